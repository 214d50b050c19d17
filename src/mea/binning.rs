//! Min/max envelope reduction.
//!
//! Every bucket collapses to a `(min, max)` pair so peaks survive
//! downsampling no matter how many samples fall into one pixel column.

/// Reduces `samples` to `2 * bin_count` values, bucket `i` covering
/// `samples[i * bin_size..(i + 1) * bin_size]`.
///
/// Buckets past the end of the input repeat the last sample (or `0.0` for
/// an empty input). Samples beyond `bin_size * bin_count` are ignored.
pub fn bin(samples: &[f32], bin_size: usize, bin_count: usize) -> Vec<f32> {
    let fallback = samples.last().copied().unwrap_or(0.0);
    let mut out = Vec::with_capacity(2 * bin_count);
    bin_into(samples, bin_size, bin_count, fallback, &mut out);
    out
}

/// Allocation-free form of [`bin`]: appends `2 * bin_count` values to `out`,
/// using `fallback` for empty buckets.
pub fn bin_into(
    samples: &[f32],
    bin_size: usize,
    bin_count: usize,
    fallback: f32,
    out: &mut Vec<f32>,
) {
    let bin_size = bin_size.max(1);
    out.reserve(2 * bin_count);
    let scanned = samples.len().min(bin_size.saturating_mul(bin_count));
    let mut filled = 0;
    for bucket in samples[..scanned].chunks(bin_size) {
        let (min, max) = min_max(bucket);
        out.push(min);
        out.push(max);
        filled += 1;
    }
    for _ in filled..bin_count {
        out.push(fallback);
        out.push(fallback);
    }
}

#[inline]
fn min_max(bucket: &[f32]) -> (f32, f32) {
    bucket
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
