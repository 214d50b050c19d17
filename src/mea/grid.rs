use log::debug;

use super::binning::bin_into;
use super::electrode::coordinates_for_electrode;
use super::error::MeaError;
use super::recording::Recording;
use super::vertex::{GridFrame, GridUniforms, Primitive};

/// Sample range and bucket layout for one resample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinPlan {
    pub start_i: usize,
    pub end_i: usize,
    pub bin_size: usize,
    pub bin_count: usize,
}
impl BinPlan {
    /// Buckets are normalised rather than stepped: a window of at least
    /// `requested` samples always yields exactly `requested` buckets and the
    /// trailing remainder is dropped. Shorter windows get one bucket per
    /// sample; an empty window keeps `requested` flat buckets.
    pub fn new(recording: &Recording, t0: f64, dt: f64, requested: usize) -> Self {
        let len = recording.len();
        let rate = recording.sample_rate();
        let offset = sample_floor((t0 - recording.start_time()) * rate);
        let start_i = if offset.is_finite() && offset > 0.0 {
            (offset as usize).min(len)
        } else {
            0
        };
        let span = sample_floor(dt * rate);
        let span = if span.is_finite() && span > 0.0 {
            span as usize
        } else {
            0
        };
        let end_i = start_i.saturating_add(span).min(len);
        let requested = requested.max(1);
        let available = end_i - start_i;
        let bin_count = if available == 0 || available >= requested {
            requested
        } else {
            available
        };
        let bin_size = (available / bin_count).max(1);
        Self {
            start_i,
            end_i,
            bin_size,
            bin_count,
        }
    }
}

/// `floor` that treats values within rounding noise of an integer as that
/// integer, so `0.29 * 100.0` lands on sample 29.
fn sample_floor(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() < 1e-9 * nearest.abs().max(1.0) {
        nearest
    } else {
        x.floor()
    }
}

/// Bins every channel of `recording` over `[t0, t0 + dt]` into one
/// interleaved grid buffer.
pub fn resample_grid(
    recording: &Recording,
    t0: f64,
    dt: f64,
    y_scale: f64,
    bin_count: usize,
) -> Result<GridFrame, MeaError> {
    let plan = BinPlan::new(recording, t0, dt, bin_count);
    let points = 2 * plan.bin_count;
    let mut vertices = Vec::with_capacity(points * recording.channel_count());
    let mut binned = Vec::with_capacity(points);
    let local_t: Vec<f32> = (0..points).map(|k| k as f32 / 2.0).collect();
    for (idx, name) in recording.channel_names().iter().enumerate() {
        let (col, row) = coordinates_for_electrode(name)?;
        let values = recording.values_at(idx)?;
        // Past the end the line stays at the last recorded value.
        let fallback = values[plan.start_i.min(values.len() - 1)];
        binned.clear();
        bin_into(
            &values[plan.start_i..plan.end_i],
            plan.bin_size,
            plan.bin_count,
            fallback,
            &mut binned,
        );
        let (col, row) = (col as f32, row as f32);
        vertices.extend(
            binned
                .iter()
                .zip(&local_t)
                .map(|(&value, &t)| [col, row, t, value]),
        );
    }
    debug!(
        "grid resample: samples {}..{}, {} x {} buckets of {}",
        plan.start_i,
        plan.end_i,
        recording.channel_count(),
        plan.bin_count,
        plan.bin_size
    );
    Ok(GridFrame {
        vertices,
        points_per_channel: points,
        uniforms: GridUniforms {
            width: plan.bin_count as f32,
            y_scale: y_scale as f32,
        },
        primitive: Primitive::LineStrip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Recording {
        let a1: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.21).sin() * 30.0).collect();
        let b2: Vec<f32> = (0..1000).map(|i| (i % 37) as f32 - 18.0).collect();
        Recording::from_sample_rate(100.0, vec![("a1".into(), a1), ("b2".into(), b2)]).unwrap()
    }

    #[test]
    fn two_channel_scenario_bins_first_five_seconds() {
        let rec = scenario();
        let frame = resample_grid(&rec, 0.0, 5.0, 50.0, 10).unwrap();
        assert_eq!(frame.points_per_channel, 20);
        assert_eq!(frame.vertices.len(), 40);
        assert_eq!(frame.uniforms.width, 10.0);
        assert_eq!(frame.uniforms.y_scale, 50.0);
        for (ch, strip) in frame.channel_strips().enumerate() {
            let values = rec.values_at(ch).unwrap();
            let (col, row) = coordinates_for_electrode(&rec.channel_names()[ch]).unwrap();
            for (k, v) in strip.iter().enumerate() {
                assert_eq!(v[0], col as f32);
                assert_eq!(v[1], row as f32);
                assert_eq!(v[2], k as f32 / 2.0);
            }
            for i in 0..10 {
                let bucket = &values[i * 50..(i + 1) * 50];
                let lo = bucket.iter().copied().fold(f32::INFINITY, f32::min);
                let hi = bucket.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                assert_eq!(strip[2 * i][3], lo);
                assert_eq!(strip[2 * i + 1][3], hi);
            }
        }
    }

    #[test]
    fn resample_is_idempotent() {
        let rec = scenario();
        let a = resample_grid(&rec, 1.234, 3.3, 50.0, 17).unwrap();
        let b = resample_grid(&rec, 1.234, 3.3, 50.0, 17).unwrap();
        let bytes = |f: &GridFrame| -> Vec<u32> { f.as_floats().iter().map(|v| v.to_bits()).collect() };
        assert_eq!(bytes(&a), bytes(&b));
    }

    #[test]
    fn zero_length_window_is_flat() {
        let rec = scenario();
        for (t0, dt) in [(20.0, 5.0), (3.0, 0.0)] {
            let frame = resample_grid(&rec, t0, dt, 50.0, 8).unwrap();
            assert_eq!(frame.points_per_channel, 16);
            for strip in frame.channel_strips() {
                let first = strip[0][3];
                assert!(strip.iter().all(|v| v[3] == first));
            }
        }
    }

    #[test]
    fn short_window_uses_one_bucket_per_sample() {
        let rec = scenario();
        let plan = BinPlan::new(&rec, 0.0, 0.05, 125);
        assert_eq!(plan, BinPlan { start_i: 0, end_i: 5, bin_size: 1, bin_count: 5 });
        let frame = resample_grid(&rec, 0.0, 0.05, 50.0, 125).unwrap();
        assert_eq!(frame.uniforms.width, 5.0);
    }

    #[test]
    fn plan_indices_survive_float_noise() {
        let rec = scenario();
        assert!((0.29f64 * 100.0).floor() < 29.0);
        let plan = BinPlan::new(&rec, 0.29, 0.29, 10);
        assert_eq!((plan.start_i, plan.end_i), (29, 58));
        let plan = BinPlan::new(&rec, 0.295, 1.0, 10);
        assert_eq!(plan.start_i, 29);
    }

    #[test]
    fn window_is_clipped_to_recording() {
        let rec = scenario();
        let plan = BinPlan::new(&rec, 8.0, 5.0, 10);
        assert_eq!((plan.start_i, plan.end_i), (800, 1000));
        assert_eq!(plan.bin_size, 20);
        let plan = BinPlan::new(&rec, -2.0, 1.0, 10);
        assert_eq!(plan.start_i, 0);
    }

    #[test]
    fn unknown_channel_fails_the_call() {
        let rec = Recording::from_sample_rate(100.0, vec![("zz9".into(), vec![0.0; 10])]).unwrap();
        assert!(matches!(
            resample_grid(&rec, 0.0, 0.1, 50.0, 2),
            Err(MeaError::UnknownElectrode(name)) if name == "zz9"
        ));
    }
}
