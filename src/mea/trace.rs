use log::debug;

use super::electrode::coordinates_for_electrode;
use super::error::MeaError;
use super::recording::Recording;
use super::vertex::{Primitive, TraceFrame, TraceUniforms};

/// Sample range covering `[t0, t0 + dt]` plus one neighbour on each side so
/// the line reaches both edges of the canvas.
pub fn visible_range(recording: &Recording, t0: f64, dt: f64) -> (usize, usize) {
    let time = recording.time_index();
    let first = recording.index_at(t0);
    let last = time.partition_point(|&t| t <= t0 + dt);
    let start = first.saturating_sub(1);
    let end = (last + 1).min(time.len());
    (start, end.max(start))
}

/// Emits the raw samples of each electrode in the window, stacked by index.
pub fn resample_traces(
    recording: &Recording,
    electrodes: &[String],
    t0: f64,
    dt: f64,
    uniforms: TraceUniforms,
) -> Result<TraceFrame, MeaError> {
    let (start, end) = visible_range(recording, t0, dt);
    let time = &recording.time_index()[start..end];
    let mut positions = Vec::with_capacity(time.len() * electrodes.len());
    let mut indices = Vec::with_capacity(time.len() * electrodes.len());
    for (i, name) in electrodes.iter().enumerate() {
        coordinates_for_electrode(name)?;
        let values = &recording.values(name)?[start..end];
        // Offsets from t0 keep sub-sample resolution far into long recordings.
        positions.extend(time.iter().zip(values).map(|(&t, &v)| [(t - t0) as f32, v]));
        indices.extend(std::iter::repeat(i as f32).take(values.len()));
    }
    debug!(
        "trace resample: {} electrodes x {} samples",
        electrodes.len(),
        end - start
    );
    Ok(TraceFrame {
        time_origin: t0,
        positions,
        indices,
        electrodes: electrodes.to_vec(),
        uniforms,
        primitive: Primitive::LineStrip,
    })
}
