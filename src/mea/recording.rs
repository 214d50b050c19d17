use std::collections::HashSet;

use ndarray::{Array2, ArrayView1};

use super::error::MeaError;

/// Immutable multichannel recording sharing one regular time index.
#[derive(Clone, Debug)]
pub struct Recording {
    channel_names: Vec<String>,
    time: Vec<f64>,
    samples: Array2<f32>, // channels x samples
    sample_rate_hz: f64,
}
impl Recording {
    pub fn new(time: Vec<f64>, channels: Vec<(String, Vec<f32>)>) -> Result<Self, MeaError> {
        if channels.is_empty() {
            return Err(MeaError::CorruptRecording("no channels".into()));
        }
        if time.len() < 2 {
            return Err(MeaError::CorruptRecording(format!(
                "need at least two samples, got {}",
                time.len()
            )));
        }
        if let Some(i) = time.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(MeaError::CorruptRecording(format!(
                "time index not strictly increasing at sample {}",
                i + 1
            )));
        }
        let mut seen = HashSet::new();
        let mut channel_names = Vec::with_capacity(channels.len());
        let mut flat = Vec::with_capacity(channels.len() * time.len());
        for (name, values) in channels {
            if values.len() != time.len() {
                return Err(MeaError::CorruptRecording(format!(
                    "channel {name} has {} samples, time index has {}",
                    values.len(),
                    time.len()
                )));
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(MeaError::CorruptRecording(format!(
                    "duplicate channel {name}"
                )));
            }
            channel_names.push(name);
            flat.extend_from_slice(&values);
        }
        let samples = Array2::from_shape_vec((channel_names.len(), time.len()), flat)
            .map_err(|e| MeaError::CorruptRecording(e.to_string()))?;
        let sample_rate_hz = 1.0 / (time[1] - time[0]);
        Ok(Self {
            channel_names,
            time,
            samples,
            sample_rate_hz,
        })
    }
    /// Builds a recording on a regular grid starting at t = 0.
    pub fn from_sample_rate(
        sample_rate_hz: f64,
        channels: Vec<(String, Vec<f32>)>,
    ) -> Result<Self, MeaError> {
        if !(sample_rate_hz > 0.0) || !sample_rate_hz.is_finite() {
            return Err(MeaError::InvalidRange {
                what: "sample rate",
                value: sample_rate_hz,
            });
        }
        let len = channels.first().map(|(_, v)| v.len()).unwrap_or(0);
        let time = (0..len).map(|i| i as f64 / sample_rate_hz).collect();
        Self::new(time, channels)
    }
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }
    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }
    pub fn time_index(&self) -> &[f64] {
        &self.time
    }
    pub fn len(&self) -> usize {
        self.time.len()
    }
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate_hz
    }
    pub fn start_time(&self) -> f64 {
        self.time[0]
    }
    /// Time of the last sample.
    pub fn end_time(&self) -> f64 {
        self.time[self.time.len() - 1]
    }
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
    }
    pub fn values(&self, channel: &str) -> Result<&[f32], MeaError> {
        let idx = self
            .channel_index(channel)
            .ok_or_else(|| MeaError::UnknownElectrode(channel.to_owned()))?;
        self.values_at(idx)
    }
    pub fn values_at(&self, idx: usize) -> Result<&[f32], MeaError> {
        if idx >= self.channel_count() {
            return Err(MeaError::CorruptRecording(format!(
                "channel index {idx} out of range"
            )));
        }
        row_slice(self.samples.row(idx))
    }
    /// Sample index at or after `time`, clamped to `[0, len]`.
    pub fn index_at(&self, time: f64) -> usize {
        self.time.partition_point(|&t| t < time)
    }
}
fn row_slice(row: ArrayView1<'_, f32>) -> Result<&[f32], MeaError> {
    row.to_slice()
        .ok_or_else(|| MeaError::CorruptRecording("channel storage not contiguous".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    fn two_channels() -> Recording {
        Recording::from_sample_rate(
            100.0,
            vec![
                ("a1".into(), (0..10).map(|v| v as f32).collect()),
                ("b2".into(), vec![1.0; 10]),
            ],
        )
        .unwrap()
    }
    #[test]
    fn exposes_channels_and_rate() {
        let rec = two_channels();
        assert_eq!(rec.channel_names(), &["a1".to_string(), "b2".to_string()]);
        assert!((rec.sample_rate() - 100.0).abs() < 1e-9);
        assert!((rec.end_time() - 0.09).abs() < 1e-12);
        assert_eq!(rec.values("A1").unwrap()[3], 3.0);
        assert!(matches!(
            rec.values("c3"),
            Err(MeaError::UnknownElectrode(_))
        ));
    }
    #[test]
    fn rejects_non_monotonic_time() {
        let err = Recording::new(vec![0.0, 0.1, 0.1], vec![("a1".into(), vec![0.0; 3])]);
        assert!(matches!(err, Err(MeaError::CorruptRecording(_))));
    }
    #[test]
    fn rejects_ragged_and_duplicate_channels() {
        let ragged = Recording::new(
            vec![0.0, 0.1],
            vec![("a1".into(), vec![0.0; 2]), ("a2".into(), vec![0.0; 3])],
        );
        assert!(ragged.is_err());
        let dup = Recording::new(
            vec![0.0, 0.1],
            vec![("a1".into(), vec![0.0; 2]), ("A1".into(), vec![0.0; 2])],
        );
        assert!(dup.is_err());
    }
    #[test]
    fn index_lookup_clamps() {
        let rec = two_channels();
        assert_eq!(rec.index_at(-1.0), 0);
        assert_eq!(rec.index_at(0.05), 5);
        assert_eq!(rec.index_at(10.0), 10);
    }
}
