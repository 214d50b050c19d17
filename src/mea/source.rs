use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::electrode::mea120_layout;
use super::error::MeaError;
use super::recording::Recording;

/// Anything that can produce a complete recording table.
pub trait RecordingSource {
    fn load(&mut self) -> Result<Recording, MeaError>;
}

/// Reads `time,<electrode>,...` CSV tables, one row per sample.
pub struct CsvRecordingSource<R: Read> {
    reader: csv::Reader<R>,
}
fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}
impl CsvRecordingSource<File> {
    pub fn from_path(path: &Path) -> Result<Self, MeaError> {
        Ok(Self {
            reader: reader_builder().from_path(path)?,
        })
    }
}
impl<R: Read> CsvRecordingSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: reader_builder().from_reader(reader),
        }
    }
}
impl<R: Read> RecordingSource for CsvRecordingSource<R> {
    fn load(&mut self) -> Result<Recording, MeaError> {
        let headers = self.reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(MeaError::CorruptRecording(
                "expected a time column followed by at least one channel".into(),
            ));
        }
        let names: Vec<String> = headers.iter().skip(1).map(str::to_owned).collect();
        let mut time = Vec::new();
        let mut columns: Vec<Vec<f32>> = vec![Vec::new(); names.len()];
        for (row, record) in self.reader.records().enumerate() {
            let record = record?;
            let parse = |field: Option<&str>| -> Result<f64, MeaError> {
                field
                    .and_then(|f| f.parse::<f64>().ok())
                    .ok_or_else(|| MeaError::CorruptRecording(format!("bad value in row {}", row + 1)))
            };
            time.push(parse(record.get(0))?);
            for (col, column) in columns.iter_mut().enumerate() {
                column.push(parse(record.get(col + 1))? as f32);
            }
        }
        let recording = Recording::new(time, names.into_iter().zip(columns).collect())?;
        info!(
            "loaded {} channels x {} samples at {:.1} Hz",
            recording.channel_count(),
            recording.len(),
            recording.sample_rate()
        );
        Ok(recording)
    }
}

/// Seeded stand-in recording covering the standard 120-site layout.
pub struct SyntheticSource {
    pub sample_rate_hz: f64,
    pub duration_secs: f64,
    pub amplitude_uv: f32,
    pub noise_uv: f32,
    pub seed: u64,
}
impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000.0,
            duration_secs: 60.0,
            amplitude_uv: 40.0,
            noise_uv: 8.0,
            seed: 7,
        }
    }
}
impl RecordingSource for SyntheticSource {
    fn load(&mut self) -> Result<Recording, MeaError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let len = (self.sample_rate_hz * self.duration_secs).ceil() as usize;
        let channels = mea120_layout()
            .iter()
            .map(|(name, (col, row))| {
                let freq_hz = 2.0 + (*col as f64) * 0.75 + (*row as f64) * 0.25;
                let phase = rng.gen_range(0.0..std::f64::consts::TAU);
                let values = (0..len)
                    .map(|i| {
                        let t = i as f64 / self.sample_rate_hz;
                        let base = (std::f64::consts::TAU * freq_hz * t + phase).sin() as f32
                            * self.amplitude_uv;
                        base + rng.gen_range(-self.noise_uv..=self.noise_uv)
                    })
                    .collect();
                (name.clone(), values)
            })
            .collect();
        Recording::from_sample_rate(self.sample_rate_hz, channels)
    }
}
