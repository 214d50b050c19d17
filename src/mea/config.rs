use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::MeaError;

/// Range a visible duration is clamped into; no `max` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DtLimits {
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}
impl DtLimits {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }
    /// Grid view has no practical bound, only positivity.
    pub fn unbounded() -> Self {
        Self {
            min: f64::MIN_POSITIVE,
            max: None,
        }
    }
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() || value <= 0.0 {
            return self.min;
        }
        let value = value.max(self.min);
        match self.max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

/// Per-mode starting state and limits.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModeConfig {
    pub dt_limits: DtLimits,
    pub initial_dt: f64,
    /// Half-range of the vertical axis in microvolts.
    pub initial_y_scale: f64,
    /// Exponent step applied per wheel notch.
    pub zoom_step: f64,
}
impl ModeConfig {
    pub fn grid() -> Self {
        Self {
            dt_limits: DtLimits::unbounded(),
            initial_dt: 20.0,
            initial_y_scale: 50.0,
            zoom_step: 0.05,
        }
    }
    pub fn trace() -> Self {
        Self {
            // Analog view limits: 2.5 ms up to 20 s.
            dt_limits: DtLimits::new(0.0025, 20.0),
            initial_dt: 20.0,
            initial_y_scale: 150.0,
            zoom_step: 0.025,
        }
    }
}

/// Fields present in a mode's JSON object; the rest keep that mode's
/// defaults.
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ModeOverrides {
    dt_limits: Option<DtLimits>,
    initial_dt: Option<f64>,
    initial_y_scale: Option<f64>,
    zoom_step: Option<f64>,
}
impl ModeOverrides {
    fn apply(self, mut base: ModeConfig) -> ModeConfig {
        if let Some(v) = self.dt_limits {
            base.dt_limits = v;
        }
        if let Some(v) = self.initial_dt {
            base.initial_dt = v;
        }
        if let Some(v) = self.initial_y_scale {
            base.initial_y_scale = v;
        }
        if let Some(v) = self.zoom_step {
            base.zoom_step = v;
        }
        base
    }
}

fn grid_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ModeConfig, D::Error> {
    Ok(ModeOverrides::deserialize(deserializer)?.apply(ModeConfig::grid()))
}

fn trace_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ModeConfig, D::Error> {
    Ok(ModeOverrides::deserialize(deserializer)?.apply(ModeConfig::trace()))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    #[serde(deserialize_with = "grid_mode")]
    pub grid: ModeConfig,
    #[serde(deserialize_with = "trace_mode")]
    pub trace: ModeConfig,
    /// Buckets per channel requested from the grid resampler.
    pub bin_count: usize,
    pub zoom_factor: f64,
    pub inertia_decay: f64,
    /// Velocities below `inertia_epsilon * dt` snap to zero.
    pub inertia_epsilon: f64,
    pub top_margin_px: f64,
    pub initial_electrodes: Vec<String>,
}
impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            grid: ModeConfig::grid(),
            trace: ModeConfig::trace(),
            bin_count: 125,
            zoom_factor: 2.5,
            inertia_decay: 0.98,
            inertia_epsilon: 1e-4,
            top_margin_px: 20.0,
            initial_electrodes: vec!["h11".to_owned()],
        }
    }
}
impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, MeaError> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn load(path: &Path) -> Result<Self, MeaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
    pub fn validate(&self) -> Result<(), MeaError> {
        for mode in [&self.grid, &self.trace] {
            let limits = mode.dt_limits;
            let ordered = limits.max.map_or(true, |max| max >= limits.min);
            if !(limits.min > 0.0) || !ordered {
                return Err(MeaError::InvalidRange {
                    what: "dt limits",
                    value: limits.min,
                });
            }
            if !(mode.initial_y_scale > 0.0) || !mode.initial_y_scale.is_finite() {
                return Err(MeaError::InvalidRange {
                    what: "initial y_scale",
                    value: mode.initial_y_scale,
                });
            }
        }
        if self.bin_count == 0 {
            return Err(MeaError::InvalidRange {
                what: "bin_count",
                value: 0.0,
            });
        }
        if !(0.0..1.0).contains(&self.inertia_decay) {
            return Err(MeaError::InvalidRange {
                what: "inertia decay",
                value: self.inertia_decay,
            });
        }
        Ok(())
    }
}
