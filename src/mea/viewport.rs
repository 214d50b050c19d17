use std::sync::Arc;

use log::{debug, info};

use super::config::{ModeConfig, ViewerConfig};
use super::electrode::{coordinates_for_electrode, electrode_at, GRID_COLUMNS, GRID_ROWS};
use super::error::MeaError;
use super::recording::Recording;
use crate::types::{Pointer, ViewEvent, ViewMode};

/// Time window and scale owned by one visualization.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ModeState {
    t0: f64,
    dt: f64,
    y_scale: f64,
}
impl ModeState {
    fn from_config(mode: &ModeConfig, t0: f64) -> Self {
        Self {
            t0,
            dt: mode.dt_limits.clamp(mode.initial_dt),
            y_scale: mode.initial_y_scale,
        }
    }
}

/// Interactive view state for a single recording.
///
/// Grid and trace views keep separate windows, so switching back and forth
/// restores where each one was left.
#[derive(Clone, Debug)]
pub struct Viewport {
    config: Arc<ViewerConfig>,
    channels: Arc<Vec<String>>,
    recording_start: f64,
    recording_end: f64,
    mode: ViewMode,
    grid: ModeState,
    trace: ModeState,
    pan_velocity: f64,
    electrodes: Vec<String>,
    canvas: (f64, f64),
    top_margin: f64,
    mouse_t: f64,
    hovered: Option<String>,
}
impl Viewport {
    pub fn new(config: Arc<ViewerConfig>, recording: &Recording) -> Self {
        let start = recording.start_time();
        let channels: Vec<String> = recording.channel_names().to_vec();
        let electrodes: Vec<String> = config
            .initial_electrodes
            .iter()
            .filter(|name| channels.iter().any(|c| c.eq_ignore_ascii_case(name)))
            .cloned()
            .collect();
        let electrodes = if electrodes.is_empty() {
            channels.iter().take(1).cloned().collect()
        } else {
            electrodes
        };
        let canvas = (1280.0, 768.0);
        let mut viewport = Self {
            grid: ModeState::from_config(&config.grid, start),
            trace: ModeState::from_config(&config.trace, start),
            top_margin: config.top_margin_px * 2.0 / canvas.1,
            config,
            channels: Arc::new(channels),
            recording_start: start,
            recording_end: recording.end_time(),
            mode: ViewMode::Grid,
            pan_velocity: 0.0,
            electrodes,
            canvas,
            mouse_t: start,
            hovered: None,
        };
        viewport.set_mode(ViewMode::Trace);
        viewport.set_mode(ViewMode::Grid);
        viewport
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }
    pub fn t0(&self) -> f64 {
        self.state().t0
    }
    pub fn dt(&self) -> f64 {
        self.state().dt
    }
    pub fn y_scale(&self) -> f64 {
        self.state().y_scale
    }
    pub fn pan_velocity(&self) -> f64 {
        self.pan_velocity
    }
    pub fn electrodes(&self) -> &[String] {
        &self.electrodes
    }
    pub fn canvas_size(&self) -> (f64, f64) {
        self.canvas
    }
    pub fn top_margin(&self) -> f64 {
        self.top_margin
    }
    /// Time under the pointer after the last mouse move.
    pub fn mouse_t(&self) -> f64 {
        self.mouse_t
    }
    pub fn hovered_electrode(&self) -> Option<&str> {
        self.hovered.as_deref()
    }
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    fn state(&self) -> &ModeState {
        match self.mode {
            ViewMode::Grid => &self.grid,
            ViewMode::Trace => &self.trace,
        }
    }
    fn state_mut(&mut self) -> &mut ModeState {
        match self.mode {
            ViewMode::Grid => &mut self.grid,
            ViewMode::Trace => &mut self.trace,
        }
    }
    fn mode_config(&self) -> &ModeConfig {
        match self.mode {
            ViewMode::Grid => &self.config.grid,
            ViewMode::Trace => &self.config.trace,
        }
    }

    /// Valid `t0` range for the current mode and `dt`.
    pub fn t0_bounds(&self) -> (f64, f64) {
        match self.mode {
            ViewMode::Grid => (self.recording_start, self.recording_end),
            ViewMode::Trace => {
                let half = self.dt() / 2.0;
                (self.recording_start - half, self.recording_end - half)
            }
        }
    }

    pub fn set_t0(&mut self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.t0();
        }
        let (lo, hi) = self.t0_bounds();
        let clamped = value.clamp(lo, hi.max(lo));
        self.state_mut().t0 = clamped;
        clamped
    }

    pub fn set_dt(&mut self, value: f64) -> f64 {
        let clamped = self.mode_config().dt_limits.clamp(value);
        self.state_mut().dt = clamped;
        // Trace bounds move with dt.
        let t0 = self.t0();
        self.set_t0(t0);
        clamped
    }

    pub fn set_y_scale(&mut self, value: f64) -> Result<f64, MeaError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(MeaError::InvalidRange {
                what: "y_scale",
                value,
            });
        }
        self.state_mut().y_scale = value;
        Ok(value)
    }

    /// Replaces the electrodes stacked in the trace view.
    pub fn set_electrodes(&mut self, names: Vec<String>) -> Result<(), MeaError> {
        for name in &names {
            coordinates_for_electrode(name)?;
            if !self.has_channel(name) {
                return Err(MeaError::UnknownElectrode(name.clone()));
            }
        }
        if names.is_empty() {
            return Err(MeaError::InvalidRange {
                what: "electrode count",
                value: 0.0,
            });
        }
        self.electrodes = names;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            info!("switching to {mode:?} view");
            // Hiding a view drops any residual motion.
            self.pan_velocity = 0.0;
            self.mode = mode;
            let t0 = self.t0();
            self.set_t0(t0);
        }
    }

    fn has_channel(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn width(&self) -> f64 {
        self.canvas.0.max(1.0)
    }

    fn cell_width(&self) -> f64 {
        self.width() / GRID_COLUMNS as f64
    }

    pub fn seconds_per_pixel(&self, width: f64) -> f64 {
        let width = width.max(1.0);
        match self.mode {
            ViewMode::Grid => self.dt() / (width / GRID_COLUMNS as f64),
            ViewMode::Trace => self.dt() / width,
        }
    }

    /// Pixel offset from the left edge of the time axis under `x`.
    fn local_x(&self, x: f64, width: f64) -> f64 {
        match self.mode {
            ViewMode::Grid => x.rem_euclid(width.max(1.0) / GRID_COLUMNS as f64),
            ViewMode::Trace => x,
        }
    }

    /// Time shown at canvas column `x`.
    pub fn time_at(&self, x: f64, width: f64) -> f64 {
        self.t0() + self.local_x(x, width) * self.seconds_per_pixel(width)
    }

    /// `delta_pixels` is previous minus current pointer x, so dragging
    /// right moves backwards in time.
    pub fn pan(&mut self, delta_pixels: f64, width: f64) -> f64 {
        let t0 = self.t0() + delta_pixels * self.seconds_per_pixel(width);
        self.set_t0(t0)
    }

    /// Exponential zoom keeping the time under `anchor_x` in place.
    pub fn zoom(&mut self, wheel_delta: f64, anchor_x: f64, width: f64) -> bool {
        if wheel_delta == 0.0 || !wheel_delta.is_finite() {
            return false;
        }
        let local_x = self.local_x(anchor_x, width);
        let target_time = local_x * self.seconds_per_pixel(width) + self.t0();
        let step = -wheel_delta.signum() * self.mode_config().zoom_step;
        let before = *self.state();
        self.set_dt(self.dt() * (self.config.zoom_factor * step).exp());
        let spp = self.seconds_per_pixel(width);
        self.set_t0(target_time - local_x * spp);
        debug!("zoom: dt {:.4} -> {:.4}", before.dt, self.dt());
        *self.state() != before
    }

    /// Converts the last drag step into residual panning speed.
    pub fn release_with_inertia(&mut self, start_x: f64, end_x: f64, width: f64) {
        self.pan_velocity = (end_x - start_x) * self.seconds_per_pixel(width);
    }

    pub fn press(&mut self) {
        self.pan_velocity = 0.0;
    }

    /// Advances inertia by one frame; returns whether `t0` moved.
    pub fn tick(&mut self) -> bool {
        if self.pan_velocity == 0.0 {
            return false;
        }
        self.pan_velocity *= self.config.inertia_decay;
        if self.pan_velocity.abs() < self.config.inertia_epsilon * self.dt() {
            self.pan_velocity = 0.0;
            return false;
        }
        let before = self.t0();
        let after = self.set_t0(before - self.pan_velocity);
        if after == before {
            self.pan_velocity = 0.0;
        }
        after != before
    }

    pub fn on_resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.canvas = (width, height);
            self.top_margin = self.config.top_margin_px * 2.0 / height;
        }
    }

    /// Grid cell under a canvas position; row 0 is the bottom row.
    pub fn cell_at(&self, pos: Pointer) -> Option<(usize, usize)> {
        let (width, height) = (self.width(), self.canvas.1.max(1.0));
        if pos.x < 0.0 || pos.y < 0.0 || pos.x >= width || pos.y >= height {
            return None;
        }
        let col = (pos.x / self.cell_width()) as usize;
        let row_from_top = (pos.y / (height / GRID_ROWS as f64)) as usize;
        Some((col, GRID_ROWS - 1 - row_from_top.min(GRID_ROWS - 1)))
    }

    fn electrode_under(&self, pos: Pointer) -> Option<String> {
        let (col, row) = self.cell_at(pos)?;
        let name = electrode_at(col, row)?;
        self.channels
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&name))
            .cloned()
    }

    pub fn mouse_move(&mut self, pos: Pointer, last: Pointer, dragging: bool) -> bool {
        let width = self.width();
        let moved = if dragging {
            let before = self.t0();
            self.pan(last.x - pos.x, width) != before
        } else {
            false
        };
        self.mouse_t = self.time_at(pos.x, width);
        self.hovered = match self.mode {
            ViewMode::Grid => self.electrode_under(pos),
            ViewMode::Trace => None,
        };
        moved
    }

    pub fn double_click(&mut self, pos: Pointer) -> bool {
        match self.mode {
            ViewMode::Grid => match self.electrode_under(pos) {
                Some(name) => {
                    self.electrodes = vec![name];
                    self.set_mode(ViewMode::Trace);
                    true
                }
                None => false,
            },
            ViewMode::Trace => {
                self.set_mode(ViewMode::Grid);
                true
            }
        }
    }

    /// Applies one input event in place; returns whether buffers need a
    /// resample.
    pub fn handle(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::MouseMove {
                pos,
                last,
                dragging,
            } => self.mouse_move(pos, last, dragging),
            ViewEvent::MousePress { .. } => {
                self.press();
                false
            }
            ViewEvent::MouseRelease { pos, last } => {
                let width = self.width();
                self.release_with_inertia(last.x, pos.x, width);
                false
            }
            ViewEvent::Wheel { delta, pos } => {
                let width = self.width();
                self.zoom(delta, pos.x, width)
            }
            ViewEvent::Resize { width, height } => {
                self.on_resize(width, height);
                true
            }
            ViewEvent::DoubleClick { pos } => self.double_click(pos),
            ViewEvent::Tick => self.tick(),
        }
    }

    /// Pure transition: the state after `event` and whether it needs a
    /// resample.
    pub fn apply(&self, event: ViewEvent) -> (Viewport, bool) {
        let mut next = self.clone();
        let dirty = next.handle(event);
        (next, dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(seconds: usize) -> Recording {
        let len = seconds * 100;
        Recording::from_sample_rate(
            100.0,
            vec![
                ("h11".into(), vec![0.0; len]),
                ("a4".into(), vec![1.0; len]),
            ],
        )
        .unwrap()
    }

    fn trace_viewport() -> Viewport {
        let mut vp = Viewport::new(Arc::new(ViewerConfig::default()), &recording(100));
        vp.set_mode(ViewMode::Trace);
        vp.on_resize(1000.0, 500.0);
        vp
    }

    #[test]
    fn set_dt_clamps_to_trace_limits() {
        let mut vp = trace_viewport();
        assert_eq!(vp.set_dt(25.0), 20.0);
        assert_eq!(vp.dt(), 20.0);
        assert_eq!(vp.set_dt(0.0001), 0.0025);
        assert_eq!(vp.set_dt(-3.0), 0.0025);
        assert_eq!(vp.set_dt(f64::NAN), 0.0025);
    }

    #[test]
    fn grid_dt_is_only_positive() {
        let mut vp = Viewport::new(Arc::new(ViewerConfig::default()), &recording(10));
        assert_eq!(vp.set_dt(500.0), 500.0);
        assert!(vp.set_dt(0.0) > 0.0);
    }

    #[test]
    fn set_t0_respects_mode_bounds() {
        let mut vp = trace_viewport();
        vp.set_dt(10.0);
        assert_eq!(vp.set_t0(-100.0), -5.0);
        let end = 99.99;
        assert!((vp.set_t0(1e6) - (end - 5.0)).abs() < 1e-9);

        vp.set_mode(ViewMode::Grid);
        assert_eq!(vp.set_t0(-1.0), 0.0);
        assert!((vp.set_t0(1e6) - end).abs() < 1e-9);
        assert_eq!(vp.set_t0(f64::INFINITY), vp.t0());
    }

    #[test]
    fn y_scale_rejects_non_positive() {
        let mut vp = trace_viewport();
        assert_eq!(vp.set_y_scale(80.0).unwrap(), 80.0);
        assert!(matches!(
            vp.set_y_scale(0.0),
            Err(MeaError::InvalidRange { .. })
        ));
        assert!(vp.set_y_scale(f64::NAN).is_err());
        assert_eq!(vp.y_scale(), 80.0);
    }

    #[test]
    fn dragging_right_moves_back_in_time() {
        let mut vp = trace_viewport();
        vp.set_dt(10.0);
        vp.set_t0(50.0);
        let moved = vp.mouse_move(Pointer::new(600.0, 0.0), Pointer::new(500.0, 0.0), true);
        assert!(moved);
        // 100 px at 0.01 s/px
        assert!((vp.t0() - 49.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_anchor_time_fixed() {
        let mut vp = trace_viewport();
        vp.set_dt(10.0);
        vp.set_t0(40.0);
        let width = 1000.0;
        for (delta, anchor) in [(1.0, 250.0), (-1.0, 900.0), (3.0, 10.0), (-2.0, 500.0)] {
            let before = vp.time_at(anchor, width);
            assert!(vp.zoom(delta, anchor, width));
            let after = vp.time_at(anchor, width);
            assert!(
                (before - after).abs() < vp.dt() / width,
                "anchor drifted: {before} -> {after}"
            );
        }
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut vp = trace_viewport();
        vp.set_dt(10.0);
        vp.zoom(1.0, 500.0, 1000.0);
        assert!(vp.dt() < 10.0);
        vp.zoom(-1.0, 500.0, 1000.0);
        assert!((vp.dt() - 10.0).abs() < 1e-9);
        assert!(!vp.zoom(0.0, 500.0, 1000.0));
    }

    #[test]
    fn grid_zoom_anchors_within_cell() {
        let mut vp = Viewport::new(Arc::new(ViewerConfig::default()), &recording(100));
        vp.on_resize(1200.0, 1200.0);
        vp.set_t0(30.0);
        let anchor = 3.0 * 100.0 + 40.0;
        let before = vp.time_at(anchor, 1200.0);
        vp.zoom(1.0, anchor, 1200.0);
        let after = vp.time_at(anchor, 1200.0);
        assert!((before - after).abs() < vp.seconds_per_pixel(1200.0));
    }

    #[test]
    fn inertia_decays_geometrically() {
        let mut vp = trace_viewport();
        vp.set_dt(10.0);
        vp.set_t0(50.0);
        vp.release_with_inertia(500.0, 510.0, 1000.0);
        assert!((vp.pan_velocity() - 0.1).abs() < 1e-12);
        let mut last_speed = vp.pan_velocity().abs();
        let mut frames = 0;
        while vp.tick() {
            let speed = vp.pan_velocity().abs();
            assert!(speed < last_speed);
            last_speed = speed;
            frames += 1;
            assert!(frames < 10_000);
        }
        assert_eq!(vp.pan_velocity(), 0.0);
        let rest = vp.t0();
        assert!(!vp.tick());
        assert_eq!(vp.t0(), rest);
        // Total travel is bounded by v * decay / (1 - decay).
        assert!(rest < 50.0 && rest > 50.0 - 0.1 * 0.98 / 0.02 - 1e-9);
    }

    #[test]
    fn inertia_stops_at_recording_edge() {
        let mut vp = trace_viewport();
        vp.set_dt(10.0);
        vp.set_t0(-4.9);
        vp.release_with_inertia(0.0, 100.0, 1000.0);
        while vp.tick() {}
        assert_eq!(vp.t0(), -5.0);
        assert_eq!(vp.pan_velocity(), 0.0);
    }

    #[test]
    fn press_cancels_inertia() {
        let mut vp = trace_viewport();
        vp.release_with_inertia(0.0, 50.0, 1000.0);
        let (next, dirty) = vp.apply(ViewEvent::MousePress {
            pos: Pointer::new(0.0, 0.0),
        });
        assert!(!dirty);
        assert_eq!(next.pan_velocity(), 0.0);
        assert!(vp.pan_velocity() != 0.0);
    }

    #[test]
    fn resize_updates_margin_only() {
        let mut vp = trace_viewport();
        let (t0, dt) = (vp.t0(), vp.dt());
        assert!(vp.handle(ViewEvent::Resize {
            width: 800.0,
            height: 400.0
        }));
        assert!((vp.top_margin() - 0.1).abs() < 1e-12);
        assert_eq!((vp.t0(), vp.dt()), (t0, dt));
    }

    #[test]
    fn double_click_switches_views() {
        let mut vp = Viewport::new(Arc::new(ViewerConfig::default()), &recording(10));
        vp.on_resize(1200.0, 1200.0);
        // h11: column 7, row 10 -> second row from the top.
        let pos = Pointer::new(7.0 * 100.0 + 50.0, 150.0);
        vp.mouse_move(pos, pos, false);
        assert_eq!(vp.hovered_electrode(), Some("h11"));
        assert!(vp.handle(ViewEvent::DoubleClick { pos }));
        assert_eq!(vp.mode(), ViewMode::Trace);
        assert_eq!(vp.electrodes(), &["h11".to_string()]);
        assert!(vp.handle(ViewEvent::DoubleClick { pos }));
        assert_eq!(vp.mode(), ViewMode::Grid);
        // Empty cell does nothing.
        assert!(!vp.handle(ViewEvent::DoubleClick {
            pos: Pointer::new(5.0, 5.0)
        }));
    }

    #[test]
    fn modes_keep_separate_windows() {
        let mut vp = trace_viewport();
        vp.set_dt(1.0);
        vp.set_mode(ViewMode::Grid);
        assert_eq!(vp.dt(), 20.0);
        vp.set_mode(ViewMode::Trace);
        assert_eq!(vp.dt(), 1.0);
    }

    #[test]
    fn set_electrodes_validates_names() {
        let mut vp = trace_viewport();
        assert!(vp.set_electrodes(vec!["a4".into(), "h11".into()]).is_ok());
        assert!(matches!(
            vp.set_electrodes(vec!["b7".into()]),
            Err(MeaError::UnknownElectrode(_))
        ));
        assert!(vp.set_electrodes(vec![]).is_err());
        assert_eq!(vp.electrodes().len(), 2);
    }
}
