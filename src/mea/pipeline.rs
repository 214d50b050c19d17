use std::sync::Arc;

use log::warn;

use super::config::ViewerConfig;
use super::error::MeaError;
use super::grid::resample_grid;
use super::recording::Recording;
use super::trace::resample_traces;
use super::vertex::{GridFrame, TraceFrame, TraceUniforms};
use super::viewport::Viewport;
use crate::types::{ViewEvent, ViewMode};

/// Whatever the renderer should draw next.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Grid(GridFrame),
    Trace(TraceFrame),
}

/// Recording + viewport + the most recent vertex buffers.
///
/// Every state change resamples synchronously before returning, so the
/// frame is never stale when the renderer asks for it.
pub struct Visualization {
    recording: Arc<Recording>,
    viewport: Viewport,
    frame: Frame,
}
impl Visualization {
    pub fn new(recording: Arc<Recording>, config: ViewerConfig) -> Result<Self, MeaError> {
        config.validate()?;
        let viewport = Viewport::new(Arc::new(config), &recording);
        let frame = resample(&recording, &viewport)?;
        Ok(Self {
            recording,
            viewport,
            frame,
        })
    }
    pub fn recording(&self) -> &Arc<Recording> {
        &self.recording
    }
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Routes one input event; returns whether the frame was rebuilt.
    ///
    /// A failed resample leaves the previous viewport and frame in place.
    pub fn handle(&mut self, event: ViewEvent) -> Result<bool, MeaError> {
        let (next, dirty) = self.viewport.apply(event);
        if !dirty {
            self.viewport = next;
            return Ok(false);
        }
        self.commit(next)
    }

    pub fn set_y_scale(&mut self, value: f64) -> Result<f64, MeaError> {
        let mut next = self.viewport.clone();
        let stored = next.set_y_scale(value)?;
        self.commit(next)?;
        Ok(stored)
    }

    pub fn set_electrodes(&mut self, names: Vec<String>) -> Result<(), MeaError> {
        let mut next = self.viewport.clone();
        next.set_electrodes(names)?;
        self.commit(next)?;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ViewMode) -> Result<(), MeaError> {
        let mut next = self.viewport.clone();
        next.set_mode(mode);
        self.commit(next)?;
        Ok(())
    }

    fn commit(&mut self, next: Viewport) -> Result<bool, MeaError> {
        match resample(&self.recording, &next) {
            Ok(frame) => {
                self.viewport = next;
                self.frame = frame;
                Ok(true)
            }
            Err(err) => {
                warn!("resample failed, keeping previous view: {err}");
                Err(err)
            }
        }
    }

    /// One-line summary of the current window.
    pub fn status_text(&self) -> String {
        let electrode = match self.viewport.mode() {
            ViewMode::Grid => self.viewport.hovered_electrode().unwrap_or_default().to_owned(),
            ViewMode::Trace => self.viewport.electrodes().join(","),
        };
        format!(
            "t0: {:1.3}    dt: {:1.3}    electrode: {}",
            self.viewport.t0(),
            self.viewport.dt(),
            electrode.to_uppercase()
        )
    }
}

pub fn resample(recording: &Recording, viewport: &Viewport) -> Result<Frame, MeaError> {
    match viewport.mode() {
        ViewMode::Grid => resample_grid(
            recording,
            viewport.t0(),
            viewport.dt(),
            viewport.y_scale(),
            viewport.config().bin_count,
        )
        .map(Frame::Grid),
        ViewMode::Trace => resample_traces(
            recording,
            viewport.electrodes(),
            viewport.t0(),
            viewport.dt(),
            TraceUniforms::from_viewport(viewport),
        )
        .map(Frame::Trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pointer;

    fn visualization() -> Visualization {
        let rec = Recording::from_sample_rate(
            100.0,
            vec![
                // Ramp: every bucket's envelope depends on the bucket size.
                ("a1".into(), (0..1000).map(|v| v as f32).collect()),
                ("b2".into(), vec![3.0; 1000]),
            ],
        )
        .unwrap();
        let config = ViewerConfig {
            bin_count: 10,
            initial_electrodes: vec!["b2".into()],
            ..Default::default()
        };
        Visualization::new(Arc::new(rec), config).unwrap()
    }

    #[test]
    fn starts_in_grid_view() {
        let vis = visualization();
        match vis.frame() {
            Frame::Grid(frame) => {
                assert_eq!(frame.vertices.len(), 2 * 20);
                assert_eq!(frame.uniforms.y_scale, 50.0);
            }
            other => panic!("expected grid frame, got {other:?}"),
        }
        assert_eq!(vis.viewport().electrodes(), &["b2".to_string()]);
    }

    #[test]
    fn wheel_rebuilds_frame() {
        let mut vis = visualization();
        let before = vis.frame().clone();
        for _ in 0..8 {
            let rebuilt = vis
                .handle(ViewEvent::Wheel {
                    delta: 1.0,
                    pos: Pointer::new(10.0, 10.0),
                })
                .unwrap();
            assert!(rebuilt);
        }
        // Under 10 s the window no longer covers the whole recording.
        assert!(vis.viewport().dt() < 10.0);
        assert_ne!(&before, vis.frame());
        match (&before, vis.frame()) {
            (Frame::Grid(old), Frame::Grid(new)) => {
                // First bucket of a1 narrows with the bucket size.
                assert_eq!(old.vertices[1][3], 99.0);
                assert!(new.vertices[1][3] - new.vertices[0][3] < 99.0);
            }
            other => panic!("expected grid frames, got {other:?}"),
        }
    }

    #[test]
    fn hover_does_not_resample() {
        let mut vis = visualization();
        let pos = Pointer::new(10.0, 740.0);
        let rebuilt = vis
            .handle(ViewEvent::MouseMove {
                pos,
                last: pos,
                dragging: false,
            })
            .unwrap();
        assert!(!rebuilt);
        // a1 sits in the bottom-left cell.
        assert_eq!(vis.viewport().hovered_electrode(), Some("a1"));
        assert!(vis.status_text().ends_with("electrode: A1"));
    }

    #[test]
    fn trace_mode_uses_stacked_uniforms() {
        let mut vis = visualization();
        vis.set_mode(ViewMode::Trace).unwrap();
        vis.set_electrodes(vec!["a1".into(), "b2".into()]).unwrap();
        match vis.frame() {
            Frame::Trace(frame) => {
                assert_eq!(frame.uniforms.height, 1.0);
                assert_eq!(frame.uniforms.adj_y_scale, (1.0 / 300.0) as f32);
                assert_eq!(frame.strips().len(), 2);
            }
            other => panic!("expected trace frame, got {other:?}"),
        }
        let vp = vis.viewport();
        assert_eq!(
            vis.status_text(),
            format!("t0: {:1.3}    dt: {:1.3}    electrode: A1,B2", vp.t0(), vp.dt())
        );
    }

    #[test]
    fn failed_update_keeps_previous_state() {
        let mut vis = visualization();
        assert!(vis.set_y_scale(-1.0).is_err());
        assert_eq!(vis.viewport().y_scale(), 50.0);
        assert!(vis.set_electrodes(vec!["k9".into()]).is_err());
        assert_eq!(vis.viewport().electrodes(), &["b2".to_string()]);
    }
}
