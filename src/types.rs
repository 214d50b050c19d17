// src/types.rs

/// Which visualization currently owns the canvas.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ViewMode {
    /// Full-array grid of binned mini-traces.
    Grid,
    /// Raw samples of a few electrodes stacked vertically.
    Trace,
}

/// Canvas position in pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}
impl Pointer {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Toolkit-independent input delivered to the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewEvent {
    MouseMove {
        pos: Pointer,
        last: Pointer,
        dragging: bool,
    },
    MousePress {
        pos: Pointer,
    },
    /// `last` is the pointer position one step before the release.
    MouseRelease {
        pos: Pointer,
        last: Pointer,
    },
    /// Positive `delta` is a wheel step away from the user.
    Wheel {
        delta: f64,
        pos: Pointer,
    },
    Resize {
        width: f64,
        height: f64,
    },
    DoubleClick {
        pos: Pointer,
    },
    Tick,
}
