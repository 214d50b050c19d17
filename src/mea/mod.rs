// src/mea/mod.rs
pub mod binning;
pub mod config;
pub mod electrode;
pub mod error;
pub mod grid;
pub mod pipeline;
pub mod plot;
pub mod recording;
pub mod source;
pub mod trace;
pub mod vertex;
pub mod viewport;
// Flat re-exports for the shell
pub use config::ViewerConfig;
pub use error::MeaError;
pub use pipeline::{Frame, Visualization};
pub use plot::{render_frame_png, PlotStyle};
pub use recording::Recording;
pub use source::{CsvRecordingSource, RecordingSource, SyntheticSource};
pub use vertex::{grid_lines, GridFrame, TraceFrame};
