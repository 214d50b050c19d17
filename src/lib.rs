//! Min/max-binned viewer for multi-electrode array recordings.
pub mod mea;
pub mod types;
