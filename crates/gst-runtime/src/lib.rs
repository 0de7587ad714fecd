//! Run layer for ggst.
//!
//! Drives the single pass over the event source and owns the concrete
//! output sinks: the JSON histogram bundle, SVG plots and the fan-out that
//! combines them.

pub mod driver;
pub mod output;
pub mod plot;

pub use gst_core as core;
pub use gst_data as data;
