//! Event accumulation layer for ggst.
//!
//! Fixed-binning histogram storage, the aggregate variants filled from
//! events, the selection registry that gates them, input discovery with the
//! JSONL event store, and the output sink seam the run exports through.

pub mod aggregate;
pub mod histogram;
pub mod reader;
pub mod registry;
pub mod sink;

pub use gst_core as core;
