//! Core types for ggst.
//!
//! The event data model, row materialisation, interaction classification,
//! run tagging, CLI settings and the shared error type. No I/O beyond what
//! the settings parser needs.

pub mod classifier;
pub mod error;
pub mod event;
pub mod row;
pub mod run_tag;
pub mod settings;
