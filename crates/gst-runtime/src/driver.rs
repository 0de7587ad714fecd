//! The single pass over the event source.
//!
//! [`RunDriver`] owns the source and the built registry. `run` visits every
//! row index once, offering the materialised event to every selection;
//! `export` then hands each frozen aggregate to an [`OutputSink`].

use std::collections::BTreeMap;

use gst_core::error::{GstError, Result};
use gst_data::reader::EventSource;
use gst_data::registry::Registry;
use gst_data::sink::OutputSink;
use tracing::{debug, info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Done,
}

/// What a completed pass saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows visited.
    pub rows: usize,
    /// Events accepted, per selection name.
    pub selected: BTreeMap<String, u64>,
}

// ── RunDriver ─────────────────────────────────────────────────────────────────

pub struct RunDriver<S: EventSource> {
    source: S,
    registry: Registry,
    state: DriverState,
    failed: bool,
}

impl<S: EventSource> RunDriver<S> {
    pub fn new(source: S, registry: Registry) -> Self {
        Self {
            source,
            registry,
            state: DriverState::Idle,
            failed: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Fill the registry from every row in order.
    ///
    /// Only valid from [`DriverState::Idle`]. The first bad row aborts the
    /// pass; the driver is then `Done` and refuses to export.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.state != DriverState::Idle {
            return Err(GstError::InvalidState(format!(
                "run() called in state {:?}",
                self.state
            )));
        }
        self.state = DriverState::Running;

        let rows = self.source.len();
        if rows == 0 {
            warn!("No rows to process");
        }
        info!("Processing {} rows", rows);

        for index in 0..rows {
            let event = match self.source.event(index) {
                Ok(event) => event,
                Err(e) => {
                    self.state = DriverState::Done;
                    self.failed = true;
                    return Err(e);
                }
            };
            self.registry.fill(&event);
        }
        self.state = DriverState::Done;

        let selected: BTreeMap<String, u64> = self
            .registry
            .selections()
            .map(|s| (s.name().to_string(), s.passed()))
            .collect();
        for (name, passed) in &selected {
            debug!("Selection {}: {} / {} events", name, passed, rows);
        }

        Ok(RunSummary { rows, selected })
    }

    /// Hand every aggregate to `sink` once, selection by selection, then
    /// finish the sink.
    pub fn export(&self, sink: &mut dyn OutputSink) -> Result<()> {
        if self.state != DriverState::Done || self.failed {
            return Err(GstError::InvalidState(format!(
                "export() called in state {:?}{}",
                self.state,
                if self.failed { " after a failed run" } else { "" }
            )));
        }

        for selection in self.registry.selections() {
            for (key, aggregate) in selection.aggregates() {
                info!("Writing {} {}", selection.name(), key);
                aggregate.export(selection.name(), sink)?;
            }
        }
        sink.finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
