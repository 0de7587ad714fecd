//! The seam between the run and whatever persists or renders its results.

use gst_core::error::Result;

use crate::aggregate::Aggregate;

/// Receives every aggregate once at the end of a run.
pub trait OutputSink {
    /// Accept one frozen aggregate belonging to `selection`.
    fn write(&mut self, selection: &str, aggregate: &Aggregate) -> Result<()>;

    /// Called once after the last aggregate.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps `(selection, name, entries)` triples, for tests and dry
/// runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub written: Vec<(String, String, u64)>,
    pub finished: bool,
}

impl OutputSink for RecordingSink {
    fn write(&mut self, selection: &str, aggregate: &Aggregate) -> Result<()> {
        self.written.push((
            selection.to_string(),
            aggregate.name().to_string(),
            aggregate.entries(),
        ));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
