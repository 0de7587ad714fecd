//! Persistent outputs: the JSON histogram bundle and sink fan-out.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gst_core::error::Result;
use gst_core::run_tag::RunTag;
use gst_data::aggregate::{Aggregate, AggregateKind, Titles};
use gst_data::histogram::Binned;
use gst_data::sink::OutputSink;
use serde::Serialize;
use tracing::info;

// ── BundleSink ────────────────────────────────────────────────────────────────

/// One exported aggregate as it appears in the bundle.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRecord {
    pub name: String,
    pub selection: String,
    pub key: String,
    pub kind: AggregateKind,
    pub title: Titles,
    #[serde(flatten)]
    pub binned: Binned,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_proton_events: Option<u64>,
}

impl AggregateRecord {
    pub fn new(selection: &str, aggregate: &Aggregate) -> Self {
        let kind = aggregate.kind();
        Self {
            name: aggregate.name().to_string(),
            selection: selection.to_string(),
            key: kind.key(),
            kind,
            title: kind.titles(),
            binned: aggregate.binned().clone(),
            multi_proton_events: (kind == AggregateKind::DiProtonKe)
                .then(|| aggregate.multi_proton_events()),
        }
    }
}

#[derive(Serialize)]
struct Bundle<'a> {
    config: &'a str,
    generator: &'a str,
    generated_at: DateTime<Utc>,
    rows: usize,
    aggregates: &'a [AggregateRecord],
}

/// Collects every aggregate and writes `<dir>/<config>_<generator>.json` on
/// finish.
#[derive(Debug)]
pub struct BundleSink {
    path: PathBuf,
    tag: RunTag,
    rows: usize,
    records: Vec<AggregateRecord>,
}

impl BundleSink {
    pub fn new(output_dir: &Path, tag: &RunTag, rows: usize) -> Self {
        Self {
            path: output_dir.join(format!("{}.json", tag.stem())),
            tag: tag.clone(),
            rows,
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[AggregateRecord] {
        &self.records
    }
}

impl OutputSink for BundleSink {
    fn write(&mut self, selection: &str, aggregate: &Aggregate) -> Result<()> {
        self.records.push(AggregateRecord::new(selection, aggregate));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let bundle = Bundle {
            config: &self.tag.config,
            generator: &self.tag.generator,
            generated_at: Utc::now(),
            rows: self.rows,
            aggregates: &self.records,
        };
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &bundle)?;
        info!(
            "Wrote {} histograms to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}

// ── Fanout ────────────────────────────────────────────────────────────────────

/// Forwards every call to each inner sink in order.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn OutputSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutputSink for Fanout {
    fn write(&mut self, selection: &str, aggregate: &Aggregate) -> Result<()> {
        for sink in &mut self.sinks {
            sink.write(selection, aggregate)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.finish()?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
