mod bootstrap;

use anyhow::Result;
use clap::Parser;
use gst_core::run_tag::RunTag;
use gst_core::settings::Settings;
use gst_data::reader::{resolve_inputs, JsonlEventStore};
use gst_data::registry::Registry;
use gst_runtime::driver::{RunDriver, RunSummary};
use gst_runtime::output::{BundleSink, Fanout};
use gst_runtime::plot::{PlotSink, PlotStyle};

fn main() -> Result<()> {
    let settings = Settings::parse();
    settings.validate()?;

    if settings.wants_usage() {
        print!("{}", Settings::usage());
        return Ok(());
    }

    bootstrap::setup_logging(&settings.log_level)?;
    tracing::info!("ggst v{} starting", env!("CARGO_PKG_VERSION"));

    let summary = run(&settings)?;
    tracing::info!(
        "Done: {} rows, {} selections",
        summary.rows,
        summary.selected.len()
    );
    Ok(())
}

/// Resolve inputs, fill every selection and export the results.
fn run(settings: &Settings) -> Result<RunSummary> {
    let files = resolve_inputs(&settings.inputs)?;
    for file in &files {
        tracing::info!("Input file {}", file.display());
    }

    let tag = RunTag::resolve(
        &files,
        settings.config.as_deref(),
        settings.generator.as_deref(),
    )?;
    tracing::info!("Run tag: {}", tag);

    let registry = Registry::for_run(&tag, &settings.reduced_generator)?;
    let store = JsonlEventStore::open(&files)?;

    let mut driver = RunDriver::new(store, registry);
    let summary = driver.run()?;

    bootstrap::ensure_output_dir(&settings.output_dir)?;
    let mut sinks = Fanout::new().with(BundleSink::new(&settings.output_dir, &tag, summary.rows));
    if !settings.no_plots {
        let style = PlotStyle::default().with_label(settings.label.clone());
        sinks = sinks.with(PlotSink::new(&settings.output_dir, &tag, style));
    }
    driver.export(&mut sinks)?;

    Ok(summary)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
