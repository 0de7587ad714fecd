use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::error::{GstError, Result};

/// Default first line of the plot label box.
pub const DEFAULT_LABEL: &str = "GENIE 2.12.10, BNB νμ";

/// Generator tag that selects the reduced aggregate set.
pub const DEFAULT_REDUCED_GENERATOR: &str = "CCMEC";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Classify GENIE summary-tree events and histogram them per selection
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ggst",
    about = "Classify GENIE summary-tree events and histogram them per selection",
    version
)]
pub struct Settings {
    /// Input files, directories, or file-name patterns such as "runs/*.jsonl"
    pub inputs: Vec<String>,

    /// Directory receiving the histogram bundle and plots
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Configuration name (derived from the input paths if not specified)
    #[arg(long)]
    pub config: Option<String>,

    /// Generator tag (derived from the input paths if not specified)
    #[arg(long)]
    pub generator: Option<String>,

    /// Generator tag that switches to the reduced histogram set
    #[arg(long, default_value = DEFAULT_REDUCED_GENERATOR)]
    pub reduced_generator: String,

    /// First line of the label drawn on plots
    #[arg(long, default_value = DEFAULT_LABEL)]
    pub label: String,

    /// Write only the histogram bundle, no plots
    #[arg(long)]
    pub no_plots: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse settings from an explicit argument list (first item is the
    /// program name), returning clap errors instead of exiting.
    pub fn try_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings =
            Settings::try_parse_from(args).map_err(|e| GstError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("config", &self.config), ("generator", &self.generator)] {
            if let Some(v) = value {
                if v.is_empty() || v.contains(std::path::MAIN_SEPARATOR) {
                    return Err(GstError::Config(format!(
                        "--{name} must be a non-empty name without path separators"
                    )));
                }
            }
        }
        if self.reduced_generator.is_empty() {
            return Err(GstError::Config(
                "--reduced-generator must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `true` when no input was given; the caller prints usage and exits.
    pub fn wants_usage(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Rendered usage text.
    pub fn usage() -> String {
        Settings::command().render_help().to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
