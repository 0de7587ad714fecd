//! The `(config, generator)` pair that names a run's outputs.
//!
//! Derived from the input paths by convention: the relevant name is split on
//! `_`, the first token is the configuration and the second the generator
//! tag. The convention is fragile, so both parts can be overridden.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GstError, Result};

/// Token delimiter in run directory and file names.
pub const TAG_DELIMITER: char = '_';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTag {
    pub config: String,
    pub generator: String,
}

impl RunTag {
    pub fn new(config: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            generator: generator.into(),
        }
    }

    /// Derive the tag from the resolved input files.
    ///
    /// With several files the first file's parent directory is used; with a
    /// single file its stem is used.
    pub fn from_inputs(files: &[PathBuf]) -> Result<Self> {
        let first = files
            .first()
            .ok_or_else(|| GstError::RunTag("no input files".to_string()))?;

        let name = if files.len() > 1 {
            first.parent().and_then(Path::file_name)
        } else {
            first.file_stem()
        }
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| GstError::RunTag(format!("no usable name in {}", first.display())))?;

        Self::parse_name(&name)
    }

    /// Split a run name such as `DefaultPlusMEC_Default+CCMEC_extra` into its
    /// first two tokens. Empty tokens are skipped.
    pub fn parse_name(name: &str) -> Result<Self> {
        let mut tokens = name.split(TAG_DELIMITER).filter(|t| !t.is_empty());
        match (tokens.next(), tokens.next()) {
            (Some(config), Some(generator)) => Ok(Self::new(config, generator)),
            _ => Err(GstError::RunTag(format!(
                "expected '<config>{TAG_DELIMITER}<generator>' in '{name}'"
            ))),
        }
    }

    /// Resolve the tag, letting explicit values win over the path convention.
    ///
    /// Paths are only consulted when at least one part is not overridden.
    pub fn resolve(
        files: &[PathBuf],
        config: Option<&str>,
        generator: Option<&str>,
    ) -> Result<Self> {
        if let (Some(c), Some(g)) = (config, generator) {
            return Ok(Self::new(c, g));
        }
        let mut tag = Self::from_inputs(files)?;
        if let Some(c) = config {
            debug!("Config '{}' overridden by '{}'", tag.config, c);
            tag.config = c.to_string();
        }
        if let Some(g) = generator {
            debug!("Generator '{}' overridden by '{}'", tag.generator, g);
            tag.generator = g.to_string();
        }
        Ok(tag)
    }

    /// Whether this run uses the reduced aggregate set.
    pub fn is_reduced(&self, sentinel: &str) -> bool {
        self.generator == sentinel
    }

    /// `<config>_<generator>`, the stem of every output file.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.config, self.generator)
    }
}

impl fmt::Display for RunTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.config, self.generator)
    }
}
