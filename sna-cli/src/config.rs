//! sna configuration loading from `.snarc.toml`.
//!
//! Configuration is optional. Values are resolved as
//! command-line flag > config file > built-in default.
//!
//! # Example Configuration
//!
//! ```toml
//! [pipeline]
//! xi = 2
//! delta = 0.7
//! tau = 0.5
//! zeta = 0.4
//! beta = 1.0
//! threshold = 0.1
//! no_merge = false
//! num_threads = 4
//!
//! [sources]
//! classification = "data/scop.tsv"
//! scores = ["data/ce.tsv", "data/tmalign.tsv"]
//! homology = "data/homology.json"
//! ```
//!
//! Relative source paths are resolved against the directory holding the
//! config file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sna_core::PipelineConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".snarc.toml";

/// Root configuration structure loaded from `.snarc.toml`.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct SnaConfig {
    /// Pipeline parameters; missing keys keep their defaults.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Input files for weight sources.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Score files fed to the weighting stage.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct SourcesConfig {
    /// Classification table (`accession  sccs  [domain]`).
    #[serde(default)]
    pub classification: Option<PathBuf>,

    /// Precomputed pair score tables (`accessionA  accessionB  score`).
    #[serde(default)]
    pub scores: Vec<PathBuf>,

    /// Network file whose homology edges are added to the input.
    #[serde(default)]
    pub homology: Option<PathBuf>,
}

impl SnaConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist and parse. Otherwise
    /// `.snarc.toml` in `root` is used if present; a parse failure there is
    /// logged and defaults are used, unless `strict` is set.
    pub fn load(root: &Path, path: Option<&Path>, strict: bool) -> Result<Self> {
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config = Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))?;
            return Ok(config.resolve(path.parent().unwrap_or(Path::new("."))));
        }

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let parsed = std::fs::read_to_string(&config_path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Self::parse(&content));
        match parsed {
            Ok(config) => {
                tracing::debug!("Loaded {}", config_path.display());
                Ok(config.resolve(root))
            }
            Err(e) if strict => bail!("Failed to load {}: {:#}", CONFIG_FILE, e),
            Err(e) => {
                tracing::warn!("Ignoring {}: {:#}", CONFIG_FILE, e);
                Ok(Self::default())
            }
        }
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Make relative source paths relative to `base`.
    fn resolve(mut self, base: &Path) -> Self {
        let join = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.sources.classification = self.sources.classification.map(join);
        self.sources.scores = self.sources.scores.into_iter().map(join).collect();
        self.sources.homology = self.sources.homology.map(join);
        self
    }
}
