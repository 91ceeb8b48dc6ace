//! Config file loading and command-line overrides.

use fintab::vocabulary::google_finance;
use fintab_data::{BatchConfig, DataError, EntityIdentifier, HttpConfig, Vocabulary};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Error type for CLI setup.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`FileConfig`].
    #[error("invalid config file {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Invalid setting or vocabulary.
    #[error(transparent)]
    Data(#[from] DataError),
    /// Nothing to fetch.
    #[error("no entities given: pass symbols or list them under `entities` in the config file")]
    NoEntities,
}

/// Contents of the JSON config file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Entities fetched when none are given on the command line.
    pub(crate) entities: Vec<EntityIdentifier>,
    /// Pacing and retry settings.
    pub(crate) batch: BatchConfig,
    /// HTTP client settings.
    pub(crate) http: HttpConfig,
    /// Extra label → code entries, merged over the built-in vocabulary.
    pub(crate) vocabulary: Option<PathBuf>,
}

impl FileConfig {
    /// Location used when `--config` is not given.
    pub(crate) fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fintab").join("config.json"))
    }

    /// Load `path` if given, otherwise the default file if it exists,
    /// otherwise defaults. An explicitly given file must exist.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading config file");
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Batch settings given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BatchOverrides {
    pub(crate) max_rounds: Option<u32>,
    pub(crate) delay_ms: Option<u64>,
    pub(crate) round_delay_ms: Option<u64>,
    pub(crate) concurrency: Option<usize>,
}

impl BatchOverrides {
    /// Apply the given flags over `config` and validate the result.
    pub(crate) fn apply(self, mut config: BatchConfig) -> Result<BatchConfig, ConfigError> {
        if let Some(max_rounds) = self.max_rounds {
            config.max_rounds = max_rounds;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.inter_attempt_delay_ms = delay_ms;
        }
        if let Some(round_delay_ms) = self.round_delay_ms {
            config.inter_round_delay_ms = round_delay_ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Symbols from the command line, or the config file's entities if none are given.
pub(crate) fn resolve_entities(
    symbols: &[String],
    configured: Vec<EntityIdentifier>,
) -> Result<Vec<EntityIdentifier>, ConfigError> {
    let entities = if symbols.is_empty() {
        configured
    } else {
        symbols
            .iter()
            .map(|s| s.parse::<EntityIdentifier>())
            .collect::<Result<Vec<_>, _>>()?
    };
    if entities.is_empty() {
        return Err(ConfigError::NoEntities);
    }
    Ok(entities)
}

/// The built-in vocabulary, extended by the entries of `extra` if given.
pub(crate) fn load_vocabulary(extra: Option<&Path>) -> Result<Vocabulary, ConfigError> {
    let mut vocabulary = google_finance();
    if let Some(path) = extra {
        let custom = Vocabulary::from_json_file(path)?;
        debug!(path = %path.display(), entries = custom.len(), "merging vocabulary file");
        vocabulary.extend(custom);
    }
    Ok(vocabulary)
}
