//! Rule configuration sources.

use std::path::PathBuf;

use toets_core::errors::ConfigError;
use toets_core::models::RuleDefinition;

/// One record read from a source, parsed or not.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// File path or other label, for logs.
    pub origin: String,
    pub parsed: Result<RuleDefinition, ConfigError>,
}

/// Where rule definitions come from.
pub trait RuleSource: Send + Sync {
    /// Label used in logs and errors.
    fn name(&self) -> String;

    /// Read every record. Returns `Err` only when the source as a whole is
    /// unreadable; a bad individual record is reported inside its
    /// `SourceRecord`.
    fn read(&self) -> Result<Vec<SourceRecord>, ConfigError>;
}

/// A directory of one-rule-per-file `*.toml` definitions, read in file-name
/// order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RuleSource for DirectorySource {
    fn name(&self) -> String {
        self.dir.display().to_string()
    }

    fn read(&self) -> Result<Vec<SourceRecord>, ConfigError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| ConfigError::SourceUnreadable {
            source_name: self.name(),
            message: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let origin = path.display().to_string();
                let parsed = std::fs::read_to_string(&path)
                    .map_err(|_| ConfigError::FileNotFound {
                        path: origin.clone(),
                    })
                    .and_then(|contents| RuleDefinition::from_toml(&origin, &contents));
                SourceRecord { origin, parsed }
            })
            .collect())
    }
}

/// In-memory TOML records, as `(origin, contents)` pairs.
#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    records: Vec<(String, String)>,
}

impl InlineSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, origin: impl Into<String>, toml: impl Into<String>) -> Self {
        self.records.push((origin.into(), toml.into()));
        self
    }
}

impl RuleSource for InlineSource {
    fn name(&self) -> String {
        "inline".to_string()
    }

    fn read(&self) -> Result<Vec<SourceRecord>, ConfigError> {
        Ok(self
            .records
            .iter()
            .map(|(origin, contents)| SourceRecord {
                origin: origin.clone(),
                parsed: RuleDefinition::from_toml(origin, contents),
            })
            .collect())
    }
}

/// Pre-built definitions, validated on read.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    definitions: Vec<RuleDefinition>,
}

impl StaticSource {
    pub fn new(definitions: Vec<RuleDefinition>) -> Self {
        Self { definitions }
    }
}

impl RuleSource for StaticSource {
    fn name(&self) -> String {
        "static".to_string()
    }

    fn read(&self) -> Result<Vec<SourceRecord>, ConfigError> {
        Ok(self
            .definitions
            .iter()
            .map(|definition| SourceRecord {
                origin: format!("static:{}", definition.id),
                parsed: definition.validate().map(|()| definition.clone()),
            })
            .collect())
    }
}
