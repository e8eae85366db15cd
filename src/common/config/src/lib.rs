//! Configuration management for Tally.
//!
//! Provides the data-source and report settings used by the loader, the
//! dashboard and the CLI. Every section has defaults, so an empty JSON object
//! is a valid configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use common_error::{TallyError, TallyResult, ensure};

/// Default name of the cleaned export.
pub const DEFAULT_DATA_FILE: &str = "all_data.csv";

/// Global Tally configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Input file configuration.
    pub data: DataConfig,
    /// Report rendering configuration.
    pub report: ReportConfig,
}

impl TallyConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> TallyResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TallyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TallyError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> TallyResult<()> {
        if !self.data.delimiter.is_ascii() {
            return Err(TallyError::config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            )));
        }
        ensure!(self.report.top_n > 0, ConfigError: "report.top_n must be at least 1");
        ensure!(
            !self.report.currency.trim().is_empty(),
            ConfigError: "report.currency must not be empty"
        );
        Ok(())
    }
}

/// Input file configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path of the delimited export.
    pub path: PathBuf,
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_FILE),
            delimiter: ',',
        }
    }
}

impl DataConfig {
    /// Delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(u32::from(self.delimiter)).unwrap_or(b',')
    }
}

/// Report rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows shown in best/worst, state and RFM rankings.
    pub top_n: usize,
    /// Currency code prefixed to monetary values.
    pub currency: String,
    /// Label of the bucket that collects states outside the top N.
    pub other_label: String,
    /// Number of characters kept when shortening customer ids.
    pub short_id_len: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            currency: "AUD".to_string(),
            other_label: "Others".to_string(),
            short_id_len: 3,
        }
    }
}
