use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use boardcheck_drc::{CleanupOptions, DrcOptions};
use serde::{Deserialize, Serialize};

use crate::error::IoError;

/// How the report file is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Settings for one checker invocation, read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub options: DrcOptions,
    pub report: ReportFormat,
    /// When present, track cleanup is analysed after the pass and its
    /// proposals are appended to the report. The board is not modified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupOptions>,
}

impl CheckConfig {
    pub fn new(options: DrcOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

pub fn read_config<R: Read>(reader: R) -> Result<CheckConfig, IoError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<CheckConfig, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let config = read_config(BufReader::new(file))?;
    log::debug!("Loaded check configuration from {}", path.display());
    Ok(config)
}
