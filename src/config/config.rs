use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use clap::ValueEnum;
use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info};

use crate::index::ProbingStrategy;

const CONFIG_FILE_NAME: &str = "inodesim.yaml";

pub const DEFAULT_DISK_CAPACITY: u64 = 1000;
pub const DEFAULT_TABLE_CAPACITY: NonZeroUsize = NonZeroUsize::new(5).unwrap();

fn get_config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Sizing and policy of a simulator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Quota units shared by every entry of the tree.
    pub disk_capacity: u64,
    /// Initial number of slots of the name index.
    pub table_capacity: NonZeroUsize,
    pub strategy: ProbingStrategy,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            disk_capacity: DEFAULT_DISK_CAPACITY,
            table_capacity: DEFAULT_TABLE_CAPACITY,
            strategy: ProbingStrategy::default(),
        }
    }
}

impl SimulatorConfig {
    /// Reads `inodesim.yaml` from `root`, falling back to defaults when the
    /// file does not exist.
    pub async fn read(root: &Path) -> Result<Self, ConfigError> {
        Self::from_path(get_config_file_path(root)).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, ConfigError> {
        debug!("Opening config file: {}", path.display());
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).context(ReadSnafu {
                    file_path: path.display().to_string(),
                });
            }
        };
        debug!("Successfully read config file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    /// Command-line values win over the file.
    pub fn with_overrides(
        self,
        disk_capacity: Option<u64>,
        table_capacity: Option<NonZeroUsize>,
        strategy: Option<ProbingStrategy>,
    ) -> Self {
        Self {
            disk_capacity: disk_capacity.unwrap_or(self.disk_capacity),
            table_capacity: table_capacity.unwrap_or(self.table_capacity),
            strategy: strategy.unwrap_or(self.strategy),
        }
    }

    fn apply_mapping(mut self, mapping: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, ConfigError> {
        for (key, value) in mapping {
            let Yaml::Value(Scalar::String(key)) = key else {
                debug!("Skipping non-string config key: {:?}", key);
                continue;
            };
            let key: &str = key;
            match key {
                "disk_capacity" => {
                    self.disk_capacity = integer_value(value)
                        .and_then(|n| u64::try_from(n).ok())
                        .context(InvalidValueSnafu {
                            key,
                            expected: "a non-negative integer",
                        })?;
                }
                "table_capacity" => {
                    self.table_capacity = integer_value(value)
                        .and_then(|n| usize::try_from(n).ok())
                        .and_then(NonZeroUsize::new)
                        .context(InvalidValueSnafu {
                            key,
                            expected: "a positive integer",
                        })?;
                }
                "strategy" => {
                    let name = value.as_str().context(InvalidValueSnafu {
                        key,
                        expected: "one of linear, quadratic, chaining",
                    })?;
                    self.strategy = ProbingStrategy::from_str(name, true)
                        .ok()
                        .context(UnknownStrategySnafu { name })?;
                }
                other => debug!("Ignoring unknown config key '{}'", other),
            }
        }
        Ok(self)
    }
}

fn integer_value(value: &Yaml) -> Option<i64> {
    match value {
        Yaml::Value(Scalar::Integer(n)) => Some(*n),
        _ => None,
    }
}

impl TryFrom<&str> for SimulatorConfig {
    type Error = ConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;

        // A file holding only comments configures nothing
        let Some(document) = documents.first() else {
            return Ok(Self::default());
        };
        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        Self::default().apply_mapping(top_level)
    }
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Config file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Config key '{}' should be {}", key, expected))]
    InvalidValue { key: String, expected: String },
    #[snafu(display("Unknown index strategy '{}'", name))]
    UnknownStrategy { name: String },
}
