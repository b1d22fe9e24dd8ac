use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::index::ProbingStrategy;

/// Per-invocation settings; the sizing fields override the config file.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub script: Option<PathBuf>,
    pub root: PathBuf,
    pub capacity: Option<u64>,
    pub table_capacity: Option<NonZeroUsize>,
    pub strategy: Option<ProbingStrategy>,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            script: cli.script,
            root: cli.root,
            capacity: cli.capacity,
            table_capacity: cli.table_capacity,
            strategy: cli.strategy,
        }
    }
}
