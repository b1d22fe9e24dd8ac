use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;
use crate::index::ProbingStrategy;

/// In-memory filesystem simulator with an instrumented name index.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// File of shell commands to run; commands are read from stdin otherwise
    pub script: Option<PathBuf>,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Directory holding the optional inodesim.yaml
    #[clap(long, short, default_value = ".")]
    pub root: PathBuf,

    /// Quota units available to the whole tree
    #[clap(long, short)]
    pub capacity: Option<u64>,

    /// Initial number of name index slots
    #[clap(long, short)]
    pub table_capacity: Option<NonZeroUsize>,

    /// Collision-resolution policy of the name index
    #[clap(long, short, value_enum)]
    pub strategy: Option<ProbingStrategy>,
}
