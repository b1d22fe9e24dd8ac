mod config;

pub use config::{ConfigError, SimulatorConfig};
