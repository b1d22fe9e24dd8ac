use std::io::{self, Write};
use std::string::FromUtf8Error;

use compio::fs;
use snafu::prelude::*;
use supports_color::Stream;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::config::{ConfigError, SimulatorConfig};
use crate::filesystem::FileSim;
use crate::shell::{SessionSummary, Shell};

pub struct Application;

impl Application {
    pub async fn run(
        runtime_config: impl Into<RuntimeConfig>,
    ) -> Result<SessionSummary, ApplicationError> {
        let colorize = supports_color::on(Stream::Stdout).is_some();
        Self::run_with_output(runtime_config.into(), colorize, &mut io::stdout()).await
    }

    /// Runs the script (or stdin) against a fresh simulator, writing every
    /// command's output to `output`.
    pub async fn run_with_output<W: Write>(
        runtime_config: RuntimeConfig,
        colorize: bool,
        output: &mut W,
    ) -> Result<SessionSummary, ApplicationError> {
        let config = SimulatorConfig::read(&runtime_config.root)
            .await
            .context(ConfigSnafu)?
            .with_overrides(
                runtime_config.capacity,
                runtime_config.table_capacity,
                runtime_config.strategy,
            );
        debug!("Loaded config: {:?}", config);

        let sim = FileSim::new(config.disk_capacity, config.table_capacity, config.strategy);
        let mut shell = Shell::new(sim, colorize);

        let summary = match &runtime_config.script {
            Some(path) => {
                let file_path = path.display().to_string();
                let bytes = fs::read(path).await.context(ScriptReadSnafu {
                    file_path: file_path.clone(),
                })?;
                let script = String::from_utf8(bytes).context(ScriptEncodingSnafu { file_path })?;
                shell.run(script.as_bytes(), output)
            }
            None => shell.run(io::stdin().lock(), output),
        }
        .context(OutputSnafu)?;

        if summary.failures > 0 {
            warn!(
                "{} of {} commands failed",
                summary.failures, summary.commands
            );
        }
        info!("Session finished: {:?}", summary);
        Ok(summary)
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: ConfigError },
    #[snafu(display("Failed to read the command script: {}", file_path))]
    ScriptReadError {
        file_path: String,
        source: io::Error,
    },
    #[snafu(display("Command script {} is not valid UTF-8", file_path))]
    ScriptEncodingError {
        file_path: String,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to write command output"))]
    OutputError { source: io::Error },
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::index::ProbingStrategy;

    fn runtime_config(dir: &TempDir, script: &str) -> RuntimeConfig {
        let script_path = dir.path().join("commands.txt");
        std::fs::write(&script_path, script).expect("Failed to write script");
        RuntimeConfig {
            script: Some(script_path),
            root: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        }
    }

    #[compio::test]
    async fn runs_script_with_default_config() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = runtime_config(&dir, "mkdir docs\ntouch docs/a.txt\ntree\n");
        let mut output = Vec::new();

        let summary = Application::run_with_output(config, false, &mut output)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), " /\n- docs\n  - a.txt\n");
        assert_eq!(summary, SessionSummary { commands: 3, failures: 0 });
    }

    #[compio::test]
    async fn config_file_and_overrides_shape_the_simulator() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            dir.path().join("inodesim.yaml"),
            "disk_capacity: 1\nstrategy: linear\n",
        )
        .expect("Failed to write config file");
        let mut config = runtime_config(&dir, "touch a\ntouch b\nstats\n");
        config.strategy = Some(ProbingStrategy::Quadratic);
        let mut output = Vec::new();

        let summary = Application::run_with_output(config, false, &mut output)
            .await
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_eq!(summary.failures, 1);
        assert!(output.starts_with("touch: No space left on disk"));
        assert!(output.contains("Strategy: quadratic probing"));
        assert!(output.contains("Disk: 1/1 units used"));
    }

    #[compio::test]
    async fn missing_script_is_reported() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = RuntimeConfig {
            script: Some(dir.path().join("absent.txt")),
            root: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        };

        let result = Application::run_with_output(config, false, &mut Vec::new()).await;

        assert!(matches!(result, Err(ApplicationError::ScriptReadError { .. })));
    }

    #[compio::test]
    async fn broken_config_is_reported() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join("inodesim.yaml"), "- not\n- a map\n")
            .expect("Failed to write config file");
        let config = runtime_config(&dir, "ls\n");

        let result = Application::run_with_output(config, false, &mut Vec::new()).await;

        assert!(matches!(result, Err(ApplicationError::ConfigError { .. })));
    }
}
