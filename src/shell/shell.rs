use std::io::{self, BufRead, Write};

use colored::Colorize;
use tracing::debug;

use crate::filesystem::{
    FileSim, FilesystemError, MoveOutcome, STATUS_FAILED, STATUS_OK, StatusCode,
};
use crate::shell::command::{Command, HELP_TEXT};

/// Text and status produced by one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: i32,
    pub message: String,
}

impl Outcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            message: message.into(),
        }
    }

    fn silent() -> Self {
        Self::success(String::new())
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_FAILED,
            message: message.into(),
        }
    }

    fn from_result<T>(
        command: &str,
        result: Result<T, FilesystemError>,
        render: impl FnOnce(T) -> String,
    ) -> Self {
        let status = result.status_code();
        let message = match result {
            Ok(value) => render(value),
            Err(e) => format!("{command}: {e}"),
        };
        Self { status, message }
    }

    pub fn is_failure(&self) -> bool {
        self.status != STATUS_OK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub commands: usize,
    pub failures: usize,
}

/// Line-oriented front end driving a [`FileSim`].
pub struct Shell {
    sim: FileSim,
    colorize: bool,
}

impl Shell {
    pub fn new(sim: FileSim, colorize: bool) -> Self {
        Self { sim, colorize }
    }

    pub fn sim(&self) -> &FileSim {
        &self.sim
    }

    /// Executes every line of `input` until it ends or a `quit` command.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
    ) -> io::Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        for line in input.lines() {
            let line = line?;
            let outcome = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    debug!("Executing {:?}", command);
                    self.execute(command)
                }
                Err(e) => Outcome::failure(e.to_string()),
            };

            summary.commands += 1;
            if outcome.is_failure() {
                summary.failures += 1;
            }
            self.write_outcome(output, &outcome)?;
        }

        Ok(summary)
    }

    fn write_outcome<W: Write>(&self, output: &mut W, outcome: &Outcome) -> io::Result<()> {
        if outcome.message.is_empty() {
            return Ok(());
        }
        if outcome.is_failure() && self.colorize {
            writeln!(output, "{}", outcome.message.red())
        } else {
            writeln!(output, "{}", outcome.message)
        }
    }

    pub fn execute(&mut self, command: Command) -> Outcome {
        match command {
            Command::Touch(path) => {
                Outcome::from_result("touch", self.sim.touch(&path), |_| String::new())
            }
            Command::Mkdir(path) => {
                Outcome::from_result("mkdir", self.sim.mkdir(&path), |_| String::new())
            }
            Command::Ls => Outcome::success(self.sim.ls().join("\n")),
            Command::Pwd => Outcome::success(self.sim.pwd()),
            Command::Tree => Outcome::success(self.sim.tree().to_string()),
            Command::Cat(path) => {
                Outcome::from_result("cat", self.sim.cat(&path), |data| data.to_string())
            }
            Command::Stat(path) => {
                Outcome::from_result("stat", self.sim.stat(&path), |report| report.to_string())
            }
            Command::Edit { path, value } => {
                Outcome::from_result("edit", self.sim.edit(&path, &value), |()| String::new())
            }
            Command::Cd(path) => {
                Outcome::from_result("cd", self.sim.cd(&path), |()| String::new())
            }
            Command::Rm { path, recursive } => {
                Outcome::from_result("rm", self.sim.rm(&path, recursive), |_| String::new())
            }
            Command::Mv { origin, dest } => {
                Outcome::from_result("mv", self.sim.mv(&origin, &dest), |outcome| {
                    match outcome {
                        MoveOutcome::Renamed => format!("Moving from: {origin} to {dest}"),
                        MoveOutcome::MovedInto => format!("Moving from: {origin} into {dest}"),
                    }
                })
            }
            Command::Search(name) => match self.sim.search(&name) {
                Ok(hits) => Outcome::success(
                    hits.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                Err(_) => Outcome::failure(format!("No files found with name: {name}")),
            },
            Command::Insert { key, path } => {
                let result = self.sim.resolve(&path).and_then(|target| {
                    self.sim
                        .insert(&key, target)
                        .map_err(|source| FilesystemError::Index { source })
                });
                Outcome::from_result("insert", result, |()| String::new())
            }
            Command::Strategy(strategy) => {
                self.sim.set_strategy(strategy);
                Outcome::success(format!("Index strategy: {strategy}"))
            }
            Command::Collisions => Outcome::success(format!(
                "Collisions with {}: {}",
                self.sim.index().strategy(),
                self.sim.collision_count()
            )),
            Command::ResetCollisions => {
                self.sim.reset_collision_count();
                Outcome::success("Collision count reset")
            }
            Command::Resize => {
                self.sim.resize_index();
                Outcome::success(format!(
                    "Name index resized to {} slots; existing records no longer resolve",
                    self.sim.index().capacity()
                ))
            }
            Command::Stats => Outcome::success(self.sim.stats().to_string()),
            Command::Help => Outcome::success(HELP_TEXT),
            Command::Quit => Outcome::silent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::index::ProbingStrategy;

    fn shell(disk_capacity: u64) -> Shell {
        let sim = FileSim::new(
            disk_capacity,
            NonZeroUsize::new(5).unwrap(),
            ProbingStrategy::Chaining,
        );
        Shell::new(sim, false)
    }

    fn run_script(shell: &mut Shell, script: &str) -> (String, SessionSummary) {
        let mut output = Vec::new();
        let summary = shell
            .run(script.as_bytes(), &mut output)
            .expect("Writing to a Vec never fails");
        (String::from_utf8(output).unwrap(), summary)
    }

    #[test]
    fn mkdir_then_ls_session() {
        let mut shell = shell(100);

        let (output, summary) = run_script(&mut shell, "mkdir docs\nls\n");

        assert_eq!(output, "docs\n");
        assert_eq!(summary, SessionSummary { commands: 2, failures: 0 });
    }

    #[test]
    fn duplicate_touch_reports_error() {
        let mut shell = shell(100);

        let (output, summary) = run_script(
            &mut shell,
            "mkdir docs\ntouch /docs/readme.txt\ntouch /docs/readme.txt\n",
        );

        assert_eq!(output, "touch: readme.txt: Already exists\n");
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn edit_cat_and_quota_errors() {
        let mut shell = shell(8);

        let (output, _) = run_script(
            &mut shell,
            "touch a.txt\nedit a.txt hello there\nedit a.txt hi\ncat a.txt\n",
        );

        assert_eq!(
            output,
            "edit: No space left on disk: 11 units requested, 7 available\nhi\n"
        );
    }

    #[test]
    fn rename_and_search_session() {
        let mut shell = shell(100);

        let (output, summary) = run_script(
            &mut shell,
            "touch /a.txt\nmv /a.txt /b.txt\nsearch a.txt\nsearch b.txt\n",
        );

        assert_eq!(
            output,
            "Moving from: /a.txt to /b.txt\nNo files found with name: a.txt\nFound: /b.txt\n"
        );
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn move_into_directory_session() {
        let mut shell = shell(100);

        let (output, _) = run_script(&mut shell, "mkdir docs\ntouch a.txt\nmv a.txt docs\nls\n");

        assert_eq!(output, "Moving from: a.txt into docs\ndocs\n");
    }

    #[test]
    fn raw_insert_session() {
        let mut shell = shell(100);

        let (output, summary) = run_script(
            &mut shell,
            "mkdir docs\ninsert alias /docs\nsearch alias\ninsert ghost /nowhere\n",
        );

        assert_eq!(
            output,
            "Found: /docs\ninsert: /nowhere: No such file or directory\n"
        );
        assert_eq!(summary.failures, 1);
        assert!(shell.sim().resolve("alias").is_err());
    }

    #[test]
    fn recursive_remove_session() {
        let mut shell = shell(100);

        let (output, _) = run_script(
            &mut shell,
            "mkdir docs\ntouch docs/a\nrm docs\nrm -r docs\nsearch a\nls\n",
        );

        assert_eq!(
            output,
            "rm: docs: Is a directory\nNo files found with name: a\n"
        );
        assert_eq!(shell.sim().store().len(), 1);
    }

    #[test]
    fn index_commands_session() {
        let mut shell = shell(100);

        let (output, _) = run_script(
            &mut shell,
            "strategy quadratic\ntouch docs\ntouch a.txt\ncollisions\nreset-collisions\ncollisions\n",
        );

        assert_eq!(
            output,
            "Index strategy: quadratic probing\n\
             Collisions with quadratic probing: 1\n\
             Collision count reset\n\
             Collisions with quadratic probing: 0\n"
        );
    }

    #[test]
    fn parse_errors_do_not_stop_the_session() {
        let mut shell = shell(100);

        let (output, summary) = run_script(&mut shell, "bogus\n# note\n\npwd\nquit\nls\n");

        assert_eq!(output, "bogus: command not found\n/\n");
        assert_eq!(summary, SessionSummary { commands: 2, failures: 1 });
    }

    #[test]
    fn failures_are_red_when_colorized() {
        let sim = FileSim::new(10, NonZeroUsize::new(5).unwrap(), ProbingStrategy::Chaining);
        let mut shell = Shell::new(sim, true);
        colored::control::set_override(true);

        let (output, _) = run_script(&mut shell, "cat nope\n");

        assert!(output.contains("\u{1b}["));
        assert!(output.contains("cat: nope: No such file or directory"));
    }
}
