use clap::ValueEnum;
use snafu::prelude::*;

use crate::index::ProbingStrategy;

const COMMENT_PREFIX: char = '#';

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Touch(String),
    Mkdir(String),
    Ls,
    Pwd,
    Tree,
    Cat(String),
    Stat(String),
    Edit { path: String, value: String },
    Cd(String),
    Rm { path: String, recursive: bool },
    Mv { origin: String, dest: String },
    Search(String),
    Insert { key: String, path: String },
    Strategy(ProbingStrategy),
    Collisions,
    ResetCollisions,
    Resize,
    Stats,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
touch <path>              create an empty file
mkdir <path>              create a directory
ls                        list the current directory
pwd                       print the current directory
tree                      print the current subtree
cat <path>                print a file
stat <path>               describe an entry
edit <path> <value...>    replace a file's contents
cd <path>                 change directory
rm [-r] <path>            remove an entry
mv <origin> <dest>        rename or move an entry
search <name>             find entries through the name index
insert <key> <path>       add an index record for an entry, bypassing the tree
strategy <name>           linear | quadratic | chaining
collisions                print the collision count
reset-collisions          zero the collision count
resize                    double the name index capacity
stats                     print index and quota figures
quit                      leave the shell";

impl Command {
    /// Parses a line; blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match (name, args.as_slice()) {
            ("touch", [path]) => Command::Touch(path.to_string()),
            ("mkdir", [path]) => Command::Mkdir(path.to_string()),
            ("ls", []) => Command::Ls,
            ("pwd", []) => Command::Pwd,
            ("tree", []) => Command::Tree,
            ("cat", [path]) => Command::Cat(path.to_string()),
            ("stat", [path]) => Command::Stat(path.to_string()),
            ("edit", [path, ..]) => Command::Edit {
                path: path.to_string(),
                value: rest[path.len()..].trim_start().to_string(),
            },
            ("cd", [path]) => Command::Cd(path.to_string()),
            ("rm", [path]) => Command::Rm {
                path: path.to_string(),
                recursive: false,
            },
            ("rm", ["-r", path]) => Command::Rm {
                path: path.to_string(),
                recursive: true,
            },
            ("mv", [origin, dest]) => Command::Mv {
                origin: origin.to_string(),
                dest: dest.to_string(),
            },
            ("search", [key]) => Command::Search(key.to_string()),
            ("insert", [key, path]) => Command::Insert {
                key: key.to_string(),
                path: path.to_string(),
            },
            ("strategy", [strategy]) => Command::Strategy(
                ProbingStrategy::from_str(strategy, true)
                    .ok()
                    .context(UnknownStrategySnafu { name: *strategy })?,
            ),
            ("collisions", []) => Command::Collisions,
            ("reset-collisions", []) => Command::ResetCollisions,
            ("resize", []) => Command::Resize,
            ("stats", []) => Command::Stats,
            ("help", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => {
                let usage = usage(name).context(UnknownCommandSnafu { name })?;
                return WrongAritySnafu { usage }.fail();
            }
        };
        Ok(Some(command))
    }
}

/// Synopsis column of the help line for `name`.
fn usage(name: &str) -> Option<&'static str> {
    HELP_TEXT
        .lines()
        .filter(|line| line.split_whitespace().next() == Some(name))
        .find_map(|line| line.split("  ").next())
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CommandParseError {
    #[snafu(display("{}: command not found", name))]
    UnknownCommand { name: String },
    #[snafu(display("usage: {}", usage))]
    WrongArity { usage: &'static str },
    #[snafu(display("unknown index strategy '{}'", name))]
    UnknownStrategy { name: String },
}
