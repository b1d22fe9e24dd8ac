//! Line-oriented command shell over a [`FileSim`](crate::filesystem::FileSim).

mod command;
mod shell;

pub use shell::{SessionSummary, Shell};
