use snafu::Snafu;

use crate::index::IndexError;

/// Status reported to programmatic callers for a successful operation.
pub const STATUS_OK: i32 = 0;
/// Status reported to programmatic callers for any failed operation.
pub const STATUS_FAILED: i32 = -1;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FilesystemError {
    #[snafu(display("{}: No such file or directory", path))]
    NotFound { path: String },
    #[snafu(display("{}: Is a directory", path))]
    IsADirectory { path: String },
    #[snafu(display("{}: Not a directory", path))]
    NotADirectory { path: String },
    #[snafu(display("{}: Already exists", name))]
    DuplicateName { name: String },
    #[snafu(display(
        "No space left on disk: {} units requested, {} available",
        requested,
        available
    ))]
    QuotaExceeded { requested: u64, available: u64 },
    #[snafu(display("Invalid operation: {}", reason))]
    InvalidOperation { reason: String },
    #[snafu(display("'{}' is not a valid entry name", name))]
    InvalidName { name: String },
    #[snafu(display("{}", source))]
    Index { source: IndexError },
}

impl FilesystemError {
    pub fn status_code(&self) -> i32 {
        STATUS_FAILED
    }
}

/// Numeric status view of an operation result: `0` on success, `-1` on failure.
pub trait StatusCode {
    fn status_code(&self) -> i32;
}

impl<T> StatusCode for Result<T, FilesystemError> {
    fn status_code(&self) -> i32 {
        match self {
            Ok(_) => STATUS_OK,
            Err(e) => e.status_code(),
        }
    }
}
