//! In-memory filesystem tree with a synchronised name index.
//!
//! Entries live in an arena ([`NodeStore`]) addressed by [`EntryId`] handles.
//! Directories own an ordered list of child handles and every entry keeps a
//! handle to its parent. [`FileSim`] layers the user-visible operations on
//! top and keeps the [`NameIndex`](crate::index::NameIndex) in step with
//! every structural change.

mod error;
mod facade;
mod report;
mod resolver;
mod tree;

pub use error::{FilesystemError, STATUS_FAILED, STATUS_OK, StatusCode};
pub use facade::{FileSim, MoveOutcome};
