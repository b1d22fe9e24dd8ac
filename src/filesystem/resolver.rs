//! Path expressions over a [`NodeStore`].
//!
//! The grammar is small: `..` on its own means the parent of
//! the current directory, a leading `/` starts at the root, anything else
//! starts at the current directory. `..` is not special inside longer paths.

use snafu::{OptionExt, ensure};

use crate::filesystem::error::{FilesystemError, NotFoundSnafu};
use crate::filesystem::tree::{EntryId, NodeStore};

pub const PATH_SEPARATOR: char = '/';
pub const PARENT_DIR: &str = "..";
pub const CURRENT_DIR: &str = ".";

/// Resolves `path` to an entry, starting from `current` for relative paths.
///
/// An empty path resolves to nothing.
pub fn resolve(
    store: &NodeStore,
    path: &str,
    current: EntryId,
) -> Result<EntryId, FilesystemError> {
    ensure!(!path.is_empty(), NotFoundSnafu { path });

    if path == PARENT_DIR {
        return Ok(store
            .get(current)
            .and_then(|entry| entry.parent())
            .unwrap_or(current));
    }

    let (start, remainder) = match path.strip_prefix(PATH_SEPARATOR) {
        Some(rest) => (store.root(), rest),
        None => (current, path),
    };

    remainder
        .split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .try_fold(start, |node, segment| {
            store.child_named(node, segment).context(NotFoundSnafu { path })
        })
}

/// Absolute path of `id`: `/` for the root, `/a/b` for `b` inside `a`.
pub fn to_path(store: &NodeStore, id: EntryId) -> String {
    let mut names = Vec::new();
    let mut current = store.get(id);

    while let Some(entry) = current {
        let Some(parent) = entry.parent() else {
            break;
        };
        names.push(entry.name());
        current = store.get(parent);
    }

    if names.is_empty() {
        return PATH_SEPARATOR.to_string();
    }
    names
        .iter()
        .rev()
        .fold(String::new(), |mut path, name| {
            path.push(PATH_SEPARATOR);
            path.push_str(name);
            path
        })
}

/// Splits a path naming a possibly missing entry into the path of its parent
/// directory and its final name.
///
/// `None` as parent means "relative to some default directory"; a path with
/// a single leading separator has the root (`/`) as parent.
pub fn split_parent(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once(PATH_SEPARATOR) {
        Some(("", name)) => (Some("/"), name),
        Some((parent, name)) => (Some(parent), name),
        None => (None, path),
    }
}

/// Whether `name` may be used for a new entry.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(PATH_SEPARATOR) && name != CURRENT_DIR && name != PARENT_DIR
}
