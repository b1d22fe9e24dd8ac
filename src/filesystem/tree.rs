use std::ops::Index;
use std::time::SystemTime;

use derive_more::{Display, From};
use snafu::ensure;
use tracing::debug;

use crate::filesystem::error::{
    DuplicateNameSnafu, FilesystemError, IsADirectorySnafu, NotADirectorySnafu,
    QuotaExceededSnafu,
};

/// Name given to the root directory.
pub const ROOT_NAME: &str = "/";

/// Stable handle to an entry of a [`NodeStore`]. Handles are never reused, so
/// a handle to a removed entry stays invalid forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("#{_0}")]
pub struct EntryId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EntryKind {
    #[display("File")]
    File,
    #[display("Directory")]
    Directory,
}

/// A file or a directory of the simulated tree.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    kind: EntryKind,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
    data: String,
    size: u64,
    created_at: SystemTime,
    modified_at: SystemTime,
}

impl Entry {
    fn new(name: String, kind: EntryKind, parent: Option<EntryId>, size: u64) -> Self {
        let now = SystemTime::now();
        Self {
            name,
            kind,
            parent,
            children: Vec::new(),
            data: String::new(),
            size,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn modified_at(&self) -> SystemTime {
        self.modified_at
    }
}

/// Quota cost of a file holding `data`.
pub fn file_size_for(data: &str) -> u64 {
    data.len() as u64 + 1
}

/// Arena owning every entry of the tree, plus the quota bookkeeping.
///
/// The root lives at a fixed handle, costs no quota and can neither be
/// detached nor deleted.
#[derive(Debug, Clone)]
pub struct NodeStore {
    entries: Vec<Option<Entry>>,
    root: EntryId,
    used_quota: u64,
    disk_capacity: u64,
}

impl NodeStore {
    pub fn new(disk_capacity: u64) -> Self {
        let root = Entry::new(ROOT_NAME.to_string(), EntryKind::Directory, None, 0);
        Self {
            entries: vec![Some(root)],
            root: EntryId(0),
            used_quota: 0,
            disk_capacity,
        }
    }

    pub fn root(&self) -> EntryId {
        self.root
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entries, root included.
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn used_quota(&self) -> u64 {
        self.used_quota
    }

    pub fn disk_capacity(&self) -> u64 {
        self.disk_capacity
    }

    pub fn available_quota(&self) -> u64 {
        self.disk_capacity.saturating_sub(self.used_quota)
    }

    /// Sum of the sizes of every live entry. Always equals [`used_quota`](Self::used_quota).
    pub fn total_size(&self) -> u64 {
        self.entries.iter().flatten().map(Entry::size).sum()
    }

    /// Handle the next successful [`create`](Self::create) will return.
    pub fn next_id(&self) -> EntryId {
        EntryId(self.entries.len())
    }

    pub fn child_named(&self, parent: EntryId, name: &str) -> Option<EntryId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|entry| entry.name == name))
    }

    /// Checks everything [`create`](Self::create) checks, without mutating.
    pub fn check_create(&self, parent: EntryId, name: &str) -> Result<(), FilesystemError> {
        let parent_entry = &self[parent];
        ensure!(
            parent_entry.is_directory(),
            NotADirectorySnafu {
                path: parent_entry.name.clone()
            }
        );
        ensure!(
            self.child_named(parent, name).is_none(),
            DuplicateNameSnafu { name }
        );
        ensure!(
            self.used_quota + 1 <= self.disk_capacity,
            QuotaExceededSnafu {
                requested: 1u64,
                available: self.available_quota(),
            }
        );
        Ok(())
    }

    /// Creates an empty file or directory of size 1 as the last child of `parent`.
    pub fn create(
        &mut self,
        parent: EntryId,
        name: &str,
        kind: EntryKind,
    ) -> Result<EntryId, FilesystemError> {
        self.check_create(parent, name)?;

        let id = self.next_id();
        self.entries
            .push(Some(Entry::new(name.to_string(), kind, Some(parent), 1)));
        self.used_quota += 1;
        self.attach(id, parent);

        debug!("Created {} '{}' as {} under {}", kind, name, id, parent);
        Ok(id)
    }

    /// Replaces a file's data, charging the size difference against the quota.
    pub fn write_data(&mut self, id: EntryId, data: &str) -> Result<(), FilesystemError> {
        let entry = &self[id];
        ensure!(
            !entry.is_directory(),
            IsADirectorySnafu {
                path: entry.name.clone()
            }
        );

        let old_size = entry.size;
        let new_size = file_size_for(data);
        let used_without = self.used_quota - old_size;
        ensure!(
            used_without + new_size <= self.disk_capacity,
            QuotaExceededSnafu {
                requested: new_size.saturating_sub(old_size),
                available: self.available_quota(),
            }
        );

        if let Some(entry) = self.get_mut(id) {
            entry.data = data.to_string();
            entry.size = new_size;
            entry.modified_at = SystemTime::now();
            self.used_quota = used_without + new_size;
        }
        Ok(())
    }

    pub fn rename(&mut self, id: EntryId, new_name: &str) {
        if let Some(entry) = self.get_mut(id) {
            entry.name = new_name.to_string();
        }
    }

    /// Moves `id` to the end of `new_parent`'s children.
    pub fn reparent(&mut self, id: EntryId, new_parent: EntryId) {
        self.detach(id);
        self.attach(id, new_parent);
    }

    fn attach(&mut self, id: EntryId, parent: EntryId) {
        if let Some(parent_entry) = self.get_mut(parent) {
            parent_entry.children.push(id);
        }
        if let Some(entry) = self.get_mut(id) {
            entry.parent = Some(parent);
        }
    }

    /// Unlinks `id` from its parent's children. The root has no parent and is
    /// left untouched.
    pub fn detach(&mut self, id: EntryId) {
        let Some(parent) = self.get(id).and_then(Entry::parent) else {
            return;
        };
        if let Some(parent_entry) = self.get_mut(parent) {
            parent_entry.children.retain(|child| *child != id);
        }
        if let Some(entry) = self.get_mut(id) {
            entry.parent = None;
        }
    }

    /// Destroys `id` and all of its descendants, children before parents, and
    /// returns how many entries were destroyed. Callers detach `id` first.
    pub fn recursive_delete(&mut self, id: EntryId) -> usize {
        if id == self.root {
            return 0;
        }
        let Some(entry) = self.entries.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };

        let removed: usize = entry
            .children
            .iter()
            .map(|child| self.recursive_delete(*child))
            .sum();
        self.used_quota -= entry.size;
        removed + 1
    }

    /// `id` followed by all of its descendants in depth-first pre-order,
    /// each with its depth relative to `id`.
    pub fn walk(&self, id: EntryId) -> Vec<(EntryId, usize)> {
        let mut visited = Vec::new();
        let mut stack = vec![(id, 0usize)];

        while let Some((current, depth)) = stack.pop() {
            let Some(entry) = self.get(current) else {
                continue;
            };
            visited.push((current, depth));
            stack.extend(entry.children.iter().rev().map(|child| (*child, depth + 1)));
        }

        visited
    }

    /// Whether `ancestor` is `id` itself or lies on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: EntryId, id: EntryId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get(node).and_then(Entry::parent);
        }
        false
    }
}

/// Panics on a handle whose entry was removed; handles handed out by path
/// resolution are always live.
impl Index<EntryId> for NodeStore {
    type Output = Entry;

    fn index(&self, id: EntryId) -> &Entry {
        match self.get(id) {
            Some(entry) => entry,
            None => panic!("entry handle {id} refers to a removed entry"),
        }
    }
}
