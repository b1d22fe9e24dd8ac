use std::num::NonZeroUsize;

use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, info, warn};

use crate::filesystem::error::{
    DuplicateNameSnafu, FilesystemError, IndexSnafu, InvalidNameSnafu, InvalidOperationSnafu,
    IsADirectorySnafu, NotADirectorySnafu, NotFoundSnafu,
};
use crate::filesystem::report::{IndexStats, SearchHit, StatReport, TreeReport};
use crate::filesystem::resolver::{self, CURRENT_DIR, PARENT_DIR};
use crate::filesystem::tree::{EntryId, EntryKind, NodeStore};
use crate::index::{IndexError, NameIndex, ProbingStrategy};

/// How [`FileSim::mv`] interpreted its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The destination did not exist and named the entry's new name/location.
    Renamed,
    /// The destination was an existing directory the entry now lives in.
    MovedInto,
}

/// The simulated filesystem: node tree, name index and current directory.
///
/// Every structural change updates the tree and the index together. All
/// validation happens before the first mutation, so a failed operation leaves
/// both untouched.
#[derive(Debug, Clone)]
pub struct FileSim {
    store: NodeStore,
    index: NameIndex<EntryId>,
    current_dir: EntryId,
}

impl FileSim {
    pub fn new(
        disk_capacity: u64,
        table_capacity: NonZeroUsize,
        strategy: ProbingStrategy,
    ) -> Self {
        let store = NodeStore::new(disk_capacity);
        let current_dir = store.root();
        Self {
            store,
            index: NameIndex::new(table_capacity, strategy),
            current_dir,
        }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn index(&self) -> &NameIndex<EntryId> {
        &self.index
    }

    pub fn current_dir(&self) -> EntryId {
        self.current_dir
    }

    pub fn resolve(&self, path: &str) -> Result<EntryId, FilesystemError> {
        resolver::resolve(&self.store, path, self.current_dir)
    }

    pub fn path_of(&self, id: EntryId) -> String {
        resolver::to_path(&self.store, id)
    }

    pub fn touch(&mut self, path: &str) -> Result<EntryId, FilesystemError> {
        self.create_entry(path, EntryKind::File)
    }

    pub fn mkdir(&mut self, path: &str) -> Result<EntryId, FilesystemError> {
        self.create_entry(path, EntryKind::Directory)
    }

    fn create_entry(&mut self, path: &str, kind: EntryKind) -> Result<EntryId, FilesystemError> {
        let (parent_path, name) = resolver::split_parent(path);
        let parent = match parent_path {
            Some(parent_path) => self.resolve_directory(parent_path)?,
            None => self.current_dir,
        };
        ensure!(resolver::is_valid_name(name), InvalidNameSnafu { name });
        self.store.check_create(parent, name)?;

        // The index is the only step left that can refuse, so it goes first
        self.index
            .insert(name, self.store.next_id())
            .context(IndexSnafu)?;
        self.store.create(parent, name, kind)
    }

    fn resolve_directory(&self, path: &str) -> Result<EntryId, FilesystemError> {
        let id = self.resolve(path)?;
        ensure!(self.store[id].is_directory(), NotADirectorySnafu { path });
        Ok(id)
    }

    fn resolve_file(&self, path: &str) -> Result<EntryId, FilesystemError> {
        let id = self.resolve(path)?;
        ensure!(!self.store[id].is_directory(), IsADirectorySnafu { path });
        Ok(id)
    }

    /// Names of the current directory's children in insertion order.
    pub fn ls(&self) -> Vec<&str> {
        self.store[self.current_dir]
            .children()
            .iter()
            .map(|child| self.store[*child].name())
            .collect()
    }

    pub fn pwd(&self) -> String {
        self.path_of(self.current_dir)
    }

    pub fn tree(&self) -> TreeReport {
        TreeReport {
            lines: self
                .store
                .walk(self.current_dir)
                .into_iter()
                .map(|(id, depth)| (depth, self.store[id].name().to_string()))
                .collect(),
        }
    }

    pub fn cat(&self, path: &str) -> Result<&str, FilesystemError> {
        let id = self.resolve_file(path)?;
        Ok(self.store[id].data())
    }

    pub fn stat(&self, path: &str) -> Result<StatReport, FilesystemError> {
        let entry = &self.store[self.resolve(path)?];
        Ok(StatReport {
            name: entry.name().to_string(),
            size: entry.size(),
            kind: entry.kind(),
            created_at: entry.created_at(),
            modified_at: entry.modified_at(),
        })
    }

    pub fn edit(&mut self, path: &str, new_value: &str) -> Result<(), FilesystemError> {
        let id = self.resolve_file(path)?;
        self.store.write_data(id, new_value)
    }

    pub fn cd(&mut self, path: &str) -> Result<(), FilesystemError> {
        self.current_dir = self.resolve_directory(path)?;
        Ok(())
    }

    /// Removes the entry at `path`; directories need `recursive`. Returns the
    /// number of entries destroyed.
    pub fn rm(&mut self, path: &str, recursive: bool) -> Result<usize, FilesystemError> {
        ensure!(
            path != CURRENT_DIR && path != PARENT_DIR,
            InvalidOperationSnafu {
                reason: "'.' and '..' may not be removed"
            }
        );
        let id = self.resolve(path)?;
        ensure!(
            id != self.store.root(),
            InvalidOperationSnafu {
                reason: "the root directory may not be removed"
            }
        );
        ensure!(
            !self.store[id].is_directory() || recursive,
            IsADirectorySnafu { path }
        );

        for (doomed, _) in self.store.walk(id) {
            let name = self.store[doomed].name();
            if self.index.remove_target(name, doomed).is_none() {
                warn!("No index record for '{}' in its hashed slot; leaving it stale", name);
            }
        }

        let parent = self.store[id].parent();
        if self.store.is_ancestor_or_self(id, self.current_dir) {
            self.current_dir = parent.unwrap_or(self.store.root());
        }

        self.store.detach(id);
        let removed = self.store.recursive_delete(id);
        info!("Removed '{}' ({} entries)", path, removed);
        Ok(removed)
    }

    /// Renames `origin` when `dest` does not exist, or moves it into `dest`
    /// when that is an existing directory.
    pub fn mv(&mut self, origin: &str, dest: &str) -> Result<MoveOutcome, FilesystemError> {
        let origin_id = self.resolve(origin)?;
        ensure!(
            origin_id != self.store.root(),
            InvalidOperationSnafu {
                reason: "the root directory may not be moved"
            }
        );

        match self.resolve(dest) {
            Err(_) => self.rename(origin_id, dest).map(|()| MoveOutcome::Renamed),
            Ok(dest_id) if self.store[dest_id].is_directory() => self
                .move_into(origin_id, dest_id)
                .map(|()| MoveOutcome::MovedInto),
            Ok(_) => InvalidOperationSnafu {
                reason: format!("cannot move '{origin}' onto existing file '{dest}'"),
            }
            .fail(),
        }
    }

    fn rename(&mut self, id: EntryId, dest: &str) -> Result<(), FilesystemError> {
        let (parent_path, new_name) = resolver::split_parent(dest);
        let new_parent = match parent_path {
            Some(parent_path) => self.resolve_directory(parent_path)?,
            None => self.store[id]
                .parent()
                .context(InvalidOperationSnafu {
                    reason: "the root directory may not be renamed",
                })?,
        };
        ensure!(
            resolver::is_valid_name(new_name),
            InvalidNameSnafu { name: new_name }
        );
        ensure!(
            self.store.child_named(new_parent, new_name).is_none(),
            DuplicateNameSnafu { name: new_name }
        );
        self.ensure_not_into_itself(id, new_parent)?;

        let old_name = self.store[id].name().to_string();
        if old_name != new_name {
            self.rekey(id, &old_name, new_name).context(IndexSnafu)?;
            self.store.rename(id, new_name);
        }
        if self.store[id].parent() != Some(new_parent) {
            self.store.reparent(id, new_parent);
        }

        debug!("Renamed '{}' to '{}'", old_name, self.path_of(id));
        Ok(())
    }

    fn move_into(&mut self, id: EntryId, dest: EntryId) -> Result<(), FilesystemError> {
        let name = self.store[id].name();
        ensure!(
            self.store.child_named(dest, name).is_none(),
            DuplicateNameSnafu { name }
        );
        self.ensure_not_into_itself(id, dest)?;

        self.store.reparent(id, dest);
        debug!("Moved {} into '{}'", id, self.path_of(dest));
        Ok(())
    }

    fn ensure_not_into_itself(
        &self,
        id: EntryId,
        new_parent: EntryId,
    ) -> Result<(), FilesystemError> {
        ensure!(
            !self.store.is_ancestor_or_self(id, new_parent),
            InvalidOperationSnafu {
                reason: format!("cannot move '{}' into itself", self.path_of(id))
            }
        );
        Ok(())
    }

    /// Registers `new_key` first so a refusal leaves the old record in place.
    fn rekey(&mut self, id: EntryId, old_key: &str, new_key: &str) -> Result<(), IndexError> {
        self.index.insert(new_key, id)?;
        if self.index.remove_target(old_key, id).is_none() {
            warn!("No index record for '{}' in its hashed slot; leaving it stale", old_key);
        }
        Ok(())
    }

    /// Every index record keyed `name`, across the whole table.
    pub fn search(&self, name: &str) -> Result<Vec<SearchHit>, FilesystemError> {
        let hits: Vec<SearchHit> = self
            .index
            .search_all(name)
            .map(|record| SearchHit {
                key: record.key().to_string(),
                path: record
                    .target()
                    .filter(|target| self.store.contains(*target))
                    .map(|target| self.path_of(target)),
            })
            .collect();

        ensure!(!hits.is_empty(), NotFoundSnafu { path: name });
        Ok(hits)
    }

    /// Seeds the index directly, bypassing the tree.
    pub fn insert(&mut self, key: &str, target: EntryId) -> Result<(), IndexError> {
        self.index.insert(key, target)
    }

    pub fn set_strategy(&mut self, strategy: ProbingStrategy) {
        self.index.set_strategy(strategy);
    }

    pub fn collision_count(&self) -> usize {
        self.index.collision_count()
    }

    pub fn reset_collision_count(&mut self) {
        self.index.reset_collision_count();
    }

    pub fn resize_index(&mut self) {
        self.index.resize();
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            strategy: self.index.strategy(),
            capacity: self.index.capacity(),
            elements: self.index.len(),
            occupied_slots: self.index.occupied_slots(),
            collisions: self.index.collision_count(),
            used_quota: self.store.used_quota(),
            disk_capacity: self.store.disk_capacity(),
        }
    }
}
