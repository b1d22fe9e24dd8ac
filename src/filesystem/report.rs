use std::fmt;
use std::time::SystemTime;

use derive_more::Display;

use crate::ext::SystemTimeExt;
use crate::filesystem::tree::EntryKind;
use crate::index::ProbingStrategy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatReport {
    pub name: String,
    pub size: u64,
    pub kind: EntryKind,
    pub created_at: SystemTime,
    pub modified_at: SystemTime,
}

impl fmt::Display for StatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Size: {} bytes", self.size)?;
        writeln!(f, "Type: {}", self.kind)?;
        writeln!(f, "Created: {}", self.created_at.to_timestamp_string())?;
        write!(f, "Last Modified: {}", self.modified_at.to_timestamp_string())
    }
}

/// Depth-first listing of a subtree; depth 0 is the subtree's own root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeReport {
    pub lines: Vec<(usize, String)>,
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (depth, name)) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match depth {
                0 => write!(f, " {name}")?,
                _ => write!(f, "{}- {name}", "  ".repeat(depth - 1))?,
            }
        }
        Ok(())
    }
}

/// One index record matching a searched name. `path` is `None` when the
/// record no longer points at a live entry.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("Found: {}", path.as_deref().unwrap_or("<unresolved>"))]
pub struct SearchHit {
    pub key: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub strategy: ProbingStrategy,
    pub capacity: usize,
    pub elements: usize,
    pub occupied_slots: usize,
    pub collisions: usize,
    pub used_quota: u64,
    pub disk_capacity: u64,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy: {}", self.strategy)?;
        writeln!(
            f,
            "Slots: {} ({} occupied)",
            self.capacity, self.occupied_slots
        )?;
        writeln!(f, "Elements: {}", self.elements)?;
        writeln!(f, "Collisions: {}", self.collisions)?;
        write!(f, "Disk: {}/{} units used", self.used_quota, self.disk_capacity)
    }
}
