//! Best-effort process discovery.
//!
//! Enumeration is a per-process skip loop: records that vanish mid-scan or
//! whose metadata is unreadable are dropped, never reported. The worst
//! outcome of a scan is an empty list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(not(target_os = "linux"))]
use fallback as platform;

/// Metadata for one running process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: i32,
    /// Resolved executable path.
    pub exe: PathBuf,
    /// Working directory, when the platform exposes it.
    pub cwd: Option<PathBuf>,
    /// Owning user id, when readable.
    pub uid: Option<u32>,
}

impl ProcessRecord {
    /// Executable base name, for name-based predicates.
    pub fn name(&self) -> Option<&str> {
        self.exe.file_name().and_then(|name| name.to_str())
    }

    /// Paths currently held open by the process.
    ///
    /// Best-effort: an unreadable fd table yields an empty list.
    pub fn open_files(&self) -> Vec<PathBuf> {
        platform::open_files(self.pid)
    }
}

/// Enumerates running processes and filters them through a caller predicate.
pub struct ProcessScanner {
    any_user: bool,
}

impl ProcessScanner {
    /// Scanner over the calling user's processes.
    pub fn new() -> Self {
        Self { any_user: false }
    }

    /// Widen the scan to every user's processes.
    pub fn any_user(mut self, any_user: bool) -> Self {
        self.any_user = any_user;
        self
    }

    /// Enumerate and keep the records the predicate accepts, preserving
    /// enumeration order.
    pub fn search<F>(&self, filter: F) -> Vec<ProcessRecord>
    where
        F: FnMut(&ProcessRecord) -> bool,
    {
        let mut records = platform::enumerate();
        if !self.any_user
            && let Some(uid) = platform::current_uid()
        {
            records.retain(|record| record.uid == Some(uid));
        }
        let records = select(records, filter);
        tracing::debug!("Process scan matched {} records", records.len());
        records
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Search the calling user's processes with the given predicate.
pub fn search_processes<F>(filter: F) -> Vec<ProcessRecord>
where
    F: FnMut(&ProcessRecord) -> bool,
{
    ProcessScanner::new().search(filter)
}

fn select<F>(records: Vec<ProcessRecord>, mut filter: F) -> Vec<ProcessRecord>
where
    F: FnMut(&ProcessRecord) -> bool,
{
    records.into_iter().filter(|record| filter(record)).collect()
}
