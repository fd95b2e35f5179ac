//! procfs-backed enumeration.

use std::path::PathBuf;

use procfs::process::{FDTarget, Process, all_processes};
use tracing::warn;

use super::ProcessRecord;

pub(super) fn enumerate() -> Vec<ProcessRecord> {
    let procs = match all_processes() {
        Ok(procs) => procs,
        Err(err) => {
            warn!(error = %err, "failed to read the process table");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for proc in procs.flatten() {
        // Kernel threads and other users' processes have no readable exe link.
        let Ok(exe) = proc.exe() else { continue };
        records.push(ProcessRecord {
            pid: proc.pid,
            exe,
            cwd: proc.cwd().ok(),
            uid: proc.uid().ok(),
        });
    }
    records
}

pub(super) fn current_uid() -> Option<u32> {
    Process::myself().and_then(|proc| proc.uid()).ok()
}

pub(super) fn open_files(pid: i32) -> Vec<PathBuf> {
    let Ok(proc) = Process::new(pid) else {
        return Vec::new();
    };
    let Ok(fds) = proc.fd() else {
        return Vec::new();
    };
    fds.flatten()
        .filter_map(|fd| match fd.target {
            FDTarget::Path(path) => Some(path),
            _ => None,
        })
        .collect()
}
