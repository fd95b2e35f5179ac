//! `ps`/`lsof` based enumeration for non-Linux Unix hosts.
//!
//! Working directories are not resolved here; records carry `cwd: None`.

use std::path::PathBuf;
use std::process::Command;

use tracing::warn;

use super::ProcessRecord;

pub(super) fn enumerate() -> Vec<ProcessRecord> {
    // ps -axo pid,uid,comm is portable across macOS and the BSDs
    let output = match Command::new("ps").args(["-axo", "pid=,uid=,comm="]).output() {
        Ok(output) if output.status.success() => output,
        Ok(_) => {
            warn!("ps exited with non-zero status");
            return Vec::new();
        }
        Err(err) => {
            warn!(error = %err, "failed to run ps");
            return Vec::new();
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().filter_map(parse_ps_line).collect()
}

/// Parse a single line of `ps -axo pid=,uid=,comm=` output.
fn parse_ps_line(line: &str) -> Option<ProcessRecord> {
    let mut parts = line.split_whitespace();
    let pid = parts.next()?.parse().ok()?;
    let uid = parts.next()?.parse().ok()?;
    // comm may contain spaces; rejoin the remainder
    let comm = parts.collect::<Vec<_>>().join(" ");
    if comm.is_empty() {
        return None;
    }

    Some(ProcessRecord {
        pid,
        exe: PathBuf::from(comm),
        cwd: None,
        uid: Some(uid),
    })
}

pub(super) fn current_uid() -> Option<u32> {
    let output = Command::new("id").arg("-u").output().ok()?;
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

pub(super) fn open_files(pid: i32) -> Vec<PathBuf> {
    let Ok(output) = Command::new("lsof").args(["-p", &pid.to_string(), "-Fn"]).output() else {
        return Vec::new();
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.strip_prefix('n'))
        .map(PathBuf::from)
        .collect()
}
