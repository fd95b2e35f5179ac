use std::path::PathBuf;

use crate::scanner::ProcessRecord;

/// Directory name Chromium-family applications use for localStorage data.
const LOCAL_STORAGE_DIR: &str = "Local Storage";

/// Find the localStorage directory a process currently has open.
///
/// Scans the process's open files for a path containing a `Local Storage`
/// component and returns that file's parent directory. First match wins; no
/// alternate paths are tried. `None` covers both "nothing open" and "process
/// unreadable".
pub fn find_local_storage(process: &ProcessRecord) -> Option<PathBuf> {
    for path in process.open_files() {
        if !path.to_string_lossy().contains(LOCAL_STORAGE_DIR) {
            continue;
        }
        if let Some(dir) = path.parent()
            && dir.is_dir()
        {
            tracing::debug!(
                "Found local storage for pid {}: {}",
                process.pid,
                dir.display()
            );
            return Some(dir.to_path_buf());
        }
    }
    None
}

/// Find the default profile's storage directory without a running process.
///
/// Checks well-known per-user data roots and returns the first that contains
/// a `Default/Local Storage` directory. Only the default profile is
/// considered.
pub fn find_default_storage() -> Option<PathBuf> {
    default_user_data_roots()
        .into_iter()
        .map(|root| root.join("Default").join(LOCAL_STORAGE_DIR))
        .find(|path| path.is_dir())
}

/// Per-user data roots for common Chromium-family applications.
fn default_user_data_roots() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    return dirs::config_dir()
        .map(|config| vec![config.join("Google/Chrome"), config.join("Chromium")])
        .unwrap_or_default();

    #[cfg(target_os = "linux")]
    return dirs::config_dir()
        .map(|config| vec![config.join("google-chrome"), config.join("chromium")])
        .unwrap_or_default();

    #[cfg(target_os = "windows")]
    return dirs::data_local_dir()
        .map(|data| {
            vec![
                data.join(r"Google\Chrome\User Data"),
                data.join(r"Chromium\User Data"),
            ]
        })
        .unwrap_or_default();

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    return Vec::new();
}
