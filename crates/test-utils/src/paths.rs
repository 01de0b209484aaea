//! Path utilities for locating workspace files from tests.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// This is determined by walking up from the current crate's manifest directory
/// until we find the workspace Cargo.toml.
pub fn workspace_root() -> PathBuf {
    // Start from the test-utils crate manifest dir
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Directory holding the shipped instrument profile YAML files.
pub fn profiles_dir() -> PathBuf {
    workspace_root().join("config").join("profiles")
}

/// Path of a shipped instrument profile (`seviri` → `config/profiles/seviri.yaml`).
pub fn profile_path(name: &str) -> PathBuf {
    profiles_dir().join(format!("{}.yaml", name))
}

/// Creates a temporary directory for test input or output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("l1c_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Create empty files with the given names in `dir`.
pub fn touch_files<S: AsRef<str>>(dir: &Path, names: &[S]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name.as_ref());
            std::fs::write(&path, b"").expect("Failed to create test file");
            path
        })
        .collect()
}
