//! Locating optional real downloads.
//!
//! Full-resolution provider files are large and never checked in. Tests
//! that want one look in `$FORECAST_PREP_TEST_DATA` and then in `testdata/`
//! at the workspace root.

use std::path::PathBuf;

/// Environment variable naming a directory of real downloads.
pub const TEST_DATA_ENV: &str = "FORECAST_PREP_TEST_DATA";

/// The workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest)
}

/// Directories searched for downloads, in order.
pub fn download_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::var_os(TEST_DATA_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.push(workspace_root().join("testdata"));
    dirs
}

/// First existing `name` across [`download_dirs`].
pub fn find_download(name: &str) -> Option<PathBuf> {
    download_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Scratch directory for files a test writes; removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("forecast-prep-")
        .tempdir()
        .expect("failed to create scratch directory")
}
