//! Scratch directories and on-disk fixtures.

use std::path::{Path, PathBuf};

/// Temporary directory removed when the returned guard drops.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("covjson-test-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Serializes a fixture document into `dir/name` and returns the path.
pub fn write_fixture(dir: &Path, name: &str, document: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    let bytes = serde_json::to_vec(document).expect("Failed to serialize fixture");
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}
