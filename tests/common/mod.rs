//! Helpers shared by the integration tests

use std::path::PathBuf;

/// Path of a screenplay under `tests/data`
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}
