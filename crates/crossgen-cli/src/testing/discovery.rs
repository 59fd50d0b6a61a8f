//! Test directory discovery.

use std::collections::BTreeSet;

use crossgen_vfs::{path, FileSystem};

use super::{TestError, TestResult};

/// Returns the test directories selected by `patterns`.
///
/// `fs` is rooted at the tests folder. Each pattern is given relative to the
/// project, so `tests_folder` is stripped from its front first; a pattern
/// that names the tests folder itself selects every top-level directory.
/// Only directories whose own name starts with `name_prefix` are kept.
/// The result is sorted and free of duplicates.
pub fn discover_test_directories(
    fs: &dyn FileSystem,
    patterns: &[String],
    tests_folder: &str,
    name_prefix: &str,
) -> TestResult<Vec<String>> {
    let mut dirs = BTreeSet::new();
    for pattern in patterns {
        let relative = pattern
            .strip_prefix(tests_folder)
            .unwrap_or(pattern)
            .trim_start_matches('/');
        let relative = if relative.is_empty() { "*" } else { relative };

        let matches = fs.glob(relative).map_err(|source| TestError::Discovery {
            pattern: pattern.clone(),
            source,
        })?;
        for candidate in matches {
            if path::file_name(&candidate).starts_with(name_prefix) && fs.is_dir(&candidate) {
                dirs.insert(candidate);
            }
        }
    }
    tracing::debug!(directories = dirs.len(), "discovered test directories");
    Ok(dirs.into_iter().collect())
}
