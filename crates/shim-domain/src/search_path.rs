use std::env;
use std::path::PathBuf;

use crate::error::{Result, ShimError};

/// Entries present in `after` that were not part of `before`.
///
/// When `before` is a prefix of `after` this is exactly the appended tail;
/// otherwise every entry of `after` missing from `before`, in order.
#[must_use]
pub fn search_path_delta(before: &[PathBuf], after: &[PathBuf]) -> Vec<PathBuf> {
    if after.starts_with(before) {
        return after[before.len()..].to_vec();
    }
    after
        .iter()
        .filter(|entry| !before.contains(entry))
        .cloned()
        .collect()
}

/// Folds new search-path entries into an ambient `PYTHONPATH` value.
///
/// The ambient value stays first so anything the caller already arranged
/// keeps precedence; returns `None` when the result would be empty.
///
/// # Errors
///
/// Returns [`ShimError::Usage`] when an addition contains the platform path
/// separator or the joined value is not valid UTF-8.
pub fn combine_pythonpath(
    ambient: Option<&str>,
    additions: &[PathBuf],
) -> Result<Option<String>> {
    let mut entries: Vec<PathBuf> = ambient
        .filter(|value| !value.is_empty())
        .map(|value| env::split_paths(value).collect())
        .unwrap_or_default();
    entries.extend(additions.iter().cloned());
    if entries.is_empty() {
        return Ok(None);
    }
    let joined = env::join_paths(&entries)
        .map_err(|err| ShimError::usage(format!("cannot build PYTHONPATH: {err}")))?;
    joined.into_string().map(Some).map_err(|joined| {
        ShimError::usage(format!(
            "PYTHONPATH is not valid UTF-8: {}",
            joined.to_string_lossy()
        ))
    })
}

/// Splits a `PYTHONPATH` style value into its entries.
#[must_use]
pub fn split_pythonpath(value: &str) -> Vec<PathBuf> {
    env::split_paths(value)
        .filter(|entry| !entry.as_os_str().is_empty())
        .collect()
}
