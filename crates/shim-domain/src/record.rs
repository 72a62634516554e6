//! Conversion of a wheel `RECORD` into a legacy install record.
//!
//! ```text
//! demo/__init__.py,sha256=x_c8nmc4Huc-lKEsAXj78ZiyqSJ9hJ71j7vltY67icw,10509
//! demo-1.0.dist-info/RECORD,,
//! ```
//!
//! becomes one absolute path per line, with `.dist-info` renamed to
//! `.egg-info` and the `RECORD` entry itself dropped.

use std::path::{Component, Path, PathBuf};

use crate::requirement::strip_wrapping_quotes;

pub const DIST_INFO_SUFFIX: &str = ".dist-info";
pub const EGG_INFO_SUFFIX: &str = ".egg-info";
pub const RECORD_FILE: &str = "RECORD";

/// Translates `RECORD` contents found in `<lib_dir>/<namever>.dist-info`.
#[must_use]
pub fn translate_record(record: &str, lib_dir: &Path, namever: &str) -> Vec<PathBuf> {
    let own_record = format!("{namever}{DIST_INFO_SUFFIX}/{RECORD_FILE}");
    record
        .lines()
        .filter_map(record_path)
        .filter(|path| *path != own_record)
        .map(|path| {
            let renamed = path.replace(DIST_INFO_SUFFIX, EGG_INFO_SUFFIX);
            normalize_lexically(&lib_dir.join(renamed))
        })
        .collect()
}

/// Renders translated paths in the install-record file format.
#[must_use]
pub fn render_install_record(paths: &[PathBuf]) -> String {
    let mut rendered = String::new();
    for path in paths {
        rendered.push_str(&path.to_string_lossy());
        rendered.push('\n');
    }
    rendered
}

fn record_path(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    let path = line.rsplitn(3, ',').last().unwrap_or(line);
    Some(strip_wrapping_quotes(path))
}

/// Resolves `.` and `..` without touching the filesystem; entries such as
/// `../../../bin/tool` point outside the library directory.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
