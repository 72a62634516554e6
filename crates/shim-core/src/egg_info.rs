//! Legacy `egg_info` output.
//!
//! Installers that predate build descriptors run `setup.py egg_info` and read
//! the resulting directory to learn a project's name, version and
//! dependencies. The layout written here is the subset they consume.

use std::fs;
use std::path::{Path, PathBuf};

use shim_domain::{MarkerEnvironment, MetadataRecord, Result, ShimError};
use tracing::{debug, info};

use crate::build_system::AbstractBuildSystem;
use crate::legacy_args::option_value;

const PKG_INFO: &str = "PKG-INFO";
const REQUIRES: &str = "requires.txt";
const DEPENDENCY_LINKS: &str = "dependency_links.txt";
const TOP_LEVEL: &str = "top_level.txt";
const SOURCES: &str = "SOURCES.txt";
const UNKNOWN: &str = "UNKNOWN";

/// Writes `<egg-base>/<safe_name>.egg-info` from the build tool's metadata.
pub fn egg_info(
    build: &AbstractBuildSystem<'_>,
    env: &MarkerEnvironment,
    args: &[String],
) -> Result<PathBuf> {
    let record = build.metadata(env)?;
    let egg_base = match option_value(args, &["--egg-base", "-e"]) {
        Some(base) => build.root().join(base),
        None => build.root().to_path_buf(),
    };
    write_egg_info(&egg_base, &record)
}

pub(crate) fn write_egg_info(egg_base: &Path, record: &MetadataRecord) -> Result<PathBuf> {
    let dir_name = format!("{}.egg-info", safe_name(&record.name));
    let dir = egg_base.join(&dir_name);
    info!("writing {}", dir.display());
    fs::create_dir_all(&dir)
        .map_err(|err| ShimError::io("failed to create egg-info directory", &dir, err))?;

    let mut written = vec![PKG_INFO, DEPENDENCY_LINKS];
    write_file(&dir.join(PKG_INFO), &render_pkg_info(record))?;
    let requires = render_requires(record);
    let requires_path = dir.join(REQUIRES);
    if requires.is_empty() {
        if requires_path.exists() {
            debug!("removing stale {}", requires_path.display());
            fs::remove_file(&requires_path)
                .map_err(|err| ShimError::io("failed to remove", &requires_path, err))?;
        }
    } else {
        write_file(&requires_path, &requires)?;
        written.push(REQUIRES);
    }
    write_file(&dir.join(DEPENDENCY_LINKS), "\n")?;
    write_file(&dir.join(TOP_LEVEL), "\n")?;
    written.push(TOP_LEVEL);
    written.push(SOURCES);
    written.sort_unstable();

    let sources = written
        .iter()
        .map(|file| format!("{dir_name}/{file}\n"))
        .collect::<String>();
    write_file(&dir.join(SOURCES), &sources)?;
    Ok(dir)
}

/// Collapses runs of characters other than ASCII alphanumerics and `.` into
/// a single `_`.
pub(crate) fn safe_name(name: &str) -> String {
    let mut safe = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' {
            safe.push(ch);
            in_run = false;
        } else if !in_run {
            safe.push('_');
            in_run = true;
        }
    }
    safe
}

fn render_pkg_info(record: &MetadataRecord) -> String {
    let summary = record.summary.as_deref().unwrap_or(UNKNOWN);
    let mut lines = vec![
        "Metadata-Version: 1.0".to_string(),
        format!("Name: {}", record.name),
        format!("Version: {}", record.version),
        format!("Summary: {summary}"),
    ];
    lines.extend(
        [
            "Home-page",
            "Author",
            "Author-email",
            "License",
            "Description",
            "Platform",
        ]
        .iter()
        .map(|field| format!("{field}: {UNKNOWN}")),
    );
    lines.iter().map(|line| format!("{line}\n")).collect()
}

fn render_requires(record: &MetadataRecord) -> String {
    let mut lines = record.install_requires.clone();
    let mut extras = record.extras.iter().collect::<Vec<_>>();
    extras.sort_by(|left, right| left.0.cmp(right.0));
    for (extra, requirements) in extras {
        lines.push(String::new());
        lines.push(format!("[{extra}]"));
        lines.extend(requirements.iter().cloned());
    }
    lines.iter().map(|line| format!("{line}\n")).collect()
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|err| ShimError::io("failed to write", path, err))
}
