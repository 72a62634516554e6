use std::fs;
use std::path::PathBuf;

use shim_domain::{Result, ShimError};
use tracing::info;

use crate::build_system::AbstractBuildSystem;
use crate::config::Config;
use crate::install::scratch_dir;
use crate::legacy_args::option_value;

pub const DEFAULT_DIST_DIR: &str = "dist";

/// `setup.py bdist_wheel`: builds in a scratch directory and copies the wheel
/// into `-d/--dist-dir` (default `<root>/dist`).
pub fn bdist_wheel(
    build: &AbstractBuildSystem<'_>,
    config: &Config,
    args: &[String],
) -> Result<PathBuf> {
    let dist_dir = build
        .root()
        .join(option_value(args, &["--dist-dir", "-d"]).unwrap_or(DEFAULT_DIST_DIR));
    let scratch = scratch_dir(config)?;
    let built = build.wheel(scratch.path())?;
    let file_name = built
        .file_name()
        .ok_or_else(|| ShimError::format(format!("{} is not a file", built.display())))?;

    fs::create_dir_all(&dist_dir)
        .map_err(|err| ShimError::io("failed to create dist directory", &dist_dir, err))?;
    let target = dist_dir.join(file_name);
    fs::copy(&built, &target).map_err(|err| ShimError::io("failed to copy wheel", &target, err))?;
    info!("created {}", target.display());
    Ok(target)
}
