//! Install scheme arithmetic.
//!
//! The interpreter knows its own directory layout; this module decides which
//! layout to ask for and then applies the adjustments legacy installers make
//! on top of it (per-distribution header directories, virtual environment
//! header placement, and `--root` re-rooting).

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShimError};

/// Install-location overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeOptions {
    pub user: bool,
    pub home: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub isolated: bool,
    pub prefix: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    Default,
    User,
    Home,
}

/// What to ask the interpreter for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRequest {
    pub kind: SchemeKind,
    /// Overrides for sysconfig's `base` and `platbase` variables.
    pub base: Option<PathBuf>,
    /// Run the interpreter without per-user configuration.
    #[serde(skip)]
    pub isolated: bool,
}

/// The interpreter's answer: raw sysconfig paths and its prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SysconfigPaths {
    pub purelib: PathBuf,
    pub platlib: PathBuf,
    pub include: PathBuf,
    pub scripts: PathBuf,
    pub data: PathBuf,
    pub prefix: PathBuf,
    pub base_prefix: PathBuf,
    #[serde(default)]
    pub real_prefix: Option<PathBuf>,
    /// `X.Y`
    pub python_version: String,
}

impl SysconfigPaths {
    /// Virtual environments report a prefix that differs from the base
    /// installation (or, for old-style virtualenv, a `real_prefix`).
    #[must_use]
    pub fn in_virtualenv(&self) -> bool {
        self.real_prefix.is_some() || self.prefix != self.base_prefix
    }
}

pub trait SysconfigProbe {
    fn probe(&self, request: &ProbeRequest) -> anyhow::Result<SysconfigPaths>;
}

/// Target directories for one distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallScheme {
    pub purelib: PathBuf,
    pub platlib: PathBuf,
    pub headers: PathBuf,
    pub scripts: PathBuf,
    pub data: PathBuf,
}

/// Computes the install scheme for `dist_name`.
///
/// # Errors
///
/// Returns [`ShimError::Usage`] when both `user` and `prefix` are given, and
/// [`ShimError::BuildTool`] when the interpreter cannot be probed.
pub fn resolve_scheme<P>(
    dist_name: &str,
    options: &SchemeOptions,
    probe: &P,
) -> Result<InstallScheme>
where
    P: SysconfigProbe + ?Sized,
{
    let request = probe_request(options)?;
    let paths = probe.probe(&request).map_err(|err| ShimError::BuildTool {
        message: "failed to query the interpreter install scheme".to_string(),
        output: format!("{err:#}"),
    })?;
    let root = options.root.as_deref();
    let reroot = |path: &Path| match root {
        Some(root) => change_root(root, path),
        None => path.to_path_buf(),
    };

    let mut scheme = InstallScheme {
        purelib: reroot(&paths.purelib),
        platlib: reroot(&paths.platlib),
        headers: reroot(&paths.include.join(dist_name)),
        scripts: reroot(&paths.scripts),
        data: reroot(&paths.data),
    };
    if paths.in_virtualenv() {
        let headers = paths
            .prefix
            .join("include")
            .join("site")
            .join(format!("python{}", paths.python_version))
            .join(dist_name);
        scheme.headers = reroot(&headers);
    }
    Ok(scheme)
}

fn probe_request(options: &SchemeOptions) -> Result<ProbeRequest> {
    let prefix = options
        .prefix
        .clone()
        .filter(|prefix| !prefix.as_os_str().is_empty());
    if let (true, Some(prefix)) = (options.user, &prefix) {
        return Err(ShimError::usage(format!(
            "user and prefix install locations are mutually exclusive (prefix={})",
            prefix.display()
        )));
    }
    let (kind, base) = if options.user {
        (SchemeKind::User, None)
    } else if let Some(home) = &options.home {
        (SchemeKind::Home, Some(home.clone()))
    } else {
        (SchemeKind::Default, prefix)
    };
    Ok(ProbeRequest {
        kind,
        base,
        isolated: options.isolated,
    })
}

/// Re-roots an absolute path under `root`, dropping any drive or volume.
#[must_use]
pub fn change_root(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::Prefix(_) | Component::RootDir))
        .collect();
    root.join(relative)
}
