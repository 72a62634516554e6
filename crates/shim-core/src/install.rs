//! `setup.py install` on top of a wheel build.
//!
//! There is no install operation in the build tool vocabulary, so the tree
//! is built as a wheel, the wheel is installed by a nested installer run, and
//! the result is dressed up as a legacy egg-info install: `RECORD` becomes
//! the `--record` file and the `.dist-info` directory becomes `.egg-info`.

use std::fs;
use std::path::{Path, PathBuf};

use shim_domain::{
    render_install_record, resolve_scheme, translate_record, InstallScheme, Result, SchemeOptions,
    ShimError, SysconfigProbe, WheelName, DIST_INFO_SUFFIX, EGG_INFO_SUFFIX, RECORD_FILE,
};
use tracing::{debug, info};

use crate::build_system::AbstractBuildSystem;
use crate::config::Config;
use crate::legacy_args::option_value;
use crate::process::Stdout;

/// Installs the source tree and writes the legacy install record.
///
/// # Errors
///
/// Returns [`ShimError::Usage`] without `--record`; any build, install or
/// filesystem failure is propagated. Nothing is rolled back once the nested
/// install has run.
pub fn install<P>(
    build: &AbstractBuildSystem<'_>,
    probe: &P,
    config: &Config,
    args: &[String],
) -> Result<PathBuf>
where
    P: SysconfigProbe + ?Sized,
{
    let record_target = option_value(args, &["--record"]).ok_or_else(|| {
        ShimError::usage(
            "--record not supplied. If installing by hand, use `pip install DIRECTORY`",
        )
    })?;
    let record_target = build.root().join(record_target);
    let options = scheme_options(args);

    let scratch = scratch_dir(config)?;
    let wheel = build.wheel(scratch.path())?;
    let wheel_name = WheelName::from_path(&wheel)?;

    let scheme = resolve_scheme(&wheel_name.lookup_name(), &options, probe)?;

    let mut install_args = vec![
        "-v".to_string(),
        "install".to_string(),
        "--no-deps".to_string(),
    ];
    install_args.extend(forwarded_options(&options, &scheme));
    install_args.push(wheel.to_string_lossy().into_owned());
    build.run_installer(install_args, Stdout::Inherit)?;

    let namever = wheel_name.namever();
    let info_dir = locate_dist_info(&[&scheme.purelib, &scheme.platlib], &namever)?;
    let lib_dir = info_dir
        .parent()
        .map_or_else(|| scheme.purelib.clone(), Path::to_path_buf);

    let record_path = info_dir.join(RECORD_FILE);
    let record = fs::read_to_string(&record_path)
        .map_err(|err| ShimError::io("failed to read", &record_path, err))?;
    let paths = translate_record(&record, &lib_dir, &namever);
    fs::write(&record_target, render_install_record(&paths))
        .map_err(|err| ShimError::io("failed to write install record", &record_target, err))?;
    info!(
        "wrote {} entries to {}",
        paths.len(),
        record_target.display()
    );

    fs::remove_file(&record_path)
        .map_err(|err| ShimError::io("failed to remove", &record_path, err))?;
    let egg_info = lib_dir.join(format!("{namever}{EGG_INFO_SUFFIX}"));
    if egg_info.exists() {
        debug!("replacing {}", egg_info.display());
        fs::remove_dir_all(&egg_info)
            .map_err(|err| ShimError::io("failed to remove", &egg_info, err))?;
    }
    fs::rename(&info_dir, &egg_info)
        .map_err(|err| ShimError::io("failed to rename", &info_dir, err))?;
    Ok(egg_info)
}

/// A scoped directory under the configured scratch location; removed on
/// drop and removal errors are ignored.
pub(crate) fn scratch_dir(config: &Config) -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("setup-shim-")
        .tempdir_in(config.scratch_dir())
        .map_err(|err| {
            ShimError::io(
                "failed to create temporary directory",
                config.scratch_dir(),
                err,
            )
        })
}

fn scheme_options(args: &[String]) -> SchemeOptions {
    SchemeOptions {
        user: args.iter().any(|arg| arg == "--user"),
        home: option_value(args, &["--home"]).map(PathBuf::from),
        root: option_value(args, &["--root"]).map(PathBuf::from),
        isolated: false,
        prefix: option_value(args, &["--prefix"]).map(PathBuf::from),
    }
}

/// Location options for the nested installer, chosen so that it installs
/// exactly where `scheme` will be searched afterwards.
///
/// The installer has no `--home`; a home install targets the home scheme's
/// library directory instead.
fn forwarded_options(options: &SchemeOptions, scheme: &InstallScheme) -> Vec<String> {
    if options.user {
        let mut args = vec!["--user".to_string()];
        if let Some(root) = &options.root {
            args.extend(["--root".to_string(), root.to_string_lossy().into_owned()]);
        }
        return args;
    }
    if options.home.is_some() {
        return vec![
            "--target".to_string(),
            scheme.purelib.to_string_lossy().into_owned(),
        ];
    }
    let mut args = Vec::new();
    if let Some(root) = &options.root {
        args.extend(["--root".to_string(), root.to_string_lossy().into_owned()]);
    }
    if let Some(prefix) = options
        .prefix
        .as_ref()
        .filter(|prefix| !prefix.as_os_str().is_empty())
    {
        args.extend(["--prefix".to_string(), prefix.to_string_lossy().into_owned()]);
    }
    args
}

fn locate_dist_info(lib_dirs: &[&PathBuf], namever: &str) -> Result<PathBuf> {
    let info_name = format!("{namever}{DIST_INFO_SUFFIX}");
    lib_dirs
        .iter()
        .map(|lib| lib.join(&info_name))
        .find(|dir| dir.join(RECORD_FILE).is_file())
        .ok_or_else(|| {
            ShimError::format(format!(
                "installed wheel has no {info_name}/{RECORD_FILE} in {}",
                lib_dirs
                    .iter()
                    .map(|lib| lib.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" or ")
            ))
        })
}
