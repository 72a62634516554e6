//! Entry point mapping a legacy `setup.py` invocation onto the build tool.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use shim_domain::{Result, ShimError};
use tracing::{debug, info};

use crate::bootstrap::{prepare_build_env, DependencyInstaller, PipTargetInstaller};
use crate::build_system::AbstractBuildSystem;
use crate::config::Config;
use crate::egg_info::egg_info;
use crate::install::install;
use crate::legacy_args::option_value;
use crate::process::{CommandRunner, SystemRunner};
use crate::python_sys::{InterpreterProbe, PythonProbe};
use crate::wheel::bdist_wheel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCommand {
    EggInfo,
    Develop,
    Install,
    Wheel,
}

impl FromStr for LegacyCommand {
    type Err = ShimError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "egg_info" => Ok(Self::EggInfo),
            "develop" => Ok(Self::Develop),
            "install" => Ok(Self::Install),
            "wheel" | "bdist_wheel" => Ok(Self::Wheel),
            other => Err(ShimError::usage(format!(
                "unknown command `{other}`; expected egg_info, develop, install or bdist_wheel"
            ))),
        }
    }
}

impl fmt::Display for LegacyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EggInfo => "egg_info",
            Self::Develop => "develop",
            Self::Install => "install",
            Self::Wheel => "bdist_wheel",
        })
    }
}

/// One legacy invocation: `setup.py <command> <args...>` run in `root`.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub root: PathBuf,
    pub python: String,
    pub command: String,
    pub args: Vec<String>,
    pub config: Config,
}

/// The side-effecting collaborators a run goes through.
pub struct Effects<'a> {
    pub runner: &'a dyn CommandRunner,
    pub installer: &'a dyn DependencyInstaller,
    pub interpreter: &'a dyn InterpreterProbe,
}

/// Runs `invocation` against real processes.
pub fn run(invocation: &Invocation) -> Result<i32> {
    let interpreter = PythonProbe::new(invocation.python.clone());
    let effects = Effects {
        runner: &SystemRunner,
        installer: &PipTargetInstaller,
        interpreter: &interpreter,
    };
    main(invocation, &effects)
}

/// Prepares the build environment, then translates the legacy command.
///
/// # Errors
///
/// Unknown commands fail with [`ShimError::Usage`] before the descriptor is
/// read or anything is launched.
pub fn main(invocation: &Invocation, effects: &Effects<'_>) -> Result<i32> {
    let command = invocation.command.parse::<LegacyCommand>()?;
    info!(%command, root = %invocation.root.display(), "setup-shim");

    let build = AbstractBuildSystem::new(
        &invocation.root,
        &invocation.python,
        &invocation.config,
        effects.runner,
    )?;
    let env = effects
        .interpreter
        .marker_environment()
        .map_err(|err| ShimError::BuildTool {
            message: "failed to probe the interpreter marker environment".to_string(),
            output: format!("{err:#}"),
        })?;
    let ready = prepare_build_env(
        build,
        effects.installer,
        &env,
        invocation.config.ambient_pythonpath(),
    )?;
    debug!(activated = ?ready.activated(), "build environment ready");
    let build = ready.into_build();
    let args = &invocation.args;

    match command {
        LegacyCommand::EggInfo => {
            egg_info(&build, &env, args)?;
        }
        LegacyCommand::Develop => {
            build.develop(
                option_value(args, &["--prefix"]),
                option_value(args, &["--root"]),
            )?;
        }
        LegacyCommand::Install => {
            install(&build, effects.interpreter, &invocation.config, args)?;
        }
        LegacyCommand::Wheel => {
            bdist_wheel(&build, &invocation.config, args)?;
        }
    }
    Ok(0)
}
