#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod bootstrap;
pub mod build_system;
pub mod config;
pub mod dispatch;
pub mod egg_info;
pub mod install;
mod legacy_args;
pub mod process;
pub mod python_sys;
mod scheme;
pub mod wheel;

pub use bootstrap::{
    activation_list, prepare_build_env, DependencyInstaller, PipTargetInstaller, Ready, Stage,
};
pub use build_system::{AbstractBuildSystem, PythonPathOverride};
pub use config::Config;
pub use dispatch::{main, run, Effects, Invocation, LegacyCommand};
pub use process::{CommandRunner, CommandSpec, Stdout, SystemRunner};
pub use python_sys::{detect_interpreter, InterpreterProbe, PythonProbe};

/// The `setup.py` stub that forwards legacy invocations to this shim.
pub const SETUP_PY_STUB: &str = r#"# Generated by setup-shim: forwards legacy setup.py commands to the build
# tool declared in pypa.json.
import os
import subprocess
import sys

if __name__ == "__main__":
    root = os.path.dirname(os.path.abspath(__file__))
    command = [
        os.environ.get("SETUP_SHIM", "setup-shim"),
        "--python",
        sys.executable,
        "--source",
        root,
    ]
    sys.exit(subprocess.call(command + sys.argv[1:]))
"#;
