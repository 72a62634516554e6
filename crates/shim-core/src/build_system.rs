//! Adapter over the build tool named by a source tree's descriptor.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shim_domain::{
    BuildDescriptor, Dependency, MarkerEnvironment, MetadataRecord, Result, ShimError,
};
use tracing::debug;

use crate::config::Config;
use crate::process::{CommandRunner, CommandSpec, Stdout};

/// What child processes see in `PYTHONPATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PythonPathOverride {
    /// Whatever we inherited.
    #[default]
    Inherit,
    /// Removed from the child environment.
    Clear,
    Set(String),
}

#[derive(Debug, Deserialize)]
struct BuildRequiresPayload {
    build_requires: Vec<String>,
}

pub struct AbstractBuildSystem<'r> {
    root: PathBuf,
    python: String,
    installer: String,
    descriptor: BuildDescriptor,
    command_prefix: Vec<String>,
    pythonpath: PythonPathOverride,
    runner: &'r dyn CommandRunner,
}

impl<'r> AbstractBuildSystem<'r> {
    /// Reads the descriptor under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Configuration`] when the descriptor is missing or
    /// malformed.
    pub fn new(
        root: &Path,
        python: &str,
        config: &Config,
        runner: &'r dyn CommandRunner,
    ) -> Result<Self> {
        let descriptor = BuildDescriptor::load(root, config.descriptor_file())?;
        let command_prefix = descriptor.command_prefix(python);
        debug!(prefix = ?command_prefix, "loaded build descriptor");
        Ok(Self {
            root: root.to_path_buf(),
            python: python.to_string(),
            installer: config.installer().to_string(),
            descriptor,
            command_prefix,
            pythonpath: PythonPathOverride::Inherit,
            runner,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    pub fn bootstrap_requires(&self) -> &[String] {
        self.descriptor.bootstrap_requires()
    }

    pub fn force_pythonpath(&mut self, pythonpath: PythonPathOverride) {
        debug!(?pythonpath, "forcing PYTHONPATH for build commands");
        self.pythonpath = pythonpath;
    }

    pub fn pythonpath(&self) -> &PythonPathOverride {
        &self.pythonpath
    }

    /// Asks the build tool for the requirements it needs to build.
    ///
    /// # Errors
    ///
    /// Propagates launch and exit failures; output that is not the expected
    /// JSON payload is a [`ShimError::BuildTool`].
    pub fn build_requires(&self) -> Result<Vec<Dependency>> {
        let output = self.run_build_command(&["build_requires"], Stdout::Capture)?;
        let text = String::from_utf8_lossy(&output);
        let payload: BuildRequiresPayload =
            serde_json::from_str(&text).map_err(|err| ShimError::BuildTool {
                message: format!("build_requires did not return valid JSON ({err})"),
                output: text.to_string(),
            })?;
        payload
            .build_requires
            .iter()
            .map(|raw| {
                Dependency::parse(raw).map_err(|err| ShimError::BuildTool {
                    message: err.to_string(),
                    output: text.to_string(),
                })
            })
            .collect()
    }

    pub fn develop(&self, prefix: Option<&str>, root: Option<&str>) -> Result<()> {
        let mut args = vec!["develop"];
        if let Some(prefix) = prefix {
            args.extend(["--prefix", prefix]);
        }
        if let Some(root) = root {
            args.extend(["--root", root]);
        }
        self.run_build_command(&args, Stdout::Inherit)?;
        Ok(())
    }

    /// Queries project metadata and evaluates it for `env`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::BuildTool`] for non UTF-8 output and
    /// [`ShimError::Format`] when the manifest is incomplete.
    pub fn metadata(&self, env: &MarkerEnvironment) -> Result<MetadataRecord> {
        let output = self.run_build_command(&["metadata"], Stdout::Capture)?;
        let text = String::from_utf8(output).map_err(|err| ShimError::BuildTool {
            message: "metadata output is not valid UTF-8".to_string(),
            output: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })?;
        MetadataRecord::from_text(&text, env)
    }

    /// Builds a wheel into `output_dir` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Format`] unless exactly one wheel appears.
    pub fn wheel(&self, output_dir: &Path) -> Result<PathBuf> {
        let dir = output_dir.to_string_lossy().into_owned();
        self.run_build_command(&["wheel", "-d", dir.as_str()], Stdout::Inherit)?;
        find_wheel(output_dir)
    }

    /// Runs `<python> -m <installer> <args>` without the build command prefix.
    pub fn run_installer<I, S>(&self, args: I, stdout: Stdout) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self
            .base_spec(self.python.clone())
            .args(["-m".to_string(), self.installer.clone()])
            .args(args)
            .stdout(stdout);
        self.runner.run(&spec)
    }

    fn run_build_command(&self, args: &[&str], stdout: Stdout) -> Result<Vec<u8>> {
        let (program, prefix_args) = self
            .command_prefix
            .split_first()
            .ok_or_else(|| ShimError::Configuration {
                path: self.root.clone(),
                message: "`build_command` must name at least one token".to_string(),
            })?;
        let spec = self
            .base_spec(program.clone())
            .args(prefix_args.iter().cloned())
            .args(args.iter().copied())
            .stdout(stdout);
        self.runner.run(&spec)
    }

    fn base_spec(&self, program: String) -> CommandSpec {
        let spec = CommandSpec::new(program, &self.root).env("PYTHON", self.python.clone());
        match &self.pythonpath {
            PythonPathOverride::Inherit => spec,
            PythonPathOverride::Clear => spec.env_remove("PYTHONPATH"),
            PythonPathOverride::Set(value) => spec.env("PYTHONPATH", value.clone()),
        }
    }
}

fn find_wheel(dir: &Path) -> Result<PathBuf> {
    let entries =
        fs::read_dir(dir).map_err(|err| ShimError::io("failed to list wheel output", dir, err))?;
    let mut wheels = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ShimError::io("failed to list wheel output", dir, err))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "whl") {
            wheels.push(path);
        }
    }
    match wheels.len() {
        1 => Ok(wheels.remove(0)),
        0 => Err(ShimError::format(format!(
            "build tool produced no wheel in {}",
            dir.display()
        ))),
        count => Err(ShimError::format(format!(
            "build tool produced {count} wheels in {}; expected exactly one",
            dir.display()
        ))),
    }
}
