use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use shim_domain::{Result, ShimError};
use tracing::info;

/// Where a child's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdout {
    /// Collected and returned to the caller.
    Capture,
    /// Shared with our own standard output so progress shows live.
    Inherit,
}

/// A fully described external invocation.
///
/// The child starts from a copy of our environment with `envs` applied and
/// `env_remove` removed; the calling process' own environment is never
/// modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
    pub env_remove: Vec<String>,
    pub stdout: Stdout,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            envs: Vec::new(),
            env_remove: Vec::new(),
            stdout: Stdout::Capture,
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    #[must_use]
    pub fn stdout(mut self, stdout: Stdout) -> Self {
        self.stdout = stdout;
        self
    }

    /// The command line as shown in logs and errors.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value the child will see for `key`, when set explicitly here.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

pub trait CommandRunner {
    /// Runs `spec` to completion and returns its captured standard output
    /// (empty when output is inherited).
    ///
    /// # Errors
    ///
    /// [`ShimError::Launch`] when the program cannot be started and
    /// [`ShimError::NonZeroExit`] when it exits unsuccessfully.
    fn run(&self, spec: &CommandSpec) -> Result<Vec<u8>>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<Vec<u8>> {
        let rendered = spec.display();
        info!("Running {rendered}");
        let mut command = configured_command(spec);
        // stdin is a pipe that is closed right after spawn.
        command.stdin(Stdio::piped());
        command.stdout(match spec.stdout {
            Stdout::Capture => Stdio::piped(),
            Stdout::Inherit => Stdio::inherit(),
        });
        command.stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|source| ShimError::Launch {
            command: rendered.clone(),
            source,
        })?;
        drop(child.stdin.take());
        let output = child
            .wait_with_output()
            .map_err(|source| ShimError::Launch {
                command: rendered.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ShimError::NonZeroExit {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                output: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }
        Ok(output.stdout)
    }
}

fn configured_command(spec: &CommandSpec) -> Command {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args);
    for key in &spec.env_remove {
        command.env_remove(key);
    }
    for (key, value) in &spec.envs {
        command.env(key, value);
    }
    command.current_dir(&spec.cwd);
    command
}
