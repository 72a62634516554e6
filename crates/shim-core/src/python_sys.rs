use std::process::Command;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use pep508_rs::{MarkerEnvironment, StringVersion};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::from_slice;
use shim_domain::{Result, ShimError, SysconfigProbe};
use tracing::debug;
use which::which;

use crate::config::Config;

const MARKER_SCRIPT: &str = r#"import json, os, platform, sys
impl_name = getattr(sys.implementation, "name", "cpython")
python_full = platform.python_version()
python_short = f"{sys.version_info[0]}.{sys.version_info[1]}"
data = {
    "implementation_name": impl_name,
    "implementation_version": python_full,
    "os_name": os.name,
    "platform_machine": platform.machine(),
    "platform_python_implementation": platform.python_implementation(),
    "platform_release": platform.release(),
    "platform_system": platform.system(),
    "platform_version": platform.version(),
    "python_full_version": python_full,
    "python_version": python_short,
    "sys_platform": sys.platform,
}
print(json.dumps(data))
"#;

/// Everything the shim needs to learn from the target interpreter.
pub trait InterpreterProbe: SysconfigProbe {
    fn marker_environment(&self) -> anyhow::Result<MarkerEnvironment>;
}

/// Probes a real interpreter by running small scripts through it.
#[derive(Debug, Clone)]
pub struct PythonProbe {
    python: String,
}

impl PythonProbe {
    #[must_use]
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    #[must_use]
    pub fn python(&self) -> &str {
        &self.python
    }
}

impl InterpreterProbe for PythonProbe {
    fn marker_environment(&self) -> anyhow::Result<MarkerEnvironment> {
        let payload: MarkerEnvPayload =
            probe_python(&self.python, &[], MARKER_SCRIPT, &[], "marker environment")?;
        payload.into_marker_environment()
    }
}

/// Picks the interpreter to drive builds with: the configured one, else the
/// first `python3`/`python` on `PATH`.
///
/// # Errors
///
/// Returns [`ShimError::Usage`] when nothing is configured and no
/// interpreter is on `PATH`.
pub fn detect_interpreter(config: &Config) -> Result<String> {
    if let Some(explicit) = config.python() {
        return Ok(explicit.to_string());
    }

    for candidate in ["python3", "python"] {
        if let Ok(path) = which(candidate) {
            return path
                .into_os_string()
                .into_string()
                .map_err(|_| ShimError::usage("interpreter path is not valid UTF-8"));
        }
    }

    Err(ShimError::usage(
        "no python interpreter found; pass --python or set SHIM_PYTHON",
    ))
}

pub(crate) fn probe_python<T>(
    python: &str,
    flags: &[&str],
    script: &str,
    script_args: &[String],
    guide: &str,
) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    debug!(%python, guide, "probing interpreter");
    let cmd = Command::new(python)
        .args(flags)
        .arg("-c")
        .arg(script)
        .args(script_args)
        .output()
        .with_context(|| format!("failed to probe {guide} via {python}"))?;
    if !cmd.status.success() {
        let stderr = String::from_utf8_lossy(&cmd.stderr);
        bail!("python {guide} probe failed: {stderr}");
    }
    from_slice(&cmd.stdout).context(format!("invalid {guide} payload"))
}

#[derive(Debug, Deserialize)]
struct MarkerEnvPayload {
    implementation_name: String,
    implementation_version: String,
    os_name: String,
    platform_machine: String,
    platform_python_implementation: String,
    platform_release: String,
    platform_system: String,
    platform_version: String,
    python_full_version: String,
    python_version: String,
    sys_platform: String,
}

impl MarkerEnvPayload {
    fn into_marker_environment(self) -> anyhow::Result<MarkerEnvironment> {
        Ok(MarkerEnvironment {
            implementation_name: self.implementation_name,
            implementation_version: string_version(
                &self.implementation_version,
                "implementation_version",
            )?,
            os_name: self.os_name,
            platform_machine: self.platform_machine,
            platform_python_implementation: self.platform_python_implementation,
            platform_release: self.platform_release,
            platform_system: self.platform_system,
            platform_version: self.platform_version,
            python_full_version: string_version(&self.python_full_version, "python_full_version")?,
            python_version: string_version(&self.python_version, "python_version")?,
            sys_platform: self.sys_platform,
        })
    }
}

fn string_version(value: &str, field: &str) -> anyhow::Result<StringVersion> {
    StringVersion::from_str(value)
        .map_err(|err| anyhow!("`{value}` is not a valid PEP 440 version for `{field}`: {err}"))
}
