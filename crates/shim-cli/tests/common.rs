#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use tempfile::TempDir;

pub const MARKER_PAYLOAD: &str = r#"{"implementation_name": "cpython", "implementation_version": "3.12.1", "os_name": "posix", "platform_machine": "x86_64", "platform_python_implementation": "CPython", "platform_release": "6.0", "platform_system": "Linux", "platform_version": "1", "python_full_version": "3.12.1", "python_version": "3.12", "sys_platform": "linux"}"#;

/// Metadata reported by the fake build tool.
pub const METADATA: &str = r#"Metadata-Version: 2.1\nName: test\nVersion: 1.0.0\nSummary: A test project\nProvides-Extra: extra\nRequires-Dist: testdep\nRequires-Dist: nothing; extra == "extra"\n"#;

/// A source tree driven by a POSIX shell build tool and a fake interpreter
/// that answers probes and logs installer invocations.
pub struct FakeProject {
    pub temp: TempDir,
}

impl FakeProject {
    pub fn new(build_requires: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix("setup-shim-test")
            .tempdir()
            .expect("tempdir");
        let project = Self { temp };
        fs::create_dir_all(project.root()).expect("source dir");
        project.write_tool(build_requires);
        project.write_python();
        let tool = project.tool();
        let descriptor = format!(
            r#"{{"build_command": ["/bin/sh", "{}"]}}"#,
            tool.display()
        );
        fs::write(project.root().join("pypa.json"), descriptor).expect("write descriptor");
        project
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("src")
    }

    pub fn tool(&self) -> PathBuf {
        self.temp.path().join("tool.sh")
    }

    pub fn python(&self) -> PathBuf {
        self.temp.path().join("python")
    }

    pub fn tool_log(&self) -> String {
        read_or_empty(&self.temp.path().join("tool.log"))
    }

    pub fn python_log(&self) -> String {
        read_or_empty(&self.temp.path().join("python.log"))
    }

    pub fn recorded(&self, name: &str) -> String {
        read_or_empty(&self.temp.path().join(name))
    }

    /// `setup-shim` pointed at this project with a scrubbed environment.
    pub fn shim(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("setup-shim");
        cmd.current_dir(self.root())
            .env_remove("PYTHONPATH")
            .env_remove("SHIM_PYTHON")
            .env_remove("SHIM_DESCRIPTOR")
            .env_remove("SHIM_INSTALLER")
            .env("SHIM_SCRATCH_DIR", self.temp.path())
            .arg("--python")
            .arg(self.python())
            .arg("--source")
            .arg(self.root());
        cmd
    }

    fn write_tool(&self, build_requires: &str) {
        let log_dir = self.temp.path().display().to_string();
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log_dir}/tool.log"
case "$1" in
  build_requires)
    printf '%s' '{{"build_requires": {build_requires}}}'
    ;;
  metadata)
    printf '%s' "$PYTHONPATH" > "{log_dir}/pythonpath.txt"
    printf '{METADATA}'
    ;;
  develop)
    printf '%s' "$PYTHON" > "{log_dir}/python_env.txt"
    ;;
  *)
    echo "unsupported command: $1" >&2
    exit 3
    ;;
esac
"#
        );
        fs::write(self.tool(), script).expect("write tool");
    }

    fn write_python(&self) {
        let log_dir = self.temp.path().display().to_string();
        let script = format!(
            r#"#!/bin/sh
if [ "$1" = "-c" ]; then
  printf '%s\n' '{MARKER_PAYLOAD}'
  exit 0
fi
echo "$@" >> "{log_dir}/python.log"
"#
        );
        let path = self.python();
        fs::write(&path, script).expect("write python");
        make_executable(&path);
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

fn read_or_empty(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}
