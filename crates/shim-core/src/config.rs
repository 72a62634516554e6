use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use shim_domain::DEFAULT_DESCRIPTOR_FILE;

pub const DEFAULT_INSTALLER: &str = "pip";

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

const SNAPSHOT_KEYS: [&str; 5] = [
    "SHIM_DESCRIPTOR",
    "SHIM_INSTALLER",
    "SHIM_PYTHON",
    "SHIM_SCRATCH_DIR",
    "PYTHONPATH",
];

impl EnvSnapshot {
    /// Reads the keys the shim consults; non-UTF-8 values count as unset.
    pub(crate) fn capture() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let vars = SNAPSHOT_KEYS
            .iter()
            .filter_map(|&key| {
                let value = lookup(key)?.into_string().ok()?;
                Some((key.to_string(), value))
            })
            .collect();
        Self { vars }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.var(key).filter(|value| !value.trim().is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Settings for one shim invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) descriptor_file: String,
    pub(crate) installer: String,
    pub(crate) python: Option<String>,
    pub(crate) scratch_dir: PathBuf,
    pub(crate) ambient_pythonpath: Option<String>,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            descriptor_file: snapshot
                .non_empty("SHIM_DESCRIPTOR")
                .unwrap_or(DEFAULT_DESCRIPTOR_FILE)
                .to_string(),
            installer: snapshot
                .non_empty("SHIM_INSTALLER")
                .unwrap_or(DEFAULT_INSTALLER)
                .to_string(),
            python: snapshot.non_empty("SHIM_PYTHON").map(ToOwned::to_owned),
            scratch_dir: snapshot
                .non_empty("SHIM_SCRATCH_DIR")
                .map_or_else(env::temp_dir, PathBuf::from),
            ambient_pythonpath: snapshot.var("PYTHONPATH").map(ToOwned::to_owned),
        }
    }

    /// Overrides the interpreter picked from the environment.
    #[must_use]
    pub fn with_python(mut self, python: Option<String>) -> Self {
        if python.is_some() {
            self.python = python;
        }
        self
    }

    #[must_use]
    pub fn with_scratch_dir(mut self, scratch_dir: PathBuf) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }

    #[must_use]
    pub fn with_ambient_pythonpath(mut self, pythonpath: Option<String>) -> Self {
        self.ambient_pythonpath = pythonpath;
        self
    }

    #[must_use]
    pub fn descriptor_file(&self) -> &str {
        &self.descriptor_file
    }

    #[must_use]
    pub fn installer(&self) -> &str {
        &self.installer
    }

    #[must_use]
    pub fn python(&self) -> Option<&str> {
        self.python.as_deref()
    }

    #[must_use]
    pub fn scratch_dir(&self) -> &PathBuf {
        &self.scratch_dir
    }

    #[must_use]
    pub fn ambient_pythonpath(&self) -> Option<&str> {
        self.ambient_pythonpath.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_snapshot(&EnvSnapshot {
            vars: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[]));
        assert_eq!(config.descriptor_file(), "pypa.json");
        assert_eq!(config.installer(), "pip");
        assert!(config.python().is_none());
        assert!(config.ambient_pythonpath().is_none());
    }

    #[test]
    fn reads_overrides_from_environment() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[
            ("SHIM_DESCRIPTOR", "build.json"),
            ("SHIM_INSTALLER", "pip3"),
            ("SHIM_PYTHON", "/opt/py/bin/python"),
            ("SHIM_SCRATCH_DIR", "/scratch"),
            ("PYTHONPATH", "/ambient"),
        ]));
        assert_eq!(config.descriptor_file(), "build.json");
        assert_eq!(config.installer(), "pip3");
        assert_eq!(config.python(), Some("/opt/py/bin/python"));
        assert_eq!(config.scratch_dir(), &PathBuf::from("/scratch"));
        assert_eq!(config.ambient_pythonpath(), Some("/ambient"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[("SHIM_INSTALLER", " ")]));
        assert_eq!(config.installer(), "pip");
    }

    #[test]
    fn explicit_python_wins_over_environment() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[("SHIM_PYTHON", "/env")]))
            .with_python(Some("/flag".into()));
        assert_eq!(config.python(), Some("/flag"));
        let unchanged = config.with_python(None);
        assert_eq!(unchanged.python(), Some("/flag"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_values_are_treated_as_unset() {
        use std::os::unix::ffi::OsStringExt;

        let snapshot = EnvSnapshot::from_lookup(|key| match key {
            "PYTHONPATH" => Some(OsString::from_vec(vec![b'/', 0xff])),
            "SHIM_INSTALLER" => Some(OsString::from("uv")),
            _ => None,
        });
        let config = Config::from_snapshot(&snapshot);
        assert!(config.ambient_pythonpath().is_none());
        assert_eq!(config.installer(), "uv");
    }

    #[test]
    fn capture_only_reads_shim_keys() {
        let snapshot = EnvSnapshot::from_lookup(|_| Some(OsString::from("x")));
        assert_eq!(snapshot.vars.len(), SNAPSHOT_KEYS.len());
        assert!(snapshot.var("HOME").is_none());
    }
}
