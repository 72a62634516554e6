use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ShimError};

pub const DEFAULT_DESCRIPTOR_FILE: &str = "pypa.json";

/// Substring in `build_command` tokens replaced with the interpreter path.
pub const PYTHON_PLACEHOLDER: &str = "{PYTHON}";

/// The declarative build descriptor of one source tree.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BuildDescriptor {
    build_command: Vec<String>,
    #[serde(default)]
    bootstrap_requires: Vec<String>,
}

impl BuildDescriptor {
    /// Reads `<root>/<file_name>`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Configuration`] when the file is missing, is not
    /// valid JSON, or declares an empty `build_command`.
    pub fn load(root: &Path, file_name: &str) -> Result<Self> {
        let path = root.join(file_name);
        let contents = fs::read_to_string(&path).map_err(|err| ShimError::Configuration {
            message: if err.kind() == io::ErrorKind::NotFound {
                "file not found; the source tree must declare its build system".to_string()
            } else {
                err.to_string()
            },
            path: path.clone(),
        })?;
        let descriptor: Self =
            serde_json::from_str(&contents).map_err(|err| ShimError::Configuration {
                path: path.clone(),
                message: err.to_string(),
            })?;
        if descriptor.build_command.is_empty() {
            return Err(ShimError::Configuration {
                path,
                message: "`build_command` must name at least one token".to_string(),
            });
        }
        Ok(descriptor)
    }

    #[must_use]
    pub fn bootstrap_requires(&self) -> &[String] {
        &self.bootstrap_requires
    }

    /// The build command with the interpreter placeholder substituted.
    #[must_use]
    pub fn command_prefix(&self, python: &str) -> Vec<String> {
        self.build_command
            .iter()
            .map(|token| token.replace(PYTHON_PLACEHOLDER, python))
            .collect()
    }
}
