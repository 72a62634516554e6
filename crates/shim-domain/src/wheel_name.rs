use std::path::Path;
use std::str::FromStr;

use pep440_rs::Version;

use crate::error::{Result, ShimError};

/// The parts of a wheel filename the install translation needs.
///
/// `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelName {
    name: String,
    version: String,
}

impl WheelName {
    /// Parses the final component of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Format`] when the filename does not follow the
    /// wheel naming grammar.
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| invalid(&path.display().to_string(), "not a file name"))?;
        Self::parse(filename)
    }

    /// # Errors
    ///
    /// Returns [`ShimError::Format`] when `filename` is not a wheel filename.
    pub fn parse(filename: &str) -> Result<Self> {
        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| invalid(filename, "must end with .whl"))?;
        let parts = stem.split('-').collect::<Vec<_>>();
        let Some(head_len) = parts.len().checked_sub(3).filter(|len| *len >= 2) else {
            return Err(invalid(
                filename,
                "expected name, version, python, abi and platform tags",
            ));
        };
        let head = &parts[..head_len];
        // The name runs up to the first digit-leading part after it.
        let version_at = head
            .iter()
            .skip(1)
            .position(|part| starts_with_digit(part))
            .map(|offset| offset + 1)
            .ok_or_else(|| invalid(filename, "missing version"))?;
        match &head[version_at + 1..] {
            [] => {}
            [build] if starts_with_digit(build) => {}
            [_] => return Err(invalid(filename, "build tag must start with a digit")),
            _ => {
                return Err(invalid(
                    filename,
                    "expected at most a build tag between version and python tag",
                ))
            }
        }
        let name = head[..version_at].join("-");
        let version = head[version_at];
        if name.split('-').any(str::is_empty) {
            return Err(invalid(filename, "missing distribution name"));
        }
        Version::from_str(version)
            .map_err(|err| invalid(filename, &format!("invalid version `{version}`: {err}")))?;
        Ok(Self {
            name,
            version: version.to_string(),
        })
    }

    /// The distribution name exactly as it appears in the filename.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{name}-{version}`, the stem of the `.dist-info` directory.
    #[must_use]
    pub fn namever(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// The name used for scheme lookups, with underscores as hyphens.
    #[must_use]
    pub fn lookup_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

fn starts_with_digit(value: &str) -> bool {
    value.chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

fn invalid(filename: &str, reason: &str) -> ShimError {
    ShimError::format(format!(
        "could not determine wheel name from `{filename}`: {reason}"
    ))
}
