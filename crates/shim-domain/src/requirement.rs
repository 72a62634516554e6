use std::fmt;
use std::str::FromStr;

use pep508_rs::{ExtraName, MarkerEnvironment, Requirement as PepRequirement, VersionOrUrl};

use crate::error::{Result, ShimError};

/// A single PEP 508 dependency as reported by a build tool or a manifest.
#[derive(Debug, Clone)]
pub struct Dependency {
    requirement: PepRequirement,
}

impl Dependency {
    /// Parses one dependency specifier.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Format`] when the specifier is not valid PEP 508.
    pub fn parse(spec: &str) -> Result<Self> {
        let requirement = PepRequirement::from_str(strip_wrapping_quotes(spec.trim()))
            .map_err(|err| ShimError::format(format!("invalid requirement `{spec}`: {err}")))?;
        Ok(Self { requirement })
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.requirement.name.to_string()
    }

    #[must_use]
    pub fn extras(&self) -> Vec<String> {
        self.requirement
            .extras
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[must_use]
    pub fn specifier(&self) -> Option<String> {
        match &self.requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                let rendered = specifiers.to_string();
                (!rendered.is_empty()).then_some(rendered)
            }
            _ => None,
        }
    }

    /// The direct reference URL, if the dependency is `name @ url`.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        match &self.requirement.version_or_url {
            Some(VersionOrUrl::Url(url)) => Some(url.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_marker(&self) -> bool {
        self.requirement.marker.is_some()
    }

    /// True when there is no marker or it holds with no extras active.
    #[must_use]
    pub fn applies(&self, env: &MarkerEnvironment) -> bool {
        self.requirement.evaluate_markers(env, &[])
    }

    /// True when the marker holds with `extra` active.
    #[must_use]
    pub fn applies_with_extra(&self, env: &MarkerEnvironment, extra: &ExtraName) -> bool {
        self.requirement
            .evaluate_markers(env, std::slice::from_ref(extra))
    }

    /// Renders `name[extras]specifier` with the marker dropped.
    ///
    /// Direct references render as `name[extras] @ url`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut rendered = self.name();
        let extras = self.extras();
        if !extras.is_empty() {
            rendered.push('[');
            rendered.push_str(&extras.join(","));
            rendered.push(']');
        }
        if let Some(url) = self.url() {
            rendered.push_str(" @ ");
            rendered.push_str(&url);
        } else if let Some(specifier) = self.specifier() {
            rendered.push_str(&specifier);
        }
        rendered
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.requirement)
    }
}

pub(crate) fn strip_wrapping_quotes(input: &str) -> &str {
    if input.len() >= 2 {
        let bytes = input.as_bytes();
        let first = bytes[0];
        let last = bytes[input.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..input.len() - 1];
        }
    }
    input
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pep508_rs::StringVersion;

    pub(crate) fn marker_env() -> MarkerEnvironment {
        MarkerEnvironment {
            implementation_name: "cpython".into(),
            implementation_version: StringVersion::from_str("3.12.0").expect("impl version"),
            os_name: "posix".into(),
            platform_machine: "x86_64".into(),
            platform_python_implementation: "CPython".into(),
            platform_release: "6.0".into(),
            platform_system: "Linux".into(),
            platform_version: "6.0".into(),
            python_full_version: StringVersion::from_str("3.12.0").expect("full version"),
            python_version: StringVersion::from_str("3.12").expect("python version"),
            sys_platform: "linux".into(),
        }
    }

    #[test]
    fn renders_name_extras_and_specifier() -> anyhow::Result<()> {
        let dep = Dependency::parse("wheel[signatures]>=0.29 ; python_version >= '3'")?;
        assert_eq!(dep.render(), "wheel[signatures]>=0.29");
        assert!(dep.has_marker());
        assert!(dep.url().is_none());
        Ok(())
    }

    #[test]
    fn omits_brackets_and_specifier_when_absent() -> anyhow::Result<()> {
        let dep = Dependency::parse("setuptools")?;
        assert_eq!(dep.render(), "setuptools");
        assert!(dep.specifier().is_none());
        assert!(dep.extras().is_empty());
        Ok(())
    }

    #[test]
    fn detects_direct_references() -> anyhow::Result<()> {
        let dep = Dependency::parse("tool @ https://example.invalid/tool-1.0.tar.gz")?;
        assert_eq!(
            dep.url().as_deref(),
            Some("https://example.invalid/tool-1.0.tar.gz")
        );
        assert!(dep.specifier().is_none());
        Ok(())
    }

    #[test]
    fn evaluates_markers_against_environment() -> anyhow::Result<()> {
        let env = marker_env();
        assert!(Dependency::parse("a")?.applies(&env));
        assert!(Dependency::parse("b ; sys_platform == 'linux'")?.applies(&env));
        assert!(!Dependency::parse("c ; sys_platform == 'win32'")?.applies(&env));
        Ok(())
    }

    #[test]
    fn extra_markers_only_hold_when_extra_is_active() -> anyhow::Result<()> {
        let env = marker_env();
        let dep = Dependency::parse("pytest ; extra == 'test'")?;
        assert!(!dep.applies(&env));
        let extra = ExtraName::from_str("test")?;
        assert!(dep.applies_with_extra(&env, &extra));
        Ok(())
    }

    #[test]
    fn rejects_invalid_specifiers() {
        let err = Dependency::parse("not a requirement !!").expect_err("invalid");
        assert!(matches!(err, ShimError::Format(_)), "{err:?}");
    }
}
