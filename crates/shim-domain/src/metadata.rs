//! Translation of core metadata text into the shape a legacy egg-info needs.
//!
//! The build tool reports metadata in the `Key: value` format used by
//! `PKG-INFO`/`METADATA`. The legacy installer only needs the project name,
//! its version, the requirements that apply unconditionally, and for each
//! extra the requirements that the extra adds on top of those.

use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use pep508_rs::{ExtraName, MarkerEnvironment};

use crate::error::{Result, ShimError};
use crate::requirement::Dependency;

/// Raw header fields of a metadata document, in order of appearance.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    fields: Vec<(String, String)>,
}

impl Manifest {
    /// Parses the header block; the body after the first blank line is
    /// ignored. Continuation lines start with whitespace.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut fields: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = fields.last_mut() {
                    value.push('\n');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                fields.push((key.trim().to_string(), value.trim().to_string()));
            }
        }
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Project metadata re-declared to the legacy installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub install_requires: Vec<String>,
    /// Requirements each extra adds beyond `install_requires`.
    pub extras: IndexMap<String, Vec<String>>,
}

impl MetadataRecord {
    /// Parses and translates metadata text in one step.
    ///
    /// # Errors
    ///
    /// See [`MetadataRecord::from_manifest`].
    pub fn from_text(text: &str, env: &MarkerEnvironment) -> Result<Self> {
        Self::from_manifest(&Manifest::parse(text), env)
    }

    /// Evaluates every `Requires-Dist` against `env`, once with no extras
    /// and once per `Provides-Extra`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Format`] when `Name` or `Version` is missing or a
    /// requirement or extra name cannot be parsed.
    pub fn from_manifest(manifest: &Manifest, env: &MarkerEnvironment) -> Result<Self> {
        let name = required_field(manifest, "Name")?;
        let version = required_field(manifest, "Version")?;
        let summary = manifest
            .get("Summary")
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);

        let requires = manifest
            .get_all("Requires-Dist")
            .map(Dependency::parse)
            .collect::<Result<Vec<_>>>()?;

        let unconditional: IndexSet<String> = requires
            .iter()
            .filter(|dep| dep.applies(env))
            .map(Dependency::render)
            .collect();

        let mut extras = IndexMap::new();
        for raw in manifest.get_all("Provides-Extra") {
            let extra = ExtraName::from_str(raw)
                .map_err(|err| ShimError::format(format!("invalid extra `{raw}`: {err}")))?;
            let additional: IndexSet<String> = requires
                .iter()
                .filter(|dep| dep.applies_with_extra(env, &extra))
                .map(Dependency::render)
                .filter(|rendered| !unconditional.contains(rendered))
                .collect();
            extras.insert(raw.to_string(), additional.into_iter().collect());
        }

        Ok(Self {
            name,
            version,
            summary,
            install_requires: unconditional.into_iter().collect(),
            extras,
        })
    }
}

fn required_field(manifest: &Manifest, key: &str) -> Result<String> {
    manifest
        .get(key)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ShimError::format(format!("build tool metadata is missing `{key}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::tests::marker_env;

    #[test]
    fn extras_only_list_additional_requirements() -> anyhow::Result<()> {
        let text = "Metadata-Version: 2.1\n\
                    Name: demo\n\
                    Version: 2.0\n\
                    Requires-Dist: a\n\
                    Provides-Extra: x\n\
                    Requires-Dist: a ; extra == 'x'\n\
                    Requires-Dist: b ; extra == 'x'\n";
        let record = MetadataRecord::from_text(text, &marker_env())?;
        assert_eq!(record.install_requires, vec!["a".to_string()]);
        assert_eq!(record.extras.get("x"), Some(&vec!["b".to_string()]));
        Ok(())
    }

    #[test]
    fn translates_single_extra_manifest() -> anyhow::Result<()> {
        let text = "Metadata-Version: 2.1\n\
                    Name: test\n\
                    Version: 1.0.0\n\
                    Summary: A test project\n\
                    Requires-Dist: testdep\n\
                    Provides-Extra: extra\n\
                    Requires-Dist: nothing ; extra == \"extra\"\n\
                    \n\
                    Long description body: ignored\n";
        let record = MetadataRecord::from_text(text, &marker_env())?;
        assert_eq!(record.name, "test");
        assert_eq!(record.version, "1.0.0");
        assert_eq!(record.summary.as_deref(), Some("A test project"));
        assert_eq!(record.install_requires, vec!["testdep".to_string()]);
        assert_eq!(record.extras.len(), 1);
        assert_eq!(record.extras["extra"], vec!["nothing".to_string()]);
        Ok(())
    }

    #[test]
    fn environment_markers_filter_unconditional_requirements() -> anyhow::Result<()> {
        let text = "Name: demo\n\
                    Version: 1\n\
                    Requires-Dist: posix-only ; os_name == 'posix'\n\
                    Requires-Dist: windows-only ; os_name == 'nt'\n\
                    Requires-Dist: pinned==1.2\n";
        let record = MetadataRecord::from_text(text, &marker_env())?;
        assert_eq!(
            record.install_requires,
            vec!["posix-only".to_string(), "pinned==1.2".to_string()]
        );
        assert!(record.extras.is_empty());
        Ok(())
    }

    #[test]
    fn extra_without_requirements_is_still_declared() -> anyhow::Result<()> {
        let text = "Name: demo\nVersion: 1\nProvides-Extra: docs\n";
        let record = MetadataRecord::from_text(text, &marker_env())?;
        assert_eq!(record.extras.get("docs"), Some(&Vec::new()));
        Ok(())
    }

    #[test]
    fn missing_version_is_a_format_error() {
        let err = MetadataRecord::from_text("Name: demo\n", &marker_env())
            .expect_err("version missing");
        assert!(matches!(err, ShimError::Format(_)), "{err:?}");
    }

    #[test]
    fn continuation_lines_extend_previous_field() {
        let manifest = Manifest::parse("Name: demo\nDescription: first\n  second\nVersion: 1\n");
        assert_eq!(manifest.get("description"), Some("first\nsecond"));
        assert_eq!(manifest.get("Version"), Some("1"));
    }
}
