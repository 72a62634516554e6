//! Build environment preparation.
//!
//! A source tree may need packages before its build tool can even start
//! (`bootstrap_requires`) and more before it can build (`build_requires`).
//! Both sets are installed into private target directories under
//! `<root>/.eggs` and made visible to later commands through `PYTHONPATH`.

use std::fs;
use std::path::PathBuf;

use shim_domain::{
    combine_pythonpath, search_path_delta, split_pythonpath, Dependency, MarkerEnvironment,
    Result, ShimError,
};
use tracing::debug;

use crate::build_system::{AbstractBuildSystem, PythonPathOverride};
use crate::process::Stdout;

pub const EGGS_DIR: &str = ".eggs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Bootstrap,
    Build,
}

impl Stage {
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Build => "build",
        }
    }
}

/// Makes requirements importable for later build commands.
pub trait DependencyInstaller {
    /// Installs `requirements` and returns the new search-path entries.
    fn install(
        &self,
        build: &AbstractBuildSystem<'_>,
        stage: Stage,
        requirements: &[String],
    ) -> Result<Vec<PathBuf>>;
}

/// Installs into `<root>/.eggs/<stage>` with `<installer> install --target`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipTargetInstaller;

impl DependencyInstaller for PipTargetInstaller {
    fn install(
        &self,
        build: &AbstractBuildSystem<'_>,
        stage: Stage,
        requirements: &[String],
    ) -> Result<Vec<PathBuf>> {
        if requirements.is_empty() {
            return Ok(Vec::new());
        }
        let target = build.root().join(EGGS_DIR).join(stage.dir_name());
        fs::create_dir_all(&target)
            .map_err(|err| ShimError::io("failed to create dependency target", &target, err))?;
        let mut args = vec![
            "install".to_string(),
            "--target".to_string(),
            target.to_string_lossy().into_owned(),
        ];
        args.extend(requirements.iter().cloned());
        build.run_installer(args, Stdout::Inherit)?;
        Ok(vec![target])
    }
}

/// Search path as seen before bootstrapping and as it is now.
#[derive(Debug, Clone)]
struct SearchPath {
    ambient: Option<String>,
    original: Vec<PathBuf>,
    current: Vec<PathBuf>,
}

impl SearchPath {
    fn new(ambient: Option<&str>) -> Self {
        let original = ambient.map(split_pythonpath).unwrap_or_default();
        Self {
            ambient: ambient.map(ToOwned::to_owned),
            current: original.clone(),
            original,
        }
    }

    fn extend(&mut self, entries: Vec<PathBuf>) {
        for entry in entries {
            if !self.current.contains(&entry) {
                self.current.push(entry);
            }
        }
    }

    fn pythonpath(&self) -> Result<PythonPathOverride> {
        let delta = search_path_delta(&self.original, &self.current);
        Ok(match combine_pythonpath(self.ambient.as_deref(), &delta)? {
            Some(value) => PythonPathOverride::Set(value),
            None => PythonPathOverride::Clear,
        })
    }
}

pub struct AwaitingBootstrap<'r> {
    build: AbstractBuildSystem<'r>,
    search_path: SearchPath,
}

pub struct AwaitingBuildDeps<'r> {
    build: AbstractBuildSystem<'r>,
    search_path: SearchPath,
}

/// A build system whose dependencies are installed and visible.
pub struct Ready<'r> {
    build: AbstractBuildSystem<'r>,
    activated: Vec<String>,
}

impl<'r> AwaitingBootstrap<'r> {
    pub fn new(build: AbstractBuildSystem<'r>, ambient_pythonpath: Option<&str>) -> Self {
        Self {
            build,
            search_path: SearchPath::new(ambient_pythonpath),
        }
    }

    pub fn install_bootstrap(
        mut self,
        installer: &dyn DependencyInstaller,
    ) -> Result<AwaitingBuildDeps<'r>> {
        let requirements = self.build.bootstrap_requires().to_vec();
        if !requirements.is_empty() {
            debug!(?requirements, "installing bootstrap requirements");
            let added = installer.install(&self.build, Stage::Bootstrap, &requirements)?;
            self.search_path.extend(added);
        }
        self.build.force_pythonpath(self.search_path.pythonpath()?);
        Ok(AwaitingBuildDeps {
            build: self.build,
            search_path: self.search_path,
        })
    }
}

impl<'r> AwaitingBuildDeps<'r> {
    pub fn install_build_deps(
        mut self,
        installer: &dyn DependencyInstaller,
        env: &MarkerEnvironment,
    ) -> Result<Ready<'r>> {
        let dependencies = self.build.build_requires()?;
        let activated = activation_list(&dependencies, env)?;
        debug!(?activated, "installing build requirements");
        let added = installer.install(&self.build, Stage::Build, &activated)?;
        self.search_path.extend(added);
        self.build.force_pythonpath(self.search_path.pythonpath()?);
        Ok(Ready {
            build: self.build,
            activated,
        })
    }
}

impl<'r> Ready<'r> {
    pub fn activated(&self) -> &[String] {
        &self.activated
    }

    pub fn build(&self) -> &AbstractBuildSystem<'r> {
        &self.build
    }

    pub fn into_build(self) -> AbstractBuildSystem<'r> {
        self.build
    }
}

/// Requirements to install for `env`, in declaration order.
///
/// # Errors
///
/// Returns [`ShimError::UnsupportedDependency`] if any dependency is a
/// direct URL reference, whether or not its marker applies.
pub fn activation_list(
    dependencies: &[Dependency],
    env: &MarkerEnvironment,
) -> Result<Vec<String>> {
    if let Some(direct) = dependencies.iter().find(|dep| dep.url().is_some()) {
        return Err(ShimError::UnsupportedDependency(direct.to_string()));
    }
    Ok(dependencies
        .iter()
        .filter(|dep| dep.applies(env))
        .map(Dependency::render)
        .collect())
}

/// Runs the whole bootstrap sequence.
pub fn prepare_build_env<'r>(
    build: AbstractBuildSystem<'r>,
    installer: &dyn DependencyInstaller,
    env: &MarkerEnvironment,
    ambient_pythonpath: Option<&str>,
) -> Result<Ready<'r>> {
    AwaitingBootstrap::new(build, ambient_pythonpath)
        .install_bootstrap(installer)?
        .install_build_deps(installer, env)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;
    use crate::config::Config;
    use crate::process::testing::RecordingRunner;
    use crate::testing::marker_env;

    #[derive(Default)]
    struct FakeInstaller {
        installs: RefCell<Vec<(Stage, Vec<String>)>>,
    }

    impl DependencyInstaller for FakeInstaller {
        fn install(
            &self,
            _build: &AbstractBuildSystem<'_>,
            stage: Stage,
            requirements: &[String],
        ) -> Result<Vec<PathBuf>> {
            self.installs
                .borrow_mut()
                .push((stage, requirements.to_vec()));
            if requirements.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![PathBuf::from(format!("/eggs/{}", stage.dir_name()))])
        }
    }

    fn parse_all(specs: &[&str]) -> anyhow::Result<Vec<Dependency>> {
        Ok(specs
            .iter()
            .map(|spec| Dependency::parse(spec))
            .collect::<Result<Vec<_>>>()?)
    }

    fn tree(descriptor: &str) -> anyhow::Result<tempfile::TempDir> {
        let dir = tempdir()?;
        fs::write(dir.path().join("pypa.json"), descriptor)?;
        Ok(dir)
    }

    #[test]
    fn keeps_unmarked_and_true_marked_in_order() -> anyhow::Result<()> {
        let deps = parse_all(&[
            "setuptools",
            "wheel[signatures]>=0.29; python_version >= '3'",
            "pywin32; sys_platform == 'win32'",
            "cffi>=1.0",
        ])?;
        assert_eq!(
            activation_list(&deps, &marker_env())?,
            vec!["setuptools", "wheel[signatures]>=0.29", "cffi>=1.0"]
        );
        Ok(())
    }

    #[test]
    fn direct_references_are_rejected() -> anyhow::Result<()> {
        let deps = parse_all(&["foo", "bar @ https://example.com/bar-1.0.tar.gz"])?;
        let err = activation_list(&deps, &marker_env()).expect_err("url dependency");
        assert!(matches!(err, ShimError::UnsupportedDependency(_)), "{err:?}");
        Ok(())
    }

    #[test]
    fn direct_reference_stops_before_any_install() -> anyhow::Result<()> {
        let tree = tree(r#"{"build_command": ["tool"]}"#)?;
        let runner = RecordingRunner::new(|_| {
            Ok(br#"{"build_requires": ["foo @ https://example.com/foo.tar.gz"]}"#.to_vec())
        });
        let build = AbstractBuildSystem::new(tree.path(), "/py", &Config::default(), &runner)?;
        let installer = FakeInstaller::default();
        let err = prepare_build_env(build, &installer, &marker_env(), None)
            .err()
            .expect("direct reference");
        assert!(matches!(err, ShimError::UnsupportedDependency(_)), "{err:?}");
        assert_eq!(runner.displayed(), vec!["tool build_requires".to_string()]);
        assert!(installer.installs.borrow().is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn stages_extend_pythonpath_after_ambient() -> anyhow::Result<()> {
        let tree = tree(r#"{"build_command": ["tool"], "bootstrap_requires": ["flit"]}"#)?;
        let runner = RecordingRunner::new(|_| Ok(br#"{"build_requires": ["six"]}"#.to_vec()));
        let build = AbstractBuildSystem::new(tree.path(), "/py", &Config::default(), &runner)?;
        let installer = FakeInstaller::default();

        let ready = prepare_build_env(build, &installer, &marker_env(), Some("/ambient"))?;

        assert_eq!(ready.activated(), ["six".to_string()]);
        assert_eq!(
            ready.build().pythonpath(),
            &PythonPathOverride::Set("/ambient:/eggs/bootstrap:/eggs/build".into())
        );
        let calls = runner.calls.borrow();
        assert_eq!(
            calls[0].env_value("PYTHONPATH"),
            Some("/ambient:/eggs/bootstrap")
        );
        let installs = installer.installs.borrow();
        assert_eq!(installs[0], (Stage::Bootstrap, vec!["flit".to_string()]));
        assert_eq!(installs[1], (Stage::Build, vec!["six".to_string()]));
        Ok(())
    }

    #[test]
    fn nothing_to_install_clears_pythonpath() -> anyhow::Result<()> {
        let tree = tree(r#"{"build_command": ["tool"]}"#)?;
        let runner = RecordingRunner::new(|_| Ok(br#"{"build_requires": []}"#.to_vec()));
        let build = AbstractBuildSystem::new(tree.path(), "/py", &Config::default(), &runner)?;
        let ready = prepare_build_env(build, &FakeInstaller::default(), &marker_env(), None)?;
        assert_eq!(ready.build().pythonpath(), &PythonPathOverride::Clear);
        Ok(())
    }

    #[test]
    fn pip_target_installer_targets_stage_directory() -> anyhow::Result<()> {
        let tree = tree(r#"{"build_command": ["tool"]}"#)?;
        let runner = RecordingRunner::new(|_| Ok(Vec::new()));
        let build = AbstractBuildSystem::new(tree.path(), "/py", &Config::default(), &runner)?;

        assert!(PipTargetInstaller
            .install(&build, Stage::Build, &[])?
            .is_empty());
        assert!(runner.calls.borrow().is_empty());

        let added = PipTargetInstaller.install(&build, Stage::Build, &["six".to_string()])?;
        let target = tree.path().join(".eggs").join("build");
        assert_eq!(added, vec![target.clone()]);
        assert!(Path::new(&target).is_dir());
        assert_eq!(
            runner.displayed(),
            vec![format!("/py -m pip install --target {} six", target.display())]
        );
        Ok(())
    }
}
