use std::io;
use std::path::PathBuf;

/// Every way a shim invocation can fail.
///
/// Nothing in the shim recovers from one of these locally: the outer
/// installer that launched us owns retries and reporting, so each variant is
/// fatal to the current command.
#[derive(thiserror::Error, Debug)]
pub enum ShimError {
    #[error("{0}")]
    Usage(String),
    #[error("invalid build descriptor {}: {message}", path.display())]
    Configuration { path: PathBuf, message: String },
    #[error("direct reference dependencies are not supported: {0}")]
    UnsupportedDependency(String),
    #[error("failed to start `{command}`")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with exit code {code}:\n--- output:\n{output}\n---")]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },
    #[error("{message}:\n--- output:\n{output}\n---")]
    BuildTool { message: String, output: String },
    #[error("{0}")]
    Format(String),
    #[error("{context}: {}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ShimError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Process exit status reported for this failure.
    ///
    /// Problems the user can fix in their invocation or project exit with 1;
    /// failures of external tools or of the artifacts they produced exit
    /// with 2.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Configuration { .. } | Self::UnsupportedDependency(_) => 1,
            Self::Launch { .. }
            | Self::NonZeroExit { .. }
            | Self::BuildTool { .. }
            | Self::Format(_)
            | Self::Io { .. } => 2,
        }
    }
}

pub type Result<T, E = ShimError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_fixable_errors_exit_with_one() {
        assert_eq!(ShimError::usage("unknown command").exit_code(), 1);
        assert_eq!(
            ShimError::UnsupportedDependency("foo @ https://example.invalid".into()).exit_code(),
            1
        );
        let config = ShimError::Configuration {
            path: PathBuf::from("pypa.json"),
            message: "missing".into(),
        };
        assert_eq!(config.exit_code(), 1);
    }

    #[test]
    fn tool_failures_exit_with_two() {
        let err = ShimError::NonZeroExit {
            command: "tool wheel".into(),
            code: 3,
            output: "boom".into(),
        };
        assert_eq!(err.exit_code(), 2);
        let rendered = err.to_string();
        assert!(rendered.contains("tool wheel"), "{rendered}");
        assert!(rendered.contains("boom"), "{rendered}");
        assert_eq!(ShimError::format("bad wheel").exit_code(), 2);
    }
}
