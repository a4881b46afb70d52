//! Error types for covwire core
//!
//! One enum covers every merge operation:
//! - Malformed input documents
//! - Caller sequencing errors (plugin/profile never installed)
//! - Missing prerequisite files
//! - Persistence and process failures
//!
//! Nothing here is retried; every failure carries a single cause.

use crate::config::ConfigError;
use covwire_document::ParseError;
use std::path::PathBuf;

/// Main covwire error type
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Input markup does not parse
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] ParseError),

    /// Configuration upsert for a plugin entry that was never installed
    #[error("plugin '{artifact_id}' is not installed in profile '{profile_id}'")]
    PluginNotFound {
        /// Profile that was searched
        profile_id: String,
        /// Requested artifact id
        artifact_id: String,
    },

    /// Operation on a profile that does not exist
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// Required secondary document is absent
    #[error("cannot read {name}; make sure the container test runner is installed first")]
    MissingExternalConfig {
        /// Logical name of the missing document
        name: String,
    },

    /// Persistence layer could not read or write
    #[error("io failure on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package name that cannot be turned into an include pattern
    #[error("invalid package name: '{0}'")]
    InvalidPackage(String),

    /// Build command could not be started
    #[error("could not start `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Build command ran but failed
    #[error("`{command}` exited with code {code}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit code reported by the process
        code: i32,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MergeError {
    /// Create plugin-not-found error
    pub fn plugin_not_found(profile_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self::PluginNotFound {
            profile_id: profile_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error comes from a wrong call sequence rather than the environment
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::PluginNotFound { .. } | Self::ProfileNotFound(_) | Self::InvalidPackage(_)
        )
    }

    /// Check if error asks the user to install something first
    #[inline]
    #[must_use]
    pub fn is_missing_prerequisite(&self) -> bool {
        matches!(self, Self::MissingExternalConfig { .. })
    }

    /// Check if the message is meant for the end user as-is
    ///
    /// Everything else points at a broken document or a programming error.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        self.is_missing_prerequisite()
            || matches!(
                self,
                Self::InvalidPackage(_)
                    | Self::ProfileNotFound(_)
                    | Self::CommandFailed { .. }
                    | Self::Spawn { .. }
                    | Self::Config(_)
            )
    }
}

/// Result type alias for merge operations
pub type MergeResult<T> = Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_not_found_display() {
        let err = MergeError::plugin_not_found("jacoco", "jacoco-maven-plugin");
        assert_eq!(
            err.to_string(),
            "plugin 'jacoco-maven-plugin' is not installed in profile 'jacoco'"
        );
        assert!(err.is_caller_error());
    }

    #[test]
    fn missing_external_config_display() {
        let err = MergeError::MissingExternalConfig {
            name: "arquillian.xml".to_string(),
        };
        assert!(err.to_string().contains("arquillian.xml"));
        assert!(err.is_missing_prerequisite());
        assert!(!err.is_caller_error());
    }

    #[test]
    fn parse_error_conversion() {
        let err: MergeError = ParseError::NoRootElement.into();
        assert!(matches!(err, MergeError::MalformedDocument(_)));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn command_failed_is_user_facing() {
        let err = MergeError::CommandFailed {
            command: "mvn clean test -Pjacoco".to_string(),
            code: 1,
        };
        assert_eq!(err.to_string(), "`mvn clean test -Pjacoco` exited with code 1");
        assert!(err.is_user_facing());
    }
}
