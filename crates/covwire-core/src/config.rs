//! covwire configuration
//!
//! Every name the setup flow writes into a descriptor lives here, so a
//! project can override coordinates or profile ids from `covwire.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::PluginCoordinates;

/// File name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "covwire.toml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`CoverageConfig`]
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Values are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Coverage setup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Build descriptor file, relative to the project root
    pub descriptor_file: String,
    /// Directory holding test resources, relative to the project root
    pub test_resource_dir: String,
    /// Container test-runner config inside the test resource dir
    pub external_config_name: String,
    /// Profile for plain test runs
    pub profile_id: String,
    /// Profile for container test runs
    pub secondary_profile_id: String,
    /// Goal that attaches the coverage agent
    pub agent_goal: String,
    /// Property the agent arguments are published under
    pub agent_property: String,
    /// Qualifier of the container record in the external config
    pub container_qualifier: String,
    /// System property selecting the container qualifier at launch
    pub container_launch_property: String,
    /// Executable used for test and report runs
    pub build_executable: String,
    /// Coverage plugin coordinates
    pub coverage_plugin: PluginCoordinates,
    /// Test-runner plugin reconfigured for container runs
    pub companion_plugin: PluginCoordinates,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            descriptor_file: "pom.xml".to_string(),
            test_resource_dir: "src/test/resources".to_string(),
            external_config_name: "arquillian.xml".to_string(),
            profile_id: "jacoco".to_string(),
            secondary_profile_id: "jacoco-arq".to_string(),
            agent_goal: "prepare-agent".to_string(),
            agent_property: "jacoco.agent".to_string(),
            container_qualifier: "jacoco".to_string(),
            container_launch_property: "arquillian.launch".to_string(),
            build_executable: "mvn".to_string(),
            coverage_plugin: PluginCoordinates::new("jacoco-maven-plugin")
                .with_group("org.jacoco")
                .with_version("0.5.8.201207111220"),
            companion_plugin: PluginCoordinates::new("maven-surefire-plugin").with_version("2.12"),
        }
    }
}

impl CoverageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With primary profile id
    #[inline]
    #[must_use]
    pub fn with_profile_id(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = profile_id.into();
        self
    }

    /// With secondary profile id
    #[inline]
    #[must_use]
    pub fn with_secondary_profile_id(mut self, profile_id: impl Into<String>) -> Self {
        self.secondary_profile_id = profile_id.into();
        self
    }

    /// With coverage plugin coordinates
    #[inline]
    #[must_use]
    pub fn with_coverage_plugin(mut self, coordinates: PluginCoordinates) -> Self {
        self.coverage_plugin = coordinates;
        self
    }

    /// With build executable
    #[inline]
    #[must_use]
    pub fn with_build_executable(mut self, executable: impl Into<String>) -> Self {
        self.build_executable = executable.into();
        self
    }

    /// Load `covwire.toml` from `project_root`, falling back to defaults
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file exists but is unreadable or invalid
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load an explicit config file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is unreadable or invalid
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if serialization fails
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Validate configuration values for consistency
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let required = [
            ("descriptor_file", &self.descriptor_file),
            ("external_config_name", &self.external_config_name),
            ("profile_id", &self.profile_id),
            ("secondary_profile_id", &self.secondary_profile_id),
            ("coverage_plugin.artifact_id", &self.coverage_plugin.artifact_id),
            ("agent_goal", &self.agent_goal),
            ("agent_property", &self.agent_property),
            ("companion_plugin.artifact_id", &self.companion_plugin.artifact_id),
            ("container_qualifier", &self.container_qualifier),
            ("build_executable", &self.build_executable),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                errors.push(format!("{name} must not be empty"));
            }
        }

        if crate::upsert::same_identity(&self.profile_id, &self.secondary_profile_id) {
            errors.push("profile_id and secondary_profile_id must differ".to_string());
        }
        if crate::upsert::same_identity(
            &self.coverage_plugin.artifact_id,
            &self.companion_plugin.artifact_id,
        ) {
            errors.push("coverage_plugin and companion_plugin must differ".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CoverageConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.profile_id, "jacoco");
        assert_eq!(config.secondary_profile_id, "jacoco-arq");
        assert_eq!(config.coverage_plugin.group_id.as_deref(), Some("org.jacoco"));
    }

    #[test]
    fn validate_rejects_same_profile_ids() {
        let config = CoverageConfig::new().with_secondary_profile_id("JACOCO");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn validate_rejects_empty_executable() {
        let config = CoverageConfig::new().with_build_executable(" ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: CoverageConfig = toml::from_str(
            "profile_id = \"coverage\"\n\
             [coverage_plugin]\n\
             artifact_id = \"jacoco-maven-plugin\"\n\
             version = \"0.8.12\"\n",
        )
        .unwrap();
        assert_eq!(config.profile_id, "coverage");
        assert_eq!(config.coverage_plugin.version.as_deref(), Some("0.8.12"));
        assert_eq!(config.coverage_plugin.group_id, None);
        assert_eq!(config.build_executable, "mvn");
    }

    #[test]
    fn toml_roundtrip() {
        let config = CoverageConfig::new();
        let text = config.to_toml().unwrap();
        let back: CoverageConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(CoverageConfig::load(dir.path()).unwrap(), CoverageConfig::default());
    }

    #[test]
    fn load_invalid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "profile_id = [").unwrap();
        assert!(matches!(
            CoverageConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
