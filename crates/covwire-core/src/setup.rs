//! Coverage setup orchestrator
//!
//! Drives the merger and the external adjuster through the setup flow:
//! - Install the coverage profile
//! - Scope instrumentation to a package
//! - Install the secondary (container) profile and its companion runner
//! - Adjust the container test-runner document
//! - Hand test and report command lines to a [`ProcessRunner`]
//!
//! Each step loads the descriptor, applies one upsert, and saves it back.

use std::fmt;

use covwire_document::Element;

use crate::config::CoverageConfig;
use crate::descriptor::ProjectDescriptor;
use crate::error::{MergeError, MergeResult};
use crate::external::{
    ensure_container_in_store, ContainerChange, ContainerSpec, ExternalContainerConfig,
};
use crate::model::{BuildSpec, ConfigurationTree, Execution, PluginEntry};
use crate::store::{DocumentStore, ExternalConfigStore};
use crate::upsert::Upsert;

const ARQUILLIAN_NS: &str = "http://jboss.org/schema/arquillian";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const ARQUILLIAN_SCHEMA: &str =
    "http://jboss.org/schema/arquillian http://jboss.org/schema/arquillian/arquillian_1_0.xsd";

/// Where a project stands in the setup flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetupState {
    /// No coverage profile
    Unconfigured,
    /// Coverage profile present, instrumenting everything
    ProfileInstalled,
    /// Coverage profile limited to a package
    PackageScoped,
    /// Container profile present
    SecondaryProfileInstalled,
    /// Container profile present and the container record written
    ExternalContainerAdjusted,
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::ProfileInstalled => "profile installed",
            Self::PackageScoped => "package scoped",
            Self::SecondaryProfileInstalled => "secondary profile installed",
            Self::ExternalContainerAdjusted => "external container adjusted",
        };
        f.write_str(name)
    }
}

/// Program plus arguments, never passed through a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Executable
    pub program: String,
    /// Arguments in order
    pub args: Vec<String>,
}

impl CommandLine {
    /// Command without arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// With an additional argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// With a `-P<profile>` argument
    #[must_use]
    pub fn profile(self, profile_id: &str) -> Self {
        self.arg(format!("-P{profile_id}"))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs build commands
pub trait ProcessRunner {
    /// Run to completion and return the exit code
    ///
    /// # Errors
    /// Returns `MergeError::Spawn` if the process cannot be started
    fn run(&mut self, command: &CommandLine) -> MergeResult<i32>;
}

/// Turn `com.example.app` into `com/example/app/**`
///
/// # Errors
/// Returns `MergeError::InvalidPackage` unless every dot-separated segment is an identifier
pub fn include_pattern(package: &str) -> MergeResult<String> {
    let package = package.trim();
    let valid = !package.is_empty() && package.split('.').all(is_identifier);
    if !valid {
        return Err(MergeError::InvalidPackage(package.to_string()));
    }
    Ok(format!("{}/**", package.replace('.', "/")))
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Setup flow over a descriptor store and an external config store
#[derive(Debug)]
pub struct CoverageSetup<D, E> {
    config: CoverageConfig,
    descriptors: D,
    external: E,
}

impl<D, E> CoverageSetup<D, E>
where
    D: DocumentStore,
    E: ExternalConfigStore,
{
    /// Create setup over the given stores
    #[must_use]
    pub fn new(config: CoverageConfig, descriptors: D, external: E) -> Self {
        Self {
            config,
            descriptors,
            external,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// Descriptor store
    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &D {
        &self.descriptors
    }

    /// External config store
    #[inline]
    #[must_use]
    pub fn external(&self) -> &E {
        &self.external
    }

    /// Give back both stores
    #[must_use]
    pub fn into_stores(self) -> (D, E) {
        (self.descriptors, self.external)
    }

    /// Install the canonical coverage profile under `profile_id`
    ///
    /// # Errors
    /// Returns load/save errors from the descriptor store
    pub fn install_profile(&mut self, profile_id: &str) -> MergeResult<Upsert> {
        let mut descriptor = self.descriptors.load()?;
        let outcome = descriptor.upsert_profile(profile_id, &self.coverage_build());
        self.descriptors.save(&descriptor)?;
        tracing::info!(profile_id, ?outcome, "coverage profile installed");
        Ok(outcome)
    }

    /// Install the primary profile, then scope it when a package is given
    ///
    /// # Errors
    /// Returns store errors and `MergeError::InvalidPackage`
    pub fn install(&mut self, package: Option<&str>) -> MergeResult<SetupState> {
        if let Some(package) = package {
            // validate before anything is written
            include_pattern(package)?;
        }
        let profile_id = self.config.profile_id.clone();
        self.install_profile(&profile_id)?;
        if let Some(package) = package {
            self.scope_package(&profile_id, package)?;
        }
        self.state()
    }

    /// Limit instrumentation in `profile_id` to `package`
    ///
    /// The secondary profile also publishes the agent property and gets the
    /// companion runner plugin.
    ///
    /// # Errors
    /// - `MergeError::InvalidPackage` for a malformed package name
    /// - `MergeError::ProfileNotFound` / `MergeError::PluginNotFound` if the profile was
    ///   never installed
    pub fn scope_package(&mut self, profile_id: &str, package: &str) -> MergeResult<()> {
        let pattern = include_pattern(package)?;
        let secondary = crate::upsert::same_identity(profile_id, &self.config.secondary_profile_id);

        let mut descriptor = self.descriptors.load()?;
        descriptor.upsert_plugin_configuration(
            profile_id,
            &self.config.coverage_plugin.artifact_id,
            self.coverage_configuration(&pattern, secondary),
            None,
        )?;
        if secondary {
            descriptor.register_plugin(profile_id, &self.companion_plugin())?;
        }
        self.descriptors.save(&descriptor)?;

        tracing::info!(profile_id, include = %pattern, "coverage scoped to package");
        Ok(())
    }

    /// Install and scope the container-run profile
    ///
    /// # Errors
    /// Same as [`CoverageSetup::scope_package`]
    pub fn install_secondary_profile(&mut self, package: &str) -> MergeResult<()> {
        include_pattern(package)?;
        let profile_id = self.config.secondary_profile_id.clone();
        self.install_profile(&profile_id)?;
        self.scope_package(&profile_id, package)
    }

    /// Ensure the coverage container exists in the container test-runner document
    ///
    /// # Errors
    /// Returns `MergeError::MissingExternalConfig` if the document does not exist
    pub fn adjust_external_config(&mut self) -> MergeResult<ContainerChange> {
        let spec = self.container_spec();
        let name = self.config.external_config_name.clone();
        let change = ensure_container_in_store(&mut self.external, &name, &spec)?;
        tracing::info!(name = %name, qualifier = %spec.qualifier, ?change, "container adjusted");
        Ok(change)
    }

    /// Scope coverage to `package` and run the tests
    ///
    /// Without `container_profile` the primary profile is scoped and used.
    /// With it, the container document is adjusted, the secondary profile is
    /// installed, and both profiles are activated.
    ///
    /// # Errors
    /// - `MergeError::ProfileNotFound` if `container_profile` is not in the descriptor
    /// - `MergeError::CommandFailed` on a non-zero exit code
    /// - any error of the setup steps involved
    pub fn run_tests<R: ProcessRunner>(
        &mut self,
        runner: &mut R,
        package: &str,
        container_profile: Option<&str>,
    ) -> MergeResult<()> {
        let base = CommandLine::new(self.config.build_executable.as_str())
            .arg("clean")
            .arg("test");

        let command = match container_profile {
            Some(container_profile) => {
                include_pattern(package)?;
                if !self.descriptors.load()?.has_profile(container_profile) {
                    return Err(MergeError::ProfileNotFound(container_profile.to_string()));
                }
                self.adjust_external_config()?;
                self.install_secondary_profile(package)?;
                base.profile(&self.config.secondary_profile_id)
                    .profile(container_profile)
            }
            None => {
                let profile_id = self.config.profile_id.clone();
                self.scope_package(&profile_id, package)?;
                base.profile(&profile_id)
            }
        };

        execute(runner, &command)
    }

    /// Generate the coverage report for every installed coverage profile
    ///
    /// # Errors
    /// Returns store errors and `MergeError::CommandFailed`
    pub fn create_report<R: ProcessRunner>(&mut self, runner: &mut R) -> MergeResult<()> {
        let descriptor = self.descriptors.load()?;
        let mut command = CommandLine::new(self.config.build_executable.as_str())
            .arg("jacoco:report")
            .profile(&self.config.profile_id);
        if descriptor.has_profile(&self.config.secondary_profile_id) {
            command = command.profile(&self.config.secondary_profile_id);
        }
        execute(runner, &command)
    }

    /// Derive the current setup state from the stored documents
    ///
    /// # Errors
    /// Returns load errors; a missing container document is not an error
    pub fn state(&self) -> MergeResult<SetupState> {
        let descriptor = self.descriptors.load()?;
        let config = &self.config;

        if !descriptor.has_profile(&config.profile_id) {
            return Ok(SetupState::Unconfigured);
        }
        if descriptor.has_profile(&config.secondary_profile_id) {
            return Ok(if self.container_present()? {
                SetupState::ExternalContainerAdjusted
            } else {
                SetupState::SecondaryProfileInstalled
            });
        }
        let scoped = descriptor
            .plugin(&config.profile_id, &config.coverage_plugin.artifact_id)
            .is_some_and(|plugin| plugin.configuration.is_some());
        Ok(if scoped {
            SetupState::PackageScoped
        } else {
            SetupState::ProfileInstalled
        })
    }

    /// Current descriptor, as stored
    ///
    /// # Errors
    /// Returns load errors from the descriptor store
    pub fn descriptor(&self) -> MergeResult<ProjectDescriptor> {
        self.descriptors.load()
    }

    fn container_present(&self) -> MergeResult<bool> {
        let Some(handle) = self.external.locate(&self.config.external_config_name)? else {
            return Ok(false);
        };
        let config = ExternalContainerConfig::parse(&self.external.read(&handle)?)?;
        Ok(config.container(&self.config.container_qualifier).is_some())
    }

    fn coverage_build(&self) -> BuildSpec {
        BuildSpec::new().with_plugin(
            PluginEntry::new(self.config.coverage_plugin.clone())
                .with_execution(Execution::with_goals([self.config.agent_goal.as_str()])),
        )
    }

    fn coverage_configuration(&self, pattern: &str, secondary: bool) -> ConfigurationTree {
        let configuration = ConfigurationTree::new().with_list("includes", "include", [pattern]);
        if secondary {
            configuration.with_value("propertyName", self.config.agent_property.as_str())
        } else {
            configuration
        }
    }

    fn companion_plugin(&self) -> PluginEntry {
        let properties = Element::new("systemProperties")
            .with_child(
                Element::new(self.config.agent_property.as_str())
                    .with_text(format!("${{{}}}", self.config.agent_property)),
            )
            .with_child(
                Element::new(self.config.container_launch_property.as_str())
                    .with_text(self.config.container_qualifier.as_str()),
            );
        PluginEntry::new(self.config.companion_plugin.clone())
            .with_configuration(ConfigurationTree::new().with_child(properties))
    }

    fn container_spec(&self) -> ContainerSpec {
        let property = Element::new("property")
            .with_attribute("name", "javaVmArguments")
            .with_text(format!("${{{}}}", self.config.agent_property));
        ContainerSpec::new(self.config.container_qualifier.as_str())
            .with_attribute("default", "false")
            .with_configuration(ConfigurationTree::new().with_child(property))
            .with_root_attribute("xmlns", ARQUILLIAN_NS)
            .with_root_attribute("xmlns:xsi", XSI_NS)
            .with_root_attribute("xsi:schemaLocation", ARQUILLIAN_SCHEMA)
    }
}

fn execute<R: ProcessRunner>(runner: &mut R, command: &CommandLine) -> MergeResult<()> {
    tracing::info!(%command, "running");
    match runner.run(command)? {
        0 => Ok(()),
        code => Err(MergeError::CommandFailed {
            command: command.to_string(),
            code,
        }),
    }
}
