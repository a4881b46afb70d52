//! covwire Core - idempotent coverage wiring
//!
//! Merges a coverage plugin into a project descriptor and a container
//! test-runner document so that re-running any step:
//! - Leaves exactly one instance of each managed profile, plugin and container
//! - Preserves everything it does not own
//! - Yields the same document as running it once
//!
//! # Example
//!
//! ```rust
//! use covwire_core::{
//!     BuildSpec, ConfigurationTree, Execution, PluginCoordinates, PluginEntry, ProjectDescriptor,
//! };
//!
//! let mut pom = ProjectDescriptor::parse("<project><profiles/></project>").unwrap();
//! let build = BuildSpec::new().with_plugin(
//!     PluginEntry::new(PluginCoordinates::new("jacoco-maven-plugin").with_group("org.jacoco"))
//!         .with_execution(Execution::with_goals(["prepare-agent"])),
//! );
//!
//! pom.upsert_profile("jacoco", &build);
//! pom.upsert_profile("jacoco", &build);
//! assert_eq!(pom.profile_ids(), vec!["jacoco"]);
//!
//! let includes = ConfigurationTree::new().with_list("includes", "include", ["com/test/**"]);
//! pom.upsert_plugin_configuration("jacoco", "jacoco-maven-plugin", includes, None).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod descriptor;
pub mod error;
pub mod external;
pub mod model;
pub mod setup;
pub mod store;
pub mod upsert;

// Re-exports for convenience
pub use config::{ConfigError, CoverageConfig, CONFIG_FILE_NAME};
pub use descriptor::ProjectDescriptor;
pub use error::{MergeError, MergeResult};
pub use external::{
    ensure_container_in_store, ContainerChange, ContainerSpec, ExternalContainerConfig,
};
pub use model::{BuildSpec, ConfigurationTree, Execution, PluginCoordinates, PluginEntry};
pub use setup::{include_pattern, CommandLine, CoverageSetup, ProcessRunner, SetupState};
pub use store::{DocumentStore, ExternalConfigStore, FileDocumentStore, FileExternalConfigStore};
pub use upsert::{replace_or_append, Upsert};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the setup flow
    pub use crate::{
        CommandLine, CoverageConfig, CoverageSetup, DocumentStore, ExternalConfigStore,
        MergeError, MergeResult, ProcessRunner, ProjectDescriptor, SetupState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
