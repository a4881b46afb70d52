//! External Config Adjuster
//!
//! Keeps exactly one `<container>` per qualifier in the container test-runner
//! document. Containers are matched by their `qualifier` attribute, exactly.

use covwire_document::{Attribute, Document, Element, ParseError};

use crate::error::{MergeError, MergeResult};
use crate::model::ConfigurationTree;
use crate::store::ExternalConfigStore;
use crate::upsert::{keyed_by_attribute, replace_or_append, Upsert};

const CONTAINER: &str = "container";
const QUALIFIER: &str = "qualifier";

/// Desired container record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Identity attribute value
    pub qualifier: String,
    /// Extra attributes written after `qualifier`
    pub attributes: Vec<Attribute>,
    /// Container payload
    pub configuration: ConfigurationTree,
    /// Attributes the document root should carry when an empty document is adopted
    pub root_attributes: Vec<Attribute>,
}

impl ContainerSpec {
    /// Spec with an empty configuration
    #[must_use]
    pub fn new(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            attributes: Vec::new(),
            configuration: ConfigurationTree::new(),
            root_attributes: Vec::new(),
        }
    }

    /// With an extra container attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// With configuration payload
    #[must_use]
    pub fn with_configuration(mut self, configuration: ConfigurationTree) -> Self {
        self.configuration = configuration;
        self
    }

    /// With a root attribute applied on adoption
    #[must_use]
    pub fn with_root_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.root_attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Build the `<container>` element
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element =
            Element::new(CONTAINER).with_attribute(QUALIFIER, self.qualifier.as_str());
        for attribute in &self.attributes {
            element.set_attribute(attribute.name.as_str(), attribute.value.as_str());
        }
        element.with_child(self.configuration.as_element().clone())
    }
}

/// What [`ExternalContainerConfig::ensure_container`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerChange {
    /// Root had no children; the container became its only child
    Adopted,
    /// No container with the qualifier existed
    Appended,
    /// Existing container(s) with the qualifier were replaced
    Replaced {
        /// Number of removed containers
        removed: usize,
    },
}

impl From<Upsert> for ContainerChange {
    fn from(outcome: Upsert) -> Self {
        match outcome {
            Upsert::Appended => Self::Appended,
            Upsert::Replaced { removed } => Self::Replaced { removed },
        }
    }
}

/// Container test-runner configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalContainerConfig {
    document: Document,
}

impl ExternalContainerConfig {
    /// Wrap a parsed document
    #[inline]
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Parse document markup
    ///
    /// # Errors
    /// Returns [`ParseError`] if the markup is malformed
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Document::parse(text).map(Self::new)
    }

    /// Underlying document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialize to markup
    #[inline]
    #[must_use]
    pub fn to_markup(&self) -> String {
        self.document.to_markup()
    }

    /// Qualifiers of all containers, in document order
    #[must_use]
    pub fn qualifiers(&self) -> Vec<&str> {
        self.document
            .root()
            .children_by_name(CONTAINER)
            .filter_map(|c| c.attribute(QUALIFIER))
            .collect()
    }

    /// Container with exactly this qualifier
    #[must_use]
    pub fn container(&self, qualifier: &str) -> Option<&Element> {
        self.document
            .root()
            .find_child(keyed_by_attribute(CONTAINER, QUALIFIER, qualifier))
    }

    /// Ensure exactly one container for `spec.qualifier` exists, with `spec`'s payload
    ///
    /// A root holding nothing but whitespace is adopted: its blank content is
    /// discarded and the missing root attributes are added. Comments or any
    /// other node count as content.
    pub fn ensure_container(&mut self, spec: &ContainerSpec) -> ContainerChange {
        let root = self.document.root_mut();

        if root.is_blank() {
            root.clear_children();
            for attribute in &spec.root_attributes {
                if root.attribute(&attribute.name).is_none() {
                    root.set_attribute(attribute.name.as_str(), attribute.value.as_str());
                }
            }
            root.push_child(spec.to_element());
            tracing::debug!(qualifier = %spec.qualifier, "adopted empty document");
            return ContainerChange::Adopted;
        }

        replace_or_append(
            root,
            keyed_by_attribute(CONTAINER, QUALIFIER, &spec.qualifier),
            spec.to_element(),
        )
        .into()
    }
}

/// Load `name` from `store`, ensure the container, and write it back
///
/// # Errors
/// - `MergeError::MissingExternalConfig` if the document does not exist; nothing is written
/// - `MergeError::MalformedDocument` if the stored markup does not parse
/// - `MergeError::Io` on read or write failure
pub fn ensure_container_in_store<S: ExternalConfigStore>(
    store: &mut S,
    name: &str,
    spec: &ContainerSpec,
) -> MergeResult<ContainerChange> {
    let handle = store
        .locate(name)?
        .ok_or_else(|| MergeError::MissingExternalConfig {
            name: name.to_string(),
        })?;

    let mut config = ExternalContainerConfig::parse(&store.read(&handle)?)?;
    let change = config.ensure_container(spec);
    store.write(&handle, &config.to_markup())?;

    tracing::debug!(name, ?change, "external config written");
    Ok(change)
}
