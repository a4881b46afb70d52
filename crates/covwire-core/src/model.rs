//! Typed views over build-descriptor fragments
//!
//! Each type builds its element through the [`Element`] API and can be read
//! back from an element produced by the merger.

use covwire_document::{Element, ParseError};
use serde::{Deserialize, Serialize};

pub(crate) const PROFILES: &str = "profiles";
pub(crate) const PROFILE: &str = "profile";
pub(crate) const ID: &str = "id";
pub(crate) const BUILD: &str = "build";
pub(crate) const PLUGINS: &str = "plugins";
pub(crate) const PLUGIN: &str = "plugin";
pub(crate) const GROUP_ID: &str = "groupId";
pub(crate) const ARTIFACT_ID: &str = "artifactId";
pub(crate) const VERSION: &str = "version";
pub(crate) const EXECUTIONS: &str = "executions";
pub(crate) const EXECUTION: &str = "execution";
pub(crate) const PHASE: &str = "phase";
pub(crate) const GOALS: &str = "goals";
pub(crate) const GOAL: &str = "goal";
pub(crate) const CONFIGURATION: &str = "configuration";

/// groupId/artifactId/version of a plugin
///
/// Only `artifact_id` is identity; group and version are payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCoordinates {
    /// Optional group id (the build tool supplies a default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Artifact id, the lookup key within a profile
    pub artifact_id: String,
    /// Optional version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PluginCoordinates {
    /// Coordinates with artifact id only
    #[inline]
    #[must_use]
    pub fn new(artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: None,
            artifact_id: artifact_id.into(),
            version: None,
        }
    }

    /// With group id
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// With version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A set of lifecycle goals bound to one plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    /// Optional execution id
    pub id: Option<String>,
    /// Optional lifecycle phase
    pub phase: Option<String>,
    /// Goal names in order
    pub goals: Vec<String>,
}

impl Execution {
    /// Execution running the given goals
    #[must_use]
    pub fn with_goals<I, S>(goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            phase: None,
            goals: goals.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the `<execution>` element
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(EXECUTION);
        if let Some(id) = &self.id {
            element.create_child(ID).set_text(id.as_str());
        }
        if let Some(phase) = &self.phase {
            element.create_child(PHASE).set_text(phase.as_str());
        }
        let goals = element.create_child(GOALS);
        for goal in &self.goals {
            goals.create_child(GOAL).set_text(goal.as_str());
        }
        element
    }

    /// Read back from an `<execution>` element
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        Self {
            id: element.child_text(ID),
            phase: element.child_text(PHASE),
            goals: element
                .child(GOALS)
                .map(|goals| goals.children_by_name(GOAL).map(Element::text).collect())
                .unwrap_or_default(),
        }
    }
}

/// Opaque `<configuration>` payload handed verbatim to a tool
///
/// Replaced as a whole; never merged key by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationTree(Element);

impl Default for ConfigurationTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationTree {
    /// Empty `<configuration/>`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Element::new(CONFIGURATION))
    }

    /// Wrap an element; anything not named `configuration` becomes its only child
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        if element.name() == CONFIGURATION {
            Self(element)
        } else {
            Self::new().with_child(element)
        }
    }

    /// Parse from markup text
    ///
    /// # Errors
    /// Returns [`ParseError`] if the markup is malformed
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Element::parse(text).map(Self::from_element)
    }

    /// Add `<name>value</name>`
    #[must_use]
    pub fn with_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.create_child(name).set_text(value);
        self
    }

    /// Add `<name><item>v1</item><item>v2</item></name>`
    #[must_use]
    pub fn with_list<I, S>(mut self, name: &str, item: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.0.create_child(name);
        for value in values {
            list.create_child(item).set_text(value);
        }
        self
    }

    /// Add an arbitrary subtree
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.0.push_child(child);
        self
    }

    /// Top-level keys in order
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.0.elements().map(Element::name).collect()
    }

    /// Text of a top-level key
    #[must_use]
    pub fn value(&self, name: &str) -> Option<String> {
        self.0.child_text(name)
    }

    /// Item texts of a top-level list key
    #[must_use]
    pub fn list(&self, name: &str) -> Vec<String> {
        self.0
            .child(name)
            .map(|list| list.elements().map(Element::text).collect())
            .unwrap_or_default()
    }

    /// Underlying element
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> &Element {
        &self.0
    }

    /// Take the underlying element
    #[inline]
    #[must_use]
    pub fn into_element(self) -> Element {
        self.0
    }
}

/// A declared build-time plugin invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    /// Identity and payload coordinates
    pub coordinates: PluginCoordinates,
    /// Goal wiring
    pub executions: Vec<Execution>,
    /// Tool configuration
    pub configuration: Option<ConfigurationTree>,
}

impl PluginEntry {
    /// Entry without executions or configuration
    #[inline]
    #[must_use]
    pub fn new(coordinates: PluginCoordinates) -> Self {
        Self {
            coordinates,
            executions: Vec::new(),
            configuration: None,
        }
    }

    /// With an additional execution
    #[inline]
    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.executions.push(execution);
        self
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_configuration(mut self, configuration: ConfigurationTree) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Artifact id (identity key)
    #[inline]
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.coordinates.artifact_id
    }

    /// All goal names across executions, in order
    #[must_use]
    pub fn goals(&self) -> Vec<&str> {
        self.executions
            .iter()
            .flat_map(|e| e.goals.iter().map(String::as_str))
            .collect()
    }

    /// Build the `<plugin>` element
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(PLUGIN);
        if let Some(group_id) = &self.coordinates.group_id {
            element.create_child(GROUP_ID).set_text(group_id.as_str());
        }
        element
            .create_child(ARTIFACT_ID)
            .set_text(self.coordinates.artifact_id.as_str());
        if let Some(version) = &self.coordinates.version {
            element.create_child(VERSION).set_text(version.as_str());
        }
        if !self.executions.is_empty() {
            let executions = element.create_child(EXECUTIONS);
            for execution in &self.executions {
                executions.push_child(execution.to_element());
            }
        }
        if let Some(configuration) = &self.configuration {
            element.push_child(configuration.as_element().clone());
        }
        element
    }

    /// Read back from a `<plugin>` element; `None` without an artifact id
    #[must_use]
    pub fn from_element(element: &Element) -> Option<Self> {
        let artifact_id = element.child_text(ARTIFACT_ID)?;
        Some(Self {
            coordinates: PluginCoordinates {
                group_id: element.child_text(GROUP_ID),
                artifact_id,
                version: element.child_text(VERSION),
            },
            executions: element
                .child(EXECUTIONS)
                .map(|list| {
                    list.children_by_name(EXECUTION)
                        .map(Execution::from_element)
                        .collect()
                })
                .unwrap_or_default(),
            configuration: element
                .child(CONFIGURATION)
                .cloned()
                .map(ConfigurationTree::from_element),
        })
    }
}

/// Ordered plugin entries of one profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSpec {
    /// Plugin entries in order
    pub plugins: Vec<PluginEntry>,
}

impl BuildSpec {
    /// Empty build spec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an additional plugin
    #[inline]
    #[must_use]
    pub fn with_plugin(mut self, plugin: PluginEntry) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Build the full `<profile>` element for `profile_id`
    #[must_use]
    pub fn to_profile_element(&self, profile_id: &str) -> Element {
        let mut profile = Element::new(PROFILE);
        profile.create_child(ID).set_text(profile_id);
        let plugins = profile.create_child(BUILD).create_child(PLUGINS);
        for plugin in &self.plugins {
            plugins.push_child(plugin.to_element());
        }
        profile
    }

    /// Read back from a `<profile>` element
    #[must_use]
    pub fn from_profile_element(profile: &Element) -> Self {
        Self {
            plugins: profile
                .descend(&[BUILD, PLUGINS])
                .map(|plugins| {
                    plugins
                        .children_by_name(PLUGIN)
                        .filter_map(PluginEntry::from_element)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coverage_plugin() -> PluginEntry {
        PluginEntry::new(
            PluginCoordinates::new("jacoco-maven-plugin")
                .with_group("org.jacoco")
                .with_version("0.5.8.201207111220"),
        )
        .with_execution(Execution::with_goals(["prepare-agent"]))
    }

    #[test]
    fn plugin_element_layout() {
        let markup = coverage_plugin().to_element().to_markup();
        assert_eq!(
            markup,
            concat!(
                "<plugin>\n",
                "    <groupId>org.jacoco</groupId>\n",
                "    <artifactId>jacoco-maven-plugin</artifactId>\n",
                "    <version>0.5.8.201207111220</version>\n",
                "    <executions>\n",
                "        <execution>\n",
                "            <goals>\n",
                "                <goal>prepare-agent</goal>\n",
                "            </goals>\n",
                "        </execution>\n",
                "    </executions>\n",
                "</plugin>",
            )
        );
    }

    #[test]
    fn plugin_reads_back() {
        let plugin = coverage_plugin().with_configuration(
            ConfigurationTree::new().with_list("includes", "include", ["com/test/**"]),
        );
        let read = PluginEntry::from_element(&plugin.to_element()).unwrap();
        assert_eq!(read, plugin);
        assert_eq!(read.goals(), vec!["prepare-agent"]);
    }

    #[test]
    fn plugin_without_artifact_id_is_skipped() {
        let element = Element::new(PLUGIN).with_child(Element::new(GROUP_ID).with_text("x"));
        assert!(PluginEntry::from_element(&element).is_none());
    }

    #[test]
    fn configuration_wraps_foreign_root() {
        let tree = ConfigurationTree::from_element(Element::new("includes"));
        assert_eq!(tree.as_element().name(), CONFIGURATION);
        assert_eq!(tree.keys(), vec!["includes"]);
    }

    #[test]
    fn configuration_parse() {
        let tree = ConfigurationTree::parse(
            "<configuration><includes><include>a/**</include><include>b/**</include></includes>\
             <propertyName>jacoco.agent</propertyName></configuration>",
        )
        .unwrap();
        assert_eq!(tree.list("includes"), vec!["a/**", "b/**"]);
        assert_eq!(tree.value("propertyName").as_deref(), Some("jacoco.agent"));
    }

    #[test]
    fn build_spec_profile_roundtrip() {
        let build = BuildSpec::new().with_plugin(coverage_plugin());
        let profile = build.to_profile_element("jacoco");
        assert_eq!(profile.child_text(ID).as_deref(), Some("jacoco"));
        assert_eq!(BuildSpec::from_profile_element(&profile), build);
    }

    #[test]
    fn coordinates_toml_shape() {
        let coordinates: PluginCoordinates =
            toml::from_str("artifact_id = \"maven-surefire-plugin\"\nversion = \"2.12\"").unwrap();
        assert_eq!(coordinates.group_id, None);
        assert_eq!(coordinates.version.as_deref(), Some("2.12"));
    }
}
