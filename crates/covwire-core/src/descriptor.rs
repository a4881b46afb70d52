//! Profile Merger
//!
//! Upserts over a project descriptor: `project/profiles/profile` entries keyed
//! by `<id>`, each holding `build/plugins/plugin` entries keyed by
//! `<artifactId>`. Both keys compare case-insensitively.
//!
//! Profiles are replaced whole (remove, then append at the end). Plugin entries
//! are located in place and only their `<configuration>` payload is swapped,
//! so execution wiring installed earlier is left untouched.

use covwire_document::{Document, Element, ParseError};

use crate::error::{MergeError, MergeResult};
use crate::model::{
    BuildSpec, ConfigurationTree, PluginCoordinates, PluginEntry, ARTIFACT_ID, BUILD,
    CONFIGURATION, GROUP_ID, ID, PLUGIN, PLUGINS, PROFILE, PROFILES, VERSION,
};
use crate::upsert::{keyed_by_child, replace_or_append, Upsert};

/// Project descriptor document with profile-level operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    document: Document,
}

impl ProjectDescriptor {
    /// Wrap a parsed document
    #[inline]
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Parse descriptor markup
    ///
    /// # Errors
    /// Returns [`ParseError`] if the markup is malformed
    #[inline]
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Document::parse(text).map(Self::new)
    }

    /// Underlying document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Take the underlying document
    #[inline]
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Serialize to markup
    #[inline]
    #[must_use]
    pub fn to_markup(&self) -> String {
        self.document.to_markup()
    }

    /// Profile ids in document order
    #[must_use]
    pub fn profile_ids(&self) -> Vec<String> {
        self.profiles()
            .map(|profiles| {
                profiles
                    .children_by_name(PROFILE)
                    .filter_map(|p| p.child_text(ID))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Profile element by id
    #[must_use]
    pub fn profile(&self, profile_id: &str) -> Option<&Element> {
        self.profiles()?
            .find_child(keyed_by_child(PROFILE, ID, profile_id))
    }

    /// Whether a profile with this id exists
    #[inline]
    #[must_use]
    pub fn has_profile(&self, profile_id: &str) -> bool {
        self.profile(profile_id).is_some()
    }

    /// Typed read-back of a profile's plugin entries
    #[must_use]
    pub fn build(&self, profile_id: &str) -> Option<BuildSpec> {
        self.profile(profile_id).map(BuildSpec::from_profile_element)
    }

    /// Typed read-back of one plugin entry
    #[must_use]
    pub fn plugin(&self, profile_id: &str, artifact_id: &str) -> Option<PluginEntry> {
        self.profile(profile_id)?
            .descend(&[BUILD, PLUGINS])?
            .find_child(keyed_by_child(PLUGIN, ARTIFACT_ID, artifact_id))
            .and_then(PluginEntry::from_element)
    }

    /// Install `build` as the profile `profile_id`
    ///
    /// Any existing profile with the same id (ignoring case) is removed first;
    /// the fresh profile always lands at the end of the profile list.
    pub fn upsert_profile(&mut self, profile_id: &str, build: &BuildSpec) -> Upsert {
        let profiles = self.document.root_mut().child_or_create(PROFILES);
        let outcome = replace_or_append(
            profiles,
            keyed_by_child(PROFILE, ID, profile_id),
            build.to_profile_element(profile_id),
        );
        tracing::debug!(profile_id, ?outcome, "profile upserted");
        outcome
    }

    /// Replace the configuration payload of an installed plugin entry
    ///
    /// The previous `<configuration>` is discarded entirely. When `coordinates`
    /// is given, the entry's groupId and version are overwritten as well.
    /// Further entries for the same artifact id are removed, so the first one
    /// is the only entry left.
    ///
    /// # Errors
    /// - `MergeError::ProfileNotFound` if the profile is absent
    /// - `MergeError::PluginNotFound` if the profile has no such plugin entry
    pub fn upsert_plugin_configuration(
        &mut self,
        profile_id: &str,
        artifact_id: &str,
        configuration: ConfigurationTree,
        coordinates: Option<&PluginCoordinates>,
    ) -> MergeResult<()> {
        let profile = self
            .profile_mut(profile_id)
            .ok_or_else(|| MergeError::ProfileNotFound(profile_id.to_string()))?;
        let matcher = keyed_by_child(PLUGIN, ARTIFACT_ID, artifact_id);
        let plugins = profile
            .descend_mut(&[BUILD, PLUGINS])
            .filter(|plugins| plugins.find_child(&matcher).is_some())
            .ok_or_else(|| MergeError::plugin_not_found(profile_id, artifact_id))?;

        // keep the first entry, later ones with the same artifact id are stale
        let mut seen = 0usize;
        let removed = plugins
            .remove_children_where(|e| {
                let matched = matcher(e);
                seen += usize::from(matched);
                matched && seen > 1
            })
            .len();
        if removed > 0 {
            tracing::warn!(profile_id, artifact_id, removed, "removed duplicate plugin entries");
        }
        let plugin = plugins
            .find_child_mut(&matcher)
            .ok_or_else(|| MergeError::plugin_not_found(profile_id, artifact_id))?;

        replace_or_append(
            plugin,
            |e| e.name() == CONFIGURATION,
            configuration.into_element(),
        );

        if let Some(coordinates) = coordinates {
            if let Some(group_id) = &coordinates.group_id {
                plugin.child_or_create(GROUP_ID).set_text(group_id.as_str());
            }
            if let Some(version) = &coordinates.version {
                plugin.child_or_create(VERSION).set_text(version.as_str());
            }
        }

        tracing::debug!(profile_id, artifact_id, "plugin configuration replaced");
        Ok(())
    }

    /// Register an additional plugin entry in an existing profile
    ///
    /// An entry with the same artifact id is replaced, so the profile never
    /// holds two entries for one plugin.
    ///
    /// # Errors
    /// Returns `MergeError::ProfileNotFound` if the profile is absent
    pub fn register_plugin(
        &mut self,
        profile_id: &str,
        plugin: &PluginEntry,
    ) -> MergeResult<Upsert> {
        let profile = self
            .profile_mut(profile_id)
            .ok_or_else(|| MergeError::ProfileNotFound(profile_id.to_string()))?;
        let plugins = profile.descend_or_create(&[BUILD, PLUGINS]);
        Ok(replace_or_append(
            plugins,
            keyed_by_child(PLUGIN, ARTIFACT_ID, plugin.artifact_id()),
            plugin.to_element(),
        ))
    }

    fn profiles(&self) -> Option<&Element> {
        self.document.root().child(PROFILES)
    }

    fn profile_mut(&mut self, profile_id: &str) -> Option<&mut Element> {
        self.document
            .root_mut()
            .child_mut(PROFILES)?
            .find_child_mut(keyed_by_child(PROFILE, ID, profile_id))
    }
}

impl From<Document> for ProjectDescriptor {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}
