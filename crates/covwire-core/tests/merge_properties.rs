//! Property tests for the merge guarantees.
//!
//! Every managed element must survive any number of re-applications as
//! exactly one instance, and everything the merger does not own must come
//! through untouched:
//! - Re-applying a profile upsert is a no-op on the document.
//! - No identity key is ever duplicated, whatever the sequence of upserts.
//! - Unrelated profiles keep their content and relative order.
//! - A configuration upsert discards every previous configuration key.
//! - An empty container document is adopted; a missing one is never created.

use covwire_core::{
    ensure_container_in_store, BuildSpec, ConfigurationTree, ContainerChange, ContainerSpec,
    Execution, MergeError, PluginCoordinates, PluginEntry, ProjectDescriptor,
};
use covwire_document::Element;
use covwire_test_utils::{count_profiles, MemoryExternalConfigStore, EMPTY_ARQUILLIAN, SAMPLE_POM};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const MANAGED_ID: &str = "jacoco";

fn build_with(artifact_ids: &[String]) -> BuildSpec {
    artifact_ids.iter().fold(BuildSpec::new(), |build, artifact_id| {
        build.with_plugin(
            PluginEntry::new(PluginCoordinates::new(artifact_id.as_str()).with_version("1.0"))
                .with_execution(Execution::with_goals(["prepare-agent"])),
        )
    })
}

fn descriptor_with_profiles(ids: &[String]) -> ProjectDescriptor {
    let mut root = Element::new("project");
    root.create_child("modelVersion").set_text("4.0.0");
    let profiles = root.create_child("profiles");
    for (index, id) in ids.iter().enumerate() {
        let profile = profiles.create_child("profile");
        profile.create_child("id").set_text(id.as_str());
        profile
            .create_child("properties")
            .create_child(format!("p{index}"))
            .set_text(format!("value-{index}"));
    }
    ProjectDescriptor::parse(&root.to_markup()).unwrap()
}

fn unrelated_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{2,8}", 0..6).prop_map(|ids| {
        ids.into_iter()
            .filter(|id| !id.eq_ignore_ascii_case(MANAGED_ID))
            .collect()
    })
}

fn artifact_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{3,10}-plugin", 1..4)
        .prop_map(|ids| ids.into_iter().collect())
}

proptest! {
    /// Tenet: re-applying a profile upsert changes nothing.
    #[test]
    fn prop_upsert_profile_is_idempotent(
        existing in unrelated_ids(),
        plugins in artifact_ids(),
    ) {
        let build = build_with(&plugins);
        let mut once = descriptor_with_profiles(&existing);
        once.upsert_profile(MANAGED_ID, &build);

        let mut twice = once.clone();
        twice.upsert_profile(MANAGED_ID, &build);

        prop_assert_eq!(twice.to_markup(), once.to_markup());
        prop_assert_eq!(count_profiles(&twice, MANAGED_ID), 1);
        prop_assert_eq!(twice.build(MANAGED_ID), Some(build));
    }

    /// Tenet: no profile id survives twice, whatever the order or casing of upserts.
    #[test]
    fn prop_no_duplicate_profiles(
        sequence in prop::collection::vec(
            prop::sample::select(vec!["alpha", "Alpha", "BETA", "beta", "gamma"]),
            1..12,
        ),
    ) {
        let mut descriptor = ProjectDescriptor::parse(SAMPLE_POM).unwrap();
        let build = build_with(&["jacoco-maven-plugin".to_string()]);
        for id in &sequence {
            descriptor.upsert_profile(id, &build);
        }

        for id in ["alpha", "beta", "gamma"] {
            prop_assert!(count_profiles(&descriptor, id) <= 1);
        }
        let ids = descriptor.profile_ids();
        let last = sequence.last().copied().unwrap_or_default();
        prop_assert_eq!(ids.last().map(String::as_str), Some(last));
    }

    /// Tenet: profiles the merger does not own are carried through unchanged.
    #[test]
    fn prop_unrelated_profiles_preserved(
        existing in unrelated_ids(),
        plugins in artifact_ids(),
        rounds in 1usize..4,
    ) {
        let mut descriptor = descriptor_with_profiles(&existing);
        let before: Vec<Element> = existing
            .iter()
            .filter_map(|id| descriptor.profile(id).cloned())
            .collect();

        for _ in 0..rounds {
            descriptor.upsert_profile(MANAGED_ID, &build_with(&plugins));
            descriptor
                .upsert_plugin_configuration(
                    MANAGED_ID,
                    &plugins[0],
                    ConfigurationTree::new().with_value("round", "x"),
                    None,
                )
                .unwrap();
        }

        let after: Vec<Element> = existing
            .iter()
            .filter_map(|id| descriptor.profile(id).cloned())
            .collect();
        prop_assert_eq!(after, before);

        let mut expected_order = existing.clone();
        expected_order.push(MANAGED_ID.to_string());
        prop_assert_eq!(descriptor.profile_ids(), expected_order);
    }

    /// Tenet: no plugin entry is duplicated by repeated companion registration.
    #[test]
    fn prop_register_plugin_keeps_one_entry(times in 1usize..5) {
        let mut descriptor = ProjectDescriptor::parse(SAMPLE_POM).unwrap();
        descriptor.upsert_profile(MANAGED_ID, &build_with(&["jacoco-maven-plugin".to_string()]));
        let companion =
            PluginEntry::new(PluginCoordinates::new("maven-surefire-plugin").with_version("2.12"));

        for _ in 0..times {
            descriptor.register_plugin(MANAGED_ID, &companion).unwrap();
        }

        let build = descriptor.build(MANAGED_ID).unwrap();
        let surefire = build
            .plugins
            .iter()
            .filter(|p| p.artifact_id() == "maven-surefire-plugin")
            .count();
        prop_assert_eq!(surefire, 1);
        prop_assert_eq!(build.plugins.len(), 2);
    }
}

/// Tenet: configuration upserts replace the whole payload.
///
/// A key written by an earlier call must not leak into the result of a later
/// call that does not mention it.
#[test]
fn configuration_replace_is_atomic() {
    let mut descriptor = ProjectDescriptor::parse(SAMPLE_POM).unwrap();
    descriptor.upsert_profile(MANAGED_ID, &build_with(&["jacoco-maven-plugin".to_string()]));

    let first = ConfigurationTree::new()
        .with_list("includes", "include", ["com/old/**"])
        .with_list("excludes", "exclude", ["com/old/generated/**"])
        .with_value("propertyName", "jacoco.agent");
    let second = ConfigurationTree::new().with_list("includes", "include", ["com/test/**"]);

    descriptor
        .upsert_plugin_configuration(MANAGED_ID, "jacoco-maven-plugin", first, None)
        .unwrap();
    descriptor
        .upsert_plugin_configuration(MANAGED_ID, "jacoco-maven-plugin", second.clone(), None)
        .unwrap();

    let plugin = descriptor.plugin(MANAGED_ID, "jacoco-maven-plugin").unwrap();
    assert_eq!(plugin.configuration, Some(second));
    assert_eq!(plugin.goals(), vec!["prepare-agent"]);
}

/// Tenet: an empty container document is adopted as-is.
#[test]
fn empty_external_document_is_adopted() {
    let mut store = MemoryExternalConfigStore::with_file("arquillian.xml", EMPTY_ARQUILLIAN);
    let spec = ContainerSpec::new("jacoco").with_attribute("default", "false");

    let change = ensure_container_in_store(&mut store, "arquillian.xml", &spec).unwrap();

    assert_eq!(change, ContainerChange::Adopted);
    let root = Element::parse(store.file("arquillian.xml").unwrap()).unwrap();
    assert_eq!(root.children().len(), 1);
    assert_eq!(
        root.child("container").and_then(|c| c.attribute("qualifier")),
        Some("jacoco")
    );
}

/// Tenet: a missing container document is a hard failure with no write.
///
/// Creating the file here would hide that the container test runner was
/// never installed.
#[test]
fn missing_external_document_is_fatal() {
    let mut store = MemoryExternalConfigStore::empty();

    let err = ensure_container_in_store(&mut store, "arquillian.xml", &ContainerSpec::new("jacoco"))
        .unwrap_err();

    assert!(matches!(
        err,
        MergeError::MissingExternalConfig { ref name } if name == "arquillian.xml"
    ));
    assert!(store.writes.is_empty());
    assert!(store.files.is_empty());
}

/// Scenario: profiles [A, B]; replacing A leaves one A with the new content and B untouched.
#[test]
fn replacing_first_of_two_profiles() {
    let mut descriptor = descriptor_with_profiles(&["A".to_string(), "B".to_string()]);
    let b_before = descriptor.profile("B").cloned();
    let spec2 = build_with(&["jacoco-maven-plugin".to_string()]);

    descriptor.upsert_profile("A", &spec2);

    assert_eq!(descriptor.profile_ids(), vec!["B", "A"]);
    assert_eq!(descriptor.build("A"), Some(spec2));
    assert_eq!(descriptor.profile("B").cloned(), b_before);
}
