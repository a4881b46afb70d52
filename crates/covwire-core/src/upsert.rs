//! Whole-object upsert primitive
//!
//! [`replace_or_append`] removes every child matching an identity predicate
//! and appends the replacement as the last child. Profiles, plugin entries,
//! configuration payloads and containers all go through it.

use covwire_document::Element;

/// What an upsert did to the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No previous instance existed
    Appended,
    /// Previous instances were removed before appending
    Replaced {
        /// Number of removed instances (more than one means duplicates were healed)
        removed: usize,
    },
}

impl Upsert {
    /// Whether a previous instance existed
    #[inline]
    #[must_use]
    pub fn replaced(self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Replace every child matching `identity` with `item`, appended at the end
///
/// Unmatched siblings keep their relative order.
pub fn replace_or_append(
    parent: &mut Element,
    identity: impl FnMut(&Element) -> bool,
    item: Element,
) -> Upsert {
    let removed = parent.remove_children_where(identity).len();
    if removed > 1 {
        tracing::warn!(
            parent = parent.name(),
            child = item.name(),
            removed,
            "removed duplicate entries"
        );
    }
    tracing::debug!(parent = parent.name(), child = item.name(), removed, "upsert");
    parent.push_child(item);

    match removed {
        0 => Upsert::Appended,
        removed => Upsert::Replaced { removed },
    }
}

/// Case-insensitive identity comparison used for profile ids and artifact ids
#[must_use]
pub fn same_identity(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Matcher for `<element_name>` children whose `<key>` text equals `value` (ignoring case)
pub fn keyed_by_child<'a>(
    element_name: &'a str,
    key: &'a str,
    value: &'a str,
) -> impl Fn(&Element) -> bool + 'a {
    move |element| {
        element.name() == element_name
            && element
                .child_text(key)
                .is_some_and(|text| same_identity(&text, value))
    }
}

/// Matcher for `<element_name>` children whose `attribute` equals `value` exactly
pub fn keyed_by_attribute<'a>(
    element_name: &'a str,
    attribute: &'a str,
    value: &'a str,
) -> impl Fn(&Element) -> bool + 'a {
    move |element| element.name() == element_name && element.attribute(attribute) == Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, payload: &str) -> Element {
        Element::new("profile")
            .with_child(Element::new("id").with_text(id))
            .with_child(Element::new("payload").with_text(payload))
    }

    fn ids(parent: &Element) -> Vec<String> {
        parent.elements().filter_map(|e| e.child_text("id")).collect()
    }

    #[test]
    fn append_when_absent() {
        let mut parent = Element::new("profiles").with_child(entry("a", "1"));
        let outcome = replace_or_append(
            &mut parent,
            keyed_by_child("profile", "id", "b"),
            entry("b", "2"),
        );

        assert_eq!(outcome, Upsert::Appended);
        assert_eq!(ids(&parent), vec!["a", "b"]);
    }

    #[test]
    fn replace_moves_to_end() {
        let mut parent = Element::new("profiles")
            .with_child(entry("a", "1"))
            .with_child(entry("b", "1"));
        let outcome = replace_or_append(
            &mut parent,
            keyed_by_child("profile", "id", "A"),
            entry("a", "2"),
        );

        assert_eq!(outcome, Upsert::Replaced { removed: 1 });
        assert_eq!(ids(&parent), vec!["b", "a"]);
        assert_eq!(
            parent.elements().last().and_then(|e| e.child_text("payload")),
            Some("2".to_string())
        );
    }

    #[test]
    fn replace_heals_duplicates() {
        let mut parent = Element::new("profiles")
            .with_child(entry("a", "1"))
            .with_child(entry("b", "1"))
            .with_child(entry("a", "1"));
        let outcome = replace_or_append(
            &mut parent,
            keyed_by_child("profile", "id", "a"),
            entry("a", "3"),
        );

        assert_eq!(outcome, Upsert::Replaced { removed: 2 });
        assert_eq!(ids(&parent), vec!["b", "a"]);
    }

    #[test]
    fn attribute_matcher_is_exact() {
        let container = Element::new("container").with_attribute("qualifier", "jacoco");
        assert!(keyed_by_attribute("container", "qualifier", "jacoco")(&container));
        assert!(!keyed_by_attribute("container", "qualifier", "JaCoCo")(&container));
        assert!(!keyed_by_attribute("group", "qualifier", "jacoco")(&container));
    }

    #[test]
    fn identity_ignores_case_and_padding() {
        assert!(same_identity("Jacoco-Maven-Plugin", " jacoco-maven-plugin"));
        assert!(!same_identity("jacoco", "jacoco-arq"));
    }
}
