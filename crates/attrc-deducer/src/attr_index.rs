//! Attribute-type index - an inverted index from attribute name to
//! the set of types providing it, one per plane (class, instance, module).
//!
//! Built once from the Importer's `all_class_attrs`, `all_combined_attrs`,
//! and `all_module_attrs` maps, then queried by the type solver once
//! per usage-key. Queries are the hot path of the whole deducer, so the
//! index keeps both the forward map (type -> attrs) for membership checks
//! and the inverted map (attr -> types) to seed candidate sets cheaply.

use attrc_importer::FactBase;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// One plane's worth of `attrname -> {type}` / `type -> {attrname}` maps.
#[derive(Default)]
struct PlaneIndex {
    inverted: FxHashMap<String, BTreeSet<String>>,
    forward: FxHashMap<String, BTreeSet<String>>,
}

impl PlaneIndex {
    fn build(forward: FxHashMap<String, BTreeSet<String>>) -> Self {
        let mut inverted: FxHashMap<String, BTreeSet<String>> = FxHashMap::default();
        for (ty, attrs) in &forward {
            for attr in attrs {
                inverted.entry(attr.clone()).or_default().insert(ty.clone());
            }
        }
        Self { inverted, forward }
    }

    /// All `t` such that `attrnames ⊆ forward[t]`. Empty usage matches every
    /// type on this plane.
    fn types_for_usage(&self, attrnames: &[String]) -> BTreeSet<String> {
        if attrnames.is_empty() {
            return self.forward.keys().cloned().collect();
        }
        let Some(seed) = self.inverted.get(&attrnames[0]) else {
            return BTreeSet::new();
        };
        seed.iter()
            .filter(|t| {
                let Some(attrs) = self.forward.get(t.as_str()) else {
                    return false;
                };
                attrnames.iter().all(|a| attrs.contains(a))
            })
            .cloned()
            .collect()
    }
}

/// The three-plane attribute-type index.
pub struct AttributeTypeIndex {
    class: PlaneIndex,
    instance: PlaneIndex,
    module: PlaneIndex,
}

impl AttributeTypeIndex {
    /// Build the index from the Importer's three type -> attribute-set maps.
    #[must_use]
    pub fn build(facts: &FactBase) -> Self {
        let class_forward: FxHashMap<String, BTreeSet<String>> = facts
            .all_class_attrs
            .iter()
            .map(|(class, attrs)| (class.clone(), attrs.keys().cloned().collect()))
            .collect();
        let instance_forward = facts.all_combined_attrs.clone();
        let module_forward = facts.all_module_attrs.clone();

        Self {
            class: PlaneIndex::build(class_forward),
            instance: PlaneIndex::build(instance_forward),
            module: PlaneIndex::build(module_forward),
        }
    }

    #[must_use]
    pub fn class_types_for_usage(&self, attrnames: &[String]) -> BTreeSet<String> {
        self.class.types_for_usage(attrnames)
    }

    #[must_use]
    pub fn instance_types_for_usage(&self, attrnames: &[String]) -> BTreeSet<String> {
        self.instance.types_for_usage(attrnames)
    }

    #[must_use]
    pub fn module_types_for_usage(&self, attrnames: &[String]) -> BTreeSet<String> {
        self.module.types_for_usage(attrnames)
    }

    /// All attributes `t` provides on the class plane.
    #[must_use]
    pub fn attrs_of_class(&self, t: &str) -> BTreeSet<String> {
        self.class.forward.get(t).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn attrs_of_instance(&self, t: &str) -> BTreeSet<String> {
        self.instance.forward.get(t).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn attrs_of_module(&self, t: &str) -> BTreeSet<String> {
        self.module.forward.get(t).cloned().unwrap_or_default()
    }

    /// Insert a marker attribute directly into the class-plane forward/inverted
    /// maps without going through the Importer (used by the descendant-closure
    /// pass to inject `"#<ClassName>"` markers).
    pub fn inject_class_attr(&mut self, class: &str, attr: &str) {
        self.class.forward.entry(class.to_string()).or_default().insert(attr.to_string());
        self.class.inverted.entry(attr.to_string()).or_default().insert(class.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_facts() -> FactBase {
        let mut fb = FactBase::new();
        fb.set_class_attr("A", "f", "A");
        fb.set_instance_attr("A", "x");
        fb.set_instance_attr("B", "x");
        fb.set_instance_attr("B", "y");
        fb.set_module_attr("m", "g");
        fb
    }

    #[test]
    fn empty_usage_matches_all_types_on_plane() {
        let fb = sample_facts();
        let idx = AttributeTypeIndex::build(&fb);
        let types = idx.instance_types_for_usage(&[]);
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn usage_monotonicity_subset_implies_superset_of_types() {
        let fb = sample_facts();
        let idx = AttributeTypeIndex::build(&fb);
        let narrow = idx.instance_types_for_usage(&["x".to_string()]);
        let wide = idx.instance_types_for_usage(&["x".to_string(), "y".to_string()]);
        assert!(wide.is_subset(&narrow));
        assert!(narrow.contains("A"));
        assert!(narrow.contains("B"));
        assert!(!wide.contains("A"));
    }

    #[test]
    fn module_plane_is_independent_of_instance_plane() {
        let fb = sample_facts();
        let idx = AttributeTypeIndex::build(&fb);
        assert!(idx.module_types_for_usage(&["g".to_string()]).contains("m"));
        assert!(idx.instance_types_for_usage(&["g".to_string()]).is_empty());
    }

    #[test]
    fn inject_class_attr_is_visible_to_subsequent_queries() {
        let fb = sample_facts();
        let mut idx = AttributeTypeIndex::build(&fb);
        idx.inject_class_attr("B", "#B");
        let types = idx.class_types_for_usage(&["#B".to_string()]);
        assert!(types.contains("B"));
    }
}
