//! Classifier - general-type closures, guard kinds, access-level
//! test kinds, and the mutation pass that demotes mutated class attributes
//! to `var`.

use crate::attr_index::AttributeTypeIndex;
use crate::descendants::DescendantClosure;
use crate::solver::DeductionState;
use attrc_common::{DiagnosticBag, DiagnosticKind};
use attrc_importer::{Importer, Reference, ReferenceKind};
use std::collections::BTreeSet;

/// A guard kind: what a one-time runtime check would prove about an
/// accessor, and the type set that check would admit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardTest {
    Specific(ReferenceKind, BTreeSet<String>),
    SpecificObject(BTreeSet<String>),
    Common(ReferenceKind, BTreeSet<String>),
    CommonObject(BTreeSet<String>),
}

impl GuardTest {
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Specific(k, _) => format!("specific-{k}"),
            Self::SpecificObject(_) => "specific-object".to_string(),
            Self::Common(k, _) => format!("common-{k}"),
            Self::CommonObject(_) => "common-object".to_string(),
        }
    }

    /// The type set a guard of this kind admits - used by the guard-subset
    /// rule.
    #[must_use]
    pub fn admitted_types(&self) -> &BTreeSet<String> {
        match self {
            Self::Specific(_, t) | Self::SpecificObject(t) | Self::Common(_, t) | Self::CommonObject(t) => t,
        }
    }
}

/// The three accessor-type planes a guard test is computed from.
#[derive(Clone, Debug, Default)]
pub struct AccessorPlanes {
    pub class: BTreeSet<String>,
    pub instance: BTreeSet<String>,
    pub module: BTreeSet<String>,
}

impl AccessorPlanes {
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.class.len() + self.instance.len() + self.module.len()
    }

    #[must_use]
    pub fn union_all(&self, other: &Self) -> Self {
        Self {
            class: self.class.union(&other.class).cloned().collect(),
            instance: self.instance.union(&other.instance).cloned().collect(),
            module: self.module.union(&other.module).cloned().collect(),
        }
    }

    #[must_use]
    pub fn from_state(state: &DeductionState) -> Self {
        Self {
            class: state.accessor_class_types.clone(),
            instance: state.accessor_instance_types.clone(),
            module: state.accessor_module_types.clone(),
        }
    }

    #[must_use]
    pub fn from_provider(state: &DeductionState) -> Self {
        Self {
            class: state.provider_class_types.clone(),
            instance: state.provider_instance_types.clone(),
            module: state.provider_module_types.clone(),
        }
    }
}

/// Collapse `types` to the most-general representatives: repeatedly drop a
/// class's full descendant set from the result once that whole set is
/// already present, keeping the ancestor.
#[must_use]
pub fn general_class_types(types: &BTreeSet<String>, descendants: &DescendantClosure) -> BTreeSet<String> {
    let mut result = types.clone();
    loop {
        let mut changed = false;
        for candidate in types {
            if !result.contains(candidate) {
                continue;
            }
            let desc = descendants.of(candidate);
            if desc.is_empty() || !desc.is_subset(&result) {
                continue;
            }
            let before = result.len();
            for d in &desc {
                result.remove(d);
            }
            if result.len() != before {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    result
}

/// True iff every declared module is present in `module_types` -,
/// a fully-populated module set carries no information and collapses to
/// the `object` sentinel.
#[must_use]
pub fn modules_collapse_to_object(module_types: &BTreeSet<String>, all_modules: &BTreeSet<String>) -> bool {
    !all_modules.is_empty() && all_modules.iter().all(|m| module_types.contains(m))
}

/// A root `c` such that every member of `set` is `c` or a descendant of
/// `c`. Only meaningful for `set.len() > 1` (the `|set| == 1` case is
/// handled by the caller's specific-kind branch).
fn single_root(set: &BTreeSet<String>, descendants: &DescendantClosure) -> Option<String> {
    if set.len() <= 1 {
        return None;
    }
    set.iter().find(|candidate| set.is_subset(&descendants.inclusive_of(candidate))).cloned()
}

/// Compute the guard test for one accessor-type triple. `None`
/// is the `∅` row: no guard can be installed.
#[must_use]
pub fn guard_test(planes: &AccessorPlanes, descendants: &DescendantClosure, all_modules: &BTreeSet<String>) -> Option<GuardTest> {
    if planes.total_len() == 1 {
        if !planes.class.is_empty() {
            return Some(GuardTest::Specific(ReferenceKind::Class, planes.class.clone()));
        }
        if !planes.instance.is_empty() {
            return Some(GuardTest::Specific(ReferenceKind::Instance, planes.instance.clone()));
        }
        return Some(GuardTest::Specific(ReferenceKind::Module, planes.module.clone()));
    }

    if planes.module.is_empty() {
        let combined: BTreeSet<String> = planes.class.union(&planes.instance).cloned().collect();
        if let Some(root) = single_root(&combined, descendants) {
            let admitted = descendants.inclusive_of(&root);
            return Some(GuardTest::SpecificObject(admitted));
        }
    }

    let g_class = general_class_types(&planes.class, descendants);
    let g_instance = general_class_types(&planes.instance, descendants);
    let module_collapsed = modules_collapse_to_object(&planes.module, all_modules);
    let g_module = if module_collapsed { BTreeSet::new() } else { planes.module.clone() };
    let g_total = g_class.len() + g_instance.len() + g_module.len() + usize::from(module_collapsed);

    if g_total == 1 {
        if module_collapsed {
            return Some(GuardTest::CommonObject(all_modules.clone()));
        }
        if !g_class.is_empty() {
            return Some(GuardTest::Common(ReferenceKind::Class, g_class));
        }
        if !g_instance.is_empty() {
            return Some(GuardTest::Common(ReferenceKind::Instance, g_instance));
        }
        return Some(GuardTest::Common(ReferenceKind::Module, g_module));
    }

    if !module_collapsed && g_module.is_empty() {
        let combined: BTreeSet<String> = g_class.union(&g_instance).cloned().collect();
        if let Some(root) = single_root(&combined, descendants) {
            let admitted = descendants.inclusive_of(&root);
            return Some(GuardTest::CommonObject(admitted));
        }
    }

    None
}

/// The test an access location would need to confirm the nature of the
/// attribute it reaches, computed from the union of every reaching
/// definition's accessor and provider planes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessClassification {
    Guarded(String),
    Specific(ReferenceKind, BTreeSet<String>),
    SpecificObject(BTreeSet<String>),
    Common(ReferenceKind, BTreeSet<String>),
    CommonObject(BTreeSet<String>),
    Validate,
}

impl AccessClassification {
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Guarded(test) => format!("guarded-{test}"),
            Self::Specific(k, _) => format!("specific-{k}"),
            Self::SpecificObject(_) => "specific-object".to_string(),
            Self::Common(k, _) => format!("common-{k}"),
            Self::CommonObject(_) => "common-object".to_string(),
            Self::Validate => "validate".to_string(),
        }
    }
}

#[derive(Default)]
pub struct AttributeClassifier;

impl AttributeClassifier {
    /// Accessor classification for one definition location. Only meaningful
    /// for unconstrained locations - callers should skip constrained
    /// locations entirely.
    #[must_use]
    pub fn classify_accessor(state: &DeductionState, descendants: &DescendantClosure, all_modules: &BTreeSet<String>) -> Option<GuardTest> {
        let planes = AccessorPlanes::from_state(state);
        guard_test(&planes, descendants, all_modules)
    }

    /// Access classification for one access location, given every reaching
    /// definition's deduction state and the attribute names actually
    /// reached at this access.
    #[must_use]
    pub fn classify_access(
        reaching: &[&DeductionState],
        accessed_attrs: &[String],
        attr_index: &AttributeTypeIndex,
        descendants: &DescendantClosure,
        all_modules: &BTreeSet<String>,
    ) -> AccessClassification {
        let mut accessor = AccessorPlanes::default();
        let mut provider = AccessorPlanes::default();
        for state in reaching {
            accessor = accessor.union_all(&AccessorPlanes::from_state(state));
            provider = provider.union_all(&AccessorPlanes::from_provider(state));
        }

        if let Some(test) = guard_test(&accessor, descendants, all_modules) {
            let provided = attrs_provided_by(test.admitted_types(), attr_index);
            if accessed_attrs.iter().all(|a| provided.contains(a)) {
                return AccessClassification::Guarded(test.encode());
            }
        }

        let provider_combined: BTreeSet<String> = provider.class.union(&provider.instance).cloned().collect();
        if provider.module.is_empty() && provider_combined.len() == 1 {
            let only = provider_combined.iter().next().cloned().unwrap_or_default();
            let kind = if provider.class.contains(&only) { ReferenceKind::Class } else { ReferenceKind::Instance };
            return AccessClassification::Specific(kind, BTreeSet::from([only]));
        }
        if provider.class.is_empty() && provider.instance.is_empty() && provider.module.len() == 1 {
            return AccessClassification::Specific(ReferenceKind::Module, provider.module.clone());
        }
        if let Some(root) = single_root(&provider_combined, descendants) {
            return AccessClassification::SpecificObject(descendants.inclusive_of(&root));
        }

        let g_class = general_class_types(&provider.class, descendants);
        let g_instance = general_class_types(&provider.instance, descendants);
        let g_combined: BTreeSet<String> = g_class.union(&g_instance).cloned().collect();
        if provider.module.is_empty() && g_combined.len() == 1 {
            let only = g_combined.iter().next().cloned().unwrap_or_default();
            let kind = if g_class.contains(&only) { ReferenceKind::Class } else { ReferenceKind::Instance };
            return AccessClassification::Common(kind, BTreeSet::from([only]));
        }
        if let Some(root) = single_root(&g_combined, descendants) {
            return AccessClassification::CommonObject(descendants.inclusive_of(&root));
        }

        AccessClassification::Validate
    }

    /// Mutation pass: for one `(usage-key, (path, name, attrnames))`
    /// reached by an assignment and its candidate class types, demote any
    /// class attribute shown to have a pre-existing value to `var`,
    /// recording the original in `modified_attributes` and raising a
    /// `MutationConflict` diagnostic.
    pub fn run_mutation_pass(facts: &mut attrc_importer::FactBase, candidate_classes: &BTreeSet<String>, attrname: &str, diagnostics: &mut DiagnosticBag) {
        for class in candidate_classes {
            let Some(defining_path) = facts.class_attr_defining_path(class, attrname) else {
                continue;
            };
            let Some(previous) = facts.get_object(&defining_path).cloned() else {
                continue;
            };
            if previous.has_kind(ReferenceKind::Var) {
                continue;
            }
            diagnostics.warn(
                DiagnosticKind::MutationConflict,
                defining_path.clone(),
                format!("class attribute demoted to var, was {previous}"),
            );
            facts.modified_attributes.insert(defining_path.clone(), previous);
            facts.set_object(&defining_path, Reference::var());
        }
    }
}

fn attrs_provided_by(types: &BTreeSet<String>, attr_index: &AttributeTypeIndex) -> BTreeSet<String> {
    let mut provided = BTreeSet::new();
    for t in types {
        provided.extend(attr_index.attrs_of_class(t));
        provided.extend(attr_index.attrs_of_instance(t));
        provided.extend(attr_index.attrs_of_module(t));
    }
    provided
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrc_importer::FactBase;

    fn s1_hierarchy() -> (FactBase, DescendantClosure) {
        let mut fb = FactBase::new();
        fb.add_class("A", vec![]);
        fb.add_class("B", vec![]);
        fb.add_class("C", vec![]);
        fb.add_subclass("A", "B");
        fb.add_subclass("A", "C");
        let closure = DescendantClosure::build(&fb);
        (fb, closure)
    }

    #[test]
    fn s1_general_types_collapse_to_ancestor() {
        let (_fb, closure) = s1_hierarchy();
        let types = BTreeSet::from(["A".to_string(), "B".to_string(), "C".to_string()]);
        let general = general_class_types(&types, &closure);
        assert_eq!(general, BTreeSet::from(["A".to_string()]));
    }

    #[test]
    fn single_type_is_specific() {
        let (_fb, closure) = s1_hierarchy();
        let planes = AccessorPlanes {
            class: BTreeSet::from(["A".to_string()]),
            instance: BTreeSet::new(),
            module: BTreeSet::new(),
        };
        let test = guard_test(&planes, &closure, &BTreeSet::new()).unwrap();
        assert_eq!(test.encode(), "specific-class");
    }

    #[test]
    fn subclasses_of_one_root_are_specific_object() {
        let (_fb, closure) = s1_hierarchy();
        let planes = AccessorPlanes {
            class: BTreeSet::new(),
            instance: BTreeSet::from(["B".to_string(), "C".to_string()]),
            module: BTreeSet::new(),
        };
        let test = guard_test(&planes, &closure, &BTreeSet::new()).unwrap();
        assert_eq!(test.encode(), "specific-object");
    }

    #[test]
    fn unrelated_types_yield_no_guard() {
        let mut fb = FactBase::new();
        fb.add_class("X", vec![]);
        fb.add_class("Y", vec![]);
        let closure = DescendantClosure::build(&fb);
        let planes = AccessorPlanes {
            class: BTreeSet::from(["X".to_string(), "Y".to_string()]),
            instance: BTreeSet::new(),
            module: BTreeSet::new(),
        };
        assert!(guard_test(&planes, &closure, &BTreeSet::new()).is_none());
    }

    #[test]
    fn s4_guarded_access_with_all_attrs_provided() {
        let mut fb = FactBase::new();
        fb.add_class("K", vec![]);
        fb.set_class_attr("K", "g", "K");
        let closure = DescendantClosure::build(&fb);
        let index = AttributeTypeIndex::build(&fb);
        let mut state = DeductionState::default();
        state.accessor_class_types.insert("K".to_string());
        state.provider_class_types.insert("K".to_string());
        let classification = AttributeClassifier::classify_access(&[&state], &["g".to_string()], &index, &closure, &BTreeSet::new());
        assert_eq!(classification.encode(), "guarded-specific-class");
    }

    #[test]
    fn falls_back_to_validate_when_nothing_else_fires() {
        let mut fb = FactBase::new();
        fb.add_class("X", vec![]);
        fb.add_class("Y", vec![]);
        let closure = DescendantClosure::build(&fb);
        let index = AttributeTypeIndex::build(&fb);
        let mut state = DeductionState::default();
        state.accessor_class_types.insert("X".to_string());
        state.accessor_instance_types.insert("Y".to_string());
        state.provider_class_types.insert("X".to_string());
        state.provider_instance_types.insert("Y".to_string());
        let classification = AttributeClassifier::classify_access(&[&state], &["z".to_string()], &index, &closure, &BTreeSet::new());
        assert_eq!(classification, AccessClassification::Validate);
    }

    #[test]
    fn s5_mutation_pass_demotes_class_attribute_to_var() {
        let mut fb = FactBase::new();
        fb.set_class_attr("A", "f", "A");
        fb.set_object("A.f", Reference::function("A.f"));
        let candidates = BTreeSet::from(["A".to_string()]);
        let mut diagnostics = DiagnosticBag::new();
        AttributeClassifier::run_mutation_pass(&mut fb, &candidates, "f", &mut diagnostics);
        assert_eq!(fb.modified_attributes.get("A.f"), Some(&Reference::function("A.f")));
        assert_eq!(fb.get_object("A.f"), Some(&Reference::var()));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn s5_mutation_pass_is_a_no_op_once_already_var() {
        let mut fb = FactBase::new();
        fb.set_class_attr("A", "f", "A");
        fb.set_object("A.f", Reference::var());
        let candidates = BTreeSet::from(["A".to_string()]);
        let mut diagnostics = DiagnosticBag::new();
        AttributeClassifier::run_mutation_pass(&mut fb, &candidates, "f", &mut diagnostics);
        assert!(fb.modified_attributes.get("A.f").is_none());
        assert!(diagnostics.is_empty());
    }
}
