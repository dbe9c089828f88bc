//! The type solver - `get_target_types` / `record_types_for_usage`.
//!
//! For each definition location and each usage-key observed at it, the
//! solver works out which types could be providing the attributes that
//! usage names, and which types the runtime accessor could actually be.
//! Those two sets differ exactly when a class supplies an attribute that is
//! read through one of its instances.

use crate::attr_index::AttributeTypeIndex;
use crate::descendants::DescendantClosure;
use attrc_importer::{DefLocation, FactBase, Importer, Reference, ReferenceKind};
use std::collections::BTreeSet;

/// Per-location deduction state: the provider/accessor type sets on
/// each plane, plus the constrained flags the classifier reads.
#[derive(Default, Clone, Debug)]
pub struct DeductionState {
    pub provider_class_types: BTreeSet<String>,
    pub provider_instance_types: BTreeSet<String>,
    pub provider_module_types: BTreeSet<String>,
    pub accessor_class_types: BTreeSet<String>,
    pub accessor_instance_types: BTreeSet<String>,
    pub accessor_module_types: BTreeSet<String>,
    pub reference_constrained: bool,
    /// True when the accessor is known to be the class object itself, not
    /// an instance - the accessor's class-plane types must NOT be mirrored
    /// onto the instance plane when this is set.
    pub constrained_specific: bool,
}

impl DeductionState {
    #[must_use]
    pub fn accessor_all_types(&self) -> BTreeSet<String> {
        self.accessor_class_types
            .iter()
            .chain(self.accessor_instance_types.iter())
            .chain(self.accessor_module_types.iter())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessor_all_types().is_empty()
    }
}

/// Describes which class/method a `self` usage appears inside, for the
/// self-narrowing step. `None` outside any method body.
#[derive(Clone, Copy, Debug)]
pub struct MethodContext<'a> {
    pub class: &'a str,
}

/// The result of solving one usage-key at one location, before it is merged
/// into the accumulated [`DeductionState`].
#[derive(Default)]
struct SolvedUsage {
    provider_class: BTreeSet<String>,
    provider_instance: BTreeSet<String>,
    provider_module: BTreeSet<String>,
    constrained: bool,
    constrained_specific: bool,
    is_self: bool,
}

/// `qualify(path, name)` - the dotted lookup key for `Importer::identify`.
#[must_use]
pub fn qualify(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn reference_into_planes(r: &Reference) -> (BTreeSet<String>, BTreeSet<String>, BTreeSet<String>) {
    let mut class = BTreeSet::new();
    let mut instance = BTreeSet::new();
    let mut module = BTreeSet::new();
    if let Some(origin) = r.origin() {
        match r.kind() {
            ReferenceKind::Class => {
                class.insert(origin.to_string());
            }
            ReferenceKind::Instance => {
                instance.insert(origin.to_string());
            }
            ReferenceKind::Module => {
                module.insert(origin.to_string());
            }
            ReferenceKind::Function | ReferenceKind::Var | ReferenceKind::Depends => {}
        }
    }
    (class, instance, module)
}

/// Solve a single usage-key at `loc`.
fn solve_one(
    loc: &DefLocation,
    usage_key: &[String],
    facts: &impl Importer,
    attr_index: &AttributeTypeIndex,
    descendants: &DescendantClosure,
    method_self: Option<MethodContext<'_>>,
) -> SolvedUsage {
    // Step 1: initialised-name override.
    if let Some(reference) = initialised_name(loc, facts) {
        let (class, instance, module) = reference_into_planes(&reference);
        return SolvedUsage {
            provider_class: class,
            provider_instance: instance,
            provider_module: module,
            constrained: true,
            constrained_specific: false,
            is_self: loc.name == "self",
        };
    }

    // Step 2: usage-based candidates.
    let class_types = attr_index.class_types_for_usage(usage_key);
    let instance_types = attr_index.instance_types_for_usage(usage_key);
    let only_instance_types: BTreeSet<String> = instance_types.difference(&class_types).cloned().collect();
    let module_types = attr_index.module_types_for_usage(usage_key);

    let mut solved = SolvedUsage {
        provider_class: class_types,
        provider_instance: only_instance_types,
        provider_module: module_types,
        constrained: false,
        constrained_specific: false,
        is_self: loc.name == "self",
    };

    // Step 3: contextual constraint via an identified static object.
    let qualified = qualify(&loc.unit_path, &loc.name);
    if let Some(identified) = facts.identify(&qualified) {
        match identified.kind() {
            ReferenceKind::Class => {
                let origin = identified.origin().unwrap_or_default().to_string();
                solved.provider_class = BTreeSet::from([origin]);
                solved.provider_instance.clear();
                solved.provider_module.clear();
                solved.constrained = true;
                solved.constrained_specific = true;
            }
            ReferenceKind::Module => {
                let origin = identified.origin().unwrap_or_default().to_string();
                solved.provider_module = BTreeSet::from([origin]);
                solved.provider_class.clear();
                solved.provider_instance.clear();
                solved.constrained = true;
            }
            _ => {}
        }
    }

    // Step 4: self-narrowing.
    if loc.name == "self" {
        if let Some(ctx) = method_self {
            let allowed = descendants.inclusive_of(ctx.class);
            solved.provider_instance = solved
                .provider_instance
                .union(&solved.provider_class)
                .cloned()
                .collect::<BTreeSet<_>>()
                .intersection(&allowed)
                .cloned()
                .collect();
            solved.provider_class.clear();
            solved.provider_module.clear();
            solved.constrained = true;
        }
    }

    solved
}

/// An initialised name's override is recorded under the same `objects`
/// table `identify` reads, keyed by `"<path>.<name>@init"` - a convention
/// local to this crate rather than a third Importer method, so a bare
/// `Importer` fixture can still exercise the override without adding a
/// fact-base-shaped method the trait doesn't otherwise need.
fn initialised_name(loc: &DefLocation, facts: &impl Importer) -> Option<Reference> {
    let qualified = qualify(&loc.unit_path, &loc.name);
    let _ = loc.version;
    facts.identify(&format!("{qualified}@init"))
}

/// Merge a solved usage-key into the accumulated per-location state,
/// applying the "key rule": class types propagate to the instance accessor
/// plane unless `constrained_specific` is set, and `self` suppresses the
/// class/module accessor planes.
pub fn record_reference_types(state: &mut DeductionState, solved_provider_class: &BTreeSet<String>, solved_provider_instance: &BTreeSet<String>, solved_provider_module: &BTreeSet<String>, constrained: bool, constrained_specific: bool, is_self: bool) {
    state.provider_class_types.extend(solved_provider_class.iter().cloned());
    state.provider_instance_types.extend(solved_provider_instance.iter().cloned());
    state.provider_module_types.extend(solved_provider_module.iter().cloned());

    if is_self {
        state.accessor_instance_types.extend(solved_provider_instance.iter().cloned());
        state.accessor_instance_types.extend(solved_provider_class.iter().cloned());
    } else {
        state.accessor_class_types.extend(solved_provider_class.iter().cloned());
        state.accessor_module_types.extend(solved_provider_module.iter().cloned());
        state.accessor_instance_types.extend(solved_provider_instance.iter().cloned());
        if !constrained_specific {
            state.accessor_instance_types.extend(solved_provider_class.iter().cloned());
        }
    }

    state.reference_constrained = state.reference_constrained || constrained;
    state.constrained_specific = state.constrained_specific || constrained_specific;
}

/// Solve every usage-key observed at `loc` against its `Usage`, merging the
/// results into a single [`DeductionState`].
#[must_use]
pub fn solve_location(
    loc: &DefLocation,
    usage: &attrc_importer::Usage,
    facts: &impl Importer,
    attr_index: &AttributeTypeIndex,
    descendants: &DescendantClosure,
    method_self: Option<MethodContext<'_>>,
) -> DeductionState {
    let mut state = DeductionState::default();
    for branch in usage.branches() {
        let solved = solve_one(loc, branch, facts, attr_index, descendants, method_self);
        record_reference_types(
            &mut state,
            &solved.provider_class,
            &solved.provider_instance,
            &solved.provider_module,
            solved.constrained,
            solved.constrained_specific,
            solved.is_self,
        );
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrc_importer::{FactBase, Usage};

    fn class_hierarchy() -> (FactBase, DescendantClosure) {
        let mut fb = FactBase::new();
        fb.add_class("C", vec![]);
        fb.add_class("D", vec![]);
        fb.add_class("E", vec![]);
        fb.add_subclass("C", "D");
        fb.set_instance_attr("C", "x");
        fb.set_instance_attr("D", "x");
        fb.set_instance_attr("E", "x");
        let closure = DescendantClosure::build(&fb);
        (fb, closure)
    }

    #[test]
    fn s2_self_narrowing_excludes_unrelated_class() {
        let (fb, closure) = class_hierarchy();
        let index = AttributeTypeIndex::build(&fb);
        let mut usage = Usage::new();
        usage.observe(["x"]);
        let loc = DefLocation::new("C.m", "self", 0);
        let state = solve_location(&loc, &usage, &fb, &index, &closure, Some(MethodContext { class: "C" }));
        assert_eq!(
            state.accessor_instance_types,
            BTreeSet::from(["C".to_string(), "D".to_string()])
        );
        assert!(state.accessor_class_types.is_empty());
        assert!(state.accessor_module_types.is_empty());
        assert!(state.reference_constrained);
    }

    #[test]
    fn s3_initialised_name_override_pins_class() {
        let mut fb = FactBase::new();
        fb.add_class("K", vec![]);
        fb.set_object("m.f@init", Reference::class("m.K"));
        let index = AttributeTypeIndex::build(&fb);
        let closure = DescendantClosure::build(&fb);
        let mut usage = Usage::new();
        usage.observe(Vec::<String>::new());
        let loc = DefLocation::new("m", "f", 0);
        let state = solve_location(&loc, &usage, &fb, &index, &closure, None);
        assert_eq!(state.provider_class_types, BTreeSet::from(["m.K".to_string()]));
        assert!(state.provider_instance_types.is_empty());
        assert!(state.provider_module_types.is_empty());
        assert!(state.reference_constrained);
    }

    #[test]
    fn class_types_propagate_to_instance_accessor_plane_unless_constrained_specific() {
        let mut fb = FactBase::new();
        fb.add_class("A", vec![]);
        fb.set_class_attr("A", "f", "A");
        let index = AttributeTypeIndex::build(&fb);
        let closure = DescendantClosure::build(&fb);
        let mut usage = Usage::new();
        usage.observe(["f"]);
        let loc = DefLocation::new("m", "obj", 0);
        let state = solve_location(&loc, &usage, &fb, &index, &closure, None);
        assert!(state.accessor_class_types.contains("A"));
        assert!(state.accessor_instance_types.contains("A"));
    }

    #[test]
    fn constrained_specific_suppresses_instance_accessor_mirroring() {
        let mut fb = FactBase::new();
        fb.add_class("A", vec![]);
        fb.set_object("m.obj", Reference::class("A"));
        let index = AttributeTypeIndex::build(&fb);
        let closure = DescendantClosure::build(&fb);
        let mut usage = Usage::new();
        usage.observe(Vec::<String>::new());
        let loc = DefLocation::new("m", "obj", 0);
        let state = solve_location(&loc, &usage, &fb, &index, &closure, None);
        assert!(state.constrained_specific);
        assert!(state.accessor_instance_types.is_empty());
        assert!(state.accessor_class_types.contains("A"));
    }
}
