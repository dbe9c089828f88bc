//! Pipeline orchestration: runs the deducer's passes in the order the
//! spec requires — descendants before the attribute index, usage/access/
//! alias indexes before the solver, the mutation pass before reference
//! identification, solver and identifier before the classifier, classifier
//! before the writer.

use crate::attr_index::AttributeTypeIndex;
use crate::classifier::{AccessClassification, AttributeClassifier, GuardTest};
use crate::descendants::DescendantClosure;
use crate::identifier::ReferenceIdentifier;
use crate::indexes::{AccessorIndex, AliasIndex, AssignedAttrsIndex, UsageIndex};
use crate::solver::{self, record_reference_types, DeductionState, MethodContext};
use crate::writer::{
    AttributeRow, AttributeSummaryRow, AttributeWarningRow, DeducerArtifacts, DeducerWriter, GuardRow, MutationRow, TestRow, TypeRow,
    TypeSummaryRow, TypeWarningRow,
};
use attrc_common::{DiagnosticBag, DiagnosticKind};
use attrc_importer::{DefLocation, FactBase};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;

/// Everything the pipeline computed, kept around so callers (tests, or a
/// future driver) can inspect per-location state before writing it out.
pub struct DeducerOutput {
    pub states: FxHashMap<DefLocation, DeductionState>,
    pub artifacts: DeducerArtifacts,
    pub diagnostics: DiagnosticBag,
}

impl DeducerOutput {
    pub fn write(&self, output_dir: &Path) -> anyhow::Result<()> {
        DeducerWriter::write_all(output_dir, &self.artifacts)
    }
}

/// If `unit_path`'s first dotted component names a known class, this
/// location is inside one of that class's methods. A more precise derivation
/// would consult a dedicated "scope belongs to method of class" fact the
/// Importer does not expose; this heuristic is sufficient because `self`
/// usage only exists inside method bodies, whose scope path is always
/// rooted at the owning class's qualified name.
fn method_context_for<'a>(unit_path: &'a str, facts: &FactBase) -> Option<MethodContext<'a>> {
    let class = unit_path.split('.').next()?;
    facts.classes.contains_key(class).then_some(MethodContext { class })
}

fn all_module_names(facts: &FactBase) -> BTreeSet<String> {
    facts.all_module_attrs.keys().cloned().collect()
}

/// Run the full deducer pipeline over `facts`, mutating it in place (the
/// mutation pass writes `modified_attributes` and demotes class attributes
/// to `var`) and returning every per-location state plus the nine output
/// artifacts.
pub fn run(facts: &mut FactBase) -> DeducerOutput {
    tracing::debug!(modules = facts.modules.len(), classes = facts.classes.len(), "running deducer pipeline");

    // (a) descendants before attribute index.
    let descendants = DescendantClosure::build(facts);
    let mut attr_index = AttributeTypeIndex::build(facts);
    descendants.init_special_attributes(facts, &mut attr_index);

    // (b) usage/access/alias indexes before solver.
    let usage_index = UsageIndex::build(facts);
    let accessor_index = AccessorIndex::build(facts);
    let assigned_index = AssignedAttrsIndex::build(facts);
    let alias_index = AliasIndex::build(facts);

    let mut diagnostics = DiagnosticBag::new();

    // (c) mutation pass before reference identification.
    for (usage_key, (_scope, _name, attrnames)) in assigned_index.entries() {
        if let Some(attrname) = attrnames.last() {
            let candidates = attr_index.class_types_for_usage(usage_key);
            AttributeClassifier::run_mutation_pass(facts, &candidates, attrname, &mut diagnostics);
        }
    }

    // Solve every definition location's usage.
    let mut states: FxHashMap<DefLocation, DeductionState> = FxHashMap::default();
    let locations: Vec<DefLocation> = usage_index.locations().cloned().collect();
    for loc in &locations {
        let Some(usage) = usage_index.get(loc) else { continue };
        let method_self = method_context_for(&loc.unit_path, facts);
        let state = solver::solve_location(loc, usage, facts, &attr_index, &descendants, method_self);
        states.insert(loc.clone(), state);
    }

    // A definition location defined by an alias (`m.a = m.b.f`) inherits the
    // types of whatever reaches the aliased access - fold the reaching
    // definitions of every `resolve()`'d access into the alias's own state.
    for def in alias_index.locations() {
        let resolved = alias_index.resolve(def);
        if resolved.is_empty() {
            continue;
        }
        let mut inherited = DeductionState::default();
        let mut found_any = false;
        for access in resolved {
            for reaching_def in accessor_index.reaching(access) {
                if let Some(reaching_state) = states.get(reaching_def) {
                    record_reference_types(
                        &mut inherited,
                        &reaching_state.provider_class_types,
                        &reaching_state.provider_instance_types,
                        &reaching_state.provider_module_types,
                        reaching_state.reference_constrained,
                        reaching_state.constrained_specific,
                        false,
                    );
                    found_any = true;
                }
            }
        }
        if found_any {
            let state = states.entry(def.clone()).or_default();
            record_reference_types(
                state,
                &inherited.provider_class_types,
                &inherited.provider_instance_types,
                &inherited.provider_module_types,
                inherited.reference_constrained,
                inherited.constrained_specific,
                false,
            );
        }
    }

    let all_modules = all_module_names(facts);

    // (d) solver and identifier before classifier.
    let mut artifacts = DeducerArtifacts::default();

    for (loc, state) in &states {
        let location = loc.encode();
        let constrained = state.reference_constrained;
        let general_class = crate::classifier::general_class_types(&state.accessor_class_types, &descendants);
        let general_instance = crate::classifier::general_class_types(&state.accessor_instance_types, &descendants);
        let general_types: Vec<String> = general_class.union(&general_instance).chain(state.accessor_module_types.iter()).cloned().collect();
        let n_specific = state.accessor_all_types().len();

        // One row per non-empty accessor plane, each carrying that plane's
        // own general types and specific count - a location with both class
        // and instance accessor types gets two rows, not one with the
        // instance plane silently dropped.
        if !state.accessor_class_types.is_empty() {
            artifacts.types.push(TypeRow {
                location: location.clone(),
                constrained,
                kind: "class".to_string(),
                general_types: general_class.iter().cloned().collect(),
                n_specific: state.accessor_class_types.len(),
            });
        }
        if !state.accessor_instance_types.is_empty() {
            artifacts.types.push(TypeRow {
                location: location.clone(),
                constrained,
                kind: "instance".to_string(),
                general_types: general_instance.iter().cloned().collect(),
                n_specific: state.accessor_instance_types.len(),
            });
        }
        if !state.accessor_module_types.is_empty() {
            artifacts.types.push(TypeRow {
                location: location.clone(),
                constrained,
                kind: "module".to_string(),
                general_types: state.accessor_module_types.iter().cloned().collect(),
                n_specific: state.accessor_module_types.len(),
            });
        }

        if state.is_empty() {
            artifacts.types.push(TypeRow {
                location: location.clone(),
                constrained: false,
                kind: String::new(),
                general_types: Vec::new(),
                n_specific: 0,
            });
            artifacts.type_warnings.push(TypeWarningRow {
                location: location.clone(),
                attrs: Vec::new(),
            });
        }

        if constrained {
            artifacts.type_summary.push(TypeSummaryRow {
                location: location.clone(),
                constrained,
                guard: "unguarded".to_string(),
                general_types,
                n_specific,
            });
            continue;
        }

        match AttributeClassifier::classify_accessor(state, &descendants, &all_modules) {
            Some(test) => {
                // The guards file carries the accessor types actually
                // present at this location, not the guard's admitted
                // universe: a specific guard writes the exact accessor set,
                // a common guard writes its general (ancestor-collapsed) set.
                let guard_types: Vec<String> = if test.encode().starts_with("specific") {
                    state.accessor_all_types().into_iter().collect()
                } else {
                    general_types.clone()
                };
                artifacts.guards.push(GuardRow {
                    location: location.clone(),
                    guard_test: test.encode(),
                    kind: guard_kind_label(&test),
                    types: guard_types,
                });
                artifacts.type_summary.push(TypeSummaryRow {
                    location,
                    constrained,
                    guard: test.encode(),
                    general_types,
                    n_specific,
                });
            }
            None => {
                artifacts.type_summary.push(TypeSummaryRow {
                    location,
                    constrained,
                    guard: "unguarded".to_string(),
                    general_types,
                    n_specific,
                });
            }
        }
    }

    for access in accessor_index.accesses() {
        let reaching = accessor_index.reaching(access);
        let reaching_states: Vec<&DeductionState> = reaching.iter().filter_map(|d| states.get(d)).collect();
        let access_location = access.encode();
        let constrained = reaching_states.iter().any(|s| s.reference_constrained);

        let mut refs = Vec::new();
        let mut plane = "";
        for state in &reaching_states {
            for t in &state.provider_class_types {
                if let Some(attrname) = access.attrnames.last() {
                    for found in ReferenceIdentifier::identify(facts, attrname, &BTreeSet::from([t.clone()]), &BTreeSet::new(), &BTreeSet::new()) {
                        refs.push(found.reference.encode());
                        plane = "class";
                    }
                }
            }
            for t in &state.provider_instance_types {
                if let Some(attrname) = access.attrnames.last() {
                    for found in ReferenceIdentifier::identify(facts, attrname, &BTreeSet::new(), &BTreeSet::from([t.clone()]), &BTreeSet::new()) {
                        refs.push(found.reference.encode());
                        plane = "instance";
                    }
                }
            }
            for t in &state.provider_module_types {
                if let Some(attrname) = access.attrnames.last() {
                    for found in ReferenceIdentifier::identify(facts, attrname, &BTreeSet::new(), &BTreeSet::new(), &BTreeSet::from([t.clone()])) {
                        refs.push(found.reference.encode());
                        plane = "module";
                    }
                }
            }
        }
        artifacts.attributes.push(AttributeRow {
            access_location: access_location.clone(),
            constrained,
            plane: plane.to_string(),
            refs: refs.clone(),
        });

        if refs.is_empty() {
            artifacts.attribute_warnings.push(AttributeWarningRow {
                access_location: access_location.clone(),
            });
        }

        let classification = AttributeClassifier::classify_access(&reaching_states, &access.attrnames, &attr_index, &descendants, &all_modules);
        let test_type = match &classification {
            AccessClassification::Validate => None,
            other => Some(other.encode()),
        };
        artifacts.attribute_summary.push(AttributeSummaryRow {
            access_location: access_location.clone(),
            constrained,
            test_type: test_type.clone(),
            attrs: access.attrnames.clone(),
        });

        let test_row = match &classification {
            AccessClassification::Validate => TestRow::Validate { access_location: access_location.clone() },
            other => {
                let accessor_type = reaching_states
                    .first()
                    .map(|s| s.accessor_all_types())
                    .and_then(|t| t.iter().next().cloned())
                    .unwrap_or_default();
                TestRow::Typed {
                    access_location: access_location.clone(),
                    test_type: other.encode(),
                    attrs: access.attrnames.clone(),
                    accessor_type,
                }
            }
        };
        artifacts.tests.push(test_row);
    }

    for (path, reference) in &facts.modified_attributes {
        artifacts.mutations.push(MutationRow {
            qualified_name: path.clone(),
            original_kind: reference.kind().to_string(),
        });
    }

    for row in &artifacts.type_warnings {
        diagnostics.warn(DiagnosticKind::TypeWarning, row.location.clone(), "empty accessor type set after deduction");
    }

    DeducerOutput { states, artifacts, diagnostics }
}

fn guard_kind_label(test: &GuardTest) -> String {
    match test {
        GuardTest::Specific(k, _) | GuardTest::Common(k, _) => k.to_string(),
        GuardTest::SpecificObject(_) | GuardTest::CommonObject(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrc_importer::{Reference, Usage};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn s1_end_to_end_pipeline_produces_type_and_guard_rows() {
        init_tracing();
        let mut fb = FactBase::new();
        fb.add_class("A", vec![]);
        fb.add_class("B", vec![]);
        fb.add_class("C", vec![]);
        fb.add_subclass("A", "B");
        fb.add_subclass("A", "C");
        fb.set_class_attr("A", "f", "A");
        fb.set_object("A.f", Reference::function("A.f"));
        fb.modules
            .entry("m".to_string())
            .or_default()
            .record_usage("m", "obj", 0, vec!["f".to_string()]);

        let output = run(&mut fb);
        let loc = DefLocation::new("m", "obj", 0);
        let state = output.states.get(&loc).expect("solved location");
        assert!(state.accessor_class_types.contains("A"));
        assert!(!output.artifacts.types.is_empty());
    }

    #[test]
    fn aliased_definition_inherits_types_from_the_access_it_aliases() {
        let mut fb = FactBase::new();
        fb.add_class("A", vec![]);
        fb.set_class_attr("A", "f", "A");
        fb.set_object("A.f", Reference::function("A.f"));
        fb.modules
            .entry("m".to_string())
            .or_default()
            .record_usage("m", "c", 0, vec!["f".to_string()]);
        fb.modules
            .entry("m".to_string())
            .or_default()
            .record_accessor("m", "c", vec!["f".to_string()], vec![0]);
        // `m.b` (version 0) is defined by the access `m.c.f`.
        fb.all_aliased_names
            .entry("m.b".to_string())
            .or_default()
            .insert(0, ("c".to_string(), vec!["f".to_string()], 0));

        let output = run(&mut fb);
        let aliased = output.states.get(&DefLocation::new("m", "b", 0)).expect("alias location solved");
        assert!(aliased.accessor_class_types.contains("A"));
    }

    #[test]
    fn method_context_detects_self_inside_known_class() {
        let mut fb = FactBase::new();
        fb.add_class("C", vec![]);
        let ctx = method_context_for("C.m", &fb);
        assert_eq!(ctx.unwrap().class, "C");
        assert!(method_context_for("unknown.m", &fb).is_none());
    }

    #[test]
    fn empty_usage_set_produces_no_states() {
        let mut fb = FactBase::new();
        let output = run(&mut fb);
        assert!(output.states.is_empty());
        let _ = Usage::new();
    }
}
