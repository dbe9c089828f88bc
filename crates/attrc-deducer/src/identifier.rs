//! Reference identifier - `_identify_reference_attribute`.
//!
//! Turns `(attrname, class_types, instance_types, module_types)` into the
//! set of concrete attribute references those types could resolve the
//! access to. Feeds both constant-access resolution and the guarded-subset
//! check in the classifier.

use attrc_importer::{Importer, Reference, ReferenceKind};
use std::collections::BTreeSet;

/// One identified attribute: the plane it was found on, the type that
/// provided it, and the reference itself.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdentifiedAttr {
    pub plane: ReferenceKind,
    pub origin_type: String,
    pub reference: Reference,
}

#[derive(Default)]
pub struct ReferenceIdentifier;

impl ReferenceIdentifier {
    /// Resolve one attribute name across the three candidate type sets.
    /// Each plane's lookups are independent; results are unioned.
    #[must_use]
    pub fn identify(
        facts: &impl Importer,
        attrname: &str,
        class_types: &BTreeSet<String>,
        instance_types: &BTreeSet<String>,
        module_types: &BTreeSet<String>,
    ) -> Vec<IdentifiedAttr> {
        let mut found = Vec::new();

        for t in class_types {
            if let Some(r) = facts.get_class_attribute(t, attrname) {
                found.push(IdentifiedAttr {
                    plane: ReferenceKind::Class,
                    origin_type: t.clone(),
                    reference: r,
                });
            }
            for r in facts.get_instance_attributes(t, attrname) {
                found.push(IdentifiedAttr {
                    plane: ReferenceKind::Instance,
                    origin_type: t.clone(),
                    reference: r,
                });
            }
        }

        for t in instance_types {
            let instance_attrs = facts.get_instance_attributes(t, attrname);
            if instance_attrs.is_empty() {
                if let Some(r) = facts.get_class_attribute(t, attrname) {
                    found.push(IdentifiedAttr {
                        plane: ReferenceKind::Class,
                        origin_type: t.clone(),
                        reference: r,
                    });
                }
            } else {
                for r in instance_attrs {
                    found.push(IdentifiedAttr {
                        plane: ReferenceKind::Instance,
                        origin_type: t.clone(),
                        reference: r,
                    });
                }
            }
        }

        for t in module_types {
            if let Some(r) = facts.get_module_attribute(t, attrname) {
                found.push(IdentifiedAttr {
                    plane: ReferenceKind::Module,
                    origin_type: t.clone(),
                    reference: r,
                });
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrc_importer::FactBase;

    #[test]
    fn class_attribute_also_surfaces_instance_attribute_constants() {
        let mut fb = FactBase::new();
        fb.set_class_attr("A", "f", "A");
        fb.set_object("A.f", Reference::function("A.f"));
        fb.all_instance_attr_constants
            .entry("A".to_string())
            .or_default()
            .insert("f".to_string(), Reference::instance("A"));

        let class_types = BTreeSet::from(["A".to_string()]);
        let found = ReferenceIdentifier::identify(&fb, "f", &class_types, &BTreeSet::new(), &BTreeSet::new());
        assert!(found.iter().any(|f| f.plane == ReferenceKind::Class && f.reference == Reference::function("A.f")));
        assert!(found.iter().any(|f| f.plane == ReferenceKind::Instance && f.reference == Reference::instance("A")));
    }

    #[test]
    fn instance_plane_prefers_instance_attribute_over_class_fallback() {
        let mut fb = FactBase::new();
        fb.set_class_attr("A", "f", "A");
        fb.set_object("A.f", Reference::function("A.f"));
        fb.all_instance_attr_constants
            .entry("A".to_string())
            .or_default()
            .insert("f".to_string(), Reference::instance("A"));

        let instance_types = BTreeSet::from(["A".to_string()]);
        let found = ReferenceIdentifier::identify(&fb, "f", &BTreeSet::new(), &instance_types, &BTreeSet::new());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plane, ReferenceKind::Instance);
    }

    #[test]
    fn instance_plane_falls_back_to_class_attribute_when_no_instance_constant() {
        let mut fb = FactBase::new();
        fb.set_class_attr("A", "g", "A");
        fb.set_object("A.g", Reference::function("A.g"));

        let instance_types = BTreeSet::from(["A".to_string()]);
        let found = ReferenceIdentifier::identify(&fb, "g", &BTreeSet::new(), &instance_types, &BTreeSet::new());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plane, ReferenceKind::Class);
        assert_eq!(found[0].reference, Reference::function("A.g"));
    }

    #[test]
    fn module_plane_requires_membership() {
        let mut fb = FactBase::new();
        fb.set_module_attr("m", "x");
        fb.set_object("m.x", Reference::var());

        let module_types = BTreeSet::from(["m".to_string()]);
        let found = ReferenceIdentifier::identify(&fb, "x", &BTreeSet::new(), &BTreeSet::new(), &module_types);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plane, ReferenceKind::Module);
    }
}
