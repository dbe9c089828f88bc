//! The Importer facade: a read-only fact base of modules, classes,
//! the subclass graph, usage, accesses, aliases, and defaults.
//!
//! This crate does not produce the fact base — the source-language
//! inspector and the name-resolution pass that build it are out of scope
//! — it only defines the shape the deducer and code generator
//! consume. [`Importer`] is the trait that shape takes so the deducer can
//! be generic over "any fact base", and [`FactBase`] is the concrete,
//! in-memory store used in tests and by whatever driver wires a real
//! inspector's output into this pipeline.

use crate::location::AccessLocation;
use crate::reference::Reference;
use crate::usage::UsageKey;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// `attr_usage` / `attr_accessors` for a single module.
///
/// `attr_usage` is keyed one level deeper than a flat usage-key map:
/// `scope -> name -> version -> [branch-set]`. The version layer is what
/// lets `init_usage_index` key its output by the same
/// `(scope, name, version)` triple the solver operates on, instead of
/// merging usage from every SSA-like version of a name together.
#[derive(Clone, Debug, Default)]
pub struct Module {
    /// `scope -> name -> version -> [branch-set]`.
    pub attr_usage: FxHashMap<String, FxHashMap<String, FxHashMap<u32, Vec<UsageKey>>>>,
    /// `scope -> (name, attrnames) -> [[version, ...]]` - for each access of
    /// `name.attrnames` in `scope`, the list of definition-location versions
    /// of `name` that reach it.
    pub attr_accessors: FxHashMap<String, FxHashMap<(String, Vec<String>), Vec<Vec<u32>>>>,
}

impl Module {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_usage(&mut self, scope: impl Into<String>, name: impl Into<String>, version: u32, branch: UsageKey) {
        self.attr_usage
            .entry(scope.into())
            .or_default()
            .entry(name.into())
            .or_default()
            .entry(version)
            .or_default()
            .push(branch);
    }

    pub fn record_accessor(
        &mut self,
        scope: impl Into<String>,
        name: impl Into<String>,
        attrnames: Vec<String>,
        versions: Vec<u32>,
    ) {
        self.attr_accessors
            .entry(scope.into())
            .or_default()
            .entry((name.into(), attrnames))
            .or_default()
            .push(versions);
    }
}

type AliasTarget = (String, Vec<String>, u32);
type ConstAccessTarget = (String, Reference, Vec<String>);

/// The whole-program, read-only fact base the deducer and code generator
/// consume. Every field mirrors one table the Importer exposes, flattened
/// into the shape this crate's consumers actually index by.
#[derive(Default)]
pub struct FactBase {
    pub modules: FxHashMap<String, Module>,
    pub all_attr_accesses: FxHashMap<String, Vec<Vec<String>>>,
    pub all_attr_access_modifiers: FxHashMap<String, FxHashMap<(String, Vec<String>), Vec<bool>>>,
    /// `qualified_name -> version -> (orig_name, attrnames, access_number)`.
    pub all_aliased_names: FxHashMap<String, FxHashMap<u32, AliasTarget>>,
    pub all_const_accesses: FxHashMap<String, FxHashMap<(String, Vec<String>), ConstAccessTarget>>,
    pub all_initialised_names: FxHashMap<String, FxHashMap<u32, Reference>>,

    pub classes: FxHashMap<String, Vec<Reference>>,
    pub subclasses: FxHashMap<String, Vec<String>>,
    pub all_class_attrs: FxHashMap<String, FxHashMap<String, String>>,
    pub all_combined_attrs: FxHashMap<String, BTreeSet<String>>,
    pub all_module_attrs: FxHashMap<String, BTreeSet<String>>,
    pub all_instance_attr_constants: FxHashMap<String, FxHashMap<String, Reference>>,

    pub function_parameters: FxHashMap<String, Vec<String>>,
    pub function_defaults: FxHashMap<String, Vec<(String, Reference)>>,
    pub objects: FxHashMap<String, Reference>,
    pub hidden: FxHashMap<String, Module>,

    /// Class attributes demoted to `var` by the mutation pass; maps `full.path -> original reference`.
    pub modified_attributes: FxHashMap<String, Reference>,
}

/// Read-only fact-base accessors the deducer and code generator depend on.
/// Implemented by [`FactBase`]; kept as a trait so the solver can be
/// exercised against hand-built fixtures without constructing a full store.
pub trait Importer {
    fn identify(&self, qualified_name: &str) -> Option<Reference>;
    fn get_object(&self, path: &str) -> Option<&Reference>;
    fn set_object(&mut self, path: &str, reference: Reference);
    fn get_class_attribute(&self, class: &str, attr: &str) -> Option<Reference>;
    fn get_instance_attributes(&self, class: &str, attr: &str) -> Vec<Reference>;
    fn get_module_attribute(&self, module: &str, attr: &str) -> Option<Reference>;
}

impl FactBase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: impl Into<String>, bases: Vec<Reference>) {
        self.classes.insert(class.into(), bases);
    }

    pub fn add_subclass(&mut self, base: impl Into<String>, sub: impl Into<String>) {
        self.subclasses.entry(base.into()).or_default().push(sub.into());
    }

    pub fn set_class_attr(&mut self, class: impl Into<String>, attr: impl Into<String>, defining_class: impl Into<String>) {
        let class = class.into();
        let attr = attr.into();
        self.all_class_attrs.entry(class.clone()).or_default().insert(attr.clone(), defining_class.into());
        self.all_combined_attrs.entry(class).or_default().insert(attr);
    }

    pub fn set_instance_attr(&mut self, class: impl Into<String>, attr: impl Into<String>) {
        let class = class.into();
        let attr = attr.into();
        self.all_combined_attrs.entry(class).or_default().insert(attr);
    }

    pub fn set_module_attr(&mut self, module: impl Into<String>, attr: impl Into<String>) {
        self.all_module_attrs.entry(module.into()).or_default().insert(attr.into());
    }

    /// Record that `access` reached one reaching definition with `attrnames`
    /// consumed at `name`.
    #[must_use]
    pub fn access_of(&self, loc: &AccessLocation) -> Option<&Vec<Vec<u32>>> {
        let module = self.modules.get(&loc.unit_path)?;
        let scope = module.attr_accessors.get(&loc.unit_path)?;
        let name = loc.name.clone().unwrap_or_default();
        scope.get(&(name, loc.attrnames.clone()))
    }

    /// The fully qualified path where `attr` is defined for `class`, if
    /// `class` carries that class attribute at all.
    #[must_use]
    pub fn class_attr_defining_path(&self, class: &str, attr: &str) -> Option<String> {
        let defining_class = self.all_class_attrs.get(class)?.get(attr)?;
        Some(format!("{defining_class}.{attr}"))
    }
}

impl Importer for FactBase {
    fn identify(&self, qualified_name: &str) -> Option<Reference> {
        self.objects.get(qualified_name).cloned()
    }

    fn get_object(&self, path: &str) -> Option<&Reference> {
        self.objects.get(path)
    }

    fn set_object(&mut self, path: &str, reference: Reference) {
        self.objects.insert(path.to_string(), reference);
    }

    fn get_class_attribute(&self, class: &str, attr: &str) -> Option<Reference> {
        let defining = self.all_class_attrs.get(class)?.get(attr)?;
        self.objects.get(&format!("{defining}.{attr}")).cloned()
    }

    fn get_instance_attributes(&self, class: &str, attr: &str) -> Vec<Reference> {
        let Some(instance_attr_constants) = self.all_instance_attr_constants.get(class) else {
            return Vec::new();
        };
        instance_attr_constants.get(attr).cloned().into_iter().collect()
    }

    fn get_module_attribute(&self, module: &str, attr: &str) -> Option<Reference> {
        if !self.all_module_attrs.get(module)?.contains(attr) {
            return None;
        }
        self.objects.get(&format!("{module}.{attr}")).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_class_attribute_resolves_through_defining_class() {
        let mut fb = FactBase::new();
        fb.set_class_attr("B", "f", "A");
        fb.set_object("A.f", Reference::function("A.f"));
        assert_eq!(fb.get_class_attribute("B", "f"), Some(Reference::function("A.f")));
    }

    #[test]
    fn get_module_attribute_requires_membership() {
        let mut fb = FactBase::new();
        fb.set_module_attr("m", "x");
        fb.set_object("m.x", Reference::var());
        assert_eq!(fb.get_module_attribute("m", "x"), Some(Reference::var()));
        assert_eq!(fb.get_module_attribute("m", "y"), None);
    }

    #[test]
    fn identify_reads_the_objects_table() {
        let mut fb = FactBase::new();
        fb.set_object("m.f", Reference::class("m.K"));
        assert_eq!(fb.identify("m.f"), Some(Reference::class("m.K")));
        assert_eq!(fb.identify("m.g"), None);
    }
}
