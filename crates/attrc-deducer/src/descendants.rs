//! Descendant closure - the transitive subclass closure per class,
//! plus `#<ClassName>` marker-attribute injection.
//!
//! `descendants[c]` feeds the `self`-narrowing step of the solver and
//! the guard/test classifier: both need "every class that could be
//! the dynamic type of an object statically typed as `c`". The marker
//! attributes let usage that tests class identity (`isinstance`-like checks
//! in the source language) participate in the same attribute-set
//! intersection mechanism as ordinary attribute usage, instead of needing a
//! separate code path.

use crate::attr_index::AttributeTypeIndex;
use attrc_common::limits::MAX_DESCENDANT_DFS_DEPTH;
use attrc_importer::FactBase;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// `descendants[c]` for every class `c`, computed by memoised DFS over
/// `subclasses`.
#[derive(Default)]
pub struct DescendantClosure {
    descendants: FxHashMap<String, BTreeSet<String>>,
}

impl DescendantClosure {
    /// Compute the closure from the Importer's `subclasses` map.
    #[must_use]
    pub fn build(facts: &FactBase) -> Self {
        let mut closure = Self::default();
        let classes: Vec<&String> = facts.classes.keys().collect();
        for class in classes {
            closure.resolve(class, facts, &mut Vec::new());
        }
        closure
    }

    fn resolve(&mut self, class: &str, facts: &FactBase, stack: &mut Vec<String>) -> BTreeSet<String> {
        if let Some(cached) = self.descendants.get(class) {
            return cached.clone();
        }
        if stack.len() as u32 > MAX_DESCENDANT_DFS_DEPTH || stack.iter().any(|c| c == class) {
            return BTreeSet::new();
        }
        stack.push(class.to_string());
        let mut result = BTreeSet::new();
        if let Some(subs) = facts.subclasses.get(class) {
            for sub in subs {
                result.insert(sub.clone());
                result.extend(self.resolve(sub, facts, stack));
            }
        }
        stack.pop();
        self.descendants.insert(class.to_string(), result.clone());
        result
    }

    #[must_use]
    pub fn of(&self, class: &str) -> BTreeSet<String> {
        self.descendants.get(class).cloned().unwrap_or_default()
    }

    /// `{c} ∪ descendants(c)` - the set used by `self`-narrowing.
    #[must_use]
    pub fn inclusive_of(&self, class: &str) -> BTreeSet<String> {
        let mut set = self.of(class);
        set.insert(class.to_string());
        set
    }

    /// Inject `"#<b>" -> b` into every class `c`'s attribute map for every
    /// ancestor `b` (including `c` itself), after the closure is computed.
    /// `all_class_attrs` is mutated directly (Importer fields are
    /// read-after-construction except for this and the mutation pass), and
    /// the attribute-type index is kept consistent.
    pub fn init_special_attributes(&self, facts: &mut FactBase, index: &mut AttributeTypeIndex) {
        for (class, _) in facts.classes.clone() {
            let mut ancestors: BTreeSet<String> = self.of(&class);
            ancestors.insert(class.clone());
            // Every descendant also needs a marker for every one of its own
            // ancestors, i.e. this is really "inject `#b` into every `c`
            // where `b` is `c` or an ancestor of `c`" - walk it from the
            // descendant side instead, which is equivalent and avoids
            // needing an `ancestors_of` map.
            for descendant in self.inclusive_of(&class) {
                let marker = format!("#{class}");
                facts
                    .all_class_attrs
                    .entry(descendant.clone())
                    .or_default()
                    .insert(marker.clone(), class.clone());
                facts.all_combined_attrs.entry(descendant.clone()).or_default().insert(marker.clone());
                index.inject_class_attr(&descendant, &marker);
            }
            let _ = ancestors;
        }
    }
}
