//! Usage/access/alias index builders - merge the Importer's per-scope
//! usage and access streams into the location-keyed maps the solver
//! and classifier operate on.

use attrc_common::limits::MAX_ALIAS_CHAIN_DEPTH;
use attrc_importer::{AccessLocation, DefLocation, FactBase, Usage, UsageKey};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// `location -> merged usage`.
#[derive(Default)]
pub struct UsageIndex {
    by_location: FxHashMap<DefLocation, Usage>,
}

impl UsageIndex {
    /// Build from every `(scope, name, version)` triple in every module's
    /// `attr_usage`, plus one synthesised location per top-level anonymous
    /// attribute-chain access (using the chain's *last* component as the
    /// usage probe).
    #[must_use]
    pub fn build(facts: &FactBase) -> Self {
        let mut index = Self::default();
        // `facts.modules` is keyed by module name; each `Module.attr_usage`
        // is itself keyed by scope (which may be a nested function/method
        // scope within that module), then name, then version - three
        // levels below the module map, not two.
        for module in facts.modules.values() {
            for (scope, by_name) in &module.attr_usage {
                for (name, by_version) in by_name {
                    for (&version, branches) in by_version {
                        let loc = DefLocation::new(scope.clone(), name.clone(), version);
                        let usage = index.by_location.entry(loc).or_default();
                        for branch in branches {
                            usage.observe(branch.iter().cloned());
                        }
                    }
                }
            }
        }
        for (scope, chains) in &facts.all_attr_accesses {
            for chain in chains {
                let Some(last) = chain.last() else { continue };
                let loc = DefLocation::new(scope.clone(), format!("#{last}"), 0);
                index.by_location.entry(loc).or_default().observe([last.clone()]);
            }
        }
        index
    }

    #[must_use]
    pub fn get(&self, loc: &DefLocation) -> Option<&Usage> {
        self.by_location.get(loc)
    }

    #[must_use]
    pub fn locations(&self) -> impl Iterator<Item = &DefLocation> {
        self.by_location.keys()
    }
}

/// `access_location -> [reaching definition locations]`.
#[derive(Default)]
pub struct AccessorIndex {
    reaching: FxHashMap<AccessLocation, Vec<DefLocation>>,
}

impl AccessorIndex {
    #[must_use]
    pub fn build(facts: &FactBase) -> Self {
        let mut index = Self::default();
        // Same two-module-levels-deep shape as `UsageIndex`: `Module.attr_accessors`
        // is keyed by scope, then by `(name, attrnames)`.
        for module in facts.modules.values() {
            for (scope, by_key) in &module.attr_accessors {
                for ((name, attrnames), occurrences) in by_key {
                    for (access_number, versions) in occurrences.iter().enumerate() {
                        let access = AccessLocation::new(
                            scope.clone(),
                            Some(name.clone()),
                            attrnames.clone(),
                            access_number as u32,
                        );
                        let defs = versions
                            .iter()
                            .map(|&v| DefLocation::new(scope.clone(), name.clone(), v))
                            .collect();
                        index.reaching.insert(access, defs);
                    }
                }
            }
        }
        index
    }

    #[must_use]
    pub fn reaching(&self, access: &AccessLocation) -> &[DefLocation] {
        self.reaching.get(access).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn accesses(&self) -> impl Iterator<Item = &AccessLocation> {
        self.reaching.keys()
    }
}

/// `usage-key -> [(scope, name, attrnames)]` for usages reached by an
/// assignment.
#[derive(Default)]
pub struct AssignedAttrsIndex {
    assigned: FxHashMap<UsageKey, Vec<(String, String, Vec<String>)>>,
}

impl AssignedAttrsIndex {
    #[must_use]
    pub fn build(facts: &FactBase) -> Self {
        let mut index = Self::default();
        for (scope, modifiers_by_key) in &facts.all_attr_access_modifiers {
            for ((name, attrnames), flags) in modifiers_by_key {
                if flags.iter().any(|&assigned| assigned) {
                    let key = attrc_importer::usage_key(attrnames.iter().cloned());
                    index
                        .assigned
                        .entry(key)
                        .or_default()
                        .push((scope.clone(), name.clone(), attrnames.clone()));
                }
            }
        }
        index
    }

    #[must_use]
    pub fn entries(&self) -> impl Iterator<Item = (&UsageKey, &(String, String, Vec<String>))> {
        self.assigned.iter().flat_map(|(key, targets)| targets.iter().map(move |t| (key, t)))
    }
}

/// Flattened alias targets: `def_location -> [access_location]`, after
/// walking through access locations whose original name is itself an alias.
#[derive(Default)]
pub struct AliasIndex {
    flattened: FxHashMap<DefLocation, Vec<AccessLocation>>,
}

impl AliasIndex {
    /// Build the raw alias index and flatten it in one pass. `visited`
    /// guards against cyclic alias graphs per definition location.
    #[must_use]
    pub fn build(facts: &FactBase) -> Self {
        let mut raw: FxHashMap<DefLocation, Vec<AccessLocation>> = FxHashMap::default();
        for (qualified_name, by_version) in &facts.all_aliased_names {
            let (path, name) = split_qualified_name(qualified_name);
            for (&version, (orig_name, attrnames, access_number)) in by_version {
                let def = DefLocation::new(path.clone(), name.clone(), version);
                let access = AccessLocation::new(
                    path.clone(),
                    Some(orig_name.clone()),
                    attrnames.clone(),
                    *access_number,
                );
                raw.entry(def).or_default().push(access);
            }
        }

        let mut flattened = FxHashMap::default();
        for def in raw.keys() {
            let mut visited: BTreeSet<AccessLocation> = BTreeSet::new();
            let resolved = Self::flatten_one(def, &raw, &mut visited);
            flattened.insert(def.clone(), resolved);
        }
        Self { flattened }
    }

    /// Iterative worklist (not recursion) that walks access
    /// locations whose original name is itself an alias until only
    /// non-alias accesses remain, or the visited set / depth guard fires.
    fn flatten_one(
        def: &DefLocation,
        raw: &FxHashMap<DefLocation, Vec<AccessLocation>>,
        visited: &mut BTreeSet<AccessLocation>,
    ) -> Vec<AccessLocation> {
        let mut result = Vec::new();
        let Some(initial) = raw.get(def) else {
            return result;
        };
        let mut worklist: Vec<AccessLocation> = initial.clone();
        let mut steps = 0u32;
        while let Some(access) = worklist.pop() {
            steps += 1;
            if steps > MAX_ALIAS_CHAIN_DEPTH || !visited.insert(access.clone()) {
                continue;
            }
            // The access's name is itself an alias source iff some version
            // of `(access.unit_path, access.name)` appears as a key in
            // `raw` - continue the walk through whichever version is on
            // file instead of terminating on it.
            let continuation = access
                .name
                .as_ref()
                .and_then(|name| {
                    raw.keys()
                        .find(|d| d.unit_path == access.unit_path && &d.name == name)
                })
                .and_then(|matched_def| raw.get(matched_def));
            match continuation {
                Some(next) => worklist.extend(next.clone()),
                None => result.push(access),
            }
        }
        result
    }

    #[must_use]
    pub fn resolve(&self, def: &DefLocation) -> &[AccessLocation] {
        self.flattened.get(def).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn locations(&self) -> impl Iterator<Item = &DefLocation> {
        self.flattened.keys()
    }
}

/// Split a dotted qualified name into `(scope_path, last_component)`. A name
/// with no dot is its own scope with an empty path.
fn split_qualified_name(qualified_name: &str) -> (String, String) {
    match qualified_name.rsplit_once('.') {
        Some((path, name)) => (path.to_string(), name.to_string()),
        None => (String::new(), qualified_name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrc_importer::usage_key;

    #[test]
    fn usage_index_merges_branches_per_version() {
        let mut fb = FactBase::new();
        fb.modules.entry("m".to_string()).or_default().record_usage("m", "x", 0, usage_key(["a"]));
        fb.modules.entry("m".to_string()).or_default().record_usage("m", "x", 0, usage_key(["b"]));
        let idx = UsageIndex::build(&fb);
        let loc = DefLocation::new("m", "x", 0);
        assert_eq!(idx.get(&loc).unwrap().len(), 2);
    }

    #[test]
    fn usage_index_keeps_versions_separate() {
        let mut fb = FactBase::new();
        fb.modules.entry("m".to_string()).or_default().record_usage("m", "x", 0, usage_key(["a"]));
        fb.modules.entry("m".to_string()).or_default().record_usage("m", "x", 1, usage_key(["b"]));
        let idx = UsageIndex::build(&fb);
        assert_eq!(idx.get(&DefLocation::new("m", "x", 0)).unwrap().len(), 1);
        assert_eq!(idx.get(&DefLocation::new("m", "x", 1)).unwrap().len(), 1);
    }

    #[test]
    fn accessor_index_maps_access_to_reaching_definitions() {
        let mut fb = FactBase::new();
        fb.modules
            .entry("m".to_string())
            .or_default()
            .record_accessor("m", "x", vec!["f".to_string()], vec![0, 1]);
        let idx = AccessorIndex::build(&fb);
        let access = AccessLocation::new("m", Some("x".to_string()), vec!["f".to_string()], 0);
        let reaching = idx.reaching(&access);
        assert_eq!(reaching.len(), 2);
        assert_eq!(reaching[0], DefLocation::new("m", "x", 0));
    }

    #[test]
    fn alias_flattening_walks_through_an_aliased_access() {
        let mut fb = FactBase::new();
        // m.a (version 0) is defined by an access of m.b, and m.b (version 0)
        // is itself defined by an access of m.c.f - flattening should walk
        // through to the terminal, non-alias access.
        fb.all_aliased_names
            .entry("m.a".to_string())
            .or_default()
            .insert(0, ("b".to_string(), vec![], 0));
        fb.all_aliased_names
            .entry("m.b".to_string())
            .or_default()
            .insert(0, ("c".to_string(), vec!["f".to_string()], 0));
        let idx = AliasIndex::build(&fb);
        let resolved = idx.resolve(&DefLocation::new("m", "a", 0));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name.as_deref(), Some("c"));
        assert_eq!(resolved[0].attrnames, vec!["f".to_string()]);
    }

    #[test]
    fn alias_flattening_terminates_on_cycle() {
        let mut fb = FactBase::new();
        // m.a aliases to an access of m.b, and m.b aliases right back to an
        // access of m.a - a cycle the visited-set guard must break.
        fb.all_aliased_names
            .entry("m.a".to_string())
            .or_default()
            .insert(0, ("b".to_string(), vec![], 0));
        fb.all_aliased_names
            .entry("m.b".to_string())
            .or_default()
            .insert(0, ("a".to_string(), vec![], 0));
        let idx = AliasIndex::build(&fb);
        // Doesn't hang; that's the property under test.
        let _ = idx.resolve(&DefLocation::new("m", "a", 0));
    }
}
