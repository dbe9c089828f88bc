//! Size enums: `csize`, `msize`, `isize`, `pmin`, `pmax`, one
//! enum per prefix mapping a qualified path to a slot/argument count.

use crate::naming::encode_size;
use attrc_importer::ReferenceKind;
use std::collections::BTreeMap;

/// One `enum __<prefix>size { ... }` block.
#[derive(Clone, Debug)]
pub struct SizeEnum {
    pub prefix: String,
    /// Sorted by path for reproducibility.
    pub entries: Vec<(String, i64)>,
}

impl SizeEnum {
    #[must_use]
    pub fn new(prefix: impl Into<String>, sizes: &BTreeMap<String, i64>) -> Self {
        Self { prefix: prefix.into(), entries: sizes.iter().map(|(p, &s)| (p.clone(), s)).collect() }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = format!("enum {} {{\n", encode_size(&self.prefix, None));
        let members: Vec<String> = self.entries.iter().map(|(path, size)| format!("    {} = {size}", encode_size(&self.prefix, Some(path)))).collect();
        out.push_str(&members.join(",\n"));
        out.push_str("\n    };\n");
        out
    }
}

/// The one-letter prefix the structure-size enums use for each reference
/// kind that carries a record.
#[must_use]
pub fn structure_size_prefix(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Class => "c",
        ReferenceKind::Module => "m",
        ReferenceKind::Instance => "i",
        _ => unreachable!("only class/module/instance references carry a structure"),
    }
}

/// Build `csize`/`msize`/`isize` from every structure's slot count,
/// grouped by the reference kind encoded in its key.
#[must_use]
pub fn structure_sizes(structures: &std::collections::HashMap<String, Vec<Option<String>>, impl std::hash::BuildHasher>) -> Vec<SizeEnum> {
    let mut by_kind: BTreeMap<&'static str, BTreeMap<String, i64>> = BTreeMap::new();
    for (ref_key, structure) in structures {
        let Ok(r) = attrc_importer::Reference::decode(ref_key) else { continue };
        let Some(origin) = r.origin() else { continue };
        if matches!(r.kind(), ReferenceKind::Class | ReferenceKind::Module | ReferenceKind::Instance) {
            by_kind.entry(structure_size_prefix(r.kind())).or_default().insert(origin.to_string(), structure.len() as i64);
        }
    }
    by_kind.into_iter().map(|(prefix, sizes)| SizeEnum::new(prefix, &sizes)).collect()
}

/// `pmin`/`pmax` from each function's arity, minus default-carrying
/// parameters for the minimum. Instantiator
/// sizes are recorded under the class path with the `self` slot removed
/// (arity reduced by one), mirroring `<class>.__init__` in the optimiser.
#[must_use]
pub fn parameter_limit_sizes(parameters: &std::collections::HashMap<String, Vec<crate::optimiser::ParameterSlot>, impl std::hash::BuildHasher>, defaults: &std::collections::HashMap<String, Vec<(String, attrc_importer::Reference)>, impl std::hash::BuildHasher>) -> (SizeEnum, SizeEnum) {
    let mut min_sizes: BTreeMap<String, i64> = BTreeMap::new();
    let mut max_sizes: BTreeMap<String, i64> = BTreeMap::new();
    for (path, params) in parameters {
        let argmax = params.len() as i64;
        let argmin = argmax - defaults.get(path).map_or(0, Vec::len) as i64;
        if let Some(class_path) = path.strip_suffix(".__init__") {
            min_sizes.insert(class_path.to_string(), argmin - 1);
            max_sizes.insert(class_path.to_string(), argmax - 1);
        } else {
            min_sizes.insert(path.clone(), argmin);
            max_sizes.insert(path.clone(), argmax);
        }
    }
    (SizeEnum::new("pmin", &min_sizes), SizeEnum::new("pmax", &max_sizes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_sizes_groups_by_kind_prefix() {
        let mut structures: rustc_hash::FxHashMap<String, Vec<Option<String>>> = rustc_hash::FxHashMap::default();
        structures.insert("class:m.A".to_string(), vec![Some("__fn__".to_string()), None]);
        structures.insert("module:m".to_string(), vec![Some("x".to_string())]);
        let enums = structure_sizes(&structures);
        let c = enums.iter().find(|e| e.prefix == "c").unwrap();
        assert_eq!(c.entries, vec![("m.A".to_string(), 2)]);
        let m = enums.iter().find(|e| e.prefix == "m").unwrap();
        assert_eq!(m.entries, vec![("m".to_string(), 1)]);
    }

    #[test]
    fn parameter_limit_sizes_strips_init_suffix_and_reduces_by_one() {
        let mut parameters: rustc_hash::FxHashMap<String, Vec<crate::optimiser::ParameterSlot>> = rustc_hash::FxHashMap::default();
        parameters.insert("m.A.__init__".to_string(), vec![Some(("self".to_string(), 0)), Some(("x".to_string(), 1))]);
        let defaults: rustc_hash::FxHashMap<String, Vec<(String, attrc_importer::Reference)>> = rustc_hash::FxHashMap::default();
        let (pmin, pmax) = parameter_limit_sizes(&parameters, &defaults);
        assert_eq!(pmin.entries, vec![("m.A".to_string(), 1)]);
        assert_eq!(pmax.entries, vec![("m.A".to_string(), 1)]);
    }
}
