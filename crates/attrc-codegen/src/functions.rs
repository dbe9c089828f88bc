//! Function records: every function yields one record; every
//! method yields two (unbound at its canonical path, bound at a mangled
//! name). Also parameter-table population, shared by ordinary functions
//! and instantiators.

use crate::naming::{encode_bound_reference, encode_symbol, encode_tablename};
use crate::optimiser::{OptimiserFacts, ParameterSlot};
use attrc_importer::{FactBase, Reference, ReferenceKind};

/// Every function instance is laid out as an instance of this builtin
/// class.
pub const FUNCTION_TYPE: &str = "__builtins__.core.function";

/// `populate_parameter_table`: one `(code, position)` pair per slot, `("0",
/// "0")` for a gap.
#[must_use]
pub fn populate_parameter_table(slots: &[ParameterSlot]) -> Vec<(String, usize)> {
    slots
        .iter()
        .map(|slot| match slot {
            Some((name, pos)) => (encode_symbol("pcode", Some(name)), *pos),
            None => ("0".to_string(), 0),
        })
        .collect()
}

/// The text for a parameter table's declaration and definition.
#[must_use]
pub fn write_parameter_table(table_name: &str, structure_size: &str, table: &[(String, usize)]) -> (String, String) {
    let decl = format!("extern const __ptable {table_name};\n");
    let rows: Vec<String> = table.iter().map(|(code, pos)| format!("{{{code}, {pos}}}")).collect();
    let def = format!("const __ptable {table_name} = {{\n    {structure_size},\n    {{\n        {}\n        }}\n    }};\n", rows.join(",\n        "));
    (decl, def)
}

/// Append a literal-default member for every defaulted parameter of
/// `path` onto `structure`.
pub fn append_defaults(opt: &OptimiserFacts, facts: &FactBase, path: &str, structure: &mut Vec<String>) {
    for (name, default) in facts.function_defaults.get(path).into_iter().flatten() {
        structure.push(member_literal(opt, path, name, default));
    }
}

fn member_literal(opt: &OptimiserFacts, path: &str, name: &str, attr: &Reference) -> String {
    if attr.has_kind(ReferenceKind::Instance) {
        let attr_path = format!("{path}.{name}");
        if let Some(&n) = opt.constant_numbers.get(&attr_path) {
            return format!("{{&const{n}, &const{n}}} /* {name} */");
        }
    }
    "{0, 0}".to_string()
}

/// The declarations and table name/size a function or instantiator needs
/// for its own `Function` parameter table.
#[must_use]
pub fn function_parameter_table(opt: &OptimiserFacts, path: &str, function_path: &str) -> (String, String, String) {
    let table_name = encode_tablename("Function", path);
    let structure_size = crate::naming::encode_size("pmax", Some(path));
    let table = populate_parameter_table(opt.parameters_for(function_path));
    let (decl, def) = write_parameter_table(&table_name, &structure_size, &table);
    (table_name, decl, def)
}

/// Whether `path` names a method - its parent object is a class.
#[must_use]
pub fn is_method(facts: &FactBase, path: &str) -> bool {
    let Some((parent, _)) = path.rsplit_once('.') else { return false };
    matches!(facts.get_object(parent), Some(r) if r.has_kind(ReferenceKind::Class))
}

#[must_use]
pub fn bound_path(path: &str) -> String {
    encode_bound_reference(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_parameter_table_encodes_gaps() {
        let slots = vec![Some(("x".to_string(), 0usize)), None];
        let table = populate_parameter_table(&slots);
        assert_eq!(table, vec![("__pcode_x".to_string(), 0), ("0".to_string(), 0)]);
    }

    #[test]
    fn is_method_detects_class_parent() {
        let mut fb = FactBase::new();
        fb.set_object("A", Reference::class("A"));
        fb.set_object("A.m", Reference::function("A.m"));
        assert!(is_method(&fb, "A.m"));
        assert!(!is_method(&fb, "m.f"));
    }
}
