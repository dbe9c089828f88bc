//! Per-object record population and declaration text:
//! `obj` literals, `__table`/`__ptable` definitions, and the per-class
//! instance struct typedef.

use crate::naming::{encode_obj_symbol, encode_path, encode_size, encode_symbol, encode_tablename};
use crate::optimiser::OptimiserFacts;
use attrc_importer::{FactBase, Reference, ReferenceKind};

/// Attribute name -> the reference it resolves to for one class or module
/// object, gathered before populating its structure. A module attribute whose module is hidden
/// (re-exported without its own top-level binding) still resolves to a
/// synthetic module reference.
#[must_use]
pub fn static_attributes(facts: &FactBase, kind: ReferenceKind, path: &str, attrnames: &[Option<String>]) -> rustc_hash::FxHashMap<String, Reference> {
    let mut attrs = rustc_hash::FxHashMap::default();
    for attrname in attrnames.iter().flatten() {
        let resolved = match kind {
            ReferenceKind::Class => facts.class_attr_defining_path(path, attrname).and_then(|defining| facts.get_object(&defining).cloned()),
            ReferenceKind::Module => facts.get_object(&format!("{path}.{attrname}")).cloned(),
            _ => None,
        };
        let resolved = resolved.or_else(|| {
            let candidate = format!("{path}.{attrname}");
            facts.hidden.contains_key(&candidate).then(|| Reference::module(candidate))
        });
        if let Some(r) = resolved {
            attrs.insert(attrname.clone(), r);
        }
    }
    attrs
}

/// `get_instance_attributes`: instance attribute names resolve to a
/// constant reference if one is on file, else an undetermined `var`.
#[must_use]
pub fn instance_attributes(facts: &FactBase, class: &str, attrnames: &[Option<String>]) -> rustc_hash::FxHashMap<String, Reference> {
    let mut attrs = rustc_hash::FxHashMap::default();
    let consts = facts.all_instance_attr_constants.get(class);
    for attrname in attrnames.iter().flatten() {
        let r = consts.and_then(|c| c.get(attrname)).cloned().unwrap_or_else(Reference::var);
        attrs.insert(attrname.clone(), r);
    }
    attrs
}

/// `populate_table`: the `__table`/`__ptable` row is just each slot's code,
/// or `"0"` for a gap.
#[must_use]
pub fn populate_table(structure: &[Option<String>]) -> Vec<String> {
    structure.iter().map(|slot| slot.as_deref().map_or_else(|| "0".to_string(), |name| encode_symbol("code", Some(name)))).collect()
}

/// One populated structure member: either a literal or a fully assembled
/// `{ctx, fn}`-shaped slot for `__fn__`/`__args__`.
fn encode_member(opt: &OptimiserFacts, path: &str, name: &str, attr: &Reference, structure_type: ReferenceKind) -> String {
    if attr.has_kind(ReferenceKind::Instance) {
        let attr_path = format!("{path}.{name}");
        if let Some(&n) = opt.constant_numbers.get(&attr_path) {
            return format!("{{&const{n}, &const{n}}} /* {name} */");
        }
    }
    if matches!(attr.kind(), ReferenceKind::Var | ReferenceKind::Instance) {
        return format!("{{0, 0}} /* {name} */");
    }
    let origin = attr.origin().unwrap_or_default();
    let context = if attr.has_kind(ReferenceKind::Function) && structure_type == ReferenceKind::Class {
        format!("&{}", encode_path(path))
    } else if attr.has_kind(ReferenceKind::Instance) {
        format!("&{}", encode_path(origin))
    } else {
        "0".to_string()
    };
    format!("{{{context}, &{}}}", encode_path(origin))
}

/// Populate a class or module structure in slot order, resolving the
/// reserved `__fn__`/`__args__` slots to instantiator/function-pointer
/// members.
#[must_use]
pub fn populate_structure(
    opt: &OptimiserFacts,
    path: &str,
    attrs: &rustc_hash::FxHashMap<String, Reference>,
    structure: &[Option<String>],
    kind: ReferenceKind,
    unbound: bool,
) -> Vec<String> {
    let mut out = Vec::with_capacity(structure.len());
    for slot in structure {
        let Some(attrname) = slot else {
            out.push("{0, 0}".to_string());
            continue;
        };
        if attrname == "__fn__" {
            let Some(attr) = attrs.get(attrname) else {
                out.push("{0, 0}".to_string());
                continue;
            };
            let origin = attr.origin().unwrap_or_default();
            let (bound, function) = if kind == ReferenceKind::Class {
                (None, crate::naming::encode_instantiator_pointer(origin))
            } else if unbound {
                (Some(crate::naming::encode_bound_reference(origin)), "__unbound_method".to_string())
            } else {
                (None, crate::naming::encode_function_pointer(origin))
            };
            let b = bound.map_or_else(|| "0".to_string(), |b| format!(".b={b}"));
            out.push(format!("{{{b}, .fn={function}}}"));
            continue;
        }
        if attrname == "__args__" {
            let Some(attr) = attrs.get(attrname) else {
                out.push("{0, 0}".to_string());
                continue;
            };
            let min = attr.origin().unwrap_or_default();
            out.push(format!("{{.min={}, .ptable={}}}", min, encode_tablename("Function", path)));
            continue;
        }
        match attrs.get(attrname) {
            Some(attr) => out.push(encode_member(opt, path, attrname, attr, kind)),
            None => out.push(format!("{{0, 0}} /* {attrname} */")),
        }
    }
    out
}

/// The declaration + definition text for one object's `obj` literal and,
/// for a class/module/instance record, its struct typedef.
#[must_use]
pub fn write_structure(path: &str, table_name: &str, structure_size: &str, structure: &[String]) -> (String, String) {
    let decl = format!(
        "extern __obj {};\n\ntypedef struct {{\n    const __table * table;\n    unsigned int pos;\n    __attr attrs[{structure_size}];\n}} {};\n",
        encode_path(path),
        encode_obj_symbol(path)
    );
    let def = format!(
        "__obj {} = {{\n    &{table_name},\n    {},\n    {{\n        {}\n    }}}};\n",
        encode_path(path),
        encode_symbol("pos", Some(path)),
        structure.join(",\n        ")
    );
    (decl, def)
}

/// The declaration + definition text for a `__table`/`__ptable` object.
#[must_use]
pub fn write_table(table_name: &str, structure_size: &str, table: &[String], pointer: bool) -> (String, String) {
    let ty = if pointer { "__ptable" } else { "__table" };
    let decl = format!("extern const {ty} {table_name};\n");
    let def = format!("const {ty} {table_name} = {{\n    {structure_size},\n    {{\n        {}\n        }}\n    }};\n", table.join(",\n        "));
    (decl, def)
}

/// Size-enum tag for a structure, e.g. `__csize_m_A`.
#[must_use]
pub fn structure_size_tag(kind: ReferenceKind, path: &str) -> String {
    encode_size(crate::sizes::structure_size_prefix(kind), Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_table_maps_gaps_and_codes() {
        let structure = vec![Some("__fn__".to_string()), None, Some("x".to_string())];
        let table = populate_table(&structure);
        assert_eq!(table, vec!["__code___fn__".to_string(), "0".to_string(), "__code_x".to_string()]);
    }

    #[test]
    fn encode_member_emits_constant_macro_for_instance_literal() {
        let mut opt = OptimiserFacts::new();
        opt.constant_numbers.insert("m.A.x".to_string(), 3);
        let attr = Reference::instance("int");
        let encoded = encode_member(&opt, "m.A", "x", &attr, ReferenceKind::Class);
        assert_eq!(encoded, "{&const3, &const3} /* x */");
    }

    #[test]
    fn encode_member_emits_undetermined_slot_for_plain_var() {
        let opt = OptimiserFacts::new();
        let attr = Reference::var();
        let encoded = encode_member(&opt, "m.A", "y", &attr, ReferenceKind::Class);
        assert_eq!(encoded, "{0, 0} /* y */");
    }

    #[test]
    fn populate_structure_resolves_fn_slot_to_instantiator_on_class() {
        let opt = OptimiserFacts::new();
        let mut attrs = rustc_hash::FxHashMap::default();
        attrs.insert("__fn__".to_string(), Reference::function("m.A"));
        let structure = vec![Some("__fn__".to_string())];
        let out = populate_structure(&opt, "m.A", &attrs, &structure, ReferenceKind::Class, false);
        assert_eq!(out, vec!["{0, .fn=__new_m_A}".to_string()]);
    }

    #[test]
    fn populate_structure_resolves_fn_slot_to_unbound_method() {
        let opt = OptimiserFacts::new();
        let mut attrs = rustc_hash::FxHashMap::default();
        attrs.insert("__fn__".to_string(), Reference::function("A.method"));
        let structure = vec![Some("__fn__".to_string())];
        let out = populate_structure(&opt, "A.method", &attrs, &structure, ReferenceKind::Instance, true);
        assert_eq!(out, vec!["{.b=bound_A_method, .fn=__unbound_method}".to_string()]);
    }
}
