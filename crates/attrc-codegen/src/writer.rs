//! Code generator output writer: assembles and writes
//! `progconsts.h`, `progtypes.h`, `progtypes.c`, `main.h`, `main.c`.
//!
//! Single pass over the object and function tables: size/code enums
//! first, then one (declaration, definition, table) triple
//! per class/module/instance object in sorted-path order, then one
//! record pair per function (and, for methods, a second bound-method
//! record), then boilerplate footers.

use crate::codes::{code_enum, pos_enum};
use crate::functions::{self, FUNCTION_TYPE};
use crate::instantiator;
use crate::layout;
use crate::naming::{encode_path, encode_size, encode_tablename};
use crate::optimiser::OptimiserFacts;
use crate::sizes::{self, structure_size_prefix};
use anyhow::{Context, Result};
use attrc_importer::{FactBase, Reference, ReferenceKind};
use std::path::Path;

fn decode_kind_and_path(ref_key: &str) -> Option<(ReferenceKind, String)> {
    let r = Reference::decode(ref_key).ok()?;
    let origin = r.origin()?.to_string();
    Some((r.kind(), origin))
}

/// Assembled text for the five output files, kept in memory before being
/// written.
#[derive(Default)]
struct Output {
    consts: String,
    decls: String,
    defs: String,
    signatures: String,
    code: String,
}

impl Output {
    fn new() -> Self {
        let mut out = Self::default();
        out.consts.push_str("#ifndef __PROGCONSTS_H__\n#define __PROGCONSTS_H__\n\n");
        out.decls.push_str("#ifndef __PROGTYPES_H__\n#define __PROGTYPES_H__\n\n#include \"progconsts.h\"\n#include \"types.h\"\n\n");
        out.defs.push_str("#include \"progtypes.h\"\n#include \"main.h\"\n\n");
        out.signatures.push_str("#ifndef __MAIN_H__\n#define __MAIN_H__\n\n#include \"types.h\"\n\n");
        out.code.push_str("#include <string.h>\n#include \"types.h\"\n#include \"ops.h\"\n#include \"progconsts.h\"\n#include \"progtypes.h\"\n#include \"progops.h\"\n#include \"main.h\"\n\n");
        out
    }

    fn finish(mut self) -> Self {
        self.consts.push_str("\n#endif /* __PROGCONSTS_H__ */\n");
        self.decls.push_str(&format!(
            "\n#define __FUNCTION_TYPE {}\n#define __FUNCTION_INSTANCE_SIZE {}\n\n#endif /* __PROGTYPES_H__ */\n",
            encode_path(FUNCTION_TYPE),
            encode_size(structure_size_prefix(ReferenceKind::Instance), Some(FUNCTION_TYPE))
        ));
        self.signatures.push_str("\n#endif /* __MAIN_H__ */\n");
        self
    }
}

/// Generate every artifact's text and write it under `output_dir`.
pub fn write_all(output_dir: &Path, facts: &FactBase, opt: &OptimiserFacts) -> Result<()> {
    tracing::debug!(output_dir = %output_dir.display(), structures = opt.structures.len(), "writing code generator artifacts");
    std::fs::create_dir_all(output_dir).with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let out = build(facts, opt);
    write_file(output_dir, "progconsts.h", &out.consts)?;
    write_file(output_dir, "progtypes.h", &out.decls)?;
    write_file(output_dir, "progtypes.c", &out.defs)?;
    write_file(output_dir, "main.h", &out.signatures)?;
    write_file(output_dir, "main.c", &out.code)?;
    Ok(())
}

fn write_file(output_dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = output_dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))
}

fn build(facts: &FactBase, opt: &OptimiserFacts) -> Output {
    let mut out = Output::new();

    for size_enum in sizes::structure_sizes(&opt.structures) {
        out.consts.push_str(&size_enum.encode());
        out.consts.push('\n');
    }
    let (pmin, pmax) = sizes::parameter_limit_sizes(&opt.parameters, &facts.function_defaults);
    out.consts.push_str(&pmin.encode());
    out.consts.push('\n');
    out.consts.push_str(&pmax.encode());
    out.consts.push('\n');

    out.consts.push_str(&code_enum(&opt.all_attrnames));
    out.consts.push('\n');
    out.consts.push_str(&pos_enum(&opt.locations));
    out.consts.push('\n');
    out.consts.push_str(&crate::constants::constant_macros(&opt.constants));
    out.consts.push('\n');

    let mut ref_keys: Vec<&String> = opt.structures.keys().collect();
    ref_keys.sort();
    let mut function_instance_attrs: Option<rustc_hash::FxHashMap<String, Reference>> = None;

    for ref_key in ref_keys {
        let Some((kind, path)) = decode_kind_and_path(ref_key) else { continue };
        let structure = opt.structure_of(ref_key);
        let table_name = match kind {
            ReferenceKind::Instance => encode_tablename("Instance", &path),
            ReferenceKind::Class => encode_tablename("Class", &path),
            ReferenceKind::Module => encode_tablename("Module", &path),
            _ => continue,
        };
        let structure_size = layout::structure_size_tag(kind, &path);

        if kind != ReferenceKind::Instance {
            let mut attrs = layout::static_attributes(facts, kind, &path, structure);
            if kind == ReferenceKind::Class {
                if let Some(init_ref) = attrs.get("__init__").cloned() {
                    let init_path = init_ref.origin().unwrap_or_default().to_string();
                    let pmin_tag = encode_size("pmin", Some(&path));
                    attrs.extend(instantiator::instantiator_attrs(&path, &pmin_tag));

                    out.signatures.push_str(&instantiator::instantiator_signature(&path));
                    out.signatures.push('\n');

                    let arity = opt.parameters_for(&init_path).len();
                    out.code.push_str(&instantiator::write_instantiator(&path, &init_path, arity));
                    out.code.push('\n');

                    let (ptable_name, decl, def) = functions::function_parameter_table(opt, &path, &init_path);
                    out.decls.push_str(&decl);
                    out.defs.push_str(&def);
                    let _ = ptable_name;
                }
            }
            let members = layout::populate_structure(opt, &path, &attrs, structure, kind, false);
            let (decl, def) = layout::write_structure(&path, &table_name, &structure_size, &members);
            out.decls.push_str(&decl);
            out.defs.push_str(&def);
        } else {
            let attrs = layout::instance_attributes(facts, &path, structure);
            if path == FUNCTION_TYPE {
                function_instance_attrs = Some(attrs);
            }
        }

        let table = layout::populate_table(structure);
        let (tdecl, tdef) = layout::write_table(&table_name, &structure_size, &table, false);
        out.decls.push_str(&tdecl);
        out.defs.push_str(&tdef);
    }

    let mut function_paths: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for r in facts.objects.values() {
        if r.has_kind(ReferenceKind::Function) {
            if let Some(origin) = r.origin() {
                function_paths.insert(origin.to_string());
            }
        }
    }

    if let Some(mut instance_attrs) = function_instance_attrs {
        let function_structure_key = Reference::instance(FUNCTION_TYPE).encode();
        let function_structure = opt.structure_of(&function_structure_key).to_vec();
        let table_name = encode_tablename("Instance", FUNCTION_TYPE);
        let structure_size = layout::structure_size_tag(ReferenceKind::Instance, FUNCTION_TYPE);

        for path in &function_paths {
            let pmin_tag = encode_size("pmin", Some(path));
            instance_attrs.extend(instantiator::instantiator_attrs(path, &pmin_tag));

            let method = functions::is_method(facts, path);
            if method {
                let mut unbound = layout::populate_structure(opt, path, &instance_attrs, &function_structure, ReferenceKind::Instance, true);
                functions::append_defaults(opt, facts, path, &mut unbound);
                let (decl, def) = layout::write_structure(path, &table_name, &structure_size, &unbound);
                out.decls.push_str(&decl);
                out.defs.push_str(&def);

                let mut bound = layout::populate_structure(opt, path, &instance_attrs, &function_structure, ReferenceKind::Instance, false);
                functions::append_defaults(opt, facts, path, &mut bound);
                let bound_path = functions::bound_path(path);
                let (bdecl, bdef) = layout::write_structure(&bound_path, &table_name, &structure_size, &bound);
                out.decls.push_str(&bdecl);
                out.defs.push_str(&bdef);
            } else {
                let mut normal = layout::populate_structure(opt, path, &instance_attrs, &function_structure, ReferenceKind::Instance, false);
                functions::append_defaults(opt, facts, path, &mut normal);
                let (decl, def) = layout::write_structure(path, &table_name, &structure_size, &normal);
                out.decls.push_str(&decl);
                out.defs.push_str(&def);
            }

            out.signatures.push_str(&format!("__attr {}(__attr args[]);\n", crate::naming::encode_function_pointer(path)));

            let (_, pdecl, pdef) = functions::function_parameter_table(opt, path, path);
            out.decls.push_str(&pdecl);
            out.defs.push_str(&pdef);
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_all_creates_every_generator_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let facts = FactBase::new();
        let opt = OptimiserFacts::new();
        write_all(dir.path(), &facts, &opt).unwrap();
        for name in ["progconsts.h", "progtypes.h", "progtypes.c", "main.h", "main.c"] {
            assert!(dir.path().join(name).exists());
        }
        let consts = std::fs::read_to_string(dir.path().join("progconsts.h")).unwrap();
        assert!(consts.contains("__PROGCONSTS_H__"));
    }

    #[test]
    fn s6_class_with_initialiser_gets_instantiator_and_parameter_table() {
        let mut facts = FactBase::new();
        facts.add_class("A", vec![]);
        facts.set_class_attr("A", "__init__", "A");
        facts.set_object("A", Reference::class("A"));
        facts.set_object("A.__init__", Reference::function("A.__init__"));
        facts.function_parameters.insert("A.__init__".to_string(), vec!["self".to_string(), "x".to_string()]);

        let mut opt = OptimiserFacts::new();
        opt.structures.insert(
            Reference::class("A").encode(),
            vec![Some("__fn__".to_string()), Some("__args__".to_string()), Some("__init__".to_string())],
        );
        opt.parameters.insert(
            "A.__init__".to_string(),
            vec![Some(("self".to_string(), 0)), Some(("x".to_string(), 1))],
        );
        opt.all_attrnames = vec!["__fn__".to_string(), "__args__".to_string(), "__init__".to_string()];
        opt.locations = vec![vec!["__fn__".to_string()], vec!["__args__".to_string()], vec!["__init__".to_string()]];

        let out = build(&facts, &opt);
        assert!(out.signatures.contains("__new_A"));
        assert!(out.code.contains("__new_A"));
        assert!(out.decls.contains("__FunctionTable_A"));
    }
}
