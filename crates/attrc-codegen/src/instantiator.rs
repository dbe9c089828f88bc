//! Instantiators: per class `C` with initialiser `I`, a C
//! function that allocates an instance, copies the caller's argument
//! vector into a local frame offset by one, invokes `I`, and returns slot
//! 0.

use crate::naming::{encode_instantiator_pointer, encode_path, encode_symbol, encode_tablename};

/// The forward declaration in `main.h`: `__attr __new_<path>(__attr[]);`.
#[must_use]
pub fn instantiator_signature(path: &str) -> String {
    format!("__attr {}(__attr[]);", encode_instantiator_pointer(path))
}

/// The instantiator body written to `main.c`. `init_path` is the
/// initialiser's origin (`C.__init__`); `init_arity` is its parameter
/// count including `self`.
#[must_use]
pub fn write_instantiator(path: &str, init_path: &str, init_arity: usize) -> String {
    let arg_copy = if init_arity > 1 {
        format!("memcpy(&__tmp_args[1], args, {} * sizeof(__attr));", init_arity - 1)
    } else {
        String::new()
    };
    format!(
        "__attr {}(__attr args[])\n{{\n    __attr __tmp_args[{init_arity}];\n    __tmp_args[0] = __new(&{}, &{}, sizeof({}));\n    {arg_copy}\n    {}(__tmp_args);\n    return __tmp_args[0];\n}}\n",
        encode_instantiator_pointer(path),
        encode_tablename("Instance", path),
        encode_path(path),
        encode_symbol("obj", Some(path)),
        crate::naming::encode_function_pointer(init_path),
    )
}

/// The `__fn__`/`__args__` attributes every class carries for its
/// instantiator, alongside the parameter table it needs. `__args__`'s origin carries the `pmin` size tag
/// text rather than a qualified path - `populate_structure` reads it
/// back out verbatim as the `.min=` member.
#[must_use]
pub fn instantiator_attrs(path: &str, pmin: &str) -> rustc_hash::FxHashMap<String, attrc_importer::Reference> {
    let mut attrs = rustc_hash::FxHashMap::default();
    attrs.insert("__fn__".to_string(), attrc_importer::Reference::function(path));
    attrs.insert("__args__".to_string(), attrc_importer::Reference::function(pmin));
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiator_signature_names_new_thunk() {
        assert_eq!(instantiator_signature("m.A"), "__attr __new_m_A(__attr[]);");
    }

    #[test]
    fn write_instantiator_copies_args_when_init_has_extra_parameters() {
        let body = write_instantiator("m.A", "m.A.__init__", 2);
        assert!(body.contains("memcpy(&__tmp_args[1], args, 1 * sizeof(__attr));"));
        assert!(body.contains("__tmp_args[0] = __new(&__InstanceTable_m_A, &m_A, sizeof(__obj_m_A));"));
        assert!(body.contains("return __tmp_args[0];"));
    }

    #[test]
    fn write_instantiator_skips_copy_when_init_takes_only_self() {
        let body = write_instantiator("m.A", "m.A.__init__", 1);
        assert!(!body.contains("memcpy"));
    }
}
