//! C-identifier mangling. Every emitted symbol is derived
//! deterministically from a qualified path so that two runs over the same
//! facts produce byte-identical output.

/// A qualified name such as `pkg.mod.Class` becomes a flat C identifier.
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.replace('.', "_")
}

/// `__<symbol>_<path>` - or just `__<symbol>` when there is no path, used
/// for the `code`/`pos` enum tags and the `pos:<path>` per-object tag.
#[must_use]
pub fn encode_symbol(symbol: &str, path: Option<&str>) -> String {
    match path {
        Some(path) => format!("__{symbol}_{}", encode_path(path)),
        None => format!("__{symbol}"),
    }
}

/// `__<prefix>Table_<path>` for a class/module/instance/function table.
#[must_use]
pub fn encode_tablename(prefix: &str, path: &str) -> String {
    format!("__{prefix}Table_{}", encode_path(path))
}

/// `__<prefix>size[_<path>]` for a size enum tag.
#[must_use]
pub fn encode_size(prefix: &str, path: Option<&str>) -> String {
    match path {
        Some(path) => format!("__{prefix}size_{}", encode_path(path)),
        None => format!("__{prefix}size"),
    }
}

/// The unbound method at `path` names its bound sibling `bound_<path>`.
#[must_use]
pub fn encode_bound_reference(path: &str) -> String {
    format!("bound_{}", encode_path(path))
}

/// A plain function pointer reference.
#[must_use]
pub fn encode_function_pointer(path: &str) -> String {
    encode_path(path)
}

/// The per-class instantiator thunk, `__new_<path>`.
#[must_use]
pub fn encode_instantiator_pointer(path: &str) -> String {
    format!("__new_{}", encode_path(path))
}

/// The per-object struct instance, `__obj_<path>`.
#[must_use]
pub fn encode_obj_symbol(path: &str) -> String {
    encode_symbol("obj", Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_path_flattens_dots() {
        assert_eq!(encode_path("pkg.mod.Class"), "pkg_mod_Class");
    }

    #[test]
    fn encode_instantiator_pointer_matches_new_prefix() {
        assert_eq!(encode_instantiator_pointer("m.A"), "__new_m_A");
    }

    #[test]
    fn encode_bound_reference_prefixes_bound() {
        assert_eq!(encode_bound_reference("A.method"), "bound_A_method");
    }
}
