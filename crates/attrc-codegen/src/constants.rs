//! Literal/predefined constants: every distinct literal
//! value emits an instance record plus a `const<n>` macro evaluating to
//! `{&record, &record}`. The four predefined named constants ride the same
//! mechanism under fixed paths.

use crate::naming::encode_path;
use attrc_importer::Reference;

/// Names the deducer's fact base binds under fixed paths, each resolved to
/// a literal-class instance the same way any other constant is.
pub const PREDEFINED_CONSTANTS: [&str; 4] = ["False", "True", "None", "NotImplemented"];

/// `#define const<n> {&<record>, &<record>}` for each entry of
/// `opt.constants`, in index order (index IS `n` - the optimiser assigns
/// it when building `constant_numbers`).
#[must_use]
pub fn constant_macros(constants: &[Reference]) -> String {
    let mut out = String::new();
    for (n, constant) in constants.iter().enumerate() {
        let Some(origin) = constant.origin() else { continue };
        let path = encode_path(origin);
        out.push_str(&format!("#define const{n} {{&{path}, &{path}}}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_macros_indexes_by_position() {
        let constants = vec![Reference::instance("m.A"), Reference::instance("m.B")];
        let text = constant_macros(&constants);
        assert!(text.contains("#define const0 {&m_A, &m_A}"));
        assert!(text.contains("#define const1 {&m_B, &m_B}"));
    }
}
