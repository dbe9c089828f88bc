//! Attribute code/position enums: `code:<attrname>` assigns
//! every distinct attribute name a dense integer; `pos:<attrname>` assigns
//! each `(record, attr)` pair the slot index the optimiser gave it (so one
//! attribute name may appear at several positions, once per record).

use crate::naming::encode_symbol;

/// `enum __code { __code_<attrname> = i, ... }`, `i` in `all_attrnames` order.
#[must_use]
pub fn code_enum(all_attrnames: &[String]) -> String {
    let mut out = String::from("enum __code {\n");
    let members: Vec<String> = all_attrnames.iter().enumerate().map(|(i, name)| format!("    {} = {i}", encode_symbol("code", Some(name)))).collect();
    out.push_str(&members.join(",\n"));
    out.push_str("\n    };\n");
    out
}

/// `enum __pos { __pos_<attrname> = i, ... }` - `locations[i]` lists every
/// attribute name occupying slot `i` in some structure.
#[must_use]
pub fn pos_enum(locations: &[Vec<String>]) -> String {
    let mut out = String::from("enum __pos {\n");
    let mut members = Vec::new();
    for (i, attrnames) in locations.iter().enumerate() {
        for name in attrnames {
            members.push(format!("    {} = {i}", encode_symbol("pos", Some(name))));
        }
    }
    out.push_str(&members.join(",\n"));
    out.push_str("\n    };\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_enum_assigns_dense_indices_in_order() {
        let names = vec!["__fn__".to_string(), "x".to_string()];
        let enc = code_enum(&names);
        assert!(enc.contains("__code___fn__ = 0"));
        assert!(enc.contains("__code_x = 1"));
    }

    #[test]
    fn pos_enum_repeats_slot_across_shared_attrnames() {
        let locations = vec![vec!["x".to_string(), "y".to_string()]];
        let enc = pos_enum(&locations);
        assert!(enc.contains("__pos_x = 0"));
        assert!(enc.contains("__pos_y = 0"));
    }
}
