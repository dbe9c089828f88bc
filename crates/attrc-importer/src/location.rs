//! `Location` - the key every per-site deduction table is indexed by.
//!
//! A *definition* location has `attrnames = None` and an integer `version`
//! distinguishing static-single-assignment-like name versions. An *access*
//! location has `Some(attrnames)` and an `access_number`. Both variants share
//! `(unit_path, name)`, so [`Location`] is a single sum type rather than two
//! unrelated structs — most of the pipeline's maps are keyed by whichever
//! variant their pass cares about, and a few (the alias index) mix both.

use std::fmt;

/// A name-definition site: `(path, name, version)`. `attrnames = ⊥`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefLocation {
    pub unit_path: String,
    pub name: String,
    pub version: u32,
}

impl DefLocation {
    #[must_use]
    pub fn new(unit_path: impl Into<String>, name: impl Into<String>, version: u32) -> Self {
        Self {
            unit_path: unit_path.into(),
            name: name.into(),
            version,
        }
    }

    /// `encode(location) = "<scope>.<name>:<version>"`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}.{}:{}", self.unit_path, self.name, self.version)
    }
}

impl fmt::Display for DefLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// An attribute-access site: `(path, name, attrnames, access_number)`.
///
/// A missing `name` (an anonymous chain access, see `init_usage_index`) is
/// represented as `name = None` and encodes as `#<attrnames>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessLocation {
    pub unit_path: String,
    pub name: Option<String>,
    pub attrnames: Vec<String>,
    pub access_number: u32,
}

impl AccessLocation {
    #[must_use]
    pub fn new(
        unit_path: impl Into<String>,
        name: Option<String>,
        attrnames: Vec<String>,
        access_number: u32,
    ) -> Self {
        Self {
            unit_path: unit_path.into(),
            name,
            attrnames,
            access_number,
        }
    }

    /// `encode(access_location) = "<scope>.<name> <attrnames>:<access_number>"`,
    /// with a missing name written as `#<attrnames>`.
    #[must_use]
    pub fn encode(&self) -> String {
        let name_part = match &self.name {
            Some(n) => format!("{}.{n}", self.unit_path),
            None => format!("{}.#{}", self.unit_path, self.attrnames.join(".")),
        };
        format!("{name_part} {}:{}", self.attrnames.join("."), self.access_number)
    }

    /// The definition-location this access would have if it were instead
    /// treated as a bare name reference (used when flattening aliases):
    /// same `(path, name)`, any `version`.
    #[must_use]
    pub fn as_def_location(&self, version: u32) -> Option<DefLocation> {
        self.name.as_ref().map(|n| DefLocation::new(self.unit_path.clone(), n.clone(), version))
    }
}

impl fmt::Display for AccessLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn def_location_encodes_as_scope_name_version() {
        let loc = DefLocation::new("m.f", "self", 0);
        assert_eq!(loc.encode(), "m.f.self:0");
    }

    #[test]
    fn access_location_encodes_with_attrnames_and_number() {
        let loc = AccessLocation::new("m.f", Some("g".to_string()), vec!["x".to_string(), "y".to_string()], 3);
        assert_eq!(loc.encode(), "m.f.g x.y:3");
    }

    #[test]
    fn access_location_with_missing_name_uses_hash_marker() {
        let loc = AccessLocation::new("m.f", None, vec!["x".to_string()], 0);
        assert_eq!(loc.encode(), "m.f.#x x:0");
    }
}
