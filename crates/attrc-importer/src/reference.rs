//! `Reference` - a tagged value `{kind, origin, name}`.
//!
//! `Reference` replaces any runtime-typed value object the source language
//! has: every site that needs to branch on "what kind of thing is this name
//! bound to" pattern-matches on [`ReferenceKind`] instead of walking an
//! inheritance hierarchy. See design note in: polymorphism over the
//! capability set `{kind, origin, name, get_types()}`.

use std::fmt;

/// The sum of kinds a [`Reference`] may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    Class,
    Instance,
    Module,
    Function,
    Var,
    Depends,
}

impl ReferenceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Instance => "instance",
            Self::Module => "module",
            Self::Function => "function",
            Self::Var => "var",
            Self::Depends => "depends",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a serialised reference's `kind` field is itself a
/// reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidReference(pub String);

impl fmt::Display for InvalidReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reference: {:?} has a kind that is itself a reference", self.0)
    }
}

impl std::error::Error for InvalidReference {}

/// A tagged reference: `kind`, an optional `origin` (fully qualified name),
/// and an optional `alias` name.
///
/// Invariant: a `var` reference has no origin. Equality and hashing use
/// `(kind, origin)` only — the alias name is display-only bookkeeping.
#[derive(Clone, Debug)]
pub struct Reference {
    kind: ReferenceKind,
    origin: Option<String>,
    alias: Option<String>,
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.origin == other.origin
    }
}

impl Eq for Reference {}

impl std::hash::Hash for Reference {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.origin.hash(state);
    }
}

impl Reference {
    /// Construct a reference. Panics if `kind == Var && origin.is_some()`;
    /// that invariant is upheld by every constructor below, so this is only
    /// reachable through direct misuse of the low-level constructor.
    #[must_use]
    pub fn new(kind: ReferenceKind, origin: Option<String>) -> Self {
        debug_assert!(
            !(kind == ReferenceKind::Var && origin.is_some()),
            "a var reference must not carry an origin"
        );
        Self {
            kind,
            origin,
            alias: None,
        }
    }

    #[must_use]
    pub fn class(origin: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Class, Some(origin.into()))
    }

    #[must_use]
    pub fn instance(origin: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Instance, Some(origin.into()))
    }

    #[must_use]
    pub fn module(origin: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Module, Some(origin.into()))
    }

    #[must_use]
    pub fn function(origin: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Function, Some(origin.into()))
    }

    #[must_use]
    pub fn var() -> Self {
        Self::new(ReferenceKind::Var, None)
    }

    #[must_use]
    pub const fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// The fully qualified name this reference names. `None` (⊥) for `var`.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub fn has_kind(&self, kind: ReferenceKind) -> bool {
        self.kind == kind
    }

    #[must_use]
    pub fn has_any_kind(&self, kinds: &[ReferenceKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// True iff this reference names a fixed program entity rather than a
    /// local binding: every kind except `var` and `instance`.
    #[must_use]
    pub const fn static_(&self) -> bool {
        !matches!(self.kind, ReferenceKind::Var | ReferenceKind::Instance)
    }

    /// `instance_of(class_ref) = instance:origin`.
    #[must_use]
    pub fn instance_of(&self) -> Option<Self> {
        if self.kind == ReferenceKind::Class {
            self.origin.clone().map(Self::instance)
        } else {
            None
        }
    }

    /// Discards the origin, producing a bare `var` reference.
    #[must_use]
    pub fn as_var(&self) -> Self {
        Self::var()
    }

    /// Attach or replace the alias name; does not affect equality/hash.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The origin split on `.`, e.g. `"pkg.mod.Class"` -> `["pkg", "mod", "Class"]`.
    #[must_use]
    pub fn get_path(&self) -> Vec<&str> {
        self.origin.as_deref().map(|o| o.split('.').collect()).unwrap_or_default()
    }

    /// True iff this reference's origin is provided by module `m`, i.e. the
    /// origin's module prefix equals `m`.
    #[must_use]
    pub fn provided_by_module(&self, m: &str) -> bool {
        match &self.origin {
            Some(origin) => match origin.rfind('.') {
                Some(idx) => &origin[..idx] == m,
                None => origin.as_str() == m,
            },
            None => false,
        }
    }

    /// Decode a serialised `"<kind>:origin"` / `"<kind>"` / `""` / module-name
    /// string into a `Reference`.
    ///
    /// - `"<kind>:origin"` - explicit kind and origin.
    /// - `"<kind>"` alone - origin defaults to the name the caller already
    ///   has in hand (passed separately; kind-only strings without a caller
    ///   supplied name decode to an originless reference of that kind).
    /// - `""` - a `var` reference.
    /// - anything else with no recognised `<kind>:` prefix - a bare module
    ///   name, i.e. `kind = module`.
    ///
    /// Fails with [`InvalidReference`] if the decoded `kind` field is itself
    /// one of the reserved kind tags nested inside another kind tag (e.g.
    /// `"class:class:Foo"`), which indicates the serialised fact base is
    /// corrupt.
    pub fn decode(s: &str) -> Result<Self, InvalidReference> {
        if s.is_empty() {
            return Ok(Self::var());
        }
        if let Some((kind_str, origin)) = s.split_once(':') {
            let kind = parse_kind(kind_str).ok_or_else(|| InvalidReference(s.to_string()))?;
            if parse_kind(origin).is_some() && origin.contains(':') {
                return Err(InvalidReference(s.to_string()));
            }
            return Ok(Self::new(kind, Some(origin.to_string())));
        }
        if let Some(kind) = parse_kind(s) {
            return Ok(Self::new(kind, Some(s.to_string())));
        }
        Ok(Self::module(s))
    }

    /// Serialise as `<kind>:<origin>` (the `ref` field format used by the
    /// deducer's output artifacts).
    #[must_use]
    pub fn encode(&self) -> String {
        match &self.origin {
            Some(origin) => format!("{}:{origin}", self.kind),
            None => self.kind.to_string(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn parse_kind(s: &str) -> Option<ReferenceKind> {
    match s {
        "class" => Some(ReferenceKind::Class),
        "instance" => Some(ReferenceKind::Instance),
        "module" => Some(ReferenceKind::Module),
        "function" => Some(ReferenceKind::Function),
        "var" => Some(ReferenceKind::Var),
        "depends" => Some(ReferenceKind::Depends),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_alias_name() {
        let a = Reference::class("m.K").alias("n1");
        let b = Reference::class("m.K").alias("n2");
        assert_eq!(a, b);
        let mut ha = rustc_hash::FxHashSet::default();
        ha.insert(a);
        assert!(ha.contains(&b));
    }

    #[test]
    fn var_has_no_origin() {
        let v = Reference::var();
        assert_eq!(v.origin(), None);
        assert!(!v.static_());
    }

    #[test]
    fn instance_of_a_class_reference() {
        let c = Reference::class("m.K");
        let i = c.instance_of().unwrap();
        assert_eq!(i, Reference::instance("m.K"));
    }

    #[test]
    fn static_is_false_only_for_var_and_instance() {
        assert!(Reference::class("m.K").static_());
        assert!(Reference::module("m").static_());
        assert!(Reference::function("m.f").static_());
        assert!(!Reference::instance("m.K").static_());
        assert!(!Reference::var().static_());
    }

    #[test]
    fn decode_explicit_kind_and_origin() {
        let r = Reference::decode("class:m.K").unwrap();
        assert_eq!(r, Reference::class("m.K"));
    }

    #[test]
    fn decode_empty_is_var() {
        assert_eq!(Reference::decode("").unwrap(), Reference::var());
    }

    #[test]
    fn decode_bare_module_name() {
        let r = Reference::decode("m.sub").unwrap();
        assert_eq!(r, Reference::module("m.sub"));
    }

    #[test]
    fn decode_rejects_nested_kind() {
        assert!(Reference::decode("class:class:Foo").is_err());
    }

    #[test]
    fn get_path_splits_on_dot() {
        let r = Reference::class("pkg.mod.Class");
        assert_eq!(r.get_path(), vec!["pkg", "mod", "Class"]);
    }

    #[test]
    fn provided_by_module_checks_prefix() {
        let r = Reference::function("pkg.mod.f");
        assert!(r.provided_by_module("pkg.mod"));
        assert!(!r.provided_by_module("pkg"));
    }
}
