//! String interning for qualified names, origins, and attribute names.
//!
//! Every `Reference` origin, every location's `unit_path`/`name`, and every
//! attribute name flows through the pipeline many times (once per usage
//! branch, once per access, once per emitted table row). Interning turns
//! those comparisons and hashes into a single `u32` compare instead of a
//! string compare, and lets every map keyed by name use a cheap `Copy` key.

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

/// An interned string: a small, `Copy`, hashable handle.
///
/// Two `Atom`s are equal iff the strings they were interned from are equal.
/// `Atom`'s `Ord` is by interning order, not lexical order — callers that
/// need sorted output should sort by the resolved `&str` explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// The raw index assigned at intern time. Stable for the life of the
    /// `Interner` that produced it; meaningless across different interners.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// A single-threaded string interner.
///
/// Use this when the whole pipeline runs in one thread (the deducer's
/// passes are ordered, see the crate-level docs). For concurrent interning
/// from parallel `rayon` workers, use [`ShardedInterner`].
#[derive(Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Atom>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing `Atom` if already seen.
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.lookup.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let boxed: Box<str> = s.into();
        self.strings.push(boxed.clone());
        self.lookup.insert(boxed, atom);
        atom
    }

    /// Resolve an `Atom` back to its string. Panics if `atom` was not
    /// produced by this interner.
    #[must_use]
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.index() as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// A thread-safe interner for building indexes in parallel (see:
/// parallelisation across independent definition locations).
#[derive(Clone, Default)]
pub struct ShardedInterner {
    inner: Arc<Mutex<Interner>>,
}

impl ShardedInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, s: &str) -> Atom {
        self.inner.lock().unwrap().intern(s)
    }

    #[must_use]
    pub fn resolve(&self, atom: Atom) -> String {
        self.inner.lock().unwrap().resolve(atom).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_interns_to_same_atom() {
        let mut i = Interner::new();
        let a = i.intern("foo.Bar");
        let b = i.intern("foo.Bar");
        assert_eq!(a, b);
        assert_eq!(i.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        let mut i = Interner::new();
        let a = i.intern("A");
        let b = i.intern("B");
        assert_ne!(a, b);
        assert_eq!(i.resolve(a), "A");
        assert_eq!(i.resolve(b), "B");
    }

    #[test]
    fn sharded_interner_is_consistent_across_clones() {
        let i = ShardedInterner::new();
        let j = i.clone();
        let a = i.intern("m.K");
        let b = j.intern("m.K");
        assert_eq!(a, b);
    }
}
