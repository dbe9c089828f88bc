//! Diagnostic types shared by the deducer and the code generator.
//!
//! Unlike a source-text compiler, the core never points at a byte offset:
//! every diagnostic is anchored to a `Location`-shaped string (see
//! `attrc_importer::reference::encode_location`) because that is the only
//! position concept the Importer fact base exposes to this layer.

use std::fmt;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

/// The five error kinds the core distinguishes.
///
/// `InvalidReference` and I/O failures are fatal; the rest are recorded and
/// analysis continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A reference whose `kind` field is itself a reference. Fatal.
    InvalidReference,
    /// A free name with no global or built-in binding.
    UnresolvedName,
    /// A class base that did not resolve to a class reference.
    BadClassBase,
    /// A location whose accessor type set is empty after deduction.
    TypeWarning,
    /// A class attribute shown to be mutated on an instance.
    MutationConflict,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn category(self) -> DiagnosticCategory {
        match self {
            Self::InvalidReference => DiagnosticCategory::Error,
            Self::UnresolvedName
            | Self::BadClassBase
            | Self::TypeWarning
            | Self::MutationConflict => DiagnosticCategory::Warning,
        }
    }

    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::InvalidReference)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidReference => "invalid-reference",
            Self::UnresolvedName => "unresolved-name",
            Self::BadClassBase => "bad-class-base",
            Self::TypeWarning => "type-warning",
            Self::MutationConflict => "mutation-conflict",
        };
        f.write_str(s)
    }
}

/// A single diagnostic: a kind, the location string it is anchored to, and
/// a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> DiagnosticCategory {
        self.kind.category()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.message, self.location)
    }
}

/// An append-only sink for diagnostics produced during a pipeline run.
///
/// Warnings accumulate here instead of aborting the run; the first
/// fatal diagnostic is still propagated as an `Err` by the caller, this
/// struct just gives every pass a uniform place to push both.
#[derive(Default, Debug)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn warn(&mut self, kind: DiagnosticKind, location: impl Into<String>, message: impl Into<String>) {
        debug_assert_eq!(kind.category(), DiagnosticCategory::Warning);
        self.push(Diagnostic::new(kind, location, message));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category() == DiagnosticCategory::Error)
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_conflict_is_a_warning_not_fatal() {
        let d = Diagnostic::new(DiagnosticKind::MutationConflict, "A.f", "demoted to var");
        assert_eq!(d.category(), DiagnosticCategory::Warning);
        assert!(!d.kind.is_fatal());
    }

    #[test]
    fn invalid_reference_is_fatal() {
        assert!(DiagnosticKind::InvalidReference.is_fatal());
    }

    #[test]
    fn bag_has_errors_only_when_fatal_kind_present() {
        let mut bag = DiagnosticBag::new();
        bag.warn(DiagnosticKind::TypeWarning, "m.f:0", "empty accessor set");
        assert!(!bag.has_errors());
        bag.push(Diagnostic::new(DiagnosticKind::InvalidReference, "m.f:0", "bad kind"));
        assert!(bag.has_errors());
    }
}
