//! Common types and utilities shared by the deducer and the code generator.
//!
//! This crate provides foundational pieces used across the pipeline:
//! - String interning (`Atom`, `Interner`, `ShardedInterner`)
//! - Diagnostics (`Diagnostic`, `DiagnosticKind`, `DiagnosticBag`)
//! - Centralized limits and thresholds

// String interning for qualified-name deduplication
pub mod interner;
pub use interner::{Atom, Interner, ShardedInterner};

// Diagnostics - the five error kinds from the error handling design
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCategory, DiagnosticKind};

// Centralized limits and thresholds
pub mod limits;
