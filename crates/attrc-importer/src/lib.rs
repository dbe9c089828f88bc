//! The Importer facade: references, locations, usage, and the read-only
//! whole-program fact base the deducer and code generator consume.
//!
//! The source-language parser/inspector and the name-resolution pass that
//! populate a [`fact_base::FactBase`] are out of scope for this crate -
//! only the shape they produce is defined here.

pub mod fact_base;
pub mod location;
pub mod reference;
pub mod usage;

pub use fact_base::{FactBase, Importer, Module};
pub use location::{AccessLocation, DefLocation};
pub use reference::{InvalidReference, Reference, ReferenceKind};
pub use usage::{Usage, UsageKey, usage_key};
