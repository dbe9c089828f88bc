//! Deducer: the whole-program attribute deduction engine.
//!
//! Consumes an [`attrc_importer::FactBase`] and produces the reference,
//! type, guard, and mutation facts the code generator needs to lay out
//! objects without runtime type information. [`attr_index`] builds the
//! attribute-type index, [`descendants`] computes subclass closures,
//! [`indexes`] merges usage/access/alias streams, [`solver`] deduces
//! per-location types, [`identifier`] resolves attribute references,
//! [`classifier`] computes guard and test kinds, [`writer`] emits the
//! output artifacts, and [`pipeline`] orders all of the above.

pub mod attr_index;
pub mod classifier;
pub mod descendants;
pub mod identifier;
pub mod indexes;
pub mod pipeline;
pub mod solver;
pub mod writer;

pub use attr_index::AttributeTypeIndex;
pub use classifier::{AccessClassification, AttributeClassifier, GuardTest};
pub use descendants::DescendantClosure;
pub use identifier::ReferenceIdentifier;
pub use indexes::{AccessorIndex, AliasIndex, AssignedAttrsIndex, UsageIndex};
pub use pipeline::{DeducerOutput, run};
pub use solver::{DeductionState, MethodContext};
pub use writer::DeducerWriter;
