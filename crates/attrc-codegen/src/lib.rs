//! Layout and emission engine: given the
//! deducer's output plus an optimiser's attribute-table and
//! parameter-table assignments, lays out every class, module, instance,
//! and function as a fixed-size record and emits the five C artifacts
//! (`progconsts.h`, `progtypes.h`, `progtypes.c`, `main.h`, `main.c`).

pub mod codes;
pub mod constants;
pub mod functions;
pub mod instantiator;
pub mod layout;
pub mod naming;
pub mod optimiser;
pub mod sizes;
pub mod writer;

pub use optimiser::OptimiserFacts;
pub use writer::write_all;
