//! Centralized limits and thresholds for the deducer and code generator.
//!
//! Centralizing these values documents the rationale for each one and keeps
//! every recursive/iterative pass bailing out at the same depth instead of
//! drifting apart as call sites are added.

/// Maximum depth for the descendant-closure DFS over `subclasses`.
///
/// A cyclic `subclasses` graph is a bug in the Importer's input, not
/// something the deducer can fix, but the DFS still needs a hard stop so a
/// malformed fact base produces a diagnostic instead of a stack overflow.
pub const MAX_DESCENDANT_DFS_DEPTH: u32 = 2_000;

/// Maximum number of hops the alias-flattening walk will follow
/// before giving up and treating the chain as a cycle.
///
/// Aliases form a DAG in well-formed input; the visited-set guard in
/// `init_aliases` already prevents infinite loops, but a very long
/// legitimate chain (re-exports through many modules) should still
/// terminate in bounded time rather than silently degrade.
pub const MAX_ALIAS_CHAIN_DEPTH: u32 = 10_000;

/// Maximum number of usage-branches merged per definition location before
/// the solver logs a size warning.
///
/// Past this, `record_types_for_usage` is still correct but the per-location
/// set union starts dominating wall-clock time; it usually indicates a
/// generated or pathological source unit.
pub const USAGE_BRANCH_WARN_THRESHOLD: usize = 4_096;
