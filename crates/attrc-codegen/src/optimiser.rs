//! The attribute-table optimiser's output shape, consumed by the layout and
//! emission passes. Producing these tables (attribute-code and
//! parameter-position assignment) is out of scope; this module only
//! defines the shape the generator reads.

use attrc_importer::Reference;
use rustc_hash::FxHashMap;

/// One object's record layout: `structure[i]` names the attribute occupying
/// slot `i`, or `None` for a reserved gap.
pub type Structure = Vec<Option<String>>;

/// `attr_table[ref]` - per-slot attribute-code indexes into `all_attrnames`,
/// parallel to `structures[ref]`.
pub type AttrTable = Vec<Option<usize>>;

/// One parameter slot: `(name, position)`, or `None` for a gap.
pub type ParameterSlot = Option<(String, usize)>;

/// The optimiser's output: object layouts, attribute-table slot assignments,
/// and per-function parameter-table slot assignments, keyed by a `Reference`
/// or a qualified path depending on what the slot belongs to. References are
/// keyed by their `encode()` string so the maps don't need `Reference: Ord`.
#[derive(Clone, Debug, Default)]
pub struct OptimiserFacts {
    /// `ref.encode() -> structure`.
    pub structures: FxHashMap<String, Structure>,
    /// `ref.encode() -> attr_table`.
    pub attr_table: FxHashMap<String, AttrTable>,
    /// `function_path -> parameter slots`.
    pub parameters: FxHashMap<String, Vec<ParameterSlot>>,
    /// Every distinct attribute name that appears in any structure, in the
    /// order `code:<attrname>` should assign dense integers.
    pub all_attrnames: Vec<String>,
    /// `locations[i]` is the set of attribute names sharing position `i`
    /// across every structure (feeds the `pos:<attrname>` enum).
    pub locations: Vec<Vec<String>>,
    /// Every distinct parameter name that appears in any parameter table.
    pub all_paramnames: Vec<String>,
    /// `function_path -> argument slot source locations` (unused by the
    /// emitted artifacts directly, retained for completeness of the
    /// consumed shape).
    pub arg_locations: FxHashMap<String, Vec<String>>,
    /// `attr_path -> constant-record reference`, keyed like `attr_table`.
    pub constants: Vec<Reference>,
    /// `attr_path -> index into constants`, one entry per instance attribute
    /// with a literal value assigned directly.
    pub constant_numbers: FxHashMap<String, usize>,
}

impl OptimiserFacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(name, pos)` pairs for `path`, as used to build its entry in
    /// the `Function` parameter table.
    #[must_use]
    pub fn parameters_for(&self, path: &str) -> &[ParameterSlot] {
        self.parameters.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The attribute names carried by `ref_key`'s structure, resolving
    /// gaps to `None`.
    #[must_use]
    pub fn structure_of(&self, ref_key: &str) -> &[Option<String>] {
        self.structures.get(ref_key).map(Vec::as_slice).unwrap_or(&[])
    }
}
