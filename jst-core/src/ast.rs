//! The internal schema type algebra.
//!
//! Every pass in the pipeline pattern-matches over [`Variant`]: the parser
//! builds the full set of variants, normalization removes `Union` and
//! `Intersection`, and the synthesizers consume the rest.

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Atomic (non-composite) schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    Bool,
    Int,
    Float,
    String,
    /// The JSON `null` type. Only transient: union normalization absorbs it
    /// into the enclosing schema's nullability.
    Null,
    /// Opaque blob. The top of the merge lattice, emitted wherever two
    /// shapes cannot be reconciled; lowers to a plain string column.
    Json,
}

/// Ordered field map of an object schema. Insertion order is source order,
/// which the Avro synthesizer preserves in its output.
pub type FieldMap = IndexMap<String, Schema>;

#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Atom(Atom),
    Object {
        fields: FieldMap,
        /// Names of fields an instance must carry. Always a subset of
        /// `fields` keys, except for the field-less `required` overlay
        /// spelling consumed by `allOf` normalization.
        required: BTreeSet<String>,
    },
    /// Free-form keys with a common value schema (`additionalProperties`
    /// and/or `patternProperties` without `properties`).
    Map { value: Box<Schema> },
    Array { items: Box<Schema> },
    /// Heterogeneous `items: [..]` array. Demoted to `Array` when all item
    /// schemas agree; otherwise synthesizers fold the items into one
    /// element type.
    Tuple { items: Vec<Schema> },
    /// `oneOf` / `anyOf` / `type: [..]` alternatives. Pre-normalization only.
    Union { alts: Vec<Schema> },
    /// `allOf` alternatives. Pre-normalization only.
    Intersection { alts: Vec<Schema> },
}

/// A schema node plus its nullability. `nullable` is intrinsic ("the value
/// itself may be null"); whether a field may be *absent* is tracked by the
/// enclosing object's `required` set until normalization folds the two
/// together.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub variant: Variant,
    pub nullable: bool,
}

impl Schema {
    pub fn new(variant: Variant) -> Self {
        Schema {
            variant,
            nullable: false,
        }
    }

    pub fn atom(atom: Atom) -> Self {
        Schema::new(Variant::Atom(atom))
    }

    /// The opaque fallback schema.
    pub fn json() -> Self {
        Schema::atom(Atom::Json)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.variant, Variant::Atom(Atom::Null))
    }
}
