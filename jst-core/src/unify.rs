//! Lattice join over schemas.
//!
//! All three combinators fold through [`unify`]; there is no per-combinator
//! special casing. `Atom(Json)` is the top of the lattice: any pair that
//! cannot be reconciled structurally degrades to it at that node, and it
//! absorbs every other operand. Nullability is the logical OR of the two
//! operands.

use std::collections::BTreeSet;

use crate::ast::{Atom, FieldMap, Schema, Variant};
use crate::{debug, TranspileConfig};

/// Join two schemas into the most specific schema subsuming both.
pub fn unify(a: Schema, b: Schema, config: &TranspileConfig) -> Schema {
    let nullable = a.nullable || b.nullable;
    let mut out = join(a.variant, b.variant, config);
    out.nullable |= nullable;
    out
}

fn join(a: Variant, b: Variant, config: &TranspileConfig) -> Schema {
    match (a, b) {
        // Null joins with anything by making it nullable.
        (Variant::Atom(Atom::Null), other) | (other, Variant::Atom(Atom::Null)) => Schema {
            variant: other,
            nullable: true,
        },
        (Variant::Atom(x), Variant::Atom(y)) => Schema::atom(join_atoms(x, y, config)),
        (
            Variant::Object {
                fields: fa,
                required: ra,
            },
            Variant::Object {
                fields: fb,
                required: rb,
            },
        ) => join_objects(fa, ra, fb, rb, config),
        (Variant::Array { items: x }, Variant::Array { items: y }) => {
            Schema::new(Variant::Array {
                items: Box::new(unify(*x, *y, config)),
            })
        }
        (Variant::Map { value: x }, Variant::Map { value: y }) => Schema::new(Variant::Map {
            value: Box::new(unify(*x, *y, config)),
        }),
        // Tuples join as arrays of their folded element type.
        (Variant::Tuple { items }, other) => join(demote_tuple(items, config), other, config),
        (other, Variant::Tuple { items }) => join(other, demote_tuple(items, config), config),
        (a, b) => {
            debug!(
                config,
                "cannot join {} with {}: degrading to opaque json",
                kind_name(&a),
                kind_name(&b)
            );
            Schema::json()
        }
    }
}

fn join_atoms(a: Atom, b: Atom, config: &TranspileConfig) -> Atom {
    match (a, b) {
        (x, y) if x == y => x,
        // Integers subsume under float.
        (Atom::Int, Atom::Float) | (Atom::Float, Atom::Int) => Atom::Float,
        (Atom::Json, _) | (_, Atom::Json) => Atom::Json,
        (x, y) => {
            debug!(
                config,
                "cannot join {x:?} with {y:?}: degrading to opaque json"
            );
            Atom::Json
        }
    }
}

/// Field union: shared fields join recursively, one-sided fields become
/// nullable because the other alternative omits them. An alternative that
/// omits a field cannot require it, so `required` intersects.
fn join_objects(
    fa: FieldMap,
    ra: BTreeSet<String>,
    mut fb: FieldMap,
    rb: BTreeSet<String>,
    config: &TranspileConfig,
) -> Schema {
    let mut fields = FieldMap::with_capacity(fa.len() + fb.len());
    for (name, left) in fa {
        match fb.shift_remove(&name) {
            Some(right) => {
                fields.insert(name, unify(left, right, config));
            }
            None => {
                let mut left = left;
                left.nullable = true;
                fields.insert(name, left);
            }
        }
    }
    for (name, mut right) in fb {
        right.nullable = true;
        fields.insert(name, right);
    }
    let required: BTreeSet<String> = ra
        .intersection(&rb)
        .filter(|name| fields.contains_key(*name))
        .cloned()
        .collect();
    Schema::new(Variant::Object { fields, required })
}

fn demote_tuple(items: Vec<Schema>, config: &TranspileConfig) -> Variant {
    let folded = items
        .into_iter()
        .reduce(|a, b| unify(a, b, config))
        .unwrap_or_else(Schema::json);
    Variant::Array {
        items: Box::new(folded),
    }
}

fn kind_name(variant: &Variant) -> &'static str {
    match variant {
        Variant::Atom(_) => "atom",
        Variant::Object { .. } => "object",
        Variant::Map { .. } => "map",
        Variant::Array { .. } => "array",
        Variant::Tuple { .. } => "tuple",
        Variant::Union { .. } => "union",
        Variant::Intersection { .. } => "intersection",
    }
}
