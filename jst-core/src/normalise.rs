//! Bottom-up rewrite of the parsed AST into canonical form.
//!
//! After normalization the tree contains only `Atom`, `Object`, `Map`,
//! `Array` and `Tuple` nodes, and every field's `nullable` flag is
//! effective: `required` has been folded in, so the synthesizers read
//! nothing but the flag.

use std::collections::BTreeSet;

use crate::ast::{Atom, Schema, Variant};
use crate::unify::unify;
use crate::{debug, TranspileConfig};

/// Normalize a parsed schema: fold combinators, absorb nullable-union
/// spellings, demote homogeneous tuples, and resolve `required` into
/// per-field nullability. Total; never fails.
pub fn normalise(schema: Schema, config: &TranspileConfig) -> Schema {
    resolve_required(rewrite(schema, config))
}

fn rewrite(schema: Schema, config: &TranspileConfig) -> Schema {
    let Schema { variant, nullable } = schema;
    let mut out = match variant {
        Variant::Atom(atom) => Schema::atom(atom),
        Variant::Object { fields, required } => Schema::new(Variant::Object {
            fields: fields
                .into_iter()
                .map(|(name, field)| (name, rewrite(field, config)))
                .collect(),
            required,
        }),
        Variant::Map { value } => Schema::new(Variant::Map {
            value: Box::new(rewrite(*value, config)),
        }),
        Variant::Array { items } => Schema::new(Variant::Array {
            items: Box::new(rewrite(*items, config)),
        }),
        Variant::Tuple { items } => rewrite_tuple(items, config),
        Variant::Union { alts } => rewrite_union(alts, config),
        Variant::Intersection { alts } => rewrite_intersection(alts, config),
    };
    out.nullable |= nullable;
    out
}

/// `oneOf` / `anyOf`: null alternatives collapse into nullability, a
/// singleton collapses to its element, anything larger folds through the
/// merge lattice.
fn rewrite_union(alts: Vec<Schema>, config: &TranspileConfig) -> Schema {
    let mut nullable = false;
    let mut rest = Vec::with_capacity(alts.len());
    for alt in alts {
        let alt = rewrite(alt, config);
        if alt.is_null() {
            nullable = true;
            continue;
        }
        nullable |= alt.nullable;
        rest.push(alt);
    }
    let mut out = match fold(rest, config) {
        Some(schema) => schema,
        // Only null alternatives remained: an empty nullable.
        None => Schema::atom(Atom::Null),
    };
    out.nullable |= nullable;
    out
}

/// `allOf`: field-less `required` overlays mark fields of the object they
/// intersect with as required, without changing field presence; everything
/// else folds through the merge lattice.
fn rewrite_intersection(alts: Vec<Schema>, config: &TranspileConfig) -> Schema {
    let mut overlay = BTreeSet::new();
    let mut rest = Vec::with_capacity(alts.len());
    for alt in alts {
        let Schema { variant, nullable } = rewrite(alt, config);
        match variant {
            Variant::Object { fields, required } if fields.is_empty() && !required.is_empty() => {
                overlay.extend(required);
            }
            variant => rest.push(Schema { variant, nullable }),
        }
    }
    let Some(mut out) = fold(rest, config) else {
        // Overlays with nothing to require: the shape is unknown.
        return Schema::json();
    };
    if !overlay.is_empty() {
        if let Variant::Object { fields, required } = &mut out.variant {
            for name in overlay {
                // Overlay names only bind to fields that exist.
                if fields.contains_key(&name) {
                    required.insert(name);
                }
            }
        } else {
            debug!(config, "required overlay on a non-object schema: ignored");
        }
    }
    out
}

fn rewrite_tuple(items: Vec<Schema>, config: &TranspileConfig) -> Schema {
    let items: Vec<Schema> = items
        .into_iter()
        .map(|item| rewrite(item, config))
        .collect();
    if items.is_empty() {
        return Schema::new(Variant::Array {
            items: Box::new(Schema::json()),
        });
    }
    let homogeneous = items
        .split_first()
        .is_some_and(|(first, rest)| rest.iter().all(|item| item == first));
    if homogeneous {
        // A tuple whose items all agree is just an array.
        let first = items.into_iter().next().unwrap_or_else(Schema::json);
        return Schema::new(Variant::Array {
            items: Box::new(first),
        });
    }
    Schema::new(Variant::Tuple { items })
}

fn fold(alts: Vec<Schema>, config: &TranspileConfig) -> Option<Schema> {
    let mut iter = alts.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |acc, next| unify(acc, next, config)))
}

/// Fold each object's `required` set into the effective nullability of its
/// fields: a field absent from `required` may be missing, and a missing
/// field is indistinguishable from null downstream. An intrinsically
/// nullable field stays nullable even when required.
fn resolve_required(schema: Schema) -> Schema {
    let Schema { variant, nullable } = schema;
    let variant = match variant {
        Variant::Object { fields, required } => {
            let fields = fields
                .into_iter()
                .map(|(name, mut field)| {
                    field.nullable |= !required.contains(&name);
                    let field = resolve_required(field);
                    (name, field)
                })
                .collect();
            Variant::Object { fields, required }
        }
        Variant::Map { value } => Variant::Map {
            value: Box::new(resolve_required(*value)),
        },
        Variant::Array { items } => Variant::Array {
            items: Box::new(resolve_required(*items)),
        },
        Variant::Tuple { items } => Variant::Tuple {
            items: items.into_iter().map(resolve_required).collect(),
        },
        atom => atom,
    };
    Schema { variant, nullable }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_schema;
    use serde_json::json;

    fn normalised(value: serde_json::Value) -> Schema {
        normalise(
            parse_schema(&value).unwrap(),
            &TranspileConfig::default(),
        )
    }

    #[test]
    fn union_absorbs_null_alternatives() {
        let schema = normalised(json!({"oneOf": [{"type": "string"}, {"type": "null"}]}));
        assert_eq!(schema.variant, Variant::Atom(Atom::String));
        assert!(schema.nullable);
    }

    #[test]
    fn singleton_union_collapses() {
        let schema = normalised(json!({"oneOf": [{"type": "integer"}]}));
        assert_eq!(schema, Schema::atom(Atom::Int));
    }

    #[test]
    fn union_of_only_null_is_empty_nullable() {
        let schema = normalised(json!({"oneOf": [{"type": "null"}]}));
        assert_eq!(schema.variant, Variant::Atom(Atom::Null));
        assert!(schema.nullable);
    }

    #[test]
    fn union_folds_through_merge() {
        let schema = normalised(json!({"oneOf": [{"type": "integer"}, {"type": "number"}]}));
        assert_eq!(schema.variant, Variant::Atom(Atom::Float));
    }

    #[test]
    fn required_overlay_applies_inside_allof() {
        let schema = normalised(json!({
            "allOf": [
                {
                    "type": "object",
                    "properties": {
                        "a": {"type": ["integer", "null"]},
                        "b": {"type": "boolean"},
                    },
                },
                {"required": ["a", "b"]},
            ]
        }));
        match schema.variant {
            Variant::Object { fields, required } => {
                assert_eq!(required.len(), 2);
                // Intrinsic nullability survives being required.
                assert!(fields["a"].nullable);
                assert!(!fields["b"].nullable);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn unrequired_fields_become_nullable() {
        let schema = normalised(json!({
            "type": "object",
            "properties": {
                "req": {"type": "integer"},
                "opt": {"type": "integer"},
            },
            "required": ["req"],
        }));
        match schema.variant {
            Variant::Object { fields, .. } => {
                assert!(!fields["req"].nullable);
                assert!(fields["opt"].nullable);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn homogeneous_tuple_demotes_to_array() {
        let schema = normalised(json!({
            "type": "array",
            "items": [{"type": "integer"}, {"type": "integer"}],
        }));
        match schema.variant {
            Variant::Array { items } => assert_eq!(items.variant, Variant::Atom(Atom::Int)),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn heterogeneous_tuple_survives() {
        let schema = normalised(json!({
            "type": "array",
            "items": [{"type": "integer"}, {"type": "string"}],
        }));
        assert!(matches!(schema.variant, Variant::Tuple { .. }));
    }

    #[test]
    fn map_value_union_folds() {
        let schema = normalised(json!({
            "type": "object",
            "patternProperties": {
                "^S_": {"type": "string"},
                "^I_": {"type": "integer"},
            },
        }));
        match schema.variant {
            Variant::Map { value } => assert_eq!(value.variant, Variant::Atom(Atom::Json)),
            other => panic!("expected map, got {other:?}"),
        }
    }
}
