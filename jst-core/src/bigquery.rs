//! Lowering of the normalized AST into a BigQuery table schema.
//!
//! Record fields are emitted sorted by name so two runs over the same input
//! produce byte-identical output.

use serde::Serialize;

use crate::ast::{Atom, Schema, Variant};
use crate::unify::unify;
use crate::TranspileConfig;

/// BigQuery column types produced by the transpiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BqType {
    Record,
    String,
    Integer,
    Float,
    Boolean,
}

/// BigQuery field modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BqMode {
    Required,
    Nullable,
    Repeated,
}

/// One field of a BigQuery schema. The schema root is an unnamed field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BqField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: BqType,
    pub mode: BqMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<BqField>>,
}

/// Lower a normalized schema into its BigQuery shape. Total: every
/// normalized tree has a BigQuery rendering.
pub fn lower(schema: &Schema, config: &TranspileConfig) -> BqField {
    lower_node(None, schema, config)
}

fn lower_node(name: Option<String>, schema: &Schema, config: &TranspileConfig) -> BqField {
    match &schema.variant {
        Variant::Atom(atom) => BqField {
            name,
            ty: atom_type(*atom),
            mode: mode_of(schema),
            fields: None,
        },
        Variant::Object { fields, .. } => {
            let mut lowered: Vec<BqField> = fields
                .iter()
                .map(|(child_name, child)| lower_node(Some(child_name.clone()), child, config))
                .collect();
            lowered.sort_by(|a, b| a.name.cmp(&b.name));
            BqField {
                name,
                ty: BqType::Record,
                mode: mode_of(schema),
                fields: Some(lowered),
            }
        }
        Variant::Map { value } => {
            // Maps flatten to a repeated key/value record, queryable with
            // UNNEST.
            let key = BqField {
                name: Some("key".to_string()),
                ty: BqType::String,
                mode: BqMode::Required,
                fields: None,
            };
            let mut value = lower_node(Some("value".to_string()), value, config);
            if value.mode != BqMode::Repeated {
                value.mode = BqMode::Required;
            }
            BqField {
                name,
                ty: BqType::Record,
                mode: BqMode::Repeated,
                fields: Some(vec![key, value]),
            }
        }
        Variant::Array { items } => {
            // REPEATED wins: BigQuery arrays cannot hold null, so element
            // nullability collapses into the mode.
            let mut field = lower_node(name, items, config);
            field.mode = BqMode::Repeated;
            field
        }
        Variant::Tuple { items } => {
            let folded = items
                .iter()
                .cloned()
                .reduce(|a, b| unify(a, b, config))
                .unwrap_or_else(Schema::json);
            let mut field = lower_node(name, &folded, config);
            field.mode = BqMode::Repeated;
            field
        }
        // Normalization leaves no combinators behind.
        Variant::Union { .. } | Variant::Intersection { .. } => BqField {
            name,
            ty: BqType::String,
            mode: mode_of(schema),
            fields: None,
        },
    }
}

fn mode_of(schema: &Schema) -> BqMode {
    if schema.nullable {
        BqMode::Nullable
    } else {
        BqMode::Required
    }
}

fn atom_type(atom: Atom) -> BqType {
    match atom {
        Atom::Int => BqType::Integer,
        Atom::Float => BqType::Float,
        Atom::Bool => BqType::Boolean,
        // Null and the opaque blob are both treated as opaque strings.
        Atom::String | Atom::Null | Atom::Json => BqType::String,
    }
}
