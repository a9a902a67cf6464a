//! Lowering of the normalized AST into an Avro schema.
//!
//! Unlike the BigQuery output, record fields keep their source order: Avro
//! field order is semantically significant. Nullable sites become
//! `["null", T]` unions, and nullable record fields default to null.

use serde_json::{Map, Value};

use crate::ast::{Atom, Schema, Variant};
use crate::error::{Result, TranspileError};
use crate::unify::unify;
use crate::TranspileConfig;

/// The subset of Avro 1.x schema forms the transpiler emits.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroSchema {
    Primitive(Primitive),
    Record {
        /// Dot-joined mangled path from the root record, unique within the
        /// emitted schema.
        name: String,
        fields: Vec<AvroField>,
    },
    Array {
        items: Box<AvroSchema>,
    },
    Map {
        values: Box<AvroSchema>,
    },
    /// `["null", T]` — the only union shape produced.
    Nullable(Box<AvroSchema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Double,
    String,
}

impl Primitive {
    fn name(self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Double => "double",
            Primitive::String => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvroField {
    pub name: String,
    pub schema: AvroSchema,
}

impl AvroSchema {
    /// Render the Avro schema JSON document.
    pub fn to_value(&self) -> Value {
        match self {
            AvroSchema::Primitive(p) => Value::String(p.name().to_string()),
            AvroSchema::Record { name, fields } => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), Value::String("record".to_string()));
                obj.insert("name".to_string(), Value::String(name.clone()));
                obj.insert(
                    "fields".to_string(),
                    Value::Array(fields.iter().map(AvroField::to_value).collect()),
                );
                Value::Object(obj)
            }
            AvroSchema::Array { items } => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), Value::String("array".to_string()));
                obj.insert("items".to_string(), items.to_value());
                Value::Object(obj)
            }
            AvroSchema::Map { values } => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), Value::String("map".to_string()));
                obj.insert("values".to_string(), values.to_value());
                Value::Object(obj)
            }
            AvroSchema::Nullable(inner) => Value::Array(vec![
                Value::String("null".to_string()),
                inner.to_value(),
            ]),
        }
    }
}

impl AvroField {
    fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::String(self.name.clone()));
        obj.insert("type".to_string(), self.schema.to_value());
        if matches!(self.schema, AvroSchema::Nullable(_)) {
            obj.insert("default".to_string(), Value::Null);
        }
        Value::Object(obj)
    }
}

/// Lower a normalized schema into its Avro shape. Fails only when a field
/// name cannot be mangled into a legal Avro identifier.
pub fn lower(schema: &Schema, config: &TranspileConfig) -> Result<AvroSchema> {
    let mut path = vec!["root".to_string()];
    lower_node(schema, &mut path, config)
}

fn lower_node(
    schema: &Schema,
    path: &mut Vec<String>,
    config: &TranspileConfig,
) -> Result<AvroSchema> {
    let lowered = match &schema.variant {
        Variant::Atom(atom) => AvroSchema::Primitive(primitive_of(*atom)),
        Variant::Object { fields, .. } => {
            let mut avro_fields = Vec::with_capacity(fields.len());
            for (name, field) in fields {
                let mangled = mangle(name).ok_or_else(|| TranspileError::InvalidName {
                    path: path.join("."),
                })?;
                path.push(mangled.clone());
                let lowered_field = lower_node(field, path, config);
                path.pop();
                avro_fields.push(AvroField {
                    name: mangled,
                    schema: lowered_field?,
                });
            }
            AvroSchema::Record {
                name: path.join("."),
                fields: avro_fields,
            }
        }
        Variant::Map { value } => AvroSchema::Map {
            values: Box::new(lower_node(value, path, config)?),
        },
        Variant::Array { items } => AvroSchema::Array {
            items: Box::new(lower_node(items, path, config)?),
        },
        Variant::Tuple { items } => {
            let folded = items
                .iter()
                .cloned()
                .reduce(|a, b| unify(a, b, config))
                .unwrap_or_else(Schema::json);
            AvroSchema::Array {
                items: Box::new(lower_node(&folded, path, config)?),
            }
        }
        // Normalization leaves no combinators behind.
        Variant::Union { .. } | Variant::Intersection { .. } => {
            AvroSchema::Primitive(Primitive::String)
        }
    };
    if schema.nullable && !matches!(lowered, AvroSchema::Primitive(Primitive::Null)) {
        Ok(AvroSchema::Nullable(Box::new(lowered)))
    } else {
        Ok(lowered)
    }
}

fn primitive_of(atom: Atom) -> Primitive {
    match atom {
        Atom::Bool => Primitive::Boolean,
        Atom::Int => Primitive::Int,
        Atom::Float => Primitive::Double,
        Atom::String | Atom::Json => Primitive::String,
        Atom::Null => Primitive::Null,
    }
}

/// Mangle a JSON field name into a legal Avro identifier: `-` and `.`
/// become `_`, a leading digit gains a `_` prefix, the empty name is
/// rejected.
fn mangle(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let mut out: String = name
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    Some(out)
}
