//! JSON Schema keyword dispatch: a generic `serde_json::Value` into the
//! schema AST.
//!
//! Recognized keywords: `type`, `properties`, `required`,
//! `additionalProperties`, `patternProperties`, `items`, `oneOf`, `anyOf`,
//! `allOf`. Everything else is ignored silently. Structural ambiguity is
//! deferred to normalization; only malformed documents and unknown `type`
//! strings fail here.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::ast::{Atom, Schema, Variant};
use crate::error::{Result, TranspileError};

/// Parse a decoded JSON Schema document into the schema AST.
pub fn parse_schema(value: &Value) -> Result<Schema> {
    parse_node(value, &mut Vec::new())
}

/// Parse JSON text, then the schema within it.
pub fn parse_schema_str(text: &str) -> Result<Schema> {
    let value: Value = serde_json::from_str(text).map_err(|err| TranspileError::Parse {
        path: "root".to_string(),
        reason: err.to_string(),
    })?;
    parse_schema(&value)
}

fn parse_node(value: &Value, path: &mut Vec<String>) -> Result<Schema> {
    let obj = value
        .as_object()
        .ok_or_else(|| parse_err(path, "schema must be a JSON object"))?;

    // Combinators win over sibling keywords.
    if let Some(alts) = obj.get("oneOf") {
        return parse_combinator("oneOf", alts, path, |alts| Variant::Union { alts });
    }
    if let Some(alts) = obj.get("anyOf") {
        return parse_combinator("anyOf", alts, path, |alts| Variant::Union { alts });
    }
    if let Some(alts) = obj.get("allOf") {
        return parse_combinator("allOf", alts, path, |alts| Variant::Intersection { alts });
    }

    match obj.get("type") {
        Some(Value::String(name)) => parse_typed(name, obj, path),
        Some(Value::Array(names)) => parse_multitype(names, obj, path),
        Some(other) => Err(parse_err(
            path,
            &format!("`type` must be a string or an array of strings, got {other}"),
        )),
        None => parse_untyped(obj, path),
    }
}

fn parse_combinator<F>(
    keyword: &str,
    alts: &Value,
    path: &mut Vec<String>,
    build: F,
) -> Result<Schema>
where
    F: FnOnce(Vec<Schema>) -> Variant,
{
    let list = alts
        .as_array()
        .ok_or_else(|| parse_err(path, &format!("`{keyword}` must be an array of schemas")))?;
    let mut parsed = Vec::with_capacity(list.len());
    for alt in list {
        parsed.push(parse_node(alt, path)?);
    }
    Ok(Schema::new(build(parsed)))
}

fn parse_typed(name: &str, obj: &Map<String, Value>, path: &mut Vec<String>) -> Result<Schema> {
    match name {
        "boolean" => Ok(Schema::atom(Atom::Bool)),
        "integer" => Ok(Schema::atom(Atom::Int)),
        "number" => Ok(Schema::atom(Atom::Float)),
        "string" => Ok(Schema::atom(Atom::String)),
        "null" => Ok(Schema {
            variant: Variant::Atom(Atom::Null),
            nullable: true,
        }),
        "object" => parse_object(obj, path),
        "array" => parse_array(obj, path),
        other => Err(TranspileError::UnsupportedType {
            path: join_path(path),
            name: other.to_string(),
        }),
    }
}

/// `type: [..]` is a union over the listed types, each parsed against the
/// full keyword set of the enclosing schema (so `["object", "null"]` with
/// `properties` works). A `"null"` entry folds into nullability.
fn parse_multitype(
    names: &[Value],
    obj: &Map<String, Value>,
    path: &mut Vec<String>,
) -> Result<Schema> {
    let mut nullable = false;
    let mut alts = Vec::with_capacity(names.len());
    for name in names {
        let name = name
            .as_str()
            .ok_or_else(|| parse_err(path, "`type` array entries must be strings"))?;
        if name == "null" {
            nullable = true;
            continue;
        }
        alts.push(parse_typed(name, obj, path)?);
    }
    let mut schema = match alts.len() {
        0 => Schema::atom(Atom::Null),
        1 => alts.remove(0),
        _ => Schema::new(Variant::Union { alts }),
    };
    schema.nullable |= nullable;
    Ok(schema)
}

/// Dispatch for schemas without a `type` keyword. draft-04 documents often
/// omit `type: "object"` when shape keywords make it obvious.
fn parse_untyped(obj: &Map<String, Value>, path: &mut Vec<String>) -> Result<Schema> {
    if obj.contains_key("properties")
        || obj.contains_key("additionalProperties")
        || obj.contains_key("patternProperties")
    {
        return parse_object(obj, path);
    }
    if obj.contains_key("items") {
        return parse_array(obj, path);
    }
    if let Some(required) = obj.get("required") {
        // Bare `{"required": [...]}` overlay, meaningful inside `allOf`.
        return Ok(Schema::new(Variant::Object {
            fields: IndexMap::new(),
            required: parse_required(required, path)?,
        }));
    }
    // Nothing recognized: the schema accepts any instance, so its shape is
    // opaque.
    Ok(Schema::json())
}

fn parse_object(obj: &Map<String, Value>, path: &mut Vec<String>) -> Result<Schema> {
    let properties = obj
        .get("properties")
        .and_then(|p| p.as_object())
        .filter(|p| !p.is_empty());

    // `additionalProperties: true/false` only opens or closes the key set;
    // a schema value declares the shape of free-form keys.
    let additional = obj
        .get("additionalProperties")
        .filter(|v| v.is_object());
    let patterns: Vec<(&String, &Value)> = obj
        .get("patternProperties")
        .and_then(|p| p.as_object())
        .map(|p| p.iter().collect())
        .unwrap_or_default();

    if let Some(props) = properties {
        if additional.is_some() || !patterns.is_empty() {
            // Fixed fields mixed with free-form keys have no faithful
            // columnar shape.
            return Ok(Schema::json());
        }
        let mut fields = IndexMap::with_capacity(props.len());
        for (name, child) in props {
            path.push(name.clone());
            let parsed = parse_node(child, path);
            path.pop();
            fields.insert(name.clone(), parsed?);
        }
        let required = match obj.get("required") {
            Some(names) => {
                let mut required = parse_required(names, path)?;
                required.retain(|name| fields.contains_key(name));
                required
            }
            None => BTreeSet::new(),
        };
        return Ok(Schema::new(Variant::Object { fields, required }));
    }

    // Map shape: the common value schema is the union of every free-form
    // value schema present.
    let mut alts = Vec::new();
    for (pattern, child) in patterns {
        path.push(pattern.clone());
        let parsed = parse_node(child, path);
        path.pop();
        alts.push(parsed?);
    }
    if let Some(child) = additional {
        path.push("additionalProperties".to_string());
        let parsed = parse_node(child, path);
        path.pop();
        alts.push(parsed?);
    }
    match alts.len() {
        // `{"type": "object"}` with no shape keywords at all.
        0 => Ok(Schema::json()),
        1 => Ok(Schema::new(Variant::Map {
            value: Box::new(alts.remove(0)),
        })),
        _ => Ok(Schema::new(Variant::Map {
            value: Box::new(Schema::new(Variant::Union { alts })),
        })),
    }
}

fn parse_array(obj: &Map<String, Value>, path: &mut Vec<String>) -> Result<Schema> {
    match obj.get("items") {
        Some(items @ Value::Object(_)) => {
            path.push("items".to_string());
            let parsed = parse_node(items, path);
            path.pop();
            Ok(Schema::new(Variant::Array {
                items: Box::new(parsed?),
            }))
        }
        Some(Value::Array(list)) if !list.is_empty() => {
            let mut items = Vec::with_capacity(list.len());
            for (index, item) in list.iter().enumerate() {
                path.push(index.to_string());
                let parsed = parse_node(item, path);
                path.pop();
                items.push(parsed?);
            }
            Ok(Schema::new(Variant::Tuple { items }))
        }
        // `items` absent, empty, or unrecognized: element shape unknown.
        _ => Ok(Schema::new(Variant::Array {
            items: Box::new(Schema::json()),
        })),
    }
}

fn parse_required(value: &Value, path: &mut Vec<String>) -> Result<BTreeSet<String>> {
    let list = value
        .as_array()
        .ok_or_else(|| parse_err(path, "`required` must be an array of strings"))?;
    let mut names = BTreeSet::new();
    for name in list {
        let name = name
            .as_str()
            .ok_or_else(|| parse_err(path, "`required` entries must be strings"))?;
        names.insert(name.to_string());
    }
    Ok(names)
}

fn parse_err(path: &[String], reason: &str) -> TranspileError {
    TranspileError::Parse {
        path: join_path(path),
        reason: reason.to_string(),
    }
}

fn join_path(path: &[String]) -> String {
    std::iter::once("root")
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(".")
}
