// `allOf` intersections and the bare `required` overlay spelling.
use jst_core::bq_schema;
use serde_json::json;

#[test]
fn allof_object() {
    let allof = json!({
        "allOf": [
            {
                "type": "object",
                "properties": {
                    "field_1": {"type": ["integer", "null"]},
                    "field_2": {"type": "string"},
                    "field_3": {"type": "boolean"},
                },
            },
            {"required": ["field_1", "field_3"]},
        ],
    });
    let expected = json!({
        "type": "RECORD",
        "mode": "REQUIRED",
        "fields": [
            {"name": "field_1", "type": "INTEGER", "mode": "NULLABLE"},
            {"name": "field_2", "type": "STRING", "mode": "NULLABLE"},
            {"name": "field_3", "type": "BOOLEAN", "mode": "REQUIRED"},
        ],
    });
    assert_eq!(bq_schema(&allof).unwrap(), expected);
}

#[test]
fn allof_overlay_ignores_unknown_fields() {
    let allof = json!({
        "allOf": [
            {
                "type": "object",
                "properties": {"field_1": {"type": "integer"}},
            },
            {"required": ["field_1", "phantom"]},
        ],
    });
    let expected = json!({
        "type": "RECORD",
        "mode": "REQUIRED",
        "fields": [
            {"name": "field_1", "type": "INTEGER", "mode": "REQUIRED"},
        ],
    });
    assert_eq!(bq_schema(&allof).unwrap(), expected);
}

#[test]
fn allof_required_twice_is_idempotent() {
    let once = json!({
        "allOf": [
            {
                "type": "object",
                "properties": {"field_1": {"type": "integer"}},
            },
            {"required": ["field_1"]},
        ],
    });
    let twice = json!({
        "allOf": [
            {
                "type": "object",
                "properties": {"field_1": {"type": "integer"}},
            },
            {"required": ["field_1"]},
            {"required": ["field_1"]},
        ],
    });
    assert_eq!(bq_schema(&once).unwrap(), bq_schema(&twice).unwrap());
}

#[test]
fn allof_of_objects_merges() {
    let allof = json!({
        "allOf": [
            {
                "type": "object",
                "properties": {"field_1": {"type": "integer"}},
            },
            {
                "type": "object",
                "properties": {"field_2": {"type": "string"}},
            },
        ],
    });
    let expected = json!({
        "type": "RECORD",
        "mode": "REQUIRED",
        "fields": [
            {"name": "field_1", "type": "INTEGER", "mode": "NULLABLE"},
            {"name": "field_2", "type": "STRING", "mode": "NULLABLE"},
        ],
    });
    assert_eq!(bq_schema(&allof).unwrap(), expected);
}

#[test]
fn allof_of_only_overlays_is_opaque() {
    let allof = json!({"allOf": [{"required": ["field_1"]}]});
    let expected = json!({"type": "STRING", "mode": "REQUIRED"});
    assert_eq!(bq_schema(&allof).unwrap(), expected);
}
