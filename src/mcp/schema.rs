//! JSON-Schema subset used by `tools/list`'s `inputSchema` and by
//! `tools/call`'s argument validation (spec §4.5 step 3).
//!
//! Only `{type:"object", properties:{...}, required:[...]}` is modeled;
//! this is intentionally not a general-purpose JSON Schema implementation.

use serde_json::Value;

/// Builds an `inputSchema` object. `required` names must all appear in
/// `properties` — callers are expected to uphold this; it is checked in
/// tests rather than at runtime since schemas are fixed at compile time.
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Validates `arguments` against `schema`'s `required` list, returning the
/// name of the first missing required property.
pub fn first_missing_required(schema: &Value, arguments: &Value) -> Option<String> {
    let required = schema.get("required")?.as_array()?;
    for name in required {
        let name = name.as_str()?;
        if arguments.get(name).is_none() {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_property_is_reported() {
        let schema = object_schema(json!({"path": {"type": "string"}}), &["path"]);
        let missing = first_missing_required(&schema, &json!({}));
        assert_eq!(missing, Some("path".to_string()));
    }

    #[test]
    fn present_required_property_reports_none_missing() {
        let schema = object_schema(json!({"path": {"type": "string"}}), &["path"]);
        let missing = first_missing_required(&schema, &json!({"path": "a.rs"}));
        assert_eq!(missing, None);
    }

    #[test]
    fn every_required_name_appears_in_properties() {
        let schema = object_schema(
            json!({"path": {}, "content": {}}),
            &["path", "content"],
        );
        let properties = schema["properties"].as_object().unwrap();
        for name in schema["required"].as_array().unwrap() {
            assert!(properties.contains_key(name.as_str().unwrap()));
        }
    }
}
