//! The supported JSON-Schema subset.
//!
//! Only `object`, `array`, `string`, `number`, and `boolean` are supported.
//! The subset is modeled as a closed sum type so every consumer matches
//! exhaustively; unsupported `type` strings are rejected once, at the JSON
//! boundary in [`Schema::from_value`].

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::GenerateError;

/// A schema node in the supported subset.
///
/// Invariant: `Array` always carries `items` and `Object` always carries
/// `properties`: absence is a configuration error raised during parsing,
/// never a silent default.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Number,
    Boolean,
    String,
    Array { items: Box<Schema> },
    Object { properties: IndexMap<String, Schema> },
}

impl Schema {
    /// Parse a JSON-Schema-shaped value into the supported subset.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::MalformedSchema`]: a node is not an object, has
    ///   no `type`, or is an array/object missing `items`/`properties`.
    /// - [`GenerateError::UnsupportedSchemaType`]: a `type` outside the
    ///   supported set.
    pub fn from_value(value: &Value) -> Result<Self, GenerateError> {
        Self::from_value_at(value, "#")
    }

    fn from_value_at(value: &Value, path: &str) -> Result<Self, GenerateError> {
        let Some(obj) = value.as_object() else {
            return Err(GenerateError::MalformedSchema {
                path: path.to_string(),
                message: "schema node must be a JSON object".to_string(),
            });
        };

        let type_name = obj.get("type").and_then(Value::as_str).ok_or_else(|| {
            GenerateError::MalformedSchema {
                path: path.to_string(),
                message: "schema node must declare a `type`".to_string(),
            }
        })?;

        match type_name {
            "number" => Ok(Schema::Number),
            "boolean" => Ok(Schema::Boolean),
            "string" => Ok(Schema::String),
            "array" => {
                let items = obj.get("items").ok_or_else(|| GenerateError::MalformedSchema {
                    path: path.to_string(),
                    message: "array schema must have `items` defined".to_string(),
                })?;
                let items = Self::from_value_at(items, &format!("{path}/items"))?;
                Ok(Schema::Array {
                    items: Box::new(items),
                })
            }
            "object" => {
                let props = obj.get("properties").and_then(Value::as_object).ok_or_else(
                    || GenerateError::MalformedSchema {
                        path: path.to_string(),
                        message: "object schema must have `properties` defined".to_string(),
                    },
                )?;
                let mut properties = IndexMap::with_capacity(props.len());
                for (key, child) in props {
                    let child_path = format!("{path}/properties/{key}");
                    properties.insert(key.clone(), Self::from_value_at(child, &child_path)?);
                }
                Ok(Schema::Object { properties })
            }
            other => Err(GenerateError::UnsupportedSchemaType {
                path: path.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    /// Canonical JSON-Schema form, used verbatim inside prompts.
    pub fn to_value(&self) -> Value {
        match self {
            Schema::Number => json!({ "type": "number" }),
            Schema::Boolean => json!({ "type": "boolean" }),
            Schema::String => json!({ "type": "string" }),
            Schema::Array { items } => json!({ "type": "array", "items": items.to_value() }),
            Schema::Object { properties } => {
                let mut props = Map::new();
                for (key, child) in properties {
                    props.insert(key.clone(), child.to_value());
                }
                json!({ "type": "object", "properties": props })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_supported_subset() {
        let value = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "number" },
                "is_student": { "type": "boolean" },
                "courses": { "type": "array", "items": { "type": "string" } }
            }
        });

        let schema = Schema::from_value(&value).unwrap();
        let Schema::Object { properties } = &schema else {
            panic!("expected object schema, got: {schema:?}");
        };

        // Declared property order must survive parsing.
        let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "age", "is_student", "courses"]);
        assert_eq!(properties["age"], Schema::Number);
        assert_eq!(
            properties["courses"],
            Schema::Array {
                items: Box::new(Schema::String)
            }
        );
    }

    #[test]
    fn test_round_trip_preserves_canonical_form() {
        let value = json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } },
                "score": { "type": "number" }
            }
        });

        let schema = Schema::from_value(&value).unwrap();
        assert_eq!(schema.to_value(), value);
    }

    #[test]
    fn test_array_without_items_is_malformed() {
        let err = Schema::from_value(&json!({ "type": "array" })).unwrap_err();
        match err {
            GenerateError::MalformedSchema { message, .. } => {
                assert!(message.contains("items"), "got: {message}");
            }
            other => panic!("expected MalformedSchema, got: {other:?}"),
        }
    }

    #[test]
    fn test_object_without_properties_is_malformed() {
        let err = Schema::from_value(&json!({ "type": "object" })).unwrap_err();
        match err {
            GenerateError::MalformedSchema { message, .. } => {
                assert!(message.contains("properties"), "got: {message}");
            }
            other => panic!("expected MalformedSchema, got: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_type_rejected_with_path() {
        let value = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" }
            }
        });

        let err = Schema::from_value(&value).unwrap_err();
        match err {
            GenerateError::UnsupportedSchemaType { path, type_name } => {
                assert_eq!(type_name, "integer");
                assert_eq!(path, "#/properties/id");
            }
            other => panic!("expected UnsupportedSchemaType, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_type_is_malformed() {
        let err = Schema::from_value(&json!({ "properties": {} })).unwrap_err();
        assert!(matches!(err, GenerateError::MalformedSchema { .. }));
    }
}
