//! The typed result tree produced by a completed generation.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// A generated value. Unlike the in-progress document, this tree is free of
/// generation markers; object fields keep their schema-declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerationValue {
    Number(f64),
    Boolean(bool),
    String(String),
    Array(Vec<GenerationValue>),
    Object(IndexMap<String, GenerationValue>),
}

impl GenerationValue {
    /// Convert into a plain `serde_json::Value`.
    pub fn into_json(self) -> Value {
        match self {
            GenerationValue::Number(n) => Value::from(n),
            GenerationValue::Boolean(b) => Value::Bool(b),
            GenerationValue::String(s) => Value::String(s),
            GenerationValue::Array(items) => {
                Value::Array(items.into_iter().map(GenerationValue::into_json).collect())
            }
            GenerationValue::Object(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (key, value) in fields {
                    map.insert(key, value.into_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl From<GenerationValue> for Value {
    fn from(value: GenerationValue) -> Self {
        value.into_json()
    }
}
