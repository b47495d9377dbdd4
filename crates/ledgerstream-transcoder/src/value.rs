//! The wire-format value tree: the textual, JSON-compatible shape every
//! domain value is reduced to before it is persisted.

use indexmap::IndexMap;
use serde_json::Number;

/// A self-describing value in the transcoder's wire format.
///
/// Mappings preserve key insertion order (`IndexMap`) so that encoding the
/// same logical value always produces the same byte sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// True if this is a tagged custom-type envelope: a mapping whose
    /// *only* keys are exactly `_type_` and `_data_`.
    ///
    /// A mapping that carries those two names alongside other keys is a
    /// plain mapping and must not be treated as tagged (`spec.md` §4.1,
    /// tested by scenario S2).
    pub fn as_tagged(&self) -> Option<(&str, &Value)> {
        let map = self.as_map()?;
        if map.len() != 2 {
            return None;
        }
        let name = map.get("_type_")?.as_str()?;
        let data = map.get("_data_")?;
        Some((name, data))
    }

    pub fn tagged(name: &str, data: Value) -> Value {
        let mut map = IndexMap::with_capacity(2);
        map.insert("_type_".to_string(), Value::Str(name.to_string()));
        map.insert("_data_".to_string(), data);
        Value::Map(map)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Seq(items) => serde_json::Value::Array(items.iter().map(Into::into).collect()),
            Value::Map(map) => {
                let mut obj = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    obj.insert(k.clone(), v.into());
                }
                serde_json::Value::Object(obj)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::Seq(items.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(obj) => {
                let mut map = IndexMap::with_capacity(obj.len());
                for (k, v) in obj {
                    map.insert(k, v.into());
                }
                Value::Map(map)
            }
        }
    }
}
