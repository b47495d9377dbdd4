//! The [`Transcoder`]: a registry of [`Transcoding`]s plus the recursive
//! encode/decode engine that walks the [`Value`] tree.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use ledgerstream_types::{PersistenceError, PersistenceResult};

use crate::transcoding::Transcoding;
use crate::value::Value;

/// Converts domain values to and from the wire-format [`Value`] tree.
///
/// The registered [`Transcoding`]s are looked up two ways: by the
/// concrete Rust type being encoded, and by the tag name being decoded.
/// Primitive types (`bool`, `i64`, `f64`, `String`, [`Value`] itself) are
/// handled natively and never need registration.
#[derive(Default)]
pub struct Transcoder {
    by_type: HashMap<TypeId, Arc<dyn Transcoding>>,
    by_name: HashMap<&'static str, Arc<dyn Transcoding>>,
}

impl Transcoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a [`Transcoding`], making its type encodable and its name
    /// decodable.
    pub fn register(&mut self, transcoding: impl Transcoding + 'static) -> &mut Self {
        let transcoding = Arc::new(transcoding);
        self.by_type.insert(transcoding.type_id(), transcoding.clone());
        self.by_name.insert(transcoding.name(), transcoding);
        self
    }

    /// Encodes a value of a known Rust type into compact UTF-8 JSON bytes.
    pub fn encode<T: 'static>(&self, value: &T) -> PersistenceResult<Vec<u8>> {
        let tree = self.encode_dyn(value)?;
        Ok(serde_json::to_vec(&serde_json::Value::from(&tree))
            .expect("Value trees produced by this module are always serializable"))
    }

    /// Encodes a value tree into compact UTF-8 JSON bytes, without typed
    /// dispatch. Use this for values already expressed as [`Value`].
    pub fn encode_value(&self, value: &Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::Value::from(value))
            .expect("Value trees produced by this module are always serializable")
    }

    /// Decodes compact or legacy-escaped JSON bytes into a [`Value`] tree,
    /// without attempting typed dispatch.
    pub fn decode_value(&self, bytes: &[u8]) -> PersistenceResult<Value> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| PersistenceError::serialization(format!("invalid JSON: {e}")))?;
        Ok(Value::from(json))
    }

    /// Decodes compact or legacy-escaped JSON bytes into a value of a
    /// known Rust type, dispatching tagged envelopes through the registry.
    pub fn decode<T: 'static>(&self, bytes: &[u8]) -> PersistenceResult<T> {
        let tree = self.decode_value(bytes)?;
        let any = self.decode_dyn(tree, TypeId::of::<T>())?;
        any.downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| PersistenceError::serialization("decoded value has the wrong type"))
    }

    /// Encodes an arbitrary value, dispatching to the registry when it is
    /// not a wire primitive.
    pub fn encode_dyn(&self, value: &dyn Any) -> PersistenceResult<Value> {
        if let Some(v) = value.downcast_ref::<Value>() {
            return Ok(v.clone());
        }
        if let Some(v) = value.downcast_ref::<bool>() {
            return Ok(Value::Bool(*v));
        }
        if let Some(v) = value.downcast_ref::<i64>() {
            return Ok(Value::Int(*v));
        }
        if let Some(v) = value.downcast_ref::<u64>() {
            return Ok(Value::Int(*v as i64));
        }
        if let Some(v) = value.downcast_ref::<f64>() {
            return Ok(Value::Float(*v));
        }
        if let Some(v) = value.downcast_ref::<String>() {
            return Ok(Value::Str(v.clone()));
        }
        if let Some(v) = value.downcast_ref::<Vec<Value>>() {
            return Ok(Value::Seq(v.clone()));
        }

        if let Some(transcoding) = self.by_type.get(&value.type_id()) {
            let data = transcoding.encode(self, value)?;
            return Ok(Value::tagged(transcoding.name(), data));
        }

        Err(PersistenceError::serialization(
            "object is not serializable; register a transcoding for this type",
        ))
    }

    /// Decodes a [`Value`] into a boxed instance of the Rust type
    /// identified by `target`, dispatching through the registry when the
    /// value is a tagged envelope.
    pub fn decode_dyn(&self, value: Value, target: TypeId) -> PersistenceResult<Box<dyn Any>> {
        if let Some((name, data)) = value.as_tagged() {
            let transcoding = self
                .by_name
                .get(name)
                .ok_or_else(|| {
                    PersistenceError::serialization(format!(
                        "no transcoding registered for '{name}'"
                    ))
                })?
                .clone();
            return transcoding.decode(self, data.clone());
        }

        if target == TypeId::of::<Value>() {
            return Ok(Box::new(value));
        }

        match value {
            Value::Bool(b) if target == TypeId::of::<bool>() => Ok(Box::new(b)),
            Value::Int(i) if target == TypeId::of::<i64>() => Ok(Box::new(i)),
            Value::Float(f) if target == TypeId::of::<f64>() => Ok(Box::new(f)),
            Value::Str(s) if target == TypeId::of::<String>() => Ok(Box::new(s)),
            Value::Seq(items) if target == TypeId::of::<Vec<Value>>() => Ok(Box::new(items)),
            _ => Err(PersistenceError::serialization(
                "decoded value does not match the requested type",
            )),
        }
    }
}
