//! The [`Transcoding`] trait: a user-supplied codec for a single
//! non-primitive type, plus the codecs the core ships.

use std::any::{Any, TypeId};

use chrono::{DateTime, SecondsFormat, Utc};
use ledgerstream_types::{PersistenceError, PersistenceResult};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::transcoder::Transcoder;
use crate::value::Value;

/// A codec over a single registered type, identified for encoding by its
/// Rust [`TypeId`] and for decoding by its [`name`](Transcoding::name).
///
/// Implementors encode into an *intermediate* value, which the transcoder
/// recursively encodes in turn — this is how nested custom types compose
/// (`spec.md` §8 scenario S3).
pub trait Transcoding: Send + Sync {
    /// The unique name this transcoding is registered under for decoding.
    fn name(&self) -> &'static str;

    /// The concrete Rust type this transcoding encodes, used to look the
    /// transcoding up by encoder-side type identity.
    fn type_id(&self) -> TypeId;

    /// Encodes `value` (guaranteed by the registry to be of `type_id()`)
    /// into a [`Value`], recursing through `transcoder` for nested values.
    fn encode(&self, transcoder: &Transcoder, value: &dyn Any) -> PersistenceResult<Value>;

    /// Decodes a previously-tagged payload back into a boxed instance of
    /// the registered type.
    fn decode(&self, transcoder: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>>;
}

/// Hex-encodes a [`Uuid`] without hyphens, matching the original
/// `uuid_hex` transcoding this library is descended from.
pub struct UuidAsHex;

impl Transcoding for UuidAsHex {
    fn name(&self) -> &'static str {
        "uuid_hex"
    }

    fn type_id(&self) -> TypeId {
        TypeId::of::<Uuid>()
    }

    fn encode(&self, _transcoder: &Transcoder, value: &dyn Any) -> PersistenceResult<Value> {
        let uuid = value
            .downcast_ref::<Uuid>()
            .expect("registry guarantees type matches type_id()");
        Ok(Value::Str(uuid.simple().to_string()))
    }

    fn decode(&self, _transcoder: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>> {
        let s = data
            .as_str()
            .ok_or_else(|| PersistenceError::serialization("uuid_hex: expected a string"))?;
        let uuid = Uuid::parse_str(s)
            .map_err(|e| PersistenceError::serialization(format!("uuid_hex: {e}")))?;
        Ok(Box::new(uuid))
    }
}

/// Represents a [`Decimal`] as its canonical string form.
pub struct DecimalAsStr;

impl Transcoding for DecimalAsStr {
    fn name(&self) -> &'static str {
        "decimal_str"
    }

    fn type_id(&self) -> TypeId {
        TypeId::of::<Decimal>()
    }

    fn encode(&self, _transcoder: &Transcoder, value: &dyn Any) -> PersistenceResult<Value> {
        let decimal = value
            .downcast_ref::<Decimal>()
            .expect("registry guarantees type matches type_id()");
        Ok(Value::Str(decimal.to_string()))
    }

    fn decode(&self, _transcoder: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>> {
        let s = data
            .as_str()
            .ok_or_else(|| PersistenceError::serialization("decimal_str: expected a string"))?;
        let decimal: Decimal = s
            .parse()
            .map_err(|e| PersistenceError::serialization(format!("decimal_str: {e}")))?;
        Ok(Box::new(decimal))
    }
}

/// Represents a UTC timestamp as ISO 8601 / RFC 3339.
pub struct TimestampAsIso;

impl Transcoding for TimestampAsIso {
    fn name(&self) -> &'static str {
        "datetime_iso"
    }

    fn type_id(&self) -> TypeId {
        TypeId::of::<DateTime<Utc>>()
    }

    fn encode(&self, _transcoder: &Transcoder, value: &dyn Any) -> PersistenceResult<Value> {
        let ts = value
            .downcast_ref::<DateTime<Utc>>()
            .expect("registry guarantees type matches type_id()");
        Ok(Value::Str(ts.to_rfc3339_opts(SecondsFormat::Micros, true)))
    }

    fn decode(&self, _transcoder: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>> {
        let s = data
            .as_str()
            .ok_or_else(|| PersistenceError::serialization("datetime_iso: expected a string"))?;
        let ts = DateTime::parse_from_rfc3339(s)
            .map_err(|e| PersistenceError::serialization(format!("datetime_iso: {e}")))?
            .with_timezone(&Utc);
        Ok(Box::new(ts))
    }
}

/// A fixed-arity ordered sequence, tagged on the wire as `tuple_as_list`.
///
/// Rust has no single dynamically-typed tuple the way the original
/// dynamic-language implementation does; this newtype over `Vec<Value>` is
/// the idiomatic substitute a caller reaches for when it needs to signal
/// "this sequence is tuple-like" rather than an arbitrary list (see
/// `SPEC_FULL.md` §9).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tuple(pub Vec<Value>);

/// The [`Transcoding`] that (de)serializes [`Tuple`] values.
pub struct TupleTranscoding;

impl Transcoding for TupleTranscoding {
    fn name(&self) -> &'static str {
        "tuple_as_list"
    }

    fn type_id(&self) -> TypeId {
        TypeId::of::<Tuple>()
    }

    fn encode(&self, _transcoder: &Transcoder, value: &dyn Any) -> PersistenceResult<Value> {
        let tuple = value
            .downcast_ref::<Tuple>()
            .expect("registry guarantees type matches type_id()");
        Ok(Value::Seq(tuple.0.clone()))
    }

    fn decode(&self, _transcoder: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>> {
        let items = data
            .as_seq()
            .ok_or_else(|| PersistenceError::serialization("tuple_as_list: expected a list"))?;
        Ok(Box::new(Tuple(items.to_vec())))
    }
}
