//! # ledgerstream
//!
//! An event-sourcing persistence runtime: store the state of aggregates
//! as append-only sequences of immutable domain events, and replay those
//! sequences to reconstruct aggregate state.
//!
//! This crate is a facade over the workspace's persistence substrate:
//!
//! ```text
//! domain event -> Mapper -> (Transcoder) -> (Compressor) -> (Cipher) -> StoredEvent -> Recorder
//! ```
//!
//! - [`Transcoder`] and [`Value`] ([`ledgerstream_transcoder`]) convert
//!   domain values to and from a self-describing byte payload.
//! - [`AesCipher`] ([`ledgerstream_crypto`]) authenticates and encrypts
//!   that payload.
//! - [`Compressor`], [`Mapper`], and the recorder traits
//!   ([`ledgerstream_storage`]) glue the pipeline together and persist
//!   the result.
//! - [`InfrastructureFactory`] ([`ledgerstream_config`]) builds the whole
//!   stack from a configuration mapping.
//!
//! The aggregate/domain DSL, the application service façade, and
//! concrete SQL-backed recorders are outside this crate's scope; it
//! ships the contracts and one in-process reference recorder
//! ([`MemoryRecorder`]) good enough to build and test against.

pub use ledgerstream_config::InfrastructureFactory;
pub use ledgerstream_crypto::{AesCipher, Cipher};
pub use ledgerstream_storage::{
    AggregateRecorder, ApplicationRecorder, Compressor, DeflateCompressor, DomainEvent, Mapper, MemoryRecorder,
    ProcessRecorder,
};
pub use ledgerstream_transcoder::{
    default_transcoder, DecimalAsStr, TimestampAsIso, Transcoder, Transcoding, Tuple, TupleTranscoding, UuidAsHex,
    Value,
};
pub use ledgerstream_types::{Notification, PersistenceError, PersistenceResult, StoredEvent, Tracking};
