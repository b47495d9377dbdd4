//! # ledgerstream-storage: compression, the mapper pipeline, and recorders
//!
//! Houses everything downstream of the transcoder: optional compression
//! ([`Compressor`]), the pipeline glue that turns a domain event into a
//! [`StoredEvent`] and back ([`Mapper`]), the three layered recorder
//! contracts, and an in-process reference implementation of all three
//! ([`MemoryRecorder`]).

mod codec;
mod mapper;
mod memory;
mod recorder;

pub use codec::{Compressor, DeflateCompressor};
pub use mapper::{DomainEvent, Mapper};
pub use memory::MemoryRecorder;
pub use recorder::{AggregateRecorder, ApplicationRecorder, ProcessRecorder};
