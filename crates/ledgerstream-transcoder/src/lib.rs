//! # ledgerstream-transcoder: extensible domain-value transcoding
//!
//! Converts domain values to and from a self-describing, JSON-compatible
//! byte payload ([`Value`]). Objects of registered custom types are
//! encoded as a two-key tagged envelope (`_type_`/`_data_`); see
//! `spec.md` §4.1 for the full contract.

mod transcoder;
mod transcoding;
mod value;

pub use transcoder::Transcoder;
pub use transcoding::{DecimalAsStr, TimestampAsIso, Transcoding, Tuple, TupleTranscoding, UuidAsHex};
pub use value::Value;

/// Builds a [`Transcoder`] with every transcoding the core ships
/// registered: [`UuidAsHex`], [`DecimalAsStr`], [`TimestampAsIso`], and
/// [`TupleTranscoding`].
pub fn default_transcoder() -> Transcoder {
    let mut t = Transcoder::new();
    t.register(UuidAsHex);
    t.register(DecimalAsStr);
    t.register(TimestampAsIso);
    t.register(TupleTranscoding);
    t
}
