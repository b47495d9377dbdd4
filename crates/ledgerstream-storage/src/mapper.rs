//! The [`Mapper`]: glue between a domain event and its [`StoredEvent`]
//! form, applying transcode → (compress) → (encrypt) and the inverse.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use ledgerstream_crypto::Cipher;
use ledgerstream_transcoder::Transcoder;
use ledgerstream_types::{PersistenceError, PersistenceResult, StoredEvent};
use uuid::Uuid;

use crate::codec::Compressor;

/// The minimal shape of a domain event the mapper needs: identity,
/// version, and timestamp. Field serialization itself is delegated to a
/// [`Transcoding`](ledgerstream_transcoder::Transcoding) registered for
/// the concrete event type, the same mechanism custom value types use.
pub trait DomainEvent: 'static {
    fn originator_id(&self) -> Uuid;
    fn originator_version(&self) -> u64;
    fn timestamp(&self) -> DateTime<Utc>;

    /// Replaces the identity/version header on a reconstructed event with
    /// the values actually persisted on its [`StoredEvent`].
    ///
    /// Header fidelity is the [`Mapper`]'s responsibility, not each
    /// registered `Transcoding`'s: a `Transcoding` only needs to decode
    /// the event's own fields, and can leave placeholder `originator_id`/
    /// `originator_version` values on the instance it returns. `Mapper::
    /// to_domain_event` always calls this afterwards to restore the real
    /// header.
    fn with_header(self, originator_id: Uuid, originator_version: u64) -> Self
    where
        Self: Sized;
}

/// Pipeline glue: `domain event -> StoredEvent` and back.
///
/// `to_stored_event` is `cipher?.encrypt ∘ compressor?.compress ∘
/// transcoder.encode`; `to_domain_event` is the exact inverse.
pub struct Mapper<E: DomainEvent> {
    transcoder: Arc<Transcoder>,
    compressor: Option<Arc<dyn Compressor>>,
    cipher: Option<Arc<dyn Cipher>>,
    _event: PhantomData<fn() -> E>,
}

impl<E: DomainEvent> fmt::Debug for Mapper<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("compressor", &self.compressor.is_some())
            .field("cipher", &self.cipher.is_some())
            .finish()
    }
}

impl<E: DomainEvent> Mapper<E> {
    pub fn new(
        transcoder: Arc<Transcoder>,
        compressor: Option<Arc<dyn Compressor>>,
        cipher: Option<Arc<dyn Cipher>>,
    ) -> Self {
        Self { transcoder, compressor, cipher, _event: PhantomData }
    }

    /// A stable, process-restart-safe label for `E`, used as
    /// [`StoredEvent::topic`].
    pub fn topic_of() -> String {
        std::any::type_name::<E>().to_string()
    }

    pub fn to_stored_event(&self, event: &E) -> PersistenceResult<StoredEvent> {
        let value = self.transcoder.encode_dyn(event)?;
        let mut state = self.transcoder.encode_value(&value);
        if let Some(compressor) = &self.compressor {
            state = compressor.compress(&state)?;
        }
        if let Some(cipher) = &self.cipher {
            state = cipher.encrypt(&state)?;
        }
        Ok(StoredEvent::new(event.originator_id(), event.originator_version(), Self::topic_of(), state))
    }

    pub fn to_domain_event(&self, stored: &StoredEvent) -> PersistenceResult<E> {
        let mut state = stored.state.clone();
        if let Some(cipher) = &self.cipher {
            state = cipher.decrypt(&state)?;
        }
        if let Some(compressor) = &self.compressor {
            state = compressor.decompress(&state)?;
        }
        let value = self.transcoder.decode_value(&state)?;
        let decoded = self.transcoder.decode_dyn(value, TypeId::of::<E>())?;
        let event = downcast_event::<E>(decoded)?;
        Ok(event.with_header(stored.originator_id, stored.originator_version))
    }

    /// Deprecated alias for [`Mapper::to_stored_event`]. Warns once per
    /// call site.
    #[deprecated(note = "use Mapper::to_stored_event")]
    #[track_caller]
    pub fn from_domain_event(&self, event: &E) -> PersistenceResult<StoredEvent> {
        warn_once_per_call_site();
        self.to_stored_event(event)
    }
}

fn downcast_event<E: DomainEvent>(decoded: Box<dyn Any>) -> PersistenceResult<E> {
    decoded
        .downcast::<E>()
        .map(|boxed| *boxed)
        .map_err(|_| PersistenceError::serialization("decoded value has the wrong event type"))
}

fn warned_call_sites() -> &'static Mutex<HashSet<String>> {
    static SITES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    SITES.get_or_init(|| Mutex::new(HashSet::new()))
}

#[track_caller]
fn warn_once_per_call_site() {
    let location = Location::caller();
    let key = format!("{}:{}:{}", location.file(), location.line(), location.column());
    let mut sites = warned_call_sites().lock().expect("warned_call_sites mutex poisoned");
    if sites.insert(key) {
        tracing::warn!("Mapper::from_domain_event is deprecated; use Mapper::to_stored_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerstream_transcoder::{Transcoding, Value};
    use std::any::Any as _;

    #[derive(Debug, Clone, PartialEq)]
    struct Deposited {
        account_id: Uuid,
        version: u64,
        at: DateTime<Utc>,
        amount: i64,
    }

    impl DomainEvent for Deposited {
        fn originator_id(&self) -> Uuid {
            self.account_id
        }
        fn originator_version(&self) -> u64 {
            self.version
        }
        fn timestamp(&self) -> DateTime<Utc> {
            self.at
        }
        fn with_header(mut self, originator_id: Uuid, originator_version: u64) -> Self {
            self.account_id = originator_id;
            self.version = originator_version;
            self
        }
    }

    struct DepositedAsDict;
    impl Transcoding for DepositedAsDict {
        fn name(&self) -> &'static str {
            "deposited"
        }
        fn type_id(&self) -> TypeId {
            TypeId::of::<Deposited>()
        }
        fn encode(&self, _t: &Transcoder, value: &dyn Any) -> PersistenceResult<Value> {
            let event = value.downcast_ref::<Deposited>().unwrap();
            let mut map = indexmap::IndexMap::new();
            map.insert("amount".to_string(), Value::Int(event.amount));
            Ok(Value::Map(map))
        }
        fn decode(&self, _t: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>> {
            // account_id/version are placeholders: Mapper::to_domain_event
            // overwrites them with the StoredEvent's own header afterwards.
            let map = data.as_map().ok_or_else(|| PersistenceError::serialization("expected a map"))?;
            let amount = map.get("amount").and_then(Value::as_int).ok_or_else(|| {
                PersistenceError::serialization("missing amount")
            })?;
            Ok(Box::new(Deposited {
                account_id: Uuid::nil(),
                version: 0,
                at: Utc::now(),
                amount,
            }))
        }
    }

    fn mapper() -> Mapper<Deposited> {
        let mut transcoder = Transcoder::new();
        transcoder.register(DepositedAsDict);
        Mapper::new(Arc::new(transcoder), None, None)
    }

    #[test]
    fn topic_is_the_rust_type_path() {
        assert!(Mapper::<Deposited>::topic_of().ends_with("Deposited"));
    }

    #[test]
    fn roundtrip_without_pipeline_stages() {
        let mapper = mapper();
        let account_id = Uuid::new_v4();
        let event = Deposited { account_id, version: 3, at: Utc::now(), amount: 500 };
        let stored = mapper.to_stored_event(&event).unwrap();
        assert_eq!(stored.originator_id, event.account_id);
        assert_eq!(stored.originator_version, 3);
        let back = mapper.to_domain_event(&stored).unwrap();
        assert_eq!(back.amount, event.amount);
        assert_eq!(back.account_id, account_id, "Mapper must restore the StoredEvent's own originator_id");
        assert_eq!(back.version, 3, "Mapper must restore the StoredEvent's own originator_version");
    }

    #[test]
    fn roundtrip_with_compressor_and_cipher() {
        let mut transcoder = Transcoder::new();
        transcoder.register(DepositedAsDict);
        let key = ledgerstream_crypto::AesCipher::create_key(32).unwrap();
        let cipher: Arc<dyn Cipher> = Arc::new(ledgerstream_crypto::AesCipher::new(&key).unwrap());
        let compressor: Arc<dyn Compressor> = Arc::new(crate::codec::DeflateCompressor::new());
        let mapper = Mapper::new(Arc::new(transcoder), Some(compressor), Some(cipher));

        let account_id = Uuid::new_v4();
        let event = Deposited { account_id, version: 5, at: Utc::now(), amount: 42 };
        let stored = mapper.to_stored_event(&event).unwrap();
        let back = mapper.to_domain_event(&stored).unwrap();
        assert_eq!(back.amount, 42);
        assert_eq!(back.account_id, account_id);
        assert_eq!(back.version, 5);
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_alias_still_maps_correctly() {
        let mapper = mapper();
        let event = Deposited { account_id: Uuid::nil(), version: 0, at: Utc::now(), amount: 7 };
        let stored = mapper.from_domain_event(&event).unwrap();
        assert_eq!(stored.originator_version, 0);
    }
}
