//! # ledgerstream-config: environment-driven construction of the stack
//!
//! [`InfrastructureFactory`] builds a [`Mapper`] and the three recorder
//! contracts from a flat `{key: value}` configuration mapping, the
//! recognized keys being the ones this crate exposes as associated
//! constants. It recognizes only the built-in in-memory recorder
//! back-end; out-of-tree back-ends can implement the same pattern
//! without widening this crate.

use std::collections::HashMap;
use std::sync::Arc;

use ledgerstream_crypto::{AesCipher, Cipher};
use ledgerstream_storage::{AggregateRecorder, ApplicationRecorder, Compressor, DeflateCompressor, DomainEvent, Mapper, MemoryRecorder, ProcessRecorder};
use ledgerstream_transcoder::Transcoder;
use ledgerstream_types::{PersistenceError, PersistenceResult};

const MEMORY_MODULE: &str = "memory";
const DEFLATE_TOPIC: &str = "deflate";
const AES_GCM_TOPIC: &str = "aes_gcm";

/// Constructs the pipeline and recorders named in a configuration
/// mapping (`spec.md` §4.8).
pub struct InfrastructureFactory {
    env: HashMap<String, String>,
}

impl InfrastructureFactory {
    pub const PERSISTENCE_MODULE: &'static str = "PERSISTENCE_MODULE";
    pub const CREATE_TABLE: &'static str = "CREATE_TABLE";
    pub const COMPRESSOR_TOPIC: &'static str = "COMPRESSOR_TOPIC";
    pub const CIPHER_TOPIC: &'static str = "CIPHER_TOPIC";
    pub const CIPHER_KEY: &'static str = "CIPHER_KEY";

    pub fn new(env: HashMap<String, String>) -> Self {
        Self { env }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Whether the back-end may create its schema on startup.
    pub fn create_table(&self) -> bool {
        self.get(Self::CREATE_TABLE).map(is_truthy).unwrap_or(false)
    }

    fn persistence_module(&self) -> &str {
        self.get(Self::PERSISTENCE_MODULE).unwrap_or(MEMORY_MODULE)
    }

    fn compressor(&self) -> PersistenceResult<Option<Arc<dyn Compressor>>> {
        match self.get(Self::COMPRESSOR_TOPIC) {
            None => Ok(None),
            Some(DEFLATE_TOPIC) => Ok(Some(Arc::new(DeflateCompressor::new()))),
            Some(other) => Err(PersistenceError::configuration(format!(
                "unrecognized {} '{other}'",
                Self::COMPRESSOR_TOPIC
            ))),
        }
    }

    /// Looks up a cipher key for `application_name`, preferring a
    /// `{APPNAME_}CIPHER_KEY` entry and falling back to the unprefixed
    /// `CIPHER_KEY`.
    fn cipher_key_for(&self, application_name: &str) -> Option<&str> {
        let prefixed = format!("{}_{}", application_name.to_uppercase(), Self::CIPHER_KEY);
        self.get(&prefixed).or_else(|| self.get(Self::CIPHER_KEY))
    }

    fn cipher(&self, application_name: &str) -> PersistenceResult<Option<Arc<dyn Cipher>>> {
        match self.get(Self::CIPHER_TOPIC) {
            None => Ok(None),
            Some(AES_GCM_TOPIC) => {
                let key = self.cipher_key_for(application_name).ok_or_else(|| {
                    PersistenceError::configuration(format!(
                        "{} is set but no cipher key is configured for '{application_name}'",
                        Self::CIPHER_TOPIC
                    ))
                })?;
                Ok(Some(Arc::new(AesCipher::new(key)?)))
            }
            Some(other) => Err(PersistenceError::configuration(format!(
                "unrecognized {} '{other}'",
                Self::CIPHER_TOPIC
            ))),
        }
    }

    /// Builds a [`Mapper`] for `application_name` using `transcoder` plus
    /// whatever compressor/cipher the configuration names.
    pub fn mapper<E: DomainEvent>(&self, transcoder: Arc<Transcoder>, application_name: &str) -> PersistenceResult<Mapper<E>> {
        let compressor = self.compressor()?;
        let cipher = self.cipher(application_name)?;
        Ok(Mapper::new(transcoder, compressor, cipher))
    }

    fn memory_recorder(&self) -> PersistenceResult<Arc<MemoryRecorder>> {
        match self.persistence_module() {
            MEMORY_MODULE => {
                tracing::debug!(create_table = self.create_table(), "constructing in-memory recorder");
                Ok(Arc::new(MemoryRecorder::new()))
            }
            other => Err(PersistenceError::configuration(format!(
                "unrecognized {} '{other}'",
                Self::PERSISTENCE_MODULE
            ))),
        }
    }

    pub fn aggregate_recorder(&self) -> PersistenceResult<Arc<dyn AggregateRecorder>> {
        Ok(self.memory_recorder()? as Arc<dyn AggregateRecorder>)
    }

    pub fn application_recorder(&self) -> PersistenceResult<Arc<dyn ApplicationRecorder>> {
        Ok(self.memory_recorder()? as Arc<dyn ApplicationRecorder>)
    }

    pub fn process_recorder(&self) -> PersistenceResult<Arc<dyn ProcessRecorder>> {
        Ok(self.memory_recorder()? as Arc<dyn ProcessRecorder>)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on" | "y" | "t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    struct NoopEvent;
    impl DomainEvent for NoopEvent {
        fn originator_id(&self) -> Uuid {
            Uuid::nil()
        }
        fn originator_version(&self) -> u64 {
            0
        }
        fn timestamp(&self) -> DateTime<Utc> {
            Utc::now()
        }
        fn with_header(self, _originator_id: Uuid, _originator_version: u64) -> Self {
            self
        }
    }

    fn factory(entries: &[(&str, &str)]) -> InfrastructureFactory {
        InfrastructureFactory::new(entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn mapper_with_no_configuration_has_no_pipeline_stages() {
        let f = factory(&[]);
        let mapper: Mapper<NoopEvent> = f.mapper(Arc::new(Transcoder::new()), "app").unwrap();
        drop(mapper); // constructs without error; stage absence is exercised via Mapper's own tests.
    }

    #[test]
    fn mapper_with_compressor_topic_only_is_legal() {
        let f = factory(&[("COMPRESSOR_TOPIC", "deflate")]);
        assert!(f.mapper::<NoopEvent>(Arc::new(Transcoder::new()), "app").is_ok());
    }

    #[test]
    fn mapper_with_cipher_topic_but_no_key_is_a_configuration_error() {
        let f = factory(&[("CIPHER_TOPIC", "aes_gcm")]);
        let err = f.mapper::<NoopEvent>(Arc::new(Transcoder::new()), "app").unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn mapper_with_cipher_key_succeeds() {
        let key = AesCipher::create_key(16).unwrap();
        let f = factory(&[("CIPHER_TOPIC", "aes_gcm"), ("CIPHER_KEY", &key)]);
        assert!(f.mapper::<NoopEvent>(Arc::new(Transcoder::new()), "app").is_ok());
    }

    #[test]
    fn per_application_cipher_keys_cannot_decrypt_each_other() {
        use ledgerstream_transcoder::{Transcoding, Value};
        use std::any::{Any, TypeId};

        #[derive(Debug)]
        struct CounterEvent {
            id: Uuid,
            count: i64,
        }
        impl DomainEvent for CounterEvent {
            fn originator_id(&self) -> Uuid {
                self.id
            }
            fn originator_version(&self) -> u64 {
                0
            }
            fn timestamp(&self) -> DateTime<Utc> {
                Utc::now()
            }
            fn with_header(mut self, originator_id: Uuid, _originator_version: u64) -> Self {
                self.id = originator_id;
                self
            }
        }
        struct CounterEventAsDict;
        impl Transcoding for CounterEventAsDict {
            fn name(&self) -> &'static str {
                "counter_event"
            }
            fn type_id(&self) -> TypeId {
                TypeId::of::<CounterEvent>()
            }
            fn encode(&self, _t: &Transcoder, value: &dyn Any) -> PersistenceResult<Value> {
                let event = value.downcast_ref::<CounterEvent>().unwrap();
                Ok(Value::Int(event.count))
            }
            fn decode(&self, _t: &Transcoder, data: Value) -> PersistenceResult<Box<dyn Any>> {
                // id is a placeholder: Mapper::to_domain_event overwrites it
                // with the StoredEvent's own header afterwards.
                let count = data.as_int().ok_or_else(|| PersistenceError::serialization("expected an int"))?;
                Ok(Box::new(CounterEvent { id: Uuid::nil(), count }))
            }
        }

        let key1 = AesCipher::create_key(16).unwrap();
        let key2 = AesCipher::create_key(16).unwrap();
        let f = factory(&[("CIPHER_TOPIC", "aes_gcm"), ("APP1_CIPHER_KEY", &key1), ("APP2_CIPHER_KEY", &key2)]);

        let mut transcoder1 = Transcoder::new();
        transcoder1.register(CounterEventAsDict);
        let mapper1: Mapper<CounterEvent> = f.mapper(Arc::new(transcoder1), "app1").unwrap();

        let mut transcoder2 = Transcoder::new();
        transcoder2.register(CounterEventAsDict);
        let mapper2: Mapper<CounterEvent> = f.mapper(Arc::new(transcoder2), "app2").unwrap();

        let stored = mapper1.to_stored_event(&CounterEvent { id: Uuid::nil(), count: 7 }).unwrap();
        let err = mapper2.to_domain_event(&stored).unwrap_err();
        assert!(matches!(err, PersistenceError::CipherData(_)));
    }

    #[test]
    fn unrecognized_persistence_module_is_a_configuration_error() {
        let f = factory(&[("PERSISTENCE_MODULE", "postgres")]);
        let err = f.aggregate_recorder().unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn memory_persistence_module_constructs_recorders() {
        let f = factory(&[("PERSISTENCE_MODULE", "memory"), ("CREATE_TABLE", "f")]);
        assert!(f.aggregate_recorder().is_ok());
        assert!(f.application_recorder().is_ok());
        assert!(f.process_recorder().is_ok());
    }

    #[test]
    fn create_table_parses_common_truthy_and_falsy_spellings() {
        assert!(!factory(&[("CREATE_TABLE", "f")]).create_table());
        assert!(!factory(&[("CREATE_TABLE", "false")]).create_table());
        assert!(factory(&[("CREATE_TABLE", "true")]).create_table());
        assert!(factory(&[("CREATE_TABLE", "1")]).create_table());
        assert!(!factory(&[]).create_table());
    }
}
