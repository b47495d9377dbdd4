//! # ledgerstream-crypto: authenticated encryption for stored events
//!
//! Ships [`AesCipher`], AES-GCM authenticated encryption with a fresh
//! per-message nonce. Wire layout (`spec.md` §4.3, testable):
//!
//! ```text
//! [ nonce (12 bytes) || auth_tag (16 bytes) || ciphertext (n bytes) ]
//! ```

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::cipher::consts::U12;
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, AesGcm, Aes256Gcm, Nonce};

type Aes192Gcm = AesGcm<Aes192, U12>;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ledgerstream_types::{PersistenceError, PersistenceResult};
use rand::RngCore;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// A byte-to-byte authenticated encryption strategy.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> PersistenceResult<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> PersistenceResult<Vec<u8>>;
}

/// AES in Galois/Counter Mode, keyed with a base64-encoded 16, 24, or
/// 32-byte key (AES-128/192/256 respectively).
enum Backend {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    Aes256(Box<Aes256Gcm>),
}

pub struct AesCipher {
    backend: Backend,
}

impl AesCipher {
    pub const KEY_SIZES: [usize; 3] = [16, 24, 32];

    /// Generates a fresh base64-encoded key of `num_bytes` (16, 24, or 32).
    pub fn create_key(num_bytes: usize) -> PersistenceResult<String> {
        Self::validate_key_bytes(num_bytes)?;
        let mut bytes = Zeroizing::new(vec![0u8; num_bytes]);
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(BASE64.encode(bytes.as_slice()))
    }

    pub fn validate_key_bytes(num_bytes: usize) -> PersistenceResult<()> {
        if Self::KEY_SIZES.contains(&num_bytes) {
            Ok(())
        } else {
            Err(PersistenceError::configuration(format!(
                "invalid key size: {num_bytes} not in {:?}",
                Self::KEY_SIZES
            )))
        }
    }

    /// Constructs a cipher from a base64-encoded key of 16, 24, or 32 bytes.
    pub fn new(cipher_key: &str) -> PersistenceResult<Self> {
        let key = Zeroizing::new(
            BASE64
                .decode(cipher_key)
                .map_err(|e| PersistenceError::configuration(format!("invalid cipher key: {e}")))?,
        );
        Self::validate_key_bytes(key.len())?;

        let backend = match key.len() {
            16 => Backend::Aes128(Box::new(Aes128Gcm::new_from_slice(&key).expect("key length validated above"))),
            24 => Backend::Aes192(Box::new(Aes192Gcm::new_from_slice(&key).expect("key length validated above"))),
            32 => Backend::Aes256(Box::new(Aes256Gcm::new_from_slice(&key).expect("key length validated above"))),
            _ => unreachable!("validate_key_bytes already rejected this length"),
        };
        Ok(Self { backend })
    }
}

impl Cipher for AesCipher {
    fn encrypt(&self, plaintext: &[u8]) -> PersistenceResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let payload = Payload { msg: plaintext, aad: b"" };

        let encrypted = match &self.backend {
            Backend::Aes128(c) => c.encrypt(nonce, payload),
            Backend::Aes192(c) => c.encrypt(nonce, payload),
            Backend::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|e| PersistenceError::cipher_data(format!("encryption failed: {e}")))?;

        // aes-gcm appends the tag after the ciphertext; re-lay out as
        // nonce || tag || ciphertext per the portable wire format.
        let ct_len = encrypted.len().saturating_sub(TAG_LEN);
        let (body, tag) = encrypted.split_at(ct_len);

        let mut out = Vec::with_capacity(NONCE_LEN + TAG_LEN + body.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(tag);
        out.extend_from_slice(body);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> PersistenceResult<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(PersistenceError::cipher_data(
                "damaged cipher text: invalid nonce or tag length",
            ));
        }
        let nonce_bytes = &ciphertext[..NONCE_LEN];
        let tag = &ciphertext[NONCE_LEN..NONCE_LEN + TAG_LEN];
        let body = &ciphertext[NONCE_LEN + TAG_LEN..];

        let nonce = Nonce::from_slice(nonce_bytes);
        let mut combined = Vec::with_capacity(body.len() + TAG_LEN);
        combined.extend_from_slice(body);
        combined.extend_from_slice(tag);
        let payload = Payload { msg: &combined, aad: b"" };

        match &self.backend {
            Backend::Aes128(c) => c.decrypt(nonce, payload),
            Backend::Aes192(c) => c.decrypt(nonce, payload),
            Backend::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| PersistenceError::cipher_data("cipher text is damaged: authentication failed"))
    }
}
