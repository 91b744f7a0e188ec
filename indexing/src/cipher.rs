//! Payload encryption for the search service transport.
//!
//! Payloads are sealed with AES-GCM under the pre-shared key. A 16 byte key
//! selects AES-128-GCM and a 32 byte key AES-256-GCM. The wire form is the
//! URL-safe base64 encoding of `nonce || ciphertext`, with a fresh random
//! nonce per call.
//!
//! Both functions are pure: no global state, safe to call from any number of
//! concurrent dispatches.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose};
use errors::CipherError;
use std::sync::Arc;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;

/// The process-wide pre-shared key.
///
/// Loaded once from configuration and never mutated afterwards; clones
/// share the same buffer. Zeroed when the last clone is dropped.
#[derive(Clone)]
pub struct EncryptionKey(Arc<Zeroizing<Vec<u8>>>);

impl EncryptionKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::new(Zeroizing::new(bytes.into())))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey(<{} bytes>)", self.len())
    }
}

enum Engine {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl Engine {
    fn new(key: &[u8]) -> Result<Self, CipherError> {
        let invalid = |_| CipherError::InvalidKey { length: key.len() };
        match key.len() {
            16 => Ok(Self::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(invalid)?,
            ))),
            32 => Ok(Self::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(invalid)?,
            ))),
            length => Err(CipherError::InvalidKey { length }),
        }
    }
}

/// Encrypt `plaintext` with `key`.
pub fn encrypt(key: &[u8], plaintext: &str) -> Result<String, CipherError> {
    let engine = Engine::new(key)?;

    let (nonce, sealed) = match engine {
        Engine::Aes128(cipher) => {
            let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
            let sealed = cipher.encrypt(&nonce, plaintext.as_bytes());
            (nonce, sealed)
        }
        Engine::Aes256(cipher) => {
            let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
            let sealed = cipher.encrypt(&nonce, plaintext.as_bytes());
            (nonce, sealed)
        }
    };
    let sealed = sealed.map_err(|e| CipherError::EncryptionFailed {
        reason: e.to_string(),
    })?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&sealed);
    Ok(general_purpose::URL_SAFE.encode(out))
}

/// Decrypt a string produced by [`encrypt`] with the same key.
pub fn decrypt(key: &[u8], ciphertext: &str) -> Result<String, CipherError> {
    let engine = Engine::new(key)?;

    let raw = general_purpose::URL_SAFE
        .decode(ciphertext.trim())
        .map_err(|e| CipherError::InvalidFormat {
            reason: e.to_string(),
        })?;
    if raw.len() <= NONCE_LEN {
        return Err(CipherError::InvalidFormat {
            reason: format!("{} bytes is shorter than the nonce", raw.len()),
        });
    }
    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plain = match engine {
        Engine::Aes128(cipher) => cipher.decrypt(nonce, sealed),
        Engine::Aes256(cipher) => cipher.decrypt(nonce, sealed),
    }
    .map_err(|e| CipherError::DecryptionFailed {
        reason: e.to_string(),
    })?;

    String::from_utf8(plain).map_err(|e| CipherError::DecryptionFailed {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_128: &[u8] = b"0123456789abcdef";
    const KEY_256: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_roundtrip_both_key_sizes() {
        let payloads = [
            r#"{"RepoID":42,"RepoPath":"alice/myrepo"}"#,
            "",
            "ünïcödé payload with\nnewlines",
        ];
        for key in [KEY_128, KEY_256] {
            for payload in payloads {
                let sealed = encrypt(key, payload).unwrap();
                assert_eq!(decrypt(key, &sealed).unwrap(), payload);
            }
        }
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let a = encrypt(KEY_256, "same").unwrap();
        let b = encrypt(KEY_256, "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_is_url_safe() {
        for _ in 0..32 {
            let sealed = encrypt(KEY_128, "alice/myrepo?x=1&y=2").unwrap();
            assert!(!sealed.contains('+') && !sealed.contains('/'));
        }
    }

    #[test]
    fn test_invalid_key_length() {
        assert_eq!(
            encrypt(b"short", "x"),
            Err(CipherError::InvalidKey { length: 5 })
        );
        assert_eq!(
            decrypt(&[0u8; 24], "AAAA"),
            Err(CipherError::InvalidKey { length: 24 })
        );
    }

    #[test]
    fn test_wrong_key_fails_to_decrypt() {
        let sealed = encrypt(KEY_256, "secret").unwrap();
        let mut other = KEY_256.to_vec();
        other[0] ^= 0xff;
        assert!(matches!(
            decrypt(&other, &sealed),
            Err(CipherError::DecryptionFailed { .. })
        ));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            decrypt(KEY_128, "not base64 !!"),
            Err(CipherError::InvalidFormat { .. })
        ));
        let short = general_purpose::URL_SAFE.encode([1u8; 8]);
        assert!(matches!(
            decrypt(KEY_128, &short),
            Err(CipherError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let sealed = encrypt(KEY_128, "payload").unwrap();
        let mut raw = general_purpose::URL_SAFE.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = general_purpose::URL_SAFE.encode(raw);
        assert!(decrypt(KEY_128, &tampered).is_err());
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = EncryptionKey::new(KEY_128);
        assert_eq!(format!("{:?}", key), "EncryptionKey(<16 bytes>)");
        let shared = key.clone();
        assert_eq!(shared.as_bytes(), KEY_128);
    }
}
