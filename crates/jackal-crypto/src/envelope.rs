use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

use crate::keys::SymmetricKey;

/// Nonce length for AES-GCM.
pub const NONCE_LEN: usize = 12;
/// Authentication tag appended to the ciphertext by the AEAD primitive.
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("encrypt failed: {0}")]
    Encrypt(String),
}

/// Outcome of opening stored content.
///
/// `Passthrough` is the backward-compatibility path: the input failed
/// authentication (wrong key, tampering, or it was never an envelope, e.g.
/// plaintext stored before encryption was mandatory) and is returned
/// unchanged. It is a policy outcome at this boundary, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    /// Plaintext recovered from an authenticated envelope.
    Decrypted(Vec<u8>),
    /// Input treated as already-plaintext, byte for byte.
    Passthrough(Vec<u8>),
}

impl Opened {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Opened::Decrypted(bytes) | Opened::Passthrough(bytes) => bytes,
        }
    }

    pub fn was_encrypted(&self) -> bool {
        matches!(self, Opened::Decrypted(_))
    }
}

/// Encrypt plaintext into a self-contained envelope:
/// `base64(nonce(12) || ciphertext_with_tag)`, standard alphabet with padding.
/// The nonce is fresh and random on every call; envelopes are never reused.
pub fn seal(plaintext: &[u8], key: &SymmetricKey) -> Result<String, EnvelopeError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| EnvelopeError::Encrypt(e.to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(envelope))
}

/// Decrypt an envelope produced by [`seal`].
///
/// Anything that does not authenticate as an envelope under this key comes
/// back as [`Opened::Passthrough`] with the input bytes untouched: invalid
/// base64, a payload too short to hold nonce and tag, or an AEAD
/// authentication failure.
pub fn open(envelope_b64: &str, key: &SymmetricKey) -> Opened {
    let passthrough = || Opened::Passthrough(envelope_b64.as_bytes().to_vec());

    let data = match BASE64.decode(envelope_b64) {
        Ok(data) => data,
        Err(_) => return passthrough(),
    };
    if data.len() < NONCE_LEN + TAG_LEN {
        return passthrough();
    }

    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    match cipher.decrypt(Nonce::from_slice(nonce), ciphertext) {
        Ok(plaintext) => Opened::Decrypted(plaintext),
        Err(_) => passthrough(),
    }
}
