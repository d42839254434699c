//! AES-256-GCM sealing of palm templates.
//!
//! A sealed template is `base64(nonce || ciphertext || tag)` with a 96-bit
//! random nonce, the same layout the capture client produces.

use crate::*;
use aes_gcm::aead::{generic_array::GenericArray, Aead, NewAead};
use aes_gcm::Aes256Gcm;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

const AES_IV_LENGTH: usize = 12;
pub const KEY_LENGTH: usize = 32;

/// A 256-bit template / session key.
///
/// The backend hands these out as "QKD session keys"; they are plain random
/// AES keys.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TemplateKey([u8; KEY_LENGTH]);

impl TemplateKey {
    /// Generate a fresh key from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        TemplateKey(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != KEY_LENGTH {
            return Err(Error::KeyLength(bytes.len()));
        }
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(TemplateKey(key))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        let bytes = base64::decode(encoded.trim())?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base64(&self) -> String {
        base64::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Keys never show up in logs
impl fmt::Debug for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("TemplateKey(..)")
    }
}

/// Seal raw template bytes under `key`, returning base64 text
pub fn seal(key: &TemplateKey, plaintext: &[u8]) -> Result<String, Error> {
    let aead = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    let mut nonce = [0u8; AES_IV_LENGTH];
    OsRng.fill_bytes(&mut nonce);
    let nonce = GenericArray::from_slice(&nonce);

    let ciphertext = aead
        .encrypt(nonce, plaintext)
        .map_err(|_| Error::OpenFailed)?;

    let mut output = Vec::with_capacity(AES_IV_LENGTH + ciphertext.len());
    output.extend_from_slice(nonce);
    output.extend(ciphertext);

    Ok(base64::encode(&output))
}

/// Open a base64 sealed template
pub fn open(key: &TemplateKey, sealed: &str) -> Result<Vec<u8>, Error> {
    let combined = base64::decode(sealed.trim())?;
    if combined.len() < AES_IV_LENGTH {
        return Err(Error::SealedTooShort);
    }

    let aead = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let nonce = GenericArray::from_slice(&combined[..AES_IV_LENGTH]);
    let encrypted = &combined[AES_IV_LENGTH..];

    aead.decrypt(nonce, encrypted).map_err(|_| Error::OpenFailed)
}
