use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

use super::{CryptoEngine, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use infbk_types::error::{InfbkError, Result};

/// AES-256-GCM engine bound to one derived archive key.
pub struct Aes256GcmEngine {
    cipher: Aes256Gcm,
}

impl Aes256GcmEngine {
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        Self { cipher }
    }
}

impl CryptoEngine for Aes256GcmEngine {
    fn seal(&self, plaintext: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>)> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| InfbkError::Other(format!("AES-GCM encrypt: {e}")))?;
        Ok((nonce_bytes, ciphertext))
    }

    fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(InfbkError::DecryptionFailed);
        }
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| InfbkError::DecryptionFailed)
    }
}
