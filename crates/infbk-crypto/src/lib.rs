pub mod aes_gcm;
pub mod key;

use infbk_types::error::Result;

/// AES-GCM nonce length.
pub const NONCE_SIZE: usize = 12;
/// Argon2id salt length stored in every archive header.
pub const SALT_SIZE: usize = 32;
/// Derived symmetric key length (AES-256).
pub const KEY_SIZE: usize = 32;
/// AES-GCM authentication tag appended to the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Authenticated encryption of opaque byte blocks without associated data.
pub trait CryptoEngine: Send + Sync {
    /// Seal `plaintext` under a fresh random nonce.
    /// Returns the nonce and the ciphertext with the tag appended.
    fn seal(&self, plaintext: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>)>;

    /// Open a ciphertext produced by `seal`. Any authentication failure maps
    /// to `DecryptionFailed`.
    fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>>;
}
