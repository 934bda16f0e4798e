//! Archive framing: JSON -> zstd -> AES-256-GCM under a peppered Argon2id key.

pub mod filename;
pub mod header;

use std::sync::Arc;

use tracing::debug;

use infbk_crypto::aes_gcm::Aes256GcmEngine;
use infbk_crypto::key::{derive_backup_key, generate_salt, KdfParams, Pepper};
use infbk_crypto::CryptoEngine;

use crate::compress::Codec;
use crate::error::Result;
use crate::model::BackupPayload;

pub use self::filename::{archive_filename, sanitize_filename, ARCHIVE_EXTENSION};
pub use self::header::{ArchiveHeader, FORMAT_VERSION, HEADER_LEN, MAGIC};

/// A finished archive and the filename it should be saved under.
#[derive(Debug, Clone)]
pub struct BackupArchive {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Builds and parses archives. Holds no per-archive state: salt, nonce and
/// key are generated fresh for every call.
#[derive(Debug, Clone)]
pub struct Archiver {
    codec: Arc<Codec>,
    kdf: KdfParams,
    pepper: Pepper,
}

impl Archiver {
    pub fn new(codec: Arc<Codec>, kdf: KdfParams, pepper: Pepper) -> Self {
        Self { codec, kdf, pepper }
    }

    pub fn build(&self, payload: &BackupPayload, password: &str) -> Result<BackupArchive> {
        let json = serde_json::to_vec(payload)?;
        let compressed = self.codec.compress(&json)?;
        debug!(
            json_bytes = json.len(),
            compressed_bytes = compressed.len(),
            "payload compressed"
        );

        let salt = generate_salt();
        let key = derive_backup_key(password, &self.pepper, &salt, &self.kdf)?;
        let (nonce, ciphertext) = Aes256GcmEngine::new(&key).seal(&compressed)?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        ArchiveHeader::new(nonce, salt).write_to(&mut bytes);
        bytes.extend_from_slice(&ciphertext);

        Ok(BackupArchive {
            bytes,
            filename: archive_filename(&payload.project.name, payload.created_at),
        })
    }

    /// Validate, decrypt and decode an archive.
    ///
    /// A wrong password and a tampered archive both fail with
    /// `DecryptionFailed`; the two cases are not distinguished.
    pub fn parse(&self, data: &[u8], password: &str) -> Result<BackupPayload> {
        let (header, ciphertext) = ArchiveHeader::split(data)?;

        let key = derive_backup_key(password, &self.pepper, &header.salt, &self.kdf)?;
        let compressed = Aes256GcmEngine::new(&key).open(&header.nonce, ciphertext)?;

        let json = self.codec.decompress(&compressed)?;
        debug!(
            compressed_bytes = compressed.len(),
            json_bytes = json.len(),
            "archive decrypted"
        );
        Ok(serde_json::from_slice(&json)?)
    }
}
