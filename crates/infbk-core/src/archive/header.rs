use infbk_crypto::{NONCE_SIZE, SALT_SIZE};

use crate::error::{InfbkError, Result};

/// File signature at offset 0.
pub const MAGIC: &[u8; 5] = b"INFBK";

/// Current (and only supported) archive format version.
pub const FORMAT_VERSION: u8 = 1;

/// magic(5) + version(1) + nonce(12) + salt(32)
pub const HEADER_LEN: usize = MAGIC.len() + 1 + NONCE_SIZE + SALT_SIZE;

/// Fixed-layout archive header. Everything after it is AES-256-GCM ciphertext.
///
/// | Offset | Length | Field |
/// |---|---|---|
/// | 0 | 5 | magic `INFBK` |
/// | 5 | 1 | format version |
/// | 6 | 12 | nonce |
/// | 18 | 32 | salt |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub version: u8,
    pub nonce: [u8; NONCE_SIZE],
    pub salt: [u8; SALT_SIZE],
}

impl ArchiveHeader {
    pub fn new(nonce: [u8; NONCE_SIZE], salt: [u8; SALT_SIZE]) -> Self {
        Self {
            version: FORMAT_VERSION,
            nonce,
            salt,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.push(self.version);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.salt);
    }

    /// Validate and split an archive into its header and ciphertext.
    ///
    /// Checks run in order: length, magic, version.
    pub fn split(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < HEADER_LEN {
            return Err(InfbkError::InvalidFormat(format!(
                "archive is {} bytes, header needs {HEADER_LEN}",
                data.len()
            )));
        }
        if &data[..MAGIC.len()] != MAGIC {
            return Err(InfbkError::InvalidFormat("bad magic".into()));
        }

        let version = data[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(InfbkError::UnsupportedVersion(version));
        }

        let mut offset = MAGIC.len() + 1;
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&data[offset..offset + NONCE_SIZE]);
        offset += NONCE_SIZE;
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&data[offset..offset + SALT_SIZE]);
        offset += SALT_SIZE;

        Ok((
            Self {
                version,
                nonce,
                salt,
            },
            &data[offset..],
        ))
    }
}
