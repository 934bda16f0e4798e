use std::fmt;

use argon2::Argon2;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_SIZE, SALT_SIZE};
use infbk_types::error::{InfbkError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compiled-in application secret. Override at build time with
/// `INFBK_BACKUP_PEPPER`; changing it makes every existing archive unreadable.
const BUILTIN_PEPPER: &str = match option_env!("INFBK_BACKUP_PEPPER") {
    Some(p) => p,
    None => "infrantery:backup:v1:a9f2c8e1-4d7b-4f3a-b5e6-8c1d9e0f7a2b",
};

/// Application-wide secret mixed into every archive key via HMAC-SHA256.
#[derive(Clone)]
pub struct Pepper(Zeroizing<Vec<u8>>);

impl Pepper {
    /// The pepper compiled into this binary.
    pub fn builtin() -> Self {
        Self(Zeroizing::new(BUILTIN_PEPPER.as_bytes().to_vec()))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Pepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pepper(<redacted>)")
    }
}

/// Argon2id cost parameters. Not stored in the archive: both sides must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024, // 64 MiB
            iterations: 3,
            parallelism: 2,
        }
    }
}

impl KdfParams {
    pub fn validate(&self) -> Result<()> {
        self.argon2_params().map(|_| ())
    }

    fn argon2_params(&self) -> Result<argon2::Params> {
        argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| InfbkError::KeyDerivation(format!("argon2 params: {e}")))
    }
}

/// Generate a fresh per-archive salt from OS entropy.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the archive key: `Argon2id(HMAC-SHA256(pepper, password), salt)`.
///
/// The result cannot be reproduced from the password alone. Never cache it.
pub fn derive_backup_key(
    password: &str,
    pepper: &Pepper,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(pepper.as_bytes())
        .map_err(|e| InfbkError::KeyDerivation(format!("hmac init: {e}")))?;
    mac.update(password.as_bytes());
    let mut peppered = Zeroizing::new([0u8; 32]);
    peppered.copy_from_slice(&mac.finalize().into_bytes());

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params.argon2_params()?,
    );

    let mut output = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(peppered.as_ref(), salt, output.as_mut())
        .map_err(|e| InfbkError::KeyDerivation(format!("argon2 hash: {e}")))?;
    Ok(output)
}
