use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{InfbkError, Result};

/// A 12-byte document identifier: 4-byte big-endian creation second followed
/// by 8 random bytes. Portable form is 24 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub [u8; 12]);

impl ObjectId {
    pub const LEN: usize = 12;

    /// Generate a fresh identifier from the wall clock and OS-seeded randomness.
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let mut out = [0u8; 12];
        out[..4].copy_from_slice(&secs.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut out[4..]);
        ObjectId(out)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| InfbkError::InvalidPayload(format!("invalid object id '{s}': {e}")))?;
        if bytes.len() != Self::LEN {
            return Err(InfbkError::InvalidPayload(format!(
                "invalid object id '{s}': expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut out = [0u8; 12];
        out.copy_from_slice(&bytes);
        Ok(ObjectId(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shortened form for log lines: first 8 hex characters.
    pub fn short(&self) -> String {
        format!("{}...", &self.to_hex()[..8])
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = InfbkError;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::from_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ObjectId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
