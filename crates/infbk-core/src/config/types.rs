use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use infbk_crypto::key::{KdfParams, Pepper};

use super::defaults::*;
use crate::compress::Codec;
use crate::error::{InfbkError, Result};
use crate::service::ServiceOptions;

/// Top-level `infbk.yaml` document. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InfbkConfig {
    #[serde(default)]
    pub kdf: KdfConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Argon2id cost. Archives only open with the same values they were built
/// with; these are not recorded in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl KdfConfig {
    pub fn params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.memory_kib,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressionConfig {
    #[serde(default = "default_zstd_level")]
    pub zstd_level: i32,
    /// Upper bound on decompressed payload size, in MiB.
    #[serde(default = "default_max_decompressed_mib")]
    pub max_decompressed_mib: u64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            zstd_level: default_zstd_level(),
            max_decompressed_mib: default_max_decompressed_mib(),
        }
    }
}

impl CompressionConfig {
    pub fn codec(&self) -> Result<Codec> {
        let max = self
            .max_decompressed_mib
            .checked_mul(1024 * 1024)
            .ok_or_else(|| InfbkError::Config("compression.max_decompressed_mib is too large".into()))?;
        Codec::new(self.zstd_level, max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest archive accepted on restore, in bytes.
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON document store used by the command-line tool.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    /// Substitute `${VAR}` and `${VAR:-fallback}` in `path`. The fallback
    /// applies when the variable is unset or empty.
    pub fn expand_placeholders(&mut self) -> Result<()> {
        let raw = self.path.as_str();
        let mut expanded = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(open) = rest.find("${") {
            expanded.push_str(&rest[..open]);
            let body = &rest[open + 2..];
            let close = body.find('}').ok_or_else(|| {
                InfbkError::Config(format!("store.path: unterminated '${{' in '{raw}'"))
            })?;
            let (name, fallback) = match body[..close].split_once(":-") {
                Some((name, fallback)) => (name, Some(fallback)),
                None => (&body[..close], None),
            };
            let value = std::env::var(name).ok().filter(|v| !v.is_empty());
            match (value, fallback) {
                (Some(value), _) => expanded.push_str(&value),
                (None, Some(fallback)) => expanded.push_str(fallback),
                (None, None) => {
                    return Err(InfbkError::Config(format!(
                        "store.path: environment variable '{name}' is not set"
                    )))
                }
            }
            rest = &body[close + 1..];
        }
        expanded.push_str(rest);
        self.path = expanded;
        Ok(())
    }

    /// The store path with a leading `~/` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(rest) = self.path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.path)
    }
}

impl InfbkConfig {
    pub fn validate(&self) -> Result<()> {
        self.kdf
            .params()
            .validate()
            .map_err(|e| InfbkError::Config(format!("kdf: {e}")))?;
        self.compression.codec()?;
        if self.limits.max_archive_bytes == 0 {
            return Err(InfbkError::Config(
                "limits.max_archive_bytes must be greater than zero".into(),
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(InfbkError::Config("store.path must not be empty".into()));
        }
        Ok(())
    }

    /// Service options for this config with the compiled-in pepper.
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            kdf: self.kdf.params(),
            max_archive_bytes: self.limits.max_archive_bytes,
            pepper: Pepper::builtin(),
        }
    }
}
