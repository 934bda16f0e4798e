use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::InfbkConfig;
use crate::error::{InfbkError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "INFBK_CONFIG";

/// Config file looked up in the working directory, and the default
/// destination of `infbk config`.
pub const PROJECT_CONFIG_FILE: &str = "infbk.yaml";

/// How the active config file was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Flag,
    EnvVar,
    Search,
}

/// A config file picked for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub origin: ConfigOrigin,
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            ConfigOrigin::Flag => write!(f, "{} (--config)", self.path.display()),
            ConfigOrigin::EnvVar => write!(f, "{} ({CONFIG_ENV_VAR})", self.path.display()),
            ConfigOrigin::Search => write!(f, "{}", self.path.display()),
        }
    }
}

/// Candidate locations, highest priority first: working directory, user
/// config dir, then `/etc` on unix.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("infbk").join("config.yaml"));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc/infbk/config.yaml"));
    }
    paths
}

/// `--config` wins over `INFBK_CONFIG`, which wins over the first search
/// path that exists.
pub fn locate_config(flag: Option<&Path>) -> Option<ConfigFile> {
    let named = flag
        .map(|p| (p.to_path_buf(), ConfigOrigin::Flag))
        .or_else(|| {
            std::env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(|v| (PathBuf::from(v), ConfigOrigin::EnvVar))
        });
    if let Some((path, origin)) = named {
        return Some(ConfigFile { path, origin });
    }
    config_search_paths()
        .into_iter()
        .find(|p| p.is_file())
        .map(|path| ConfigFile {
            path,
            origin: ConfigOrigin::Search,
        })
}

/// Read, parse and validate one config file. An empty file is all defaults.
pub fn load_config(path: &Path) -> Result<InfbkConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| InfbkError::Config(format!("cannot read '{}': {e}", path.display())))?;
    let mut config: InfbkConfig = if contents.trim().is_empty() {
        InfbkConfig::default()
    } else {
        serde_yaml::from_str(&contents)
            .map_err(|e| InfbkError::Config(format!("invalid config '{}': {e}", path.display())))?
    };
    config.store.expand_placeholders()?;
    config.validate()?;
    Ok(config)
}

/// Load the active config. Built-in defaults apply when no file is found;
/// a file named by flag or environment must exist.
pub fn load_resolved(flag: Option<&Path>) -> Result<(InfbkConfig, Option<ConfigFile>)> {
    let Some(file) = locate_config(flag) else {
        debug!("no config file found, using defaults");
        return Ok((InfbkConfig::default(), None));
    };
    debug!(config = %file, "loading config");
    let config = load_config(&file.path)?;
    Ok((config, Some(file)))
}

/// Starter YAML written by `infbk config`.
pub fn minimal_config_template() -> &'static str {
    r#"# infbk configuration file
# Every setting is optional; the values below are the defaults.

# Argon2id cost. Archives only open with the values they were created with.
kdf:
  memory_kib: 65536
  iterations: 3
  parallelism: 2

compression:
  zstd_level: 3
  max_decompressed_mib: 256

limits:
  max_archive_bytes: 104857600

# ${VAR} and ${VAR:-fallback} are expanded here.
store:
  path: "${INFBK_STORE:-infbk-store.json}"
"#
}
