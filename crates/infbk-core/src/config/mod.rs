mod defaults;
mod resolve;
mod types;

pub use self::resolve::{
    config_search_paths, load_config, load_resolved, locate_config, minimal_config_template,
    ConfigFile, ConfigOrigin, CONFIG_ENV_VAR, PROJECT_CONFIG_FILE,
};
pub use self::types::*;
