use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use infbk_core::config;

/// Write the starter config to `dest`, or to `./infbk.yaml` when omitted.
/// Never overwrites an existing file.
pub(crate) fn run_config(dest: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = dest
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::PROJECT_CONFIG_FILE));
    write_starter_config(&path)?;
    println!("Config written to {}", path.display());
    println!("Keep the kdf section unchanged once archives exist; they only open with the values they were built with.");
    Ok(())
}

fn write_starter_config(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => io::Error::new(
                e.kind(),
                format!("{} already exists", path.display()),
            ),
            _ => e,
        })?;
    file.write_all(config::minimal_config_template().as_bytes())
}
