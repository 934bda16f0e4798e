use std::path::Path;

use infbk_core::service::BackupService;
use infbk_types::ObjectId;

use crate::format::format_bytes;
use crate::passphrase::get_new_password;

pub(crate) fn run_backup(
    service: &BackupService,
    project: &ObjectId,
    user: &ObjectId,
    out: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = Path::new(out);
    if !out_dir.is_dir() {
        return Err(format!("output directory does not exist: {}", out_dir.display()).into());
    }

    let password = get_new_password()?;
    let archive = service.create_backup(project, user, &password)?;

    let path = out_dir.join(&archive.filename);
    if path.exists() {
        return Err(format!("file already exists: {}", path.display()).into());
    }
    std::fs::write(&path, &archive.bytes)?;

    println!(
        "Backup written to: {} ({})",
        path.display(),
        format_bytes(archive.bytes.len() as u64)
    );
    Ok(())
}
