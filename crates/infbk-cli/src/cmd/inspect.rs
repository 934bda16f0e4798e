use std::fs::File;
use std::io::BufReader;

use infbk_core::service::BackupService;

use crate::format::{format_time, print_kv};
use crate::passphrase::get_password;

pub(crate) fn run_inspect(
    service: &BackupService,
    archive: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(archive).map_err(|e| format!("cannot open '{archive}': {e}"))?;
    let password = get_password(archive)?;
    let payload = service.inspect_backup(&password, BufReader::new(file))?;

    let mut rows = vec![
        ("Project", payload.project.name.clone()),
        ("Source id", payload.project.id.clone()),
        ("Key epoch", payload.project.key_epoch.clone()),
        ("Created", format_time(payload.created_at)),
        ("Payload version", payload.version.to_string()),
        ("Keyrings", payload.member.keyrings.len().to_string()),
        ("Diagrams", payload.diagrams.len().to_string()),
        ("Nodes", payload.nodes.len().to_string()),
        ("Vaults", payload.vaults.len().to_string()),
        ("Notes", payload.notes.len().to_string()),
    ];
    if !payload.project.description.is_empty() {
        rows.insert(1, ("Description", payload.project.description.clone()));
    }
    print_kv(&rows);
    Ok(())
}
