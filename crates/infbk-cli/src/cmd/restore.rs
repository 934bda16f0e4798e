use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use infbk_core::service::BackupService;
use infbk_core::store::MemoryStore;
use infbk_types::error::ErrorKind;
use infbk_types::ObjectId;

use crate::format::print_kv;
use crate::passphrase::get_password;

pub(crate) fn run_restore(
    service: &BackupService,
    store: &MemoryStore,
    store_path: &Path,
    user: &ObjectId,
    archive: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(archive).map_err(|e| format!("cannot open '{archive}': {e}"))?;
    let password = get_password(archive)?;

    let result = service.restore_backup(user, &password, BufReader::new(file));

    // A storage failure midway leaves partial writes behind; persist those
    // too so the store file matches what was created.
    let wrote = match &result {
        Ok(_) => true,
        Err(e) => e.kind() == ErrorKind::Storage,
    };
    if wrote {
        store.flush(store_path)?;
    }
    let outcome = result?;

    let stats = outcome.stats;
    println!("Restored project '{}'", outcome.project.name);
    print_kv(&[
        ("Project id", outcome.project.id.to_hex()),
        ("Owner", user.to_hex()),
        ("Diagrams", stats.diagrams.to_string()),
        ("Nodes", stats.nodes.to_string()),
        ("Vaults", stats.vaults.to_string()),
        ("Notes", stats.notes.to_string()),
    ]);
    if stats.detached_parents > 0 {
        eprintln!(
            "Warning: {} parent reference(s) pointed outside the backup and were restored at the top level",
            stats.detached_parents
        );
    }
    Ok(())
}
