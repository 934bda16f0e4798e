use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info};

use infbk_crypto::key::{KdfParams, Pepper};
use infbk_types::ObjectId;

use crate::archive::{Archiver, BackupArchive};
use crate::collect::GraphCollector;
use crate::compress::Codec;
use crate::error::{InfbkError, Result};
use crate::model::{BackupPayload, Permission};
use crate::restore::{GraphRestorer, RestoreOutcome};
use crate::store::Stores;

/// Largest archive accepted on restore (100 MiB).
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 100 * 1024 * 1024;

/// Shortest accepted archive password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub kdf: KdfParams,
    pub max_archive_bytes: u64,
    pub pepper: Pepper,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
            pepper: Pepper::builtin(),
        }
    }
}

/// Entry point for backup, restore and inspect.
pub struct BackupService {
    stores: Stores,
    archiver: Archiver,
    max_archive_bytes: u64,
}

impl BackupService {
    pub fn new(stores: Stores, codec: Arc<Codec>, options: ServiceOptions) -> Self {
        Self {
            stores,
            archiver: Archiver::new(codec, options.kdf, options.pepper),
            max_archive_bytes: options.max_archive_bytes,
        }
    }

    pub fn max_archive_bytes(&self) -> u64 {
        self.max_archive_bytes
    }

    /// Snapshot a project into an encrypted archive.
    ///
    /// The requesting user needs `manage_project` on the source project.
    pub fn create_backup(
        &self,
        project_id: &ObjectId,
        user_id: &ObjectId,
        password: &str,
    ) -> Result<BackupArchive> {
        check_password(password)?;
        info!(project = %project_id, user = %user_id.short(), "creating backup");

        let allowed = self
            .stores
            .permissions
            .has_permission(project_id, user_id, Permission::ManageProject)
            .map_err(|e| InfbkError::storage("checking permission", e))?;
        if !allowed {
            return Err(InfbkError::PermissionDenied(format!(
                "user {} may not back up project {project_id}",
                user_id.short()
            )));
        }

        let payload = GraphCollector::new(&self.stores).collect(project_id, user_id)?;
        let archive = self.archiver.build(&payload, password)?;
        info!(
            bytes = archive.bytes.len(),
            filename = %archive.filename,
            "backup created"
        );
        Ok(archive)
    }

    /// Restore an archive as a new project owned by `user_id`.
    ///
    /// Any authenticated user may restore. Input larger than the configured
    /// cap is rejected before decryption.
    pub fn restore_backup(
        &self,
        user_id: &ObjectId,
        password: &str,
        reader: impl Read,
    ) -> Result<RestoreOutcome> {
        check_password(password)?;
        info!(user = %user_id.short(), "restoring backup");

        let data = self.read_limited(reader)?;
        let payload = self.archiver.parse(&data, password)?;
        debug!(
            source_project = %payload.project.id,
            entities = payload.entity_count(),
            "archive parsed"
        );

        GraphRestorer::new(&self.stores).restore(&payload, user_id)
    }

    /// Decrypt and decode an archive without writing anything.
    pub fn inspect_backup(&self, password: &str, reader: impl Read) -> Result<BackupPayload> {
        check_password(password)?;
        let data = self.read_limited(reader)?;
        self.archiver.parse(&data, password)
    }

    /// Read at most `max_archive_bytes + 1` bytes so oversized input is
    /// detected without buffering all of it.
    fn read_limited(&self, reader: impl Read) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        reader
            .take(self.max_archive_bytes.saturating_add(1))
            .read_to_end(&mut data)?;
        if data.len() as u64 > self.max_archive_bytes {
            return Err(InfbkError::SizeExceeded {
                limit: self.max_archive_bytes,
            });
        }
        Ok(data)
    }
}

/// Enforce the minimum archive password length, measured in UTF-8 bytes.
pub fn check_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(InfbkError::InvalidPassword(format!(
            "must be at least {MIN_PASSWORD_LEN} bytes"
        )));
    }
    Ok(())
}
