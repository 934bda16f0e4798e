use chrono::Utc;
use tracing::{debug, info};

use infbk_types::ObjectId;

use crate::error::{InfbkError, Result};
use crate::model::{
    BackupPayload, DiagramBackup, MemberBackup, NodeBackup, NoteBackup, ProjectBackup,
    VaultBackup, PAYLOAD_VERSION,
};
use crate::store::Stores;

/// Reads one project graph out of the storage ports.
///
/// Any failed read aborts the whole collection; a partial payload is never
/// returned.
pub struct GraphCollector<'a> {
    stores: &'a Stores,
}

impl<'a> GraphCollector<'a> {
    pub fn new(stores: &'a Stores) -> Self {
        Self { stores }
    }

    pub fn collect(&self, project_id: &ObjectId, user_id: &ObjectId) -> Result<BackupPayload> {
        let project = self
            .stores
            .projects
            .find_project(project_id)
            .map_err(|e| InfbkError::storage("fetching project", e))?;

        let member = self
            .stores
            .members
            .find_member(project_id, user_id)
            .map_err(|e| InfbkError::storage("fetching member", e))?;

        let diagrams = self
            .stores
            .diagrams
            .find_all_diagrams_by_project(project_id)
            .map_err(|e| InfbkError::storage("fetching diagrams", e))?;
        debug!(count = diagrams.len(), "diagrams fetched");

        let nodes = if diagrams.is_empty() {
            Vec::new()
        } else {
            let diagram_ids: Vec<ObjectId> = diagrams.iter().map(|d| d.id).collect();
            self.stores
                .nodes
                .find_nodes_by_diagram_ids(&diagram_ids)
                .map_err(|e| InfbkError::storage("fetching nodes", e))?
        };
        debug!(count = nodes.len(), "nodes fetched");

        let vaults = self
            .stores
            .vaults
            .find_vaults_by_project(project_id)
            .map_err(|e| InfbkError::storage("fetching vaults", e))?;
        debug!(count = vaults.len(), "vaults fetched");

        let notes = self
            .stores
            .notes
            .find_notes_by_project(project_id)
            .map_err(|e| InfbkError::storage("fetching notes", e))?;
        debug!(count = notes.len(), "notes fetched");

        let payload = BackupPayload {
            version: PAYLOAD_VERSION,
            created_at: Utc::now(),
            project: ProjectBackup::from(&project),
            member: MemberBackup::from(&member),
            diagrams: diagrams.iter().map(DiagramBackup::from).collect(),
            nodes: nodes.iter().map(NodeBackup::from).collect(),
            vaults: vaults.iter().map(VaultBackup::from).collect(),
            notes: notes.iter().map(NoteBackup::from).collect(),
        };

        info!(
            project = %project_id,
            user = %user_id.short(),
            diagrams = payload.diagrams.len(),
            nodes = payload.nodes.len(),
            vaults = payload.vaults.len(),
            notes = payload.notes.len(),
            "project graph collected"
        );
        Ok(payload)
    }
}
