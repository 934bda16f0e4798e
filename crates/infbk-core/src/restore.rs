//! Rebuild a project graph under freshly generated identifiers.
//!
//! Diagrams, nodes and notes are restored in two passes: every old id is
//! first assigned a new one, then each record is written with its references
//! rewritten through that mapping. Parent references that point outside the
//! payload, or at the entity itself, are restored as roots.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info, warn};

use infbk_types::ObjectId;

use crate::error::{InfbkError, Result};
use crate::model::{
    BackupPayload, Diagram, MemberKeyring, NewVault, Node, Note, NoteType, Project,
    ProjectMember, Role,
};
use crate::store::Stores;

/// Old portable id -> newly generated id, scoped to one restore and one
/// entity kind.
#[derive(Debug, Default)]
pub struct IdMap {
    map: HashMap<String, ObjectId>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and record a new id for `old`. Assigning the same old id twice
    /// replaces the earlier mapping.
    pub fn assign(&mut self, old: &str) -> ObjectId {
        let new = ObjectId::generate();
        self.map.insert(old.to_string(), new);
        new
    }

    pub fn get(&self, old: &str) -> Option<ObjectId> {
        self.map.get(old).copied()
    }

    fn require(&self, old: &str, what: &str) -> Result<ObjectId> {
        self.get(old)
            .ok_or_else(|| InfbkError::InvalidPayload(format!("{what} references unknown id {old}")))
    }
}

/// Counts of what a restore wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreStats {
    pub diagrams: usize,
    pub nodes: usize,
    pub vaults: usize,
    pub notes: usize,
    /// Diagram or note parents that pointed outside the payload, or at the
    /// entity itself, and were restored as roots.
    pub detached_parents: usize,
}

#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub project: Project,
    pub stats: RestoreStats,
}

/// Reject payloads whose internal references cannot be restored consistently.
///
/// Runs before anything is written. Parents that are absent from the payload
/// or self-referencing are allowed here; the restorer detaches them.
pub fn validate_payload(payload: &BackupPayload) -> Result<()> {
    let diagram_ids = unique_ids("diagram", payload.diagrams.iter().map(|d| d.id.as_str()))?;
    let node_ids = unique_ids("node", payload.nodes.iter().map(|n| n.id.as_str()))?;
    unique_ids("vault", payload.vaults.iter().map(|v| v.id.as_str()))?;
    unique_ids("note", payload.notes.iter().map(|n| n.id.as_str()))?;

    for node in &payload.nodes {
        if !diagram_ids.contains(node.diagram_id.as_str()) {
            return Err(InfbkError::InvalidPayload(format!(
                "node {} references unknown diagram {}",
                node.id, node.diagram_id
            )));
        }
    }

    for vault in &payload.vaults {
        if !node_ids.contains(vault.node_id.as_str()) {
            return Err(InfbkError::InvalidPayload(format!(
                "vault {} references unknown node {}",
                vault.id, vault.node_id
            )));
        }
    }

    let note_types: HashMap<&str, NoteType> = payload
        .notes
        .iter()
        .map(|n| (n.id.as_str(), n.note_type))
        .collect();
    for note in &payload.notes {
        if let Some(parent) = note.parent_id.as_deref().filter(|p| *p != note.id) {
            if let Some(kind) = note_types.get(parent) {
                if *kind != NoteType::Folder {
                    return Err(InfbkError::InvalidPayload(format!(
                        "note {} has parent {parent} which is not a folder",
                        note.id
                    )));
                }
            }
        }
    }

    Ok(())
}

fn unique_ids<'p>(
    entity: &str,
    ids: impl Iterator<Item = &'p str>,
) -> Result<HashSet<&'p str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(InfbkError::InvalidPayload(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(seen)
}

/// Writes a payload back through the storage ports as a new project owned by
/// the restoring user.
///
/// Nothing is rolled back on failure: entities written before a failing
/// insert stay in storage.
pub struct GraphRestorer<'a> {
    stores: &'a Stores,
}

impl<'a> GraphRestorer<'a> {
    pub fn new(stores: &'a Stores) -> Self {
        Self { stores }
    }

    pub fn restore(&self, payload: &BackupPayload, user_id: &ObjectId) -> Result<RestoreOutcome> {
        validate_payload(payload)?;

        let now = Utc::now();
        let mut stats = RestoreStats::default();

        let project = Project {
            id: ObjectId::generate(),
            name: payload.project.name.clone(),
            description: payload.project.description.clone(),
            key_epoch: payload.project.key_epoch.clone(),
            created_at: now,
            updated_at: now,
        };
        self.stores
            .projects
            .create_project(&project)
            .map_err(|e| InfbkError::storage("creating project", e))?;
        debug!(old = %payload.project.id, new = %project.id, "project created");

        let member = ProjectMember {
            project_id: project.id,
            user_id: *user_id,
            role: Role::Owner,
            permissions: Role::Owner.permissions(),
            public_key: payload.member.public_key.clone(),
            encrypted_private_key: payload.member.encrypted_private_key.clone(),
            keyrings: payload.member.keyrings.iter().map(MemberKeyring::from).collect(),
            created_at: now,
            updated_at: now,
        };
        self.stores
            .members
            .create_member(&member)
            .map_err(|e| InfbkError::storage("creating owner membership", e))?;

        let mut diagram_ids = IdMap::new();
        for diagram in &payload.diagrams {
            diagram_ids.assign(&diagram.id);
        }
        for backup in &payload.diagrams {
            let parent_diagram_id = remap_parent(
                &diagram_ids,
                "diagram",
                &backup.id,
                backup.parent_diagram_id.as_deref(),
                &mut stats,
            );
            let diagram = Diagram {
                id: diagram_ids.require(&backup.id, "diagram")?,
                project_id: project.id,
                parent_diagram_id,
                diagram_name: backup.diagram_name.clone(),
                description: backup.description.clone(),
                encrypted_data: backup.encrypted_data.clone(),
                encrypted_data_signature: backup.encrypted_data_signature.clone(),
                created_at: now,
                updated_at: now,
            };
            self.stores.diagrams.create_diagram(&diagram).map_err(|e| {
                InfbkError::storage(format!("creating diagram '{}'", backup.diagram_name), e)
            })?;
            stats.diagrams += 1;
        }

        let mut node_ids = IdMap::new();
        for node in &payload.nodes {
            node_ids.assign(&node.id);
        }
        for backup in &payload.nodes {
            let node = Node {
                id: node_ids.require(&backup.id, "node")?,
                diagram_id: diagram_ids.require(&backup.diagram_id, "node")?,
                encrypted_readme: backup.encrypted_readme.clone(),
                encrypted_readme_signature: backup.encrypted_readme_signature.clone(),
                encrypted_dict: backup.encrypted_dict.clone(),
                encrypted_dict_signature: backup.encrypted_dict_signature.clone(),
                created_at: now,
                updated_at: now,
            };
            self.stores
                .nodes
                .create_node(&node)
                .map_err(|e| InfbkError::storage(format!("creating node {}", backup.id), e))?;
            stats.nodes += 1;
        }

        for backup in &payload.vaults {
            let vault = NewVault {
                project_id: project.id,
                node_id: node_ids.require(&backup.node_id, "vault")?,
                label: backup.label.clone(),
                vault_type: backup.vault_type.clone(),
                encrypted_value: backup.encrypted_value.clone(),
                encrypted_value_signature: backup.encrypted_value_signature.clone(),
            };
            self.stores.vaults.create_vault(vault).map_err(|e| {
                InfbkError::storage(format!("creating vault '{}'", backup.label), e)
            })?;
            stats.vaults += 1;
        }

        let mut note_ids = IdMap::new();
        for note in &payload.notes {
            note_ids.assign(&note.id);
        }
        for backup in &payload.notes {
            let parent_id = remap_parent(
                &note_ids,
                "note",
                &backup.id,
                backup.parent_id.as_deref(),
                &mut stats,
            );
            let note = Note {
                id: note_ids.require(&backup.id, "note")?,
                project_id: project.id,
                parent_id,
                note_type: backup.note_type,
                file_name: backup.file_name.clone(),
                icon: backup.icon.clone(),
                encrypted_content: backup.encrypted_content.clone(),
                encrypted_content_signature: backup.encrypted_content_signature.clone(),
                created_at: now,
                updated_at: now,
            };
            self.stores.notes.create_note(&note).map_err(|e| {
                InfbkError::storage(format!("creating note '{}'", backup.file_name), e)
            })?;
            stats.notes += 1;
        }

        info!(
            project = %project.id,
            user = %user_id.short(),
            diagrams = stats.diagrams,
            nodes = stats.nodes,
            vaults = stats.vaults,
            notes = stats.notes,
            detached = stats.detached_parents,
            "project graph restored"
        );
        Ok(RestoreOutcome { project, stats })
    }
}

/// Rewrite a diagram or note parent through `ids`. A parent that is missing
/// from the payload or names the entity itself is dropped and counted.
fn remap_parent(
    ids: &IdMap,
    entity: &str,
    own_id: &str,
    parent: Option<&str>,
    stats: &mut RestoreStats,
) -> Option<ObjectId> {
    let parent = parent?;
    if parent == own_id {
        warn!(entity, id = own_id, "{entity} is its own parent, restoring as root");
        stats.detached_parents += 1;
        return None;
    }
    match ids.get(parent) {
        Some(id) => Some(id),
        None => {
            warn!(entity, id = own_id, parent, "{entity} parent not in backup, restoring as root");
            stats.detached_parents += 1;
            None
        }
    }
}
