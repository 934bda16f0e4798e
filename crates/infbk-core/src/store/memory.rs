use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use infbk_types::ObjectId;

use super::{
    DiagramStore, MemberStore, NodeStore, NoteStore, PermissionGate, ProjectStore, VaultStore,
};
use crate::error::{InfbkError, Result, StoreError, StoreResult};
use crate::model::{
    Diagram, NewVault, Node, NodeVault, Note, Permission, Project, ProjectMember,
};

/// Every collection, keyed by id. Also the on-disk JSON document layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Documents {
    #[serde(default)]
    pub projects: BTreeMap<ObjectId, Project>,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
    #[serde(default)]
    pub diagrams: BTreeMap<ObjectId, Diagram>,
    #[serde(default)]
    pub nodes: BTreeMap<ObjectId, Node>,
    #[serde(default)]
    pub vaults: BTreeMap<ObjectId, NodeVault>,
    #[serde(default)]
    pub notes: BTreeMap<ObjectId, Note>,
}

/// In-process document store implementing every storage port.
/// Thread-safe via Mutex; optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(docs: Documents) -> Self {
        Self {
            docs: Mutex::new(docs),
        }
    }

    /// Load a JSON document file. A missing file yields an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "store file missing, starting empty");
            return Ok(Self::new());
        }
        let raw = std::fs::read(path)?;
        let docs: Documents = serde_json::from_slice(&raw).map_err(|e| {
            InfbkError::Config(format!("invalid store file '{}': {e}", path.display()))
        })?;
        Ok(Self::from_documents(docs))
    }

    /// Write the current contents to `path` via a temp file and rename.
    pub fn flush(&self, path: &Path) -> Result<()> {
        let json = {
            let docs = self.lock().map_err(|e| InfbkError::storage("flushing store", e))?;
            serde_json::to_vec_pretty(&*docs)?
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreResult<Documents> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Documents>> {
        self.docs
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

fn insert_unique<T>(
    map: &mut BTreeMap<ObjectId, T>,
    entity: &'static str,
    id: ObjectId,
    value: T,
) -> StoreResult<()> {
    if map.contains_key(&id) {
        return Err(StoreError::Duplicate {
            entity,
            id: id.to_hex(),
        });
    }
    map.insert(id, value);
    Ok(())
}

impl ProjectStore for MemoryStore {
    fn find_project(&self, id: &ObjectId) -> StoreResult<Project> {
        self.lock()?
            .projects
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "project",
                id: id.to_hex(),
            })
    }

    fn create_project(&self, project: &Project) -> StoreResult<()> {
        insert_unique(&mut self.lock()?.projects, "project", project.id, project.clone())
    }
}

impl MemberStore for MemoryStore {
    fn find_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> StoreResult<ProjectMember> {
        self.lock()?
            .members
            .iter()
            .find(|m| m.project_id == *project_id && m.user_id == *user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "member",
                id: format!("{project_id}/{user_id}"),
            })
    }

    fn create_member(&self, member: &ProjectMember) -> StoreResult<()> {
        let mut docs = self.lock()?;
        if docs
            .members
            .iter()
            .any(|m| m.project_id == member.project_id && m.user_id == member.user_id)
        {
            return Err(StoreError::Duplicate {
                entity: "member",
                id: format!("{}/{}", member.project_id, member.user_id),
            });
        }
        docs.members.push(member.clone());
        Ok(())
    }
}

impl DiagramStore for MemoryStore {
    fn find_all_diagrams_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<Diagram>> {
        Ok(self
            .lock()?
            .diagrams
            .values()
            .filter(|d| d.project_id == *project_id)
            .cloned()
            .collect())
    }

    fn create_diagram(&self, diagram: &Diagram) -> StoreResult<()> {
        insert_unique(&mut self.lock()?.diagrams, "diagram", diagram.id, diagram.clone())
    }
}

impl NodeStore for MemoryStore {
    fn find_nodes_by_diagram_ids(&self, diagram_ids: &[ObjectId]) -> StoreResult<Vec<Node>> {
        Ok(self
            .lock()?
            .nodes
            .values()
            .filter(|n| diagram_ids.contains(&n.diagram_id))
            .cloned()
            .collect())
    }

    fn create_node(&self, node: &Node) -> StoreResult<()> {
        insert_unique(&mut self.lock()?.nodes, "node", node.id, node.clone())
    }
}

impl VaultStore for MemoryStore {
    fn find_vaults_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<NodeVault>> {
        Ok(self
            .lock()?
            .vaults
            .values()
            .filter(|v| v.project_id == *project_id)
            .cloned()
            .collect())
    }

    fn create_vault(&self, vault: NewVault) -> StoreResult<NodeVault> {
        let now = Utc::now();
        let stored = NodeVault {
            id: ObjectId::generate(),
            project_id: vault.project_id,
            node_id: vault.node_id,
            label: vault.label,
            vault_type: vault.vault_type,
            encrypted_value: vault.encrypted_value,
            encrypted_value_signature: vault.encrypted_value_signature,
            created_at: now,
            updated_at: now,
        };
        insert_unique(&mut self.lock()?.vaults, "vault", stored.id, stored.clone())?;
        Ok(stored)
    }
}

impl NoteStore for MemoryStore {
    fn find_notes_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<Note>> {
        Ok(self
            .lock()?
            .notes
            .values()
            .filter(|n| n.project_id == *project_id)
            .cloned()
            .collect())
    }

    fn create_note(&self, note: &Note) -> StoreResult<()> {
        insert_unique(&mut self.lock()?.notes, "note", note.id, note.clone())
    }
}

impl PermissionGate for MemoryStore {
    fn has_permission(
        &self,
        project_id: &ObjectId,
        user_id: &ObjectId,
        permission: Permission,
    ) -> StoreResult<bool> {
        Ok(self
            .lock()?
            .members
            .iter()
            .any(|m| m.project_id == *project_id && m.user_id == *user_id && m.has_permission(permission)))
    }
}
