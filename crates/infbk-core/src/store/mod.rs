//! Storage ports consumed by the collector and restorer.
//!
//! Implementations only need single-document writes; restore never updates or
//! deletes anything.

pub mod memory;

use std::sync::Arc;

use infbk_types::ObjectId;

use crate::error::StoreResult;
use crate::model::{
    Diagram, NewVault, Node, NodeVault, Note, Permission, Project, ProjectMember,
};

pub use self::memory::MemoryStore;

pub trait ProjectStore: Send + Sync {
    fn find_project(&self, id: &ObjectId) -> StoreResult<Project>;
    fn create_project(&self, project: &Project) -> StoreResult<()>;
}

pub trait MemberStore: Send + Sync {
    fn find_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> StoreResult<ProjectMember>;
    fn create_member(&self, member: &ProjectMember) -> StoreResult<()>;
}

pub trait DiagramStore: Send + Sync {
    /// Every diagram of the project, unpaginated.
    fn find_all_diagrams_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<Diagram>>;
    fn create_diagram(&self, diagram: &Diagram) -> StoreResult<()>;
}

pub trait NodeStore: Send + Sync {
    /// Bulk lookup of the nodes of every listed diagram.
    fn find_nodes_by_diagram_ids(&self, diagram_ids: &[ObjectId]) -> StoreResult<Vec<Node>>;
    fn create_node(&self, node: &Node) -> StoreResult<()>;
}

pub trait VaultStore: Send + Sync {
    fn find_vaults_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<NodeVault>>;
    /// Insert a vault under a store-assigned id and return the stored record.
    fn create_vault(&self, vault: NewVault) -> StoreResult<NodeVault>;
}

pub trait NoteStore: Send + Sync {
    fn find_notes_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<Note>>;
    fn create_note(&self, note: &Note) -> StoreResult<()>;
}

pub trait PermissionGate: Send + Sync {
    fn has_permission(
        &self,
        project_id: &ObjectId,
        user_id: &ObjectId,
        permission: Permission,
    ) -> StoreResult<bool>;
}

/// The full set of collaborators one backup service talks to.
#[derive(Clone)]
pub struct Stores {
    pub projects: Arc<dyn ProjectStore>,
    pub members: Arc<dyn MemberStore>,
    pub diagrams: Arc<dyn DiagramStore>,
    pub nodes: Arc<dyn NodeStore>,
    pub vaults: Arc<dyn VaultStore>,
    pub notes: Arc<dyn NoteStore>,
    pub permissions: Arc<dyn PermissionGate>,
}

impl Stores {
    /// Wire every port to one backend that implements all of them.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ProjectStore
            + MemberStore
            + DiagramStore
            + NodeStore
            + VaultStore
            + NoteStore
            + PermissionGate
            + 'static,
    {
        Self {
            projects: backend.clone(),
            members: backend.clone(),
            diagrams: backend.clone(),
            nodes: backend.clone(),
            vaults: backend.clone(),
            notes: backend.clone(),
            permissions: backend,
        }
    }
}
