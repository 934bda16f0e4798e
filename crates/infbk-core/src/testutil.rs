use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use infbk_crypto::key::{KdfParams, Pepper};
use infbk_types::ObjectId;

use crate::compress::Codec;
use crate::error::{StoreError, StoreResult};
use crate::model::{
    Diagram, MemberKeyring, NewVault, Node, NodeVault, Note, NoteType, Permission, Project,
    ProjectMember, Role,
};
use crate::service::{BackupService, ServiceOptions, DEFAULT_MAX_ARCHIVE_BYTES};
use crate::store::{
    DiagramStore, MemberStore, MemoryStore, NodeStore, NoteStore, PermissionGate, ProjectStore,
    Stores, VaultStore,
};

pub const PASSWORD: &str = "CorrectHorse1";

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set (`Some`) or removed (`None`), then
/// put the previous values back. Holds a process-wide lock so tests touching
/// the environment or working directory never overlap.
pub fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let saved: Vec<_> = vars
        .iter()
        .map(|(key, value)| {
            let previous = std::env::var_os(key);
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            (*key, previous)
        })
        .collect();
    let out = f();
    for (key, previous) in saved {
        match previous {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    out
}

/// Argon2id parameters cheap enough for unit tests.
pub fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn test_options() -> ServiceOptions {
    ServiceOptions {
        kdf: fast_kdf(),
        max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
        pepper: Pepper::builtin(),
    }
}

pub fn test_service(stores: Stores) -> BackupService {
    BackupService::new(stores, Arc::new(Codec::default()), test_options())
}

/// Ids of the seeded project graph:
///
/// ```text
/// project
/// ├── D1 (root diagram)
/// │   └── D2 (child of D1)
/// │       └── N1
/// │           └── V1
/// └── notes: F (folder) ── C (note in F)
/// ```
#[derive(Debug, Clone)]
pub struct SeededGraph {
    pub project: ObjectId,
    pub owner: ObjectId,
    pub viewer: ObjectId,
    pub d1: ObjectId,
    pub d2: ObjectId,
    pub n1: ObjectId,
    pub v1: ObjectId,
    pub folder: ObjectId,
    pub child: ObjectId,
}

fn member(project_id: ObjectId, user_id: ObjectId, role: Role) -> ProjectMember {
    let now = Utc::now();
    ProjectMember {
        project_id,
        user_id,
        role,
        permissions: role.permissions(),
        public_key: format!("pk-{}", user_id.short()),
        encrypted_private_key: "enc-private-key".into(),
        keyrings: vec![
            MemberKeyring {
                epoch: "1".into(),
                secret_passphrase: "enc-pass-1".into(),
                secret_signing_private_key: "enc-sign-1".into(),
                signing_public_key: "sign-pub-1".into(),
            },
            MemberKeyring {
                epoch: "2".into(),
                secret_passphrase: "enc-pass-2".into(),
                secret_signing_private_key: "enc-sign-2".into(),
                signing_public_key: "sign-pub-2".into(),
            },
        ],
        created_at: now,
        updated_at: now,
    }
}

pub fn diagram(project_id: ObjectId, parent: Option<ObjectId>, name: &str) -> Diagram {
    let now = Utc::now();
    Diagram {
        id: ObjectId::generate(),
        project_id,
        parent_diagram_id: parent,
        diagram_name: name.into(),
        description: format!("{name} description"),
        encrypted_data: Some(format!("enc-{name}")),
        encrypted_data_signature: format!("sig-{name}"),
        created_at: now,
        updated_at: now,
    }
}

pub fn node(diagram_id: ObjectId) -> Node {
    let now = Utc::now();
    Node {
        id: ObjectId::generate(),
        diagram_id,
        encrypted_readme: "enc-readme".into(),
        encrypted_readme_signature: "sig-readme".into(),
        encrypted_dict: "enc-dict".into(),
        encrypted_dict_signature: "sig-dict".into(),
        created_at: now,
        updated_at: now,
    }
}

pub fn note(
    project_id: ObjectId,
    parent: Option<ObjectId>,
    note_type: NoteType,
    name: &str,
) -> Note {
    let now = Utc::now();
    Note {
        id: ObjectId::generate(),
        project_id,
        parent_id: parent,
        note_type,
        file_name: name.into(),
        icon: String::new(),
        encrypted_content: (note_type == NoteType::Note).then(|| format!("enc-{name}")),
        encrypted_content_signature: (note_type == NoteType::Note).then(|| format!("sig-{name}")),
        created_at: now,
        updated_at: now,
    }
}

/// Populate `store` with the graph described on [`SeededGraph`]: an owner
/// with `manage_project` and a viewer without it.
pub fn seed_graph(store: &MemoryStore) -> SeededGraph {
    let now = Utc::now();
    let project = Project {
        id: ObjectId::generate(),
        name: "Infra Prod".into(),
        description: "production topology".into(),
        key_epoch: "2".into(),
        created_at: now,
        updated_at: now,
    };
    store.create_project(&project).unwrap();

    let owner = ObjectId::generate();
    let viewer = ObjectId::generate();
    store
        .create_member(&member(project.id, owner, Role::Owner))
        .unwrap();
    store
        .create_member(&member(project.id, viewer, Role::Viewer))
        .unwrap();

    let d1 = diagram(project.id, None, "D1");
    let d2 = diagram(project.id, Some(d1.id), "D2");
    store.create_diagram(&d1).unwrap();
    store.create_diagram(&d2).unwrap();

    let n1 = node(d2.id);
    store.create_node(&n1).unwrap();

    let v1 = store
        .create_vault(NewVault {
            project_id: project.id,
            node_id: n1.id,
            label: "db root".into(),
            vault_type: "password".into(),
            encrypted_value: Some("enc-secret".into()),
            encrypted_value_signature: Some("sig-secret".into()),
        })
        .unwrap();

    let folder = note(project.id, None, NoteType::Folder, "F");
    let child = note(project.id, Some(folder.id), NoteType::Note, "C");
    store.create_note(&folder).unwrap();
    store.create_note(&child).unwrap();

    SeededGraph {
        project: project.id,
        owner,
        viewer,
        d1: d1.id,
        d2: d2.id,
        n1: n1.id,
        v1: v1.id,
        folder: folder.id,
        child: child.id,
    }
}

/// Where a [`FailingStore`] injects its error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Every read of this entity kind fails.
    Read(&'static str),
    /// The permission gate itself errors.
    Permission,
    /// Creates succeed this many times, then every create fails.
    CreateAfter(usize),
}

/// Delegates to a `MemoryStore` and fails at the configured point.
pub struct FailingStore {
    pub inner: Arc<MemoryStore>,
    fail: FailPoint,
    creates: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>, fail: FailPoint) -> Self {
        Self {
            inner,
            fail,
            creates: AtomicUsize::new(0),
        }
    }

    fn check_read(&self, entity: &'static str) -> StoreResult<()> {
        if self.fail == FailPoint::Read(entity) {
            return Err(StoreError::Backend(format!("injected {entity} read failure")));
        }
        Ok(())
    }

    fn check_create(&self) -> StoreResult<()> {
        let done = self.creates.fetch_add(1, Ordering::SeqCst);
        if let FailPoint::CreateAfter(limit) = self.fail {
            if done >= limit {
                return Err(StoreError::Backend("injected write failure".into()));
            }
        }
        Ok(())
    }
}

impl ProjectStore for FailingStore {
    fn find_project(&self, id: &ObjectId) -> StoreResult<Project> {
        self.check_read("project")?;
        self.inner.find_project(id)
    }
    fn create_project(&self, project: &Project) -> StoreResult<()> {
        self.check_create()?;
        self.inner.create_project(project)
    }
}

impl MemberStore for FailingStore {
    fn find_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> StoreResult<ProjectMember> {
        self.check_read("member")?;
        self.inner.find_member(project_id, user_id)
    }
    fn create_member(&self, member: &ProjectMember) -> StoreResult<()> {
        self.check_create()?;
        self.inner.create_member(member)
    }
}

impl DiagramStore for FailingStore {
    fn find_all_diagrams_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<Diagram>> {
        self.check_read("diagram")?;
        self.inner.find_all_diagrams_by_project(project_id)
    }
    fn create_diagram(&self, diagram: &Diagram) -> StoreResult<()> {
        self.check_create()?;
        self.inner.create_diagram(diagram)
    }
}

impl NodeStore for FailingStore {
    fn find_nodes_by_diagram_ids(&self, diagram_ids: &[ObjectId]) -> StoreResult<Vec<Node>> {
        self.check_read("node")?;
        self.inner.find_nodes_by_diagram_ids(diagram_ids)
    }
    fn create_node(&self, node: &Node) -> StoreResult<()> {
        self.check_create()?;
        self.inner.create_node(node)
    }
}

impl VaultStore for FailingStore {
    fn find_vaults_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<NodeVault>> {
        self.check_read("vault")?;
        self.inner.find_vaults_by_project(project_id)
    }
    fn create_vault(&self, vault: NewVault) -> StoreResult<NodeVault> {
        self.check_create()?;
        self.inner.create_vault(vault)
    }
}

impl NoteStore for FailingStore {
    fn find_notes_by_project(&self, project_id: &ObjectId) -> StoreResult<Vec<Note>> {
        self.check_read("note")?;
        self.inner.find_notes_by_project(project_id)
    }
    fn create_note(&self, note: &Note) -> StoreResult<()> {
        self.check_create()?;
        self.inner.create_note(note)
    }
}

impl PermissionGate for FailingStore {
    fn has_permission(
        &self,
        project_id: &ObjectId,
        user_id: &ObjectId,
        permission: Permission,
    ) -> StoreResult<bool> {
        if self.fail == FailPoint::Permission {
            return Err(StoreError::Backend("injected permission failure".into()));
        }
        self.inner.has_permission(project_id, user_id, permission)
    }
}
