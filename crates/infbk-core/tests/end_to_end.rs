use std::sync::Arc;

use chrono::Utc;
use infbk_core::compress::Codec;
use infbk_core::model::{
    Diagram, MemberKeyring, NewVault, Node, Note, NoteType, Project, ProjectMember, Role,
};
use infbk_core::service::{BackupService, ServiceOptions};
use infbk_core::store::{
    DiagramStore, MemberStore, MemoryStore, NodeStore, NoteStore, ProjectStore, Stores, VaultStore,
};
use infbk_crypto::key::KdfParams;
use infbk_types::ObjectId;

const PASSWORD: &str = "CorrectHorse1";

fn fast_service(store: Arc<MemoryStore>) -> BackupService {
    BackupService::new(
        Stores::from_backend(store),
        Arc::new(Codec::default()),
        ServiceOptions {
            kdf: KdfParams {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1,
            },
            ..ServiceOptions::default()
        },
    )
}

struct Source {
    project: ObjectId,
    owner: ObjectId,
    ids: Vec<ObjectId>,
}

fn seed(store: &MemoryStore) -> Source {
    let now = Utc::now();
    let project = Project {
        id: ObjectId::generate(),
        name: "Payments Platform".into(),
        description: String::new(),
        key_epoch: "1".into(),
        created_at: now,
        updated_at: now,
    };
    store.create_project(&project).unwrap();

    let owner = ObjectId::generate();
    store
        .create_member(&ProjectMember {
            project_id: project.id,
            user_id: owner,
            role: Role::Owner,
            permissions: Role::Owner.permissions(),
            public_key: "owner-public".into(),
            encrypted_private_key: "owner-private".into(),
            keyrings: vec![MemberKeyring {
                epoch: "1".into(),
                secret_passphrase: "kp".into(),
                secret_signing_private_key: "ks".into(),
                signing_public_key: "kv".into(),
            }],
            created_at: now,
            updated_at: now,
        })
        .unwrap();

    let diagram = |parent: Option<ObjectId>, name: &str| Diagram {
        id: ObjectId::generate(),
        project_id: project.id,
        parent_diagram_id: parent,
        diagram_name: name.into(),
        description: String::new(),
        encrypted_data: None,
        encrypted_data_signature: String::new(),
        created_at: now,
        updated_at: now,
    };
    let d1 = diagram(None, "D1");
    let d2 = diagram(Some(d1.id), "D2");
    store.create_diagram(&d1).unwrap();
    store.create_diagram(&d2).unwrap();

    let n1 = Node {
        id: ObjectId::generate(),
        diagram_id: d2.id,
        encrypted_readme: "r".into(),
        encrypted_readme_signature: "rs".into(),
        encrypted_dict: "d".into(),
        encrypted_dict_signature: "ds".into(),
        created_at: now,
        updated_at: now,
    };
    store.create_node(&n1).unwrap();

    let v1 = store
        .create_vault(NewVault {
            project_id: project.id,
            node_id: n1.id,
            label: "V1".into(),
            vault_type: "api_key".into(),
            encrypted_value: Some("secret".into()),
            encrypted_value_signature: None,
        })
        .unwrap();

    let note = |parent: Option<ObjectId>, note_type: NoteType, name: &str| Note {
        id: ObjectId::generate(),
        project_id: project.id,
        parent_id: parent,
        note_type,
        file_name: name.into(),
        icon: String::new(),
        encrypted_content: None,
        encrypted_content_signature: None,
        created_at: now,
        updated_at: now,
    };
    let f = note(None, NoteType::Folder, "F");
    let c = note(Some(f.id), NoteType::Note, "C");
    store.create_note(&f).unwrap();
    store.create_note(&c).unwrap();

    Source {
        project: project.id,
        owner,
        ids: vec![project.id, d1.id, d2.id, n1.id, v1.id, f.id, c.id],
    }
}

#[test]
fn backup_then_restore_rebuilds_graph_under_new_ids() {
    let source_store = Arc::new(MemoryStore::new());
    let source = seed(&source_store);

    let archive = fast_service(source_store)
        .create_backup(&source.project, &source.owner, PASSWORD)
        .unwrap();
    assert!(archive.filename.starts_with("Payments_Platform_"));

    let target = Arc::new(MemoryStore::new());
    let outcome = fast_service(target.clone())
        .restore_backup(&source.owner, PASSWORD, archive.bytes.as_slice())
        .unwrap();
    let docs = target.snapshot().unwrap();

    let diagram = |name: &str| {
        docs.diagrams
            .values()
            .find(|d| d.diagram_name == name)
            .unwrap()
            .clone()
    };
    let d1 = diagram("D1");
    let d2 = diagram("D2");
    assert_eq!(d1.parent_diagram_id, None);
    assert_eq!(d2.parent_diagram_id, Some(d1.id));

    let n1 = docs.nodes.values().next().unwrap();
    assert_eq!(n1.diagram_id, d2.id);

    let v1 = docs.vaults.values().next().unwrap();
    assert_eq!(v1.node_id, n1.id);
    assert_eq!(v1.project_id, outcome.project.id);

    let f = docs.notes.values().find(|n| n.file_name == "F").unwrap();
    let c = docs.notes.values().find(|n| n.file_name == "C").unwrap();
    assert_eq!(c.parent_id, Some(f.id));

    let restored = [
        outcome.project.id,
        d1.id,
        d2.id,
        n1.id,
        v1.id,
        f.id,
        c.id,
    ];
    for id in restored {
        assert!(!source.ids.contains(&id), "identifier {id} was reused");
    }
}

#[test]
fn restored_graph_survives_store_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(MemoryStore::new());
    let source = seed(&store);
    let service = fast_service(store.clone());
    let archive = service
        .create_backup(&source.project, &source.owner, PASSWORD)
        .unwrap();
    let outcome = service
        .restore_backup(&source.owner, PASSWORD, archive.bytes.as_slice())
        .unwrap();
    store.flush(&path).unwrap();

    let reopened = Arc::new(MemoryStore::open(&path).unwrap());
    let docs = reopened.snapshot().unwrap();
    assert_eq!(docs.projects.len(), 2);
    assert_eq!(docs.members.len(), 2);

    // The restored copy can itself be backed up by its new owner.
    let again = fast_service(reopened)
        .create_backup(&outcome.project.id, &source.owner, PASSWORD)
        .unwrap();
    assert!(!again.bytes.is_empty());
}

#[test]
fn archive_does_not_open_with_other_password() {
    let store = Arc::new(MemoryStore::new());
    let source = seed(&store);
    let service = fast_service(store);
    let archive = service
        .create_backup(&source.project, &source.owner, PASSWORD)
        .unwrap();

    let err = service
        .inspect_backup("CorrectHorse2", archive.bytes.as_slice())
        .unwrap_err();
    assert_eq!(err.kind(), infbk_types::error::ErrorKind::DecryptionFailed);
}
