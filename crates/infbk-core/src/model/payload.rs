//! Portable, JSON-serialized snapshot of one project graph.
//!
//! Every identifier in here is the hex form of the source store's id. None of
//! them are reused on restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Diagram, MemberKeyring, Node, NodeVault, Note, NoteType, Project, ProjectMember,
};

/// Schema version written into `BackupPayload::version`.
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPayload {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub project: ProjectBackup,
    pub member: MemberBackup,
    #[serde(default)]
    pub diagrams: Vec<DiagramBackup>,
    #[serde(default)]
    pub nodes: Vec<NodeBackup>,
    #[serde(default)]
    pub vaults: Vec<VaultBackup>,
    #[serde(default)]
    pub notes: Vec<NoteBackup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBackup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub key_epoch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The backing-up member's key material, so the restoring user can read
/// project content without a fresh invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBackup {
    pub public_key: String,
    pub encrypted_private_key: String,
    #[serde(default)]
    pub keyrings: Vec<MemberKeyringBackup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKeyringBackup {
    pub epoch: String,
    pub secret_passphrase: String,
    pub secret_signing_private_key: String,
    pub signing_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramBackup {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_diagram_id: Option<String>,
    pub diagram_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_data: Option<String>,
    pub encrypted_data_signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBackup {
    pub id: String,
    pub diagram_id: String,
    pub encrypted_readme: String,
    pub encrypted_readme_signature: String,
    pub encrypted_dict: String,
    pub encrypted_dict_signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultBackup {
    pub id: String,
    pub node_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub vault_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteBackup {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectBackup {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.to_hex(),
            name: p.name.clone(),
            description: p.description.clone(),
            key_epoch: p.key_epoch.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<&MemberKeyring> for MemberKeyringBackup {
    fn from(k: &MemberKeyring) -> Self {
        Self {
            epoch: k.epoch.clone(),
            secret_passphrase: k.secret_passphrase.clone(),
            secret_signing_private_key: k.secret_signing_private_key.clone(),
            signing_public_key: k.signing_public_key.clone(),
        }
    }
}

impl From<&MemberKeyringBackup> for MemberKeyring {
    fn from(k: &MemberKeyringBackup) -> Self {
        Self {
            epoch: k.epoch.clone(),
            secret_passphrase: k.secret_passphrase.clone(),
            secret_signing_private_key: k.secret_signing_private_key.clone(),
            signing_public_key: k.signing_public_key.clone(),
        }
    }
}

impl From<&ProjectMember> for MemberBackup {
    fn from(m: &ProjectMember) -> Self {
        Self {
            public_key: m.public_key.clone(),
            encrypted_private_key: m.encrypted_private_key.clone(),
            keyrings: m.keyrings.iter().map(MemberKeyringBackup::from).collect(),
        }
    }
}

impl From<&Diagram> for DiagramBackup {
    fn from(d: &Diagram) -> Self {
        Self {
            id: d.id.to_hex(),
            parent_diagram_id: d.parent_diagram_id.map(|p| p.to_hex()),
            diagram_name: d.diagram_name.clone(),
            description: d.description.clone(),
            encrypted_data: d.encrypted_data.clone(),
            encrypted_data_signature: d.encrypted_data_signature.clone(),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<&Node> for NodeBackup {
    fn from(n: &Node) -> Self {
        Self {
            id: n.id.to_hex(),
            diagram_id: n.diagram_id.to_hex(),
            encrypted_readme: n.encrypted_readme.clone(),
            encrypted_readme_signature: n.encrypted_readme_signature.clone(),
            encrypted_dict: n.encrypted_dict.clone(),
            encrypted_dict_signature: n.encrypted_dict_signature.clone(),
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

impl From<&NodeVault> for VaultBackup {
    fn from(v: &NodeVault) -> Self {
        Self {
            id: v.id.to_hex(),
            node_id: v.node_id.to_hex(),
            label: v.label.clone(),
            vault_type: v.vault_type.clone(),
            encrypted_value: v.encrypted_value.clone(),
            encrypted_value_signature: v.encrypted_value_signature.clone(),
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

impl From<&Note> for NoteBackup {
    fn from(n: &Note) -> Self {
        Self {
            id: n.id.to_hex(),
            parent_id: n.parent_id.map(|p| p.to_hex()),
            note_type: n.note_type,
            file_name: n.file_name.clone(),
            icon: n.icon.clone(),
            encrypted_content: n.encrypted_content.clone(),
            encrypted_content_signature: n.encrypted_content_signature.clone(),
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

impl BackupPayload {
    /// Total number of graph entities below the project.
    pub fn entity_count(&self) -> usize {
        self.diagrams.len() + self.nodes.len() + self.vaults.len() + self.notes.len()
    }
}
