//! Stored entities as the storage collaborators see them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use infbk_types::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDiagram,
    EditDiagram,
    ViewNote,
    EditNote,
    ViewVault,
    EditVault,
    ManageProject,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::ViewDiagram => "view_diagram",
            Permission::EditDiagram => "edit_diagram",
            Permission::ViewNote => "view_note",
            Permission::EditNote => "edit_note",
            Permission::ViewVault => "view_vault",
            Permission::EditVault => "edit_vault",
            Permission::ManageProject => "manage_project",
        };
        f.write_str(s)
    }
}

/// Named permission presets assigned to members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
}

impl Role {
    pub fn permissions(self) -> Vec<Permission> {
        use Permission::*;
        match self {
            Role::Owner => vec![
                ViewDiagram,
                EditDiagram,
                ViewNote,
                EditNote,
                ViewVault,
                EditVault,
                ManageProject,
            ],
            Role::Editor => vec![ViewDiagram, EditDiagram, ViewNote, EditNote, ViewVault],
            Role::Viewer => vec![ViewDiagram, ViewNote],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    /// Key-rotation generation marker.
    pub key_epoch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member's encrypted key material for one key epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKeyring {
    pub epoch: String,
    pub secret_passphrase: String,
    pub secret_signing_private_key: String,
    pub signing_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub project_id: ObjectId,
    pub user_id: ObjectId,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub public_key: String,
    pub encrypted_private_key: String,
    #[serde(default)]
    pub keyrings: Vec<MemberKeyring>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectMember {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    pub id: ObjectId,
    pub project_id: ObjectId,
    pub parent_diagram_id: Option<ObjectId>,
    pub diagram_name: String,
    pub description: String,
    pub encrypted_data: Option<String>,
    pub encrypted_data_signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: ObjectId,
    pub diagram_id: ObjectId,
    pub encrypted_readme: String,
    pub encrypted_readme_signature: String,
    pub encrypted_dict: String,
    pub encrypted_dict_signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A secret attached to a node. Carries its project id directly so
/// permission checks skip the node -> diagram -> project walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVault {
    pub id: ObjectId,
    pub project_id: ObjectId,
    pub node_id: ObjectId,
    pub label: String,
    #[serde(rename = "type")]
    pub vault_type: String,
    pub encrypted_value: Option<String>,
    pub encrypted_value_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vault fields supplied by the caller; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVault {
    pub project_id: ObjectId,
    pub node_id: ObjectId,
    pub label: String,
    pub vault_type: String,
    pub encrypted_value: Option<String>,
    pub encrypted_value_signature: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Note,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: ObjectId,
    pub project_id: ObjectId,
    pub parent_id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub file_name: String,
    #[serde(default)]
    pub icon: String,
    pub encrypted_content: Option<String>,
    pub encrypted_content_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
