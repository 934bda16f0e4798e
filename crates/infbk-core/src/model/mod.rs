pub mod domain;
pub mod payload;

pub use self::domain::{
    Diagram, MemberKeyring, NewVault, Node, NodeVault, Note, NoteType, Permission, Project,
    ProjectMember, Role,
};
pub use self::payload::{
    BackupPayload, DiagramBackup, MemberBackup, MemberKeyringBackup, NodeBackup, NoteBackup,
    ProjectBackup, VaultBackup, PAYLOAD_VERSION,
};
