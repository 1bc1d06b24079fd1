//! Group domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::{MemberNotation, Members};
use super::record::{ArchiveMark, Origin};

/// A set of users, service accounts and other groups. Groups nest, and
/// nothing prevents a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: Uuid,
    pub tenant_uuid: Uuid,
    pub identifier: String,
    /// `identifier@group.tenant_identifier`, never set by callers.
    #[serde(default)]
    pub full_identifier: String,
    /// Members as submitted; the id lists below are derived from them.
    #[serde(default)]
    pub members: Vec<MemberNotation>,
    #[serde(default)]
    pub users: Vec<Uuid>,
    #[serde(default)]
    pub service_accounts: Vec<Uuid>,
    #[serde(default)]
    pub groups: Vec<Uuid>,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl Group {
    pub fn new(
        tenant_uuid: Uuid,
        identifier: impl Into<String>,
        members: Vec<MemberNotation>,
        origin: Origin,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            identifier: identifier.into(),
            full_identifier: String::new(),
            members,
            users: Vec::new(),
            service_accounts: Vec::new(),
            groups: Vec::new(),
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }

    pub fn set_members(&mut self, members: Members) {
        self.users = members.users;
        self.service_accounts = members.service_accounts;
        self.groups = members.groups;
    }
}
