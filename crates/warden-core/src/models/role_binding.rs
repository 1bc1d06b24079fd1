//! Role binding domain model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::{MemberNotation, Members};
use super::record::{ArchiveMark, Origin};

/// Free-form per-role parameters carried by a binding.
pub type RoleOptions = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundRole {
    pub name: String,
    #[serde(default)]
    pub options: RoleOptions,
}

impl BoundRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: RoleOptions::new(),
        }
    }
}

/// Grants roles to users, service accounts and groups of one tenant,
/// optionally restricted to some of its projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub uuid: Uuid,
    pub tenant_uuid: Uuid,
    #[serde(default)]
    pub description: String,
    /// Unix seconds; zero means no expiry.
    #[serde(default)]
    pub valid_till: i64,
    #[serde(default)]
    pub require_mfa: bool,
    #[serde(default)]
    pub members: Vec<MemberNotation>,
    #[serde(default)]
    pub users: Vec<Uuid>,
    #[serde(default)]
    pub service_accounts: Vec<Uuid>,
    #[serde(default)]
    pub groups: Vec<Uuid>,
    #[serde(default)]
    pub any_project: bool,
    /// Used only when `any_project` is false.
    #[serde(default)]
    pub projects: Vec<Uuid>,
    #[serde(default)]
    pub roles: Vec<BoundRole>,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl RoleBinding {
    pub fn new(tenant_uuid: Uuid, members: Vec<MemberNotation>, origin: Origin) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            description: String::new(),
            valid_till: 0,
            require_mfa: false,
            members,
            users: Vec::new(),
            service_accounts: Vec::new(),
            groups: Vec::new(),
            any_project: false,
            projects: Vec::new(),
            roles: Vec::new(),
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

    /// True when the binding has a validity bound that is not after `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.valid_till != 0 && self.valid_till <= now
    }

    /// True when the binding applies to `project`.
    pub fn covers_project(&self, project: Uuid) -> bool {
        self.any_project || self.projects.contains(&project)
    }
}
