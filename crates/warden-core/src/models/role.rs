//! Role domain model.
//!
//! Roles are global (not tenant scoped) and keyed by name. A role may
//! include other roles: holding the including role implies holding every
//! role it includes.

use serde::{Deserialize, Serialize};

use super::record::{ArchiveMark, Origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    Tenant,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedRole {
    pub name: String,
    #[serde(default)]
    pub options_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    /// Fixed at creation.
    pub scope: RoleScope,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub included_roles: Vec<IncludedRole>,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl Role {
    pub fn new(name: impl Into<String>, scope: RoleScope, origin: Origin) -> Self {
        Self {
            name: name.into(),
            scope,
            description: String::new(),
            included_roles: Vec::new(),
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }

    pub fn including(mut self, name: impl Into<String>) -> Self {
        self.included_roles.push(IncludedRole {
            name: name.into(),
            options_template: String::new(),
        });
        self
    }
}
