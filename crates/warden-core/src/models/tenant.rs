//! Tenant domain model.
//!
//! Tenants are the isolation boundary: projects, users, service accounts,
//! groups, role bindings and identity sharings all belong to one tenant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{ArchiveMark, Origin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub uuid: Uuid,
    /// Unique among tenants, compared case-insensitively.
    pub identifier: String,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl Tenant {
    pub fn new(identifier: impl Into<String>, origin: Origin) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            identifier: identifier.into(),
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }
}
