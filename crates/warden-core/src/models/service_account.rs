//! Service account domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{ArchiveMark, Origin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub uuid: Uuid,
    pub tenant_uuid: Uuid,
    /// Unique within the tenant.
    pub identifier: String,
    #[serde(default)]
    pub full_identifier: String,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl ServiceAccount {
    pub fn new(tenant_uuid: Uuid, identifier: impl Into<String>, origin: Origin) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            identifier: identifier.into(),
            full_identifier: String::new(),
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }
}
