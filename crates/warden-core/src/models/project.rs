//! Project domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{ArchiveMark, Origin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub uuid: Uuid,
    pub tenant_uuid: Uuid,
    /// Unique within the tenant.
    pub identifier: String,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl Project {
    pub fn new(tenant_uuid: Uuid, identifier: impl Into<String>, origin: Origin) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            identifier: identifier.into(),
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }
}
