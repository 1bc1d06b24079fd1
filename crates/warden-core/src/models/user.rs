//! User domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{ArchiveMark, Origin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub tenant_uuid: Uuid,
    pub identifier: String,
    /// `identifier@tenant_identifier`, derived on every write.
    #[serde(default)]
    pub full_identifier: String,
    /// Unique within the tenant.
    pub email: String,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl User {
    pub fn new(
        tenant_uuid: Uuid,
        identifier: impl Into<String>,
        email: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            identifier: identifier.into(),
            full_identifier: String::new(),
            email: email.into(),
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }
}
