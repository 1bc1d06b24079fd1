//! Identity sharing domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{ArchiveMark, Origin};

/// Makes membership in some source-tenant groups visible to role checks
/// in the destination tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySharing {
    pub uuid: Uuid,
    pub source_tenant_uuid: Uuid,
    pub destination_tenant_uuid: Uuid,
    /// Groups of the source tenant.
    #[serde(default)]
    pub groups: Vec<Uuid>,
    #[serde(default)]
    pub resource_version: String,
    pub origin: Origin,
    #[serde(flatten)]
    pub archive: ArchiveMark,
}

impl IdentitySharing {
    pub fn new(
        source_tenant_uuid: Uuid,
        destination_tenant_uuid: Uuid,
        groups: Vec<Uuid>,
        origin: Origin,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_tenant_uuid,
            destination_tenant_uuid,
            groups,
            resource_version: String::new(),
            origin,
            archive: ArchiveMark::default(),
        }
    }
}
