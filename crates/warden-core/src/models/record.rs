//! Metadata shared by every persisted entity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::Group;
use super::identity_sharing::IdentitySharing;
use super::project::Project;
use super::role::Role;
use super::role_binding::RoleBinding;
use super::service_account::ServiceAccount;
use super::tenant::Tenant;
use super::user::User;

/// Subsystem that created an entity. Only the same subsystem may mutate
/// or delete it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(pub String);

impl Origin {
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Soft-delete marker.
///
/// A zero timestamp means the record is live. Records archived together
/// by one cascade share the same timestamp and hash, which is how a
/// cascading restore tells them apart from records archived on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveMark {
    pub archiving_timestamp: i64,
    pub archiving_hash: i64,
}

impl ArchiveMark {
    pub fn new(archiving_timestamp: i64, archiving_hash: i64) -> Self {
        Self {
            archiving_timestamp,
            archiving_hash,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archiving_timestamp != 0
    }
}

/// Generates a fresh opaque resource version.
pub fn new_resource_version() -> String {
    Uuid::new_v4().to_string()
}

/// Accessors the lifecycle needs on every entity.
pub trait Entity: Clone {
    /// Entity name used in errors and logs.
    const KIND: &'static str;

    fn resource_version(&self) -> &str;
    fn origin(&self) -> &Origin;
    fn archive_mark(&self) -> ArchiveMark;
    fn set_archive_mark(&mut self, mark: ArchiveMark);

    fn is_archived(&self) -> bool {
        self.archive_mark().is_archived()
    }
}

/// Entities owned by exactly one tenant.
pub trait TenantOwned: Entity {
    fn tenant_uuid(&self) -> Uuid;
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:literal),+ $(,)?) => {$(
        impl Entity for $ty {
            const KIND: &'static str = $kind;

            fn resource_version(&self) -> &str {
                &self.resource_version
            }

            fn origin(&self) -> &Origin {
                &self.origin
            }

            fn archive_mark(&self) -> ArchiveMark {
                self.archive
            }

            fn set_archive_mark(&mut self, mark: ArchiveMark) {
                self.archive = mark;
            }
        }
    )+};
}

impl_entity!(
    Tenant => "tenant",
    Project => "project",
    User => "user",
    ServiceAccount => "service_account",
    Group => "group",
    Role => "role",
    RoleBinding => "role_binding",
    IdentitySharing => "identity_sharing",
);

macro_rules! impl_tenant_owned {
    ($($ty:ty),+ $(,)?) => {$(
        impl TenantOwned for $ty {
            fn tenant_uuid(&self) -> Uuid {
                self.tenant_uuid
            }
        }
    )+};
}

impl_tenant_owned!(Project, User, ServiceAccount, Group, RoleBinding);

impl TenantOwned for IdentitySharing {
    fn tenant_uuid(&self) -> Uuid {
        self.source_tenant_uuid
    }
}
