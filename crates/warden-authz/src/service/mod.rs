//! Entity services.
//!
//! Each service is bound to one write transaction and enforces the write
//! rules of its entity: fresh records carry no version and a non-empty
//! origin, updates present the stored version and origin, deletion
//! archives, erasure requires an archived record.

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::record::{Entity, Origin, TenantOwned};
use warden_core::models::tenant::Tenant;
use warden_db::repository::{Repository, TenantRepository};
use warden_db::table::Record;
use warden_db::{Txn, WriteTxn};

use crate::lifecycle::{Cascade, new_archive_mark};

mod group;
mod identity_sharing;
mod project;
mod role;
mod role_binding;
mod service_account;
mod tenant;
mod user;

pub use group::GroupService;
pub use identity_sharing::IdentitySharingService;
pub use project::ProjectService;
pub use role::RoleService;
pub use role_binding::RoleBindingService;
pub use service_account::ServiceAccountService;
pub use tenant::TenantService;
pub use user::UserService;

/// Rules for a record that is about to be created.
fn check_new<T: Entity>(record: &T) -> WardenResult<()> {
    if !record.resource_version().is_empty() {
        return Err(WardenError::BadVersion);
    }
    if record.origin().is_empty() {
        return Err(WardenError::BadOrigin);
    }
    Ok(())
}

/// Rules for replacing `stored` with `incoming`.
fn check_update<T: Entity>(stored: &T, incoming: &T) -> WardenResult<()> {
    if stored.is_archived() {
        return Err(WardenError::IsArchived);
    }
    if stored.origin() != incoming.origin() {
        return Err(WardenError::BadOrigin);
    }
    if stored.resource_version() != incoming.resource_version() {
        return Err(WardenError::BadVersion);
    }
    Ok(())
}

fn require_identifier(identifier: &str) -> WardenResult<()> {
    if identifier.trim().is_empty() {
        return Err(WardenError::validation("identifier must not be empty"));
    }
    Ok(())
}

/// The owning tenant, which must exist and be live.
fn live_tenant(txn: &impl Txn, id: Uuid) -> WardenResult<Arc<Tenant>> {
    let tenant = TenantRepository::new(txn).get_by_id(&id)?;
    if tenant.is_archived() {
        return Err(WardenError::IsArchived);
    }
    Ok(tenant)
}

/// Assigns a primary key to a new record, rejecting a taken one.
fn assign_uuid<T: Record<Key = Uuid>, X: Txn>(
    repo: &Repository<'_, T, X>,
    uuid: &mut Uuid,
) -> WardenResult<()> {
    if uuid.is_nil() {
        *uuid = Uuid::new_v4();
    } else if repo.get_by_id(uuid).is_ok() {
        return Err(WardenError::AlreadyExists {
            entity: T::KIND.to_string(),
            key: uuid.to_string(),
        });
    }
    Ok(())
}

/// Appends the rows listed in `shared` that are not in `rows` yet.
fn append_shared<T: Record<Key = Uuid>, X: Txn>(
    repo: &Repository<'_, T, X>,
    rows: &mut Vec<Arc<T>>,
    shared: BTreeSet<Uuid>,
    show_archived: bool,
) -> WardenResult<()> {
    let own: BTreeSet<Uuid> = rows.iter().map(|row| row.key()).collect();
    for id in shared.difference(&own) {
        let row = repo.get_by_id(id)?;
        if show_archived || !row.is_archived() {
            rows.push(row);
        }
    }
    Ok(())
}

/// A row of `tenant`; rows of other tenants are reported as missing.
fn fetch_owned<T: Record<Key = Uuid> + TenantOwned, X: Txn>(
    repo: &Repository<'_, T, X>,
    tenant: Uuid,
    id: Uuid,
) -> WardenResult<Arc<T>> {
    let row = repo.get_by_id(&id)?;
    if row.tenant_uuid() != tenant {
        return Err(WardenError::not_found(T::KIND, id));
    }
    Ok(row)
}

/// Archives a row after running `cascade` for it.
fn archive_owned<T: Record<Key = Uuid> + TenantOwned>(
    repo: &Repository<'_, T, WriteTxn<'_>>,
    tenant: Uuid,
    id: Uuid,
    origin: &Origin,
    cascade: &Cascade<'_>,
) -> WardenResult<Arc<T>> {
    let row = fetch_owned(repo, tenant, id)?;
    if row.origin() != origin {
        return Err(WardenError::BadOrigin);
    }
    if row.is_archived() {
        return Err(WardenError::IsArchived);
    }
    cascade.run(id)?;
    repo.archive(&id, new_archive_mark())
}

fn restore_owned<T: Record<Key = Uuid> + TenantOwned>(
    repo: &Repository<'_, T, WriteTxn<'_>>,
    tenant: Uuid,
    id: Uuid,
) -> WardenResult<Arc<T>> {
    let row = fetch_owned(repo, tenant, id)?;
    if !row.is_archived() {
        return Err(WardenError::IsNotArchived);
    }
    live_tenant(repo.txn(), tenant)?;
    repo.restore(&id)
}

fn erase_owned<T: Record<Key = Uuid> + TenantOwned>(
    repo: &Repository<'_, T, WriteTxn<'_>>,
    tenant: Uuid,
    id: Uuid,
) -> WardenResult<Arc<T>> {
    let row = fetch_owned(repo, tenant, id)?;
    if !row.is_archived() {
        return Err(WardenError::IsNotArchived);
    }
    repo.erase(&id)
}

#[cfg(test)]
mod tests {
    use warden_core::models::project::Project;

    use super::*;

    fn project(version: &str, origin: &str) -> Project {
        let mut p = Project::new(Uuid::new_v4(), "web", Origin::new(origin));
        p.resource_version = version.into();
        p
    }

    #[test]
    fn new_record_must_not_carry_a_version() {
        assert!(matches!(
            check_new(&project("v1", "iam")),
            Err(WardenError::BadVersion)
        ));
        assert!(matches!(
            check_new(&project("", "")),
            Err(WardenError::BadOrigin)
        ));
        assert!(check_new(&project("", "iam")).is_ok());
    }

    #[test]
    fn update_checks_origin_before_version() {
        let stored = project("v1", "iam");
        let mut incoming = stored.clone();
        incoming.origin = Origin::new("billing");
        incoming.resource_version = "v0".into();
        assert!(matches!(
            check_update(&stored, &incoming),
            Err(WardenError::BadOrigin)
        ));

        incoming.origin = Origin::new("iam");
        assert!(matches!(
            check_update(&stored, &incoming),
            Err(WardenError::BadVersion)
        ));
    }
}
