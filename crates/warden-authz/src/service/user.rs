use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::member::SubjectKind;
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_core::models::{tenant::Tenant, user::User};
use warden_db::WriteTxn;
use warden_db::repository::{GroupRepository, IdentitySharingRepository, UserRepository};

use super::{
    append_shared, archive_owned, assign_uuid, check_new, check_update, erase_owned, fetch_owned,
    live_tenant, require_identifier, restore_owned,
};
use crate::lifecycle::{Cascade, MemberStripper, strip_member};
use crate::sharing::shared_group_closure;

/// `identifier@tenant_identifier`, shared by users and service accounts.
pub(super) fn full_identifier(identifier: &str, tenant: &Tenant) -> String {
    format!("{identifier}@{}", tenant.identifier)
}

pub struct UserService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> UserService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> UserRepository<'t, WriteTxn<'s>> {
        UserRepository::new(self.txn)
    }

    pub fn get(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<User>> {
        fetch_owned(&self.repo(), tenant, id)
    }

    /// Users of `tenant`. With `show_shared`, users of groups shared into
    /// the tenant (nested groups included) follow the tenant's own.
    pub fn list(
        &self,
        tenant: Uuid,
        show_shared: bool,
        show_archived: bool,
    ) -> WardenResult<Vec<Arc<User>>> {
        let repo = self.repo();
        let mut users = repo.list(tenant, show_archived);
        if show_shared {
            let shared = shared_group_closure(
                &GroupRepository::new(self.txn),
                &IdentitySharingRepository::new(self.txn),
                tenant,
                show_archived,
            )?;
            let ids = shared.iter().flat_map(|g| g.users.iter().copied()).collect();
            append_shared(&repo, &mut users, ids, show_archived)?;
        }
        Ok(users)
    }

    pub fn create(&self, mut user: User) -> WardenResult<Arc<User>> {
        check_new(&user)?;
        require_identifier(&user.identifier)?;
        let tenant = live_tenant(self.txn, user.tenant_uuid)?;
        let repo = self.repo();
        assign_uuid(&repo, &mut user.uuid)?;
        user.full_identifier = full_identifier(&user.identifier, &tenant);
        user.resource_version = new_resource_version();
        user.archive = ArchiveMark::default();

        let user = repo.insert(user)?;
        info!(tenant = %user.tenant_uuid, user = %user.uuid, "user created");
        Ok(user)
    }

    pub fn update(&self, mut user: User) -> WardenResult<Arc<User>> {
        require_identifier(&user.identifier)?;
        let repo = self.repo();
        let stored = fetch_owned(&repo, user.tenant_uuid, user.uuid)?;
        check_update(&*stored, &user)?;
        let tenant = live_tenant(self.txn, user.tenant_uuid)?;
        user.full_identifier = full_identifier(&user.identifier, &tenant);
        user.resource_version = new_resource_version();
        user.archive = stored.archive;

        let user = repo.insert(user)?;
        info!(user = %user.uuid, "user updated");
        Ok(user)
    }

    /// Archives the user after removing it from every group and role
    /// binding. A restore does not bring those memberships back.
    pub fn delete(&self, tenant: Uuid, id: Uuid, origin: &Origin) -> WardenResult<Arc<User>> {
        let cascade = Cascade::new().then(MemberStripper::new(self.txn, SubjectKind::User));
        archive_owned(&self.repo(), tenant, id, origin, &cascade)
    }

    pub fn restore(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<User>> {
        restore_owned(&self.repo(), tenant, id)
    }

    /// Erases an archived user and every reference to it.
    pub fn erase(&self, tenant: Uuid, id: Uuid) -> WardenResult<()> {
        erase_owned(&self.repo(), tenant, id)?;
        strip_member(self.txn, SubjectKind::User, id)
    }
}
