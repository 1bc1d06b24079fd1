use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_core::models::{
    group::Group, service_account::ServiceAccount, tenant::Tenant, user::User,
};
use warden_db::WriteTxn;
use warden_db::repository::{
    GroupRepository, ServiceAccountRepository, TenantRepository, UserRepository,
};

use super::{assign_uuid, check_new, check_update, require_identifier};
use crate::lifecycle::TenantLifecycle;

pub struct TenantService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> TenantService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> TenantRepository<'t, WriteTxn<'s>> {
        TenantRepository::new(self.txn)
    }

    pub fn get(&self, id: Uuid) -> WardenResult<Arc<Tenant>> {
        self.repo().get_by_id(&id)
    }

    pub fn list(&self, show_archived: bool) -> Vec<Arc<Tenant>> {
        self.repo().list_all(show_archived)
    }

    pub fn create(&self, mut tenant: Tenant) -> WardenResult<Arc<Tenant>> {
        check_new(&tenant)?;
        require_identifier(&tenant.identifier)?;
        let repo = self.repo();
        assign_uuid(&repo, &mut tenant.uuid)?;
        tenant.resource_version = new_resource_version();
        tenant.archive = ArchiveMark::default();

        let tenant = repo.insert(tenant)?;
        info!(tenant = %tenant.uuid, identifier = %tenant.identifier, "tenant created");
        Ok(tenant)
    }

    /// Replaces a tenant. A changed identifier is propagated to the full
    /// identifiers of the tenant's users, service accounts and groups, each
    /// of which gets a new resource version.
    pub fn update(&self, mut tenant: Tenant) -> WardenResult<Arc<Tenant>> {
        require_identifier(&tenant.identifier)?;
        let repo = self.repo();
        let stored = repo.get_by_id(&tenant.uuid)?;
        check_update(&*stored, &tenant)?;
        tenant.resource_version = new_resource_version();
        tenant.archive = stored.archive;

        let tenant = repo.insert(tenant)?;
        if tenant.identifier != stored.identifier {
            self.rename_children(&tenant)?;
        }
        info!(tenant = %tenant.uuid, "tenant updated");
        Ok(tenant)
    }

    fn rename_children(&self, tenant: &Tenant) -> WardenResult<()> {
        let users = UserRepository::new(self.txn);
        for row in users.list(tenant.uuid, true) {
            let mut user = User::clone(&row);
            user.full_identifier = super::user::full_identifier(&user.identifier, tenant);
            user.resource_version = new_resource_version();
            users.insert(user)?;
        }
        let service_accounts = ServiceAccountRepository::new(self.txn);
        for row in service_accounts.list(tenant.uuid, true) {
            let mut sa = ServiceAccount::clone(&row);
            sa.full_identifier = super::user::full_identifier(&sa.identifier, tenant);
            sa.resource_version = new_resource_version();
            service_accounts.insert(sa)?;
        }
        let groups = GroupRepository::new(self.txn);
        for row in groups.list(tenant.uuid, true) {
            let mut group = Group::clone(&row);
            group.full_identifier = super::group::full_identifier(&group.identifier, tenant);
            group.resource_version = new_resource_version();
            groups.insert(group)?;
        }
        Ok(())
    }

    /// Archives the tenant together with everything it owns.
    pub fn delete(&self, id: Uuid, origin: &Origin) -> WardenResult<ArchiveMark> {
        TenantLifecycle::new(self.txn).delete_tenant(id, origin)
    }

    pub fn restore(&self, id: Uuid) -> WardenResult<Arc<Tenant>> {
        TenantLifecycle::new(self.txn).restore_tenant(id)
    }

    pub fn erase(&self, id: Uuid) -> WardenResult<()> {
        TenantLifecycle::new(self.txn).erase_tenant(id)
    }
}
