use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::member::SubjectKind;
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_core::models::service_account::ServiceAccount;
use warden_db::WriteTxn;
use warden_db::repository::{GroupRepository, IdentitySharingRepository, ServiceAccountRepository};

use super::user::full_identifier;
use super::{
    append_shared, archive_owned, assign_uuid, check_new, check_update, erase_owned, fetch_owned,
    live_tenant, require_identifier, restore_owned,
};
use crate::lifecycle::{Cascade, MemberStripper, strip_member};
use crate::sharing::shared_group_closure;

pub struct ServiceAccountService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> ServiceAccountService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> ServiceAccountRepository<'t, WriteTxn<'s>> {
        ServiceAccountRepository::new(self.txn)
    }

    pub fn get(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<ServiceAccount>> {
        fetch_owned(&self.repo(), tenant, id)
    }

    /// Service accounts of `tenant`, followed by those of groups shared
    /// into it when `show_shared` is set.
    pub fn list(
        &self,
        tenant: Uuid,
        show_shared: bool,
        show_archived: bool,
    ) -> WardenResult<Vec<Arc<ServiceAccount>>> {
        let repo = self.repo();
        let mut service_accounts = repo.list(tenant, show_archived);
        if show_shared {
            let shared = shared_group_closure(
                &GroupRepository::new(self.txn),
                &IdentitySharingRepository::new(self.txn),
                tenant,
                show_archived,
            )?;
            let ids = shared
                .iter()
                .flat_map(|g| g.service_accounts.iter().copied())
                .collect();
            append_shared(&repo, &mut service_accounts, ids, show_archived)?;
        }
        Ok(service_accounts)
    }

    pub fn create(&self, mut sa: ServiceAccount) -> WardenResult<Arc<ServiceAccount>> {
        check_new(&sa)?;
        require_identifier(&sa.identifier)?;
        let tenant = live_tenant(self.txn, sa.tenant_uuid)?;
        let repo = self.repo();
        assign_uuid(&repo, &mut sa.uuid)?;
        sa.full_identifier = full_identifier(&sa.identifier, &tenant);
        sa.resource_version = new_resource_version();
        sa.archive = ArchiveMark::default();

        let sa = repo.insert(sa)?;
        info!(tenant = %sa.tenant_uuid, service_account = %sa.uuid, "service account created");
        Ok(sa)
    }

    pub fn update(&self, mut sa: ServiceAccount) -> WardenResult<Arc<ServiceAccount>> {
        require_identifier(&sa.identifier)?;
        let repo = self.repo();
        let stored = fetch_owned(&repo, sa.tenant_uuid, sa.uuid)?;
        check_update(&*stored, &sa)?;
        let tenant = live_tenant(self.txn, sa.tenant_uuid)?;
        sa.full_identifier = full_identifier(&sa.identifier, &tenant);
        sa.resource_version = new_resource_version();
        sa.archive = stored.archive;

        let sa = repo.insert(sa)?;
        info!(service_account = %sa.uuid, "service account updated");
        Ok(sa)
    }

    pub fn delete(
        &self,
        tenant: Uuid,
        id: Uuid,
        origin: &Origin,
    ) -> WardenResult<Arc<ServiceAccount>> {
        let cascade =
            Cascade::new().then(MemberStripper::new(self.txn, SubjectKind::ServiceAccount));
        archive_owned(&self.repo(), tenant, id, origin, &cascade)
    }

    pub fn restore(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<ServiceAccount>> {
        restore_owned(&self.repo(), tenant, id)
    }

    pub fn erase(&self, tenant: Uuid, id: Uuid) -> WardenResult<()> {
        erase_owned(&self.repo(), tenant, id)?;
        strip_member(self.txn, SubjectKind::ServiceAccount, id)
    }
}
