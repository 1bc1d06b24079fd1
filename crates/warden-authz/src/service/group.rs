use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::member::SubjectKind;
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_core::models::{group::Group, tenant::Tenant};
use warden_db::WriteTxn;
use warden_db::repository::{GroupRepository, IdentitySharingRepository};

use super::{
    append_shared, archive_owned, assign_uuid, check_new, check_update, erase_owned, fetch_owned,
    live_tenant, require_identifier, restore_owned,
};
use crate::lifecycle::{Cascade, MemberStripper, strip_member};
use crate::members::MemberResolver;
use crate::sharing::shared_group_closure;

/// `identifier@group.tenant_identifier`.
pub(super) fn full_identifier(identifier: &str, tenant: &Tenant) -> String {
    format!("{identifier}@group.{}", tenant.identifier)
}

pub struct GroupService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> GroupService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> GroupRepository<'t, WriteTxn<'s>> {
        GroupRepository::new(self.txn)
    }

    pub fn get(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<Group>> {
        fetch_owned(&self.repo(), tenant, id)
    }

    /// Groups of `tenant`. With `show_shared`, the groups shared into the
    /// tenant and the groups nested in them are listed too.
    pub fn list(
        &self,
        tenant: Uuid,
        show_shared: bool,
        show_archived: bool,
    ) -> WardenResult<Vec<Arc<Group>>> {
        let repo = self.repo();
        let mut groups = repo.list(tenant, show_archived);
        if show_shared {
            let shared = shared_group_closure(
                &repo,
                &IdentitySharingRepository::new(self.txn),
                tenant,
                show_archived,
            )?;
            let ids = shared.iter().map(|g| g.uuid).collect();
            append_shared(&repo, &mut groups, ids, show_archived)?;
        }
        Ok(groups)
    }

    /// Creates a group, materialising its member notations into id lists.
    pub fn create(&self, mut group: Group) -> WardenResult<Arc<Group>> {
        check_new(&group)?;
        require_identifier(&group.identifier)?;
        let tenant = live_tenant(self.txn, group.tenant_uuid)?;
        let repo = self.repo();
        assign_uuid(&repo, &mut group.uuid)?;
        group.set_members(MemberResolver::new(self.txn).resolve(&group.members)?);
        group.full_identifier = full_identifier(&group.identifier, &tenant);
        group.resource_version = new_resource_version();
        group.archive = ArchiveMark::default();

        let group = repo.insert(group)?;
        info!(
            tenant = %group.tenant_uuid,
            group = %group.uuid,
            users = group.users.len(),
            service_accounts = group.service_accounts.len(),
            groups = group.groups.len(),
            "group created"
        );
        Ok(group)
    }

    pub fn update(&self, mut group: Group) -> WardenResult<Arc<Group>> {
        require_identifier(&group.identifier)?;
        let repo = self.repo();
        let stored = fetch_owned(&repo, group.tenant_uuid, group.uuid)?;
        check_update(&*stored, &group)?;
        let tenant = live_tenant(self.txn, group.tenant_uuid)?;
        group.set_members(MemberResolver::new(self.txn).resolve(&group.members)?);
        group.full_identifier = full_identifier(&group.identifier, &tenant);
        group.resource_version = new_resource_version();
        group.archive = stored.archive;

        let group = repo.insert(group)?;
        info!(group = %group.uuid, "group updated");
        Ok(group)
    }

    /// Archives the group after removing it from parent groups, role
    /// bindings and identity sharings.
    pub fn delete(&self, tenant: Uuid, id: Uuid, origin: &Origin) -> WardenResult<Arc<Group>> {
        let cascade = Cascade::new().then(MemberStripper::new(self.txn, SubjectKind::Group));
        archive_owned(&self.repo(), tenant, id, origin, &cascade)
    }

    pub fn restore(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<Group>> {
        restore_owned(&self.repo(), tenant, id)
    }

    /// Erases an archived group and removes it from parent groups, role
    /// bindings and identity sharings.
    pub fn erase(&self, tenant: Uuid, id: Uuid) -> WardenResult<()> {
        erase_owned(&self.repo(), tenant, id)?;
        strip_member(self.txn, SubjectKind::Group, id)
    }
}
