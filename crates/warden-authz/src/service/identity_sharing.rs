use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::identity_sharing::IdentitySharing;
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_db::WriteTxn;
use warden_db::repository::{GroupRepository, IdentitySharingRepository};

use super::{
    archive_owned, assign_uuid, check_new, check_update, erase_owned, fetch_owned, live_tenant,
    restore_owned,
};
use crate::lifecycle::Cascade;

pub struct IdentitySharingService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> IdentitySharingService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> IdentitySharingRepository<'t, WriteTxn<'s>> {
        IdentitySharingRepository::new(self.txn)
    }

    /// A sharing owned by its source tenant.
    pub fn get(&self, source_tenant: Uuid, id: Uuid) -> WardenResult<Arc<IdentitySharing>> {
        fetch_owned(&self.repo(), source_tenant, id)
    }

    pub fn list(&self, source_tenant: Uuid, show_archived: bool) -> Vec<Arc<IdentitySharing>> {
        self.repo().list(source_tenant, show_archived)
    }

    pub fn list_for_destination(
        &self,
        destination_tenant: Uuid,
        show_archived: bool,
    ) -> Vec<Arc<IdentitySharing>> {
        self.repo()
            .list_for_destination(destination_tenant, show_archived)
    }

    pub fn create(&self, mut sharing: IdentitySharing) -> WardenResult<Arc<IdentitySharing>> {
        check_new(&sharing)?;
        if sharing.source_tenant_uuid == sharing.destination_tenant_uuid {
            return Err(WardenError::validation(
                "source and destination tenants must differ",
            ));
        }
        live_tenant(self.txn, sharing.source_tenant_uuid)?;
        live_tenant(self.txn, sharing.destination_tenant_uuid)?;
        self.check_groups(&mut sharing)?;

        let repo = self.repo();
        assign_uuid(&repo, &mut sharing.uuid)?;
        sharing.resource_version = new_resource_version();
        sharing.archive = ArchiveMark::default();

        let sharing = repo.insert(sharing)?;
        info!(
            source = %sharing.source_tenant_uuid,
            destination = %sharing.destination_tenant_uuid,
            groups = sharing.groups.len(),
            "identity sharing created"
        );
        Ok(sharing)
    }

    /// Replaces the shared groups. The source and destination tenants of a
    /// sharing never change.
    pub fn update(&self, mut sharing: IdentitySharing) -> WardenResult<Arc<IdentitySharing>> {
        let repo = self.repo();
        let stored = repo.get_by_id(&sharing.uuid)?;
        if sharing.source_tenant_uuid != stored.source_tenant_uuid
            || sharing.destination_tenant_uuid != stored.destination_tenant_uuid
        {
            return Err(WardenError::validation(
                "only the shared groups of an identity sharing may change",
            ));
        }
        check_update(&*stored, &sharing)?;
        self.check_groups(&mut sharing)?;
        sharing.resource_version = new_resource_version();
        sharing.archive = stored.archive;

        let sharing = repo.insert(sharing)?;
        info!(
            sharing = %sharing.uuid,
            groups = sharing.groups.len(),
            "identity sharing updated"
        );
        Ok(sharing)
    }

    pub fn delete(
        &self,
        source_tenant: Uuid,
        id: Uuid,
        origin: &Origin,
    ) -> WardenResult<Arc<IdentitySharing>> {
        archive_owned(&self.repo(), source_tenant, id, origin, &Cascade::new())
    }

    pub fn restore(&self, source_tenant: Uuid, id: Uuid) -> WardenResult<Arc<IdentitySharing>> {
        restore_owned(&self.repo(), source_tenant, id)
    }

    pub fn erase(&self, source_tenant: Uuid, id: Uuid) -> WardenResult<()> {
        erase_owned(&self.repo(), source_tenant, id)?;
        Ok(())
    }

    /// Every shared group must belong to the source tenant. Duplicates are
    /// dropped.
    fn check_groups(&self, sharing: &mut IdentitySharing) -> WardenResult<()> {
        let groups = GroupRepository::new(self.txn);
        for id in &sharing.groups {
            let group = groups.get_by_id(id)?;
            if group.tenant_uuid != sharing.source_tenant_uuid {
                return Err(WardenError::validation(format!(
                    "group {id} does not belong to the source tenant"
                )));
            }
        }
        sharing.groups.sort();
        sharing.groups.dedup();
        Ok(())
    }
}
