use std::sync::Arc;

use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::identity_sharing::IdentitySharing;
use warden_core::repository::SharingInformer;

use super::Repository;
use crate::schema::{DESTINATION_TENANT_INDEX, SHARED_GROUP_INDEX, TENANT_INDEX};
use crate::store::Txn;

impl<X: Txn> Repository<'_, IdentitySharing, X> {
    /// Sharings with `tenant` as source or destination.
    pub fn list_touching(&self, tenant: Uuid, show_archived: bool) -> Vec<Arc<IdentitySharing>> {
        let key = tenant.to_string();
        let mut rows = self.find_by_index(TENANT_INDEX, &key, show_archived);
        rows.extend(self.find_by_index(DESTINATION_TENANT_INDEX, &key, show_archived));
        rows
    }

    pub fn list_for_destination(
        &self,
        tenant: Uuid,
        show_archived: bool,
    ) -> Vec<Arc<IdentitySharing>> {
        self.find_by_index(DESTINATION_TENANT_INDEX, &tenant.to_string(), show_archived)
    }

    /// Sharings that share `group`.
    pub fn find_sharing_group(&self, group: Uuid, show_archived: bool) -> Vec<Arc<IdentitySharing>> {
        self.find_by_index(SHARED_GROUP_INDEX, &group.to_string(), show_archived)
    }
}

impl<X: Txn> SharingInformer for Repository<'_, IdentitySharing, X> {
    fn list_for_destination_tenant(
        &self,
        tenant: Uuid,
    ) -> WardenResult<Vec<Arc<IdentitySharing>>> {
        Ok(self.list_for_destination(tenant, false))
    }
}
