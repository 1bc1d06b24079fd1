use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::member::{Principal, PrincipalRecord};
use warden_core::models::record::TenantOwned;
use warden_core::models::{service_account::ServiceAccount, user::User};
use warden_core::repository::{PrincipalInformer, principal_not_found};

use super::Repository;
use crate::store::Txn;
use crate::table::Record;

/// Resolves users and service accounts for the engine.
pub struct PrincipalRepository<'t, X> {
    txn: &'t X,
}

impl<'t, X: Txn> PrincipalRepository<'t, X> {
    pub fn new(txn: &'t X) -> Self {
        Self { txn }
    }

    fn record<T: Record<Key = Uuid> + TenantOwned>(&self, id: Uuid) -> Option<PrincipalRecord> {
        Repository::<T, X>::new(self.txn)
            .get_by_id(&id)
            .ok()
            .map(|row| PrincipalRecord {
                tenant_uuid: row.tenant_uuid(),
                archived: row.is_archived(),
            })
    }
}

impl<X: Txn> PrincipalInformer for PrincipalRepository<'_, X> {
    fn lookup_principal(&self, principal: Principal) -> WardenResult<PrincipalRecord> {
        let found = match principal {
            Principal::User(id) => self.record::<User>(id),
            Principal::ServiceAccount(id) => self.record::<ServiceAccount>(id),
        };
        found.ok_or_else(|| principal_not_found(principal))
    }
}
