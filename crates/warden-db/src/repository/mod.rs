//! Repositories over a store transaction.
//!
//! [`Repository`] is generic over the record type and the transaction.
//! Reads work on any [`Txn`]; writes need a [`WriteTxn`]. The per-entity
//! modules add identifier lookups and the `warden-core` informer traits.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::record::{ArchiveMark, TenantOwned};
use warden_core::models::{
    group::Group, identity_sharing::IdentitySharing, project::Project, role::Role,
    role_binding::RoleBinding, service_account::ServiceAccount, tenant::Tenant, user::User,
};

use crate::schema::TENANT_INDEX;
use crate::store::{Txn, WriteTxn};
use crate::table::Record;

mod group;
mod identity_sharing;
mod principal;
mod role;
mod role_binding;
mod tenant;

pub use principal::PrincipalRepository;

pub type TenantRepository<'t, X> = Repository<'t, Tenant, X>;
pub type ProjectRepository<'t, X> = Repository<'t, Project, X>;
pub type UserRepository<'t, X> = Repository<'t, User, X>;
pub type ServiceAccountRepository<'t, X> = Repository<'t, ServiceAccount, X>;
pub type GroupRepository<'t, X> = Repository<'t, Group, X>;
pub type RoleRepository<'t, X> = Repository<'t, Role, X>;
pub type RoleBindingRepository<'t, X> = Repository<'t, RoleBinding, X>;
pub type IdentitySharingRepository<'t, X> = Repository<'t, IdentitySharing, X>;

/// Typed access to one table through a borrowed transaction.
pub struct Repository<'t, T, X> {
    txn: &'t X,
    _record: PhantomData<fn() -> T>,
}

impl<T, X> Clone for Repository<'_, T, X> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, X> Copy for Repository<'_, T, X> {}

impl<'t, T: Record, X: Txn> Repository<'t, T, X> {
    pub fn new(txn: &'t X) -> Self {
        Self {
            txn,
            _record: PhantomData,
        }
    }

    pub fn txn(&self) -> &'t X {
        self.txn
    }

    /// Fetches a row, archived or not.
    pub fn get_by_id(&self, key: &T::Key) -> WardenResult<Arc<T>> {
        self.txn
            .get::<T>(key)
            .ok_or_else(|| WardenError::not_found(T::KIND, key))
    }

    pub fn list_all(&self, show_archived: bool) -> Vec<Arc<T>> {
        self.txn
            .scan::<T>()
            .into_iter()
            .filter(|row| show_archived || !row.is_archived())
            .collect()
    }

    /// Rows reachable under `value` in `index`.
    pub fn find_by_index(&self, index: &str, value: &str, show_archived: bool) -> Vec<Arc<T>> {
        self.txn
            .lookup::<T>(index, value)
            .into_iter()
            .filter(|row| show_archived || !row.is_archived())
            .collect()
    }

    /// The single row under a unique `index` value, if any.
    pub(crate) fn find_unique(&self, index: &str, value: &str) -> WardenResult<Arc<T>> {
        self.txn
            .lookup::<T>(index, value)
            .into_iter()
            .next()
            .ok_or_else(|| WardenError::not_found(T::KIND, value.replace('\0', "/")))
    }
}

impl<T: Record + TenantOwned, X: Txn> Repository<'_, T, X> {
    /// Rows owned by `tenant`.
    pub fn list(&self, tenant: Uuid, show_archived: bool) -> Vec<Arc<T>> {
        self.find_by_index(TENANT_INDEX, &tenant.to_string(), show_archived)
    }
}

impl<'t, 's, T: Record> Repository<'t, T, WriteTxn<'s>> {
    /// Inserts or replaces a row.
    pub fn insert(&self, record: T) -> WardenResult<Arc<T>> {
        Ok(self.txn.insert(record)?)
    }

    pub fn archive(&self, key: &T::Key, mark: ArchiveMark) -> WardenResult<Arc<T>> {
        let mut row = T::clone(&*self.get_by_id(key)?);
        row.set_archive_mark(mark);
        let row = self.insert(row)?;
        info!(entity = T::KIND, id = %key, "archived");
        Ok(row)
    }

    pub fn restore(&self, key: &T::Key) -> WardenResult<Arc<T>> {
        let mut row = T::clone(&*self.get_by_id(key)?);
        row.set_archive_mark(ArchiveMark::default());
        let row = self.insert(row)?;
        info!(entity = T::KIND, id = %key, "restored");
        Ok(row)
    }

    /// Physically removes a row.
    pub fn erase(&self, key: &T::Key) -> WardenResult<Arc<T>> {
        let row = self.txn.remove::<T>(key)?;
        info!(entity = T::KIND, id = %key, "erased");
        Ok(row)
    }
}
