//! Snapshot-isolated in-memory store.
//!
//! Readers clone an `Arc` of the committed tables and never block writers.
//! A single writer at a time works on a private copy that replaces the
//! committed tables on [`WriteTxn::commit`]; dropping the transaction
//! instead discards every change.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};
use warden_core::models::{
    group::Group, identity_sharing::IdentitySharing, project::Project, role::Role,
    role_binding::RoleBinding, service_account::ServiceAccount, tenant::Tenant, user::User,
};

use crate::error::DbError;
use crate::table::{Record, Table};

/// Every table of the store.
#[derive(Clone, Default)]
pub struct Tables {
    pub tenants: Table<Tenant>,
    pub projects: Table<Project>,
    pub users: Table<User>,
    pub service_accounts: Table<ServiceAccount>,
    pub groups: Table<Group>,
    pub roles: Table<Role>,
    pub role_bindings: Table<RoleBinding>,
    pub identity_sharings: Table<IdentitySharing>,
}

/// Read access shared by read and write transactions.
pub trait Txn {
    fn with_tables<R>(&self, f: impl FnOnce(&Tables) -> R) -> R;

    fn get<T: Record>(&self, key: &T::Key) -> Option<Arc<T>> {
        self.with_tables(|tables| T::table(tables).get(key))
    }

    fn lookup<T: Record>(&self, index: &str, value: &str) -> Vec<Arc<T>> {
        self.with_tables(|tables| T::table(tables).lookup(index, value).cloned().collect())
    }

    fn scan<T: Record>(&self) -> Vec<Arc<T>> {
        self.with_tables(|tables| T::table(tables).iter().cloned().collect())
    }
}

/// A consistent view of the store as of [`MemoryStore::read_txn`].
#[derive(Clone)]
pub struct ReadTxn {
    tables: Arc<Tables>,
}

impl Txn for ReadTxn {
    fn with_tables<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.tables)
    }
}

/// The single open write transaction.
///
/// Mutations go through `&self` so that repositories and readers can
/// share one transaction reference during a cascade.
pub struct WriteTxn<'s> {
    store: &'s MemoryStore,
    tables: RefCell<Tables>,
    _writer: MutexGuard<'s, ()>,
}

impl Txn for WriteTxn<'_> {
    fn with_tables<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.tables.borrow())
    }
}

impl WriteTxn<'_> {
    /// Inserts or replaces a row.
    pub fn insert<T: Record>(&self, record: T) -> Result<Arc<T>, DbError> {
        let key = record.key();
        let mut tables = self.tables.borrow_mut();
        let table = T::table_mut(&mut tables);
        table.insert(record)?;
        table.get(&key).ok_or_else(|| DbError::NotFound {
            entity: T::KIND.to_string(),
            id: key.to_string(),
        })
    }

    /// Physically removes a row.
    pub fn remove<T: Record>(&self, key: &T::Key) -> Result<Arc<T>, DbError> {
        T::table_mut(&mut self.tables.borrow_mut())
            .remove(key)
            .ok_or_else(|| DbError::NotFound {
                entity: T::KIND.to_string(),
                id: key.to_string(),
            })
    }

    /// Publishes every change made in this transaction at once.
    pub fn commit(self) {
        let WriteTxn {
            store,
            tables,
            _writer,
        } = self;
        *store.committed.write() = Arc::new(tables.into_inner());
        info!("write transaction committed");
    }
}

/// The entity store.
#[derive(Default)]
pub struct MemoryStore {
    committed: RwLock<Arc<Tables>>,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_txn(&self) -> ReadTxn {
        ReadTxn {
            tables: Arc::clone(&self.committed.read()),
        }
    }

    /// Opens the write transaction, waiting for any other writer to finish.
    pub fn write_txn(&self) -> WriteTxn<'_> {
        let writer = self.writer.lock();
        let tables = (**self.committed.read()).clone();
        debug!("write transaction opened");
        WriteTxn {
            store: self,
            tables: RefCell::new(tables),
            _writer: writer,
        }
    }

    /// Runs `f` in a write transaction, committing only if it succeeds.
    pub fn update<R, E>(&self, f: impl FnOnce(&WriteTxn<'_>) -> Result<R, E>) -> Result<R, E> {
        let txn = self.write_txn();
        let out = f(&txn)?;
        txn.commit();
        Ok(out)
    }
}
