//! JSON export and import of the whole store.

use serde::{Deserialize, Serialize};
use tracing::info;
use warden_core::models::{
    group::Group, identity_sharing::IdentitySharing, project::Project, role::Role,
    role_binding::RoleBinding, service_account::ServiceAccount, tenant::Tenant, user::User,
};

use crate::error::DbError;
use crate::store::{MemoryStore, Txn};
use crate::table::Record;

/// Every record of a store, archived ones included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub tenants: Vec<Tenant>,
    pub projects: Vec<Project>,
    pub users: Vec<User>,
    pub service_accounts: Vec<ServiceAccount>,
    pub groups: Vec<Group>,
    pub roles: Vec<Role>,
    pub role_bindings: Vec<RoleBinding>,
    pub identity_sharings: Vec<IdentitySharing>,
}

fn rows<T: Record>(txn: &impl Txn) -> Vec<T> {
    txn.scan::<T>().iter().map(|row| T::clone(row)).collect()
}

impl Snapshot {
    pub fn export(txn: &impl Txn) -> Self {
        Self {
            tenants: rows(txn),
            projects: rows(txn),
            users: rows(txn),
            service_accounts: rows(txn),
            groups: rows(txn),
            roles: rows(txn),
            role_bindings: rows(txn),
            identity_sharings: rows(txn),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DbError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DbError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
            + self.projects.len()
            + self.users.len()
            + self.service_accounts.len()
            + self.groups.len()
            + self.roles.len()
            + self.role_bindings.len()
            + self.identity_sharings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MemoryStore {
    /// Loads `snapshot` in one write transaction. Records are stored as
    /// given; nothing beyond unique indexes is validated.
    pub fn import(&self, snapshot: Snapshot) -> Result<usize, DbError> {
        let count = snapshot.len();
        let txn = self.write_txn();
        for row in snapshot.tenants {
            txn.insert(row)?;
        }
        for row in snapshot.projects {
            txn.insert(row)?;
        }
        for row in snapshot.users {
            txn.insert(row)?;
        }
        for row in snapshot.service_accounts {
            txn.insert(row)?;
        }
        for row in snapshot.groups {
            txn.insert(row)?;
        }
        for row in snapshot.roles {
            txn.insert(row)?;
        }
        for row in snapshot.role_bindings {
            txn.insert(row)?;
        }
        for row in snapshot.identity_sharings {
            txn.insert(row)?;
        }
        txn.commit();
        info!(records = count, "snapshot imported");
        Ok(count)
    }
}
