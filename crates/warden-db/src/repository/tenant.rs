//! Identifier lookups for tenants, projects, users and service accounts.

use std::sync::Arc;

use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::{
    project::Project, service_account::ServiceAccount, tenant::Tenant, user::User,
};

use super::Repository;
use crate::schema::{EMAIL_INDEX, IDENTIFIER_INDEX, compound};
use crate::store::Txn;

impl<X: Txn> Repository<'_, Tenant, X> {
    pub fn get_by_identifier(&self, identifier: &str) -> WardenResult<Arc<Tenant>> {
        self.find_unique(IDENTIFIER_INDEX, &identifier.to_lowercase())
    }
}

impl<X: Txn> Repository<'_, Project, X> {
    pub fn get_by_identifier(&self, tenant: Uuid, identifier: &str) -> WardenResult<Arc<Project>> {
        self.find_unique(IDENTIFIER_INDEX, &compound(tenant, identifier.to_lowercase()))
    }
}

impl<X: Txn> Repository<'_, User, X> {
    pub fn get_by_identifier(&self, tenant: Uuid, identifier: &str) -> WardenResult<Arc<User>> {
        self.find_unique(IDENTIFIER_INDEX, &compound(tenant, identifier.to_lowercase()))
    }

    pub fn get_by_email(&self, tenant: Uuid, email: &str) -> WardenResult<Arc<User>> {
        self.find_unique(EMAIL_INDEX, &compound(tenant, email.to_lowercase()))
    }
}

impl<X: Txn> Repository<'_, ServiceAccount, X> {
    pub fn get_by_identifier(
        &self,
        tenant: Uuid,
        identifier: &str,
    ) -> WardenResult<Arc<ServiceAccount>> {
        self.find_unique(IDENTIFIER_INDEX, &compound(tenant, identifier.to_lowercase()))
    }
}
