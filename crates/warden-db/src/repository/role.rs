use std::collections::BTreeSet;
use std::sync::Arc;

use warden_core::error::WardenResult;
use warden_core::models::role::Role;
use warden_core::repository::RoleInformer;

use super::Repository;
use crate::schema::INCLUDED_ROLE_INDEX;
use crate::store::Txn;

impl<X: Txn> Repository<'_, Role, X> {
    /// Roles whose inclusion list references `name`.
    pub fn find_including(&self, name: &str, show_archived: bool) -> Vec<Arc<Role>> {
        self.find_by_index(INCLUDED_ROLE_INDEX, name, show_archived)
    }
}

impl<X: Txn> RoleInformer for Repository<'_, Role, X> {
    fn get_role(&self, name: &str) -> WardenResult<Arc<Role>> {
        self.get_by_id(&name.to_string())
    }

    fn find_direct_including_roles(&self, name: &str) -> WardenResult<BTreeSet<String>> {
        Ok(self
            .find_including(name, false)
            .iter()
            .map(|role| role.name.clone())
            .collect())
    }
}
