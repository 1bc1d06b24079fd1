use std::sync::Arc;

use tracing::info;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::record::{ArchiveMark, Entity, Origin, new_resource_version};
use warden_core::models::role::Role;
use warden_db::WriteTxn;
use warden_db::repository::{RoleBindingRepository, RoleRepository};

use super::{check_new, check_update};
use crate::lifecycle::new_archive_mark;

pub struct RoleService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> RoleService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> RoleRepository<'t, WriteTxn<'s>> {
        RoleRepository::new(self.txn)
    }

    pub fn get(&self, name: &str) -> WardenResult<Arc<Role>> {
        self.repo().get_by_id(&name.to_string())
    }

    pub fn list(&self, show_archived: bool) -> Vec<Arc<Role>> {
        self.repo().list_all(show_archived)
    }

    fn check_included(&self, role: &Role) -> WardenResult<()> {
        let repo = self.repo();
        for included in &role.included_roles {
            repo.get_by_id(&included.name)?;
        }
        Ok(())
    }

    pub fn create(&self, mut role: Role) -> WardenResult<Arc<Role>> {
        check_new(&role)?;
        if role.name.trim().is_empty() {
            return Err(WardenError::validation("role name must not be empty"));
        }
        let repo = self.repo();
        if repo.get_by_id(&role.name).is_ok() {
            return Err(WardenError::AlreadyExists {
                entity: Role::KIND.to_string(),
                key: role.name,
            });
        }
        self.check_included(&role)?;
        role.resource_version = new_resource_version();
        role.archive = ArchiveMark::default();

        let role = repo.insert(role)?;
        info!(role = %role.name, scope = ?role.scope, "role created");
        Ok(role)
    }

    /// Replaces a role. The scope chosen at creation cannot change.
    pub fn update(&self, mut role: Role) -> WardenResult<Arc<Role>> {
        let repo = self.repo();
        let stored = repo.get_by_id(&role.name)?;
        check_update(&*stored, &role)?;
        if stored.scope != role.scope {
            return Err(WardenError::validation("role scope cannot be changed"));
        }
        self.check_included(&role)?;
        role.resource_version = new_resource_version();
        role.archive = stored.archive;

        let role = repo.insert(role)?;
        info!(role = %role.name, "role updated");
        Ok(role)
    }

    pub fn delete(&self, name: &str, origin: &Origin) -> WardenResult<Arc<Role>> {
        let repo = self.repo();
        let role = repo.get_by_id(&name.to_string())?;
        if role.origin() != origin {
            return Err(WardenError::BadOrigin);
        }
        if role.is_archived() {
            return Err(WardenError::IsArchived);
        }
        repo.archive(&role.name, new_archive_mark())
    }

    pub fn restore(&self, name: &str) -> WardenResult<Arc<Role>> {
        let repo = self.repo();
        let role = repo.get_by_id(&name.to_string())?;
        if !role.is_archived() {
            return Err(WardenError::IsNotArchived);
        }
        repo.restore(&role.name)
    }

    /// Erases an archived role that no role binding or role refers to.
    pub fn erase(&self, name: &str) -> WardenResult<()> {
        let repo = self.repo();
        let role = repo.get_by_id(&name.to_string())?;
        if !role.is_archived() {
            return Err(WardenError::IsNotArchived);
        }
        let referenced = !RoleBindingRepository::new(self.txn)
            .find_for_role_name(name, true)
            .is_empty()
            || !repo.find_including(name, true).is_empty();
        if referenced {
            return Err(WardenError::ForeignKey {
                entity: Role::KIND.to_string(),
                id: name.to_string(),
            });
        }
        repo.erase(&role.name)?;
        Ok(())
    }
}
