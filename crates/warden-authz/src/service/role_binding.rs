use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_core::models::role_binding::RoleBinding;
use warden_db::WriteTxn;
use warden_db::repository::{ProjectRepository, RoleBindingRepository, RoleRepository};

use super::{
    archive_owned, assign_uuid, check_new, check_update, erase_owned, fetch_owned, live_tenant,
    restore_owned,
};
use crate::lifecycle::Cascade;
use crate::members::MemberResolver;

pub struct RoleBindingService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> RoleBindingService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> RoleBindingRepository<'t, WriteTxn<'s>> {
        RoleBindingRepository::new(self.txn)
    }

    pub fn get(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<RoleBinding>> {
        fetch_owned(&self.repo(), tenant, id)
    }

    pub fn list(&self, tenant: Uuid, show_archived: bool) -> Vec<Arc<RoleBinding>> {
        self.repo().list(tenant, show_archived)
    }

    /// Project and role references, then members.
    fn validate(&self, binding: &mut RoleBinding) -> WardenResult<()> {
        if binding.any_project && !binding.projects.is_empty() {
            return Err(WardenError::validation(
                "any_project cannot be combined with a project list",
            ));
        }
        let projects = ProjectRepository::new(self.txn);
        for project in &binding.projects {
            fetch_owned(&projects, binding.tenant_uuid, *project)?;
        }
        let roles = RoleRepository::new(self.txn);
        for role in &binding.roles {
            roles.get_by_id(&role.name)?;
        }
        binding.set_members(MemberResolver::new(self.txn).resolve(&binding.members)?);
        Ok(())
    }

    pub fn create(&self, mut binding: RoleBinding) -> WardenResult<Arc<RoleBinding>> {
        check_new(&binding)?;
        live_tenant(self.txn, binding.tenant_uuid)?;
        let repo = self.repo();
        assign_uuid(&repo, &mut binding.uuid)?;
        self.validate(&mut binding)?;
        binding.resource_version = new_resource_version();
        binding.archive = ArchiveMark::default();

        let binding = repo.insert(binding)?;
        info!(
            tenant = %binding.tenant_uuid,
            role_binding = %binding.uuid,
            roles = binding.roles.len(),
            valid_till = binding.valid_till,
            "role binding created"
        );
        Ok(binding)
    }

    pub fn update(&self, mut binding: RoleBinding) -> WardenResult<Arc<RoleBinding>> {
        let repo = self.repo();
        let stored = fetch_owned(&repo, binding.tenant_uuid, binding.uuid)?;
        check_update(&*stored, &binding)?;
        live_tenant(self.txn, binding.tenant_uuid)?;
        self.validate(&mut binding)?;
        binding.resource_version = new_resource_version();
        binding.archive = stored.archive;

        let binding = repo.insert(binding)?;
        info!(role_binding = %binding.uuid, "role binding updated");
        Ok(binding)
    }

    pub fn delete(
        &self,
        tenant: Uuid,
        id: Uuid,
        origin: &Origin,
    ) -> WardenResult<Arc<RoleBinding>> {
        archive_owned(&self.repo(), tenant, id, origin, &Cascade::new())
    }

    pub fn restore(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<RoleBinding>> {
        restore_owned(&self.repo(), tenant, id)
    }

    pub fn erase(&self, tenant: Uuid, id: Uuid) -> WardenResult<()> {
        erase_owned(&self.repo(), tenant, id)?;
        Ok(())
    }
}
