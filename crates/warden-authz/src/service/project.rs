use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::project::Project;
use warden_core::models::record::{ArchiveMark, Origin, new_resource_version};
use warden_db::WriteTxn;
use warden_db::repository::ProjectRepository;

use super::{
    archive_owned, assign_uuid, check_new, check_update, erase_owned, fetch_owned, live_tenant,
    require_identifier, restore_owned,
};
use crate::lifecycle::{Cascade, strip_project};

pub struct ProjectService<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> ProjectService<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    fn repo(&self) -> ProjectRepository<'t, WriteTxn<'s>> {
        ProjectRepository::new(self.txn)
    }

    pub fn get(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<Project>> {
        fetch_owned(&self.repo(), tenant, id)
    }

    pub fn list(&self, tenant: Uuid, show_archived: bool) -> Vec<Arc<Project>> {
        self.repo().list(tenant, show_archived)
    }

    pub fn create(&self, mut project: Project) -> WardenResult<Arc<Project>> {
        check_new(&project)?;
        require_identifier(&project.identifier)?;
        live_tenant(self.txn, project.tenant_uuid)?;
        let repo = self.repo();
        assign_uuid(&repo, &mut project.uuid)?;
        project.resource_version = new_resource_version();
        project.archive = ArchiveMark::default();

        let project = repo.insert(project)?;
        info!(tenant = %project.tenant_uuid, project = %project.uuid, "project created");
        Ok(project)
    }

    pub fn update(&self, mut project: Project) -> WardenResult<Arc<Project>> {
        require_identifier(&project.identifier)?;
        let repo = self.repo();
        let stored = fetch_owned(&repo, project.tenant_uuid, project.uuid)?;
        check_update(&*stored, &project)?;
        project.resource_version = new_resource_version();
        project.archive = stored.archive;

        let project = repo.insert(project)?;
        info!(project = %project.uuid, "project updated");
        Ok(project)
    }

    pub fn delete(&self, tenant: Uuid, id: Uuid, origin: &Origin) -> WardenResult<Arc<Project>> {
        archive_owned(&self.repo(), tenant, id, origin, &Cascade::new())
    }

    pub fn restore(&self, tenant: Uuid, id: Uuid) -> WardenResult<Arc<Project>> {
        restore_owned(&self.repo(), tenant, id)
    }

    /// Erases an archived project and drops it from role bindings.
    pub fn erase(&self, tenant: Uuid, id: Uuid) -> WardenResult<()> {
        erase_owned(&self.repo(), tenant, id)?;
        strip_project(self.txn, id)
    }
}
