use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::member::SubjectKind;
use warden_core::models::role_binding::RoleBinding;
use warden_core::repository::{RoleBindingInformer, RoleBindingMap};

use super::Repository;
use super::group::member_index;
use crate::schema::{PROJECT_INDEX, ROLE_INDEX, compound};
use crate::store::Txn;

fn into_map(rows: impl IntoIterator<Item = Arc<RoleBinding>>) -> RoleBindingMap {
    rows.into_iter().map(|rb| (rb.uuid, rb)).collect()
}

impl<X: Txn> Repository<'_, RoleBinding, X> {
    /// Bindings of `tenant` naming `subject` directly.
    pub fn find_for_member(
        &self,
        tenant: Uuid,
        subject: Uuid,
        kind: SubjectKind,
        show_archived: bool,
    ) -> Vec<Arc<RoleBinding>> {
        self.find_by_index(member_index(kind), &compound(tenant, subject), show_archived)
    }

    /// Bindings of `tenant` listing `project`.
    pub fn find_for_project(
        &self,
        tenant: Uuid,
        project: Uuid,
        show_archived: bool,
    ) -> Vec<Arc<RoleBinding>> {
        self.find_by_index(PROJECT_INDEX, &compound(tenant, project), show_archived)
    }

    /// Bindings anywhere granting the role `name`.
    pub fn find_for_role_name(&self, name: &str, show_archived: bool) -> Vec<Arc<RoleBinding>> {
        self.list_all(show_archived)
            .into_iter()
            .filter(|rb| rb.roles.iter().any(|role| role.name == name))
            .collect()
    }
}

impl<X: Txn> RoleBindingInformer for Repository<'_, RoleBinding, X> {
    fn find_direct_role_bindings_for_user(
        &self,
        tenant: Uuid,
        user: Uuid,
    ) -> WardenResult<RoleBindingMap> {
        Ok(into_map(self.find_for_member(tenant, user, SubjectKind::User, false)))
    }

    fn find_direct_role_bindings_for_service_account(
        &self,
        tenant: Uuid,
        service_account: Uuid,
    ) -> WardenResult<RoleBindingMap> {
        Ok(into_map(self.find_for_member(
            tenant,
            service_account,
            SubjectKind::ServiceAccount,
            false,
        )))
    }

    fn find_direct_role_bindings_for_groups(
        &self,
        tenant: Uuid,
        groups: &BTreeSet<Uuid>,
    ) -> WardenResult<RoleBindingMap> {
        Ok(into_map(groups.iter().flat_map(|group| {
            self.find_for_member(tenant, *group, SubjectKind::Group, false)
        })))
    }

    fn find_direct_role_bindings_for_roles(
        &self,
        tenant: Uuid,
        roles: &BTreeSet<String>,
    ) -> WardenResult<RoleBindingMap> {
        Ok(into_map(roles.iter().flat_map(|role| {
            self.find_by_index(ROLE_INDEX, &compound(tenant, role), false)
        })))
    }

    fn find_direct_role_bindings_for_project(
        &self,
        tenant: Uuid,
        project: Uuid,
    ) -> WardenResult<RoleBindingMap> {
        Ok(into_map(self.find_for_project(tenant, project, false)))
    }
}
