use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::models::group::Group;
use warden_core::models::member::SubjectKind;
use warden_core::repository::GroupInformer;

use super::Repository;
use crate::schema::{
    GROUP_MEMBER_INDEX, IDENTIFIER_INDEX, SERVICE_ACCOUNT_MEMBER_INDEX, USER_MEMBER_INDEX,
    compound,
};
use crate::store::Txn;

/// Member index of group-like rows for one subject kind.
pub(crate) fn member_index(kind: SubjectKind) -> &'static str {
    match kind {
        SubjectKind::User => USER_MEMBER_INDEX,
        SubjectKind::ServiceAccount => SERVICE_ACCOUNT_MEMBER_INDEX,
        SubjectKind::Group => GROUP_MEMBER_INDEX,
    }
}

impl<X: Txn> Repository<'_, Group, X> {
    pub fn get_by_identifier(&self, tenant: Uuid, identifier: &str) -> WardenResult<Arc<Group>> {
        self.find_unique(IDENTIFIER_INDEX, &compound(tenant, identifier.to_lowercase()))
    }

    /// Groups of `tenant` listing `subject` as a direct member, archived
    /// ones included when asked.
    pub fn find_containing(
        &self,
        tenant: Uuid,
        subject: Uuid,
        kind: SubjectKind,
        show_archived: bool,
    ) -> Vec<Arc<Group>> {
        self.find_by_index(member_index(kind), &compound(tenant, subject), show_archived)
    }
}

impl<X: Txn> GroupInformer for Repository<'_, Group, X> {
    fn get_group(&self, id: Uuid) -> WardenResult<Arc<Group>> {
        self.get_by_id(&id)
    }

    fn find_direct_parent_groups(
        &self,
        tenant: Uuid,
        subject: Uuid,
        kind: SubjectKind,
    ) -> WardenResult<BTreeSet<Uuid>> {
        Ok(self
            .find_containing(tenant, subject, kind, false)
            .iter()
            .map(|group| group.uuid)
            .collect())
    }
}
