//! Narrow read interfaces the role resolution engine consumes.
//!
//! Each trait covers one relation of the entity graph. The store crate
//! implements them over a transaction snapshot; tests implement them with
//! in-memory fakes. Lookups through these traits never return archived
//! records.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{WardenError, WardenResult};
use crate::graph::reachable;
use crate::models::{
    group::Group,
    identity_sharing::IdentitySharing,
    member::{Principal, PrincipalRecord, SubjectKind},
    role::Role,
    role_binding::RoleBinding,
};

/// Role bindings keyed by their UUID.
pub type RoleBindingMap = BTreeMap<Uuid, Arc<RoleBinding>>;

// ---------------------------------------------------------------------------
// Principals
// ---------------------------------------------------------------------------

pub trait PrincipalInformer {
    /// Home tenant and archive state of a user or service account.
    fn lookup_principal(&self, principal: Principal) -> WardenResult<PrincipalRecord>;
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

pub trait RoleInformer {
    fn get_role(&self, name: &str) -> WardenResult<Arc<Role>>;

    /// Names of live roles whose inclusion list references `name`.
    fn find_direct_including_roles(&self, name: &str) -> WardenResult<BTreeSet<String>>;

    /// Every role that includes `name` directly or transitively.
    ///
    /// `name` itself is never part of the result, even when an inclusion
    /// cycle leads back to it. An archived role has no including roles.
    fn find_all_including_roles(&self, name: &str) -> WardenResult<BTreeSet<String>> {
        let role = self.get_role(name)?;
        if role.archive.is_archived() {
            return Ok(BTreeSet::new());
        }
        let mut closure = reachable([name.to_string()], |n| {
            self.find_direct_including_roles(n)
        })?;
        closure.remove(name);
        Ok(closure)
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

pub trait GroupInformer {
    fn get_group(&self, id: Uuid) -> WardenResult<Arc<Group>>;

    /// Live groups of `tenant` listing `subject` as a direct member of the
    /// given kind.
    fn find_direct_parent_groups(
        &self,
        tenant: Uuid,
        subject: Uuid,
        kind: SubjectKind,
    ) -> WardenResult<BTreeSet<Uuid>>;

    /// Every group of `tenant` containing `subject` directly or through
    /// nested groups. A group never contains itself here, even on a cycle.
    fn find_all_parent_groups(
        &self,
        tenant: Uuid,
        subject: Uuid,
        kind: SubjectKind,
    ) -> WardenResult<BTreeSet<Uuid>> {
        let direct = self.find_direct_parent_groups(tenant, subject, kind)?;
        let mut closure = reachable(direct.iter().copied(), |g| {
            self.find_direct_parent_groups(tenant, *g, SubjectKind::Group)
        })?;
        closure.extend(direct);
        if kind == SubjectKind::Group {
            closure.remove(&subject);
        }
        Ok(closure)
    }

    /// Users and service accounts that are direct or transitive members of
    /// `groups`, merged with the given direct `users` and `service_accounts`.
    /// Archived groups contribute no members.
    fn find_all_members_for(
        &self,
        users: impl IntoIterator<Item = Uuid>,
        service_accounts: impl IntoIterator<Item = Uuid>,
        groups: impl IntoIterator<Item = Uuid>,
    ) -> WardenResult<(BTreeSet<Uuid>, BTreeSet<Uuid>)> {
        let mut all_users: BTreeSet<Uuid> = users.into_iter().collect();
        let mut all_service_accounts: BTreeSet<Uuid> = service_accounts.into_iter().collect();
        let seeds: BTreeSet<Uuid> = groups.into_iter().collect();

        let mut visit = |id: &Uuid| -> WardenResult<BTreeSet<Uuid>> {
            let group = self.get_group(*id)?;
            if group.archive.is_archived() {
                return Ok(BTreeSet::new());
            }
            all_users.extend(group.users.iter().copied());
            all_service_accounts.extend(group.service_accounts.iter().copied());
            Ok(group.groups.iter().copied().collect())
        };
        // Seeds are expanded by the walk itself; children reached through
        // edges are expanded once each as well.
        reachable(seeds, &mut visit)?;

        Ok((all_users, all_service_accounts))
    }
}

// ---------------------------------------------------------------------------
// Role bindings
// ---------------------------------------------------------------------------

/// Live role bindings of one tenant by the relation they reference.
pub trait RoleBindingInformer {
    fn find_direct_role_bindings_for_user(
        &self,
        tenant: Uuid,
        user: Uuid,
    ) -> WardenResult<RoleBindingMap>;

    fn find_direct_role_bindings_for_service_account(
        &self,
        tenant: Uuid,
        service_account: Uuid,
    ) -> WardenResult<RoleBindingMap>;

    fn find_direct_role_bindings_for_groups(
        &self,
        tenant: Uuid,
        groups: &BTreeSet<Uuid>,
    ) -> WardenResult<RoleBindingMap>;

    fn find_direct_role_bindings_for_roles(
        &self,
        tenant: Uuid,
        roles: &BTreeSet<String>,
    ) -> WardenResult<RoleBindingMap>;

    /// Bindings listing `project`; the `any_project` flag is not consulted.
    fn find_direct_role_bindings_for_project(
        &self,
        tenant: Uuid,
        project: Uuid,
    ) -> WardenResult<RoleBindingMap>;

    fn find_direct_role_bindings_for_principal(
        &self,
        tenant: Uuid,
        principal: Principal,
    ) -> WardenResult<RoleBindingMap> {
        match principal {
            Principal::User(id) => self.find_direct_role_bindings_for_user(tenant, id),
            Principal::ServiceAccount(id) => {
                self.find_direct_role_bindings_for_service_account(tenant, id)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Identity sharing
// ---------------------------------------------------------------------------

pub trait SharingInformer {
    /// Live sharings whose destination is `tenant`.
    fn list_for_destination_tenant(&self, tenant: Uuid)
    -> WardenResult<Vec<Arc<IdentitySharing>>>;
}

/// Converts a missing-principal lookup into the engine's error.
pub fn principal_not_found(principal: Principal) -> WardenError {
    WardenError::not_found(principal.kind().as_str(), principal.id())
}
