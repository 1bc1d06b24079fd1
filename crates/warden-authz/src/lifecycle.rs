//! Archiving, restoring and erasing entities together with their
//! dependents.
//!
//! A cascade is an ordered list of [`Deleter`]s, each responsible for the
//! children of one entity type, followed by the operation on the parent
//! itself. Everything runs inside the caller's write transaction; a failed
//! step leaves the transaction to be dropped, so nothing is committed.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::member::{MemberNotation, SubjectKind};
use warden_core::models::record::{ArchiveMark, Entity, Origin, TenantOwned, new_resource_version};
use warden_core::models::{
    group::Group, identity_sharing::IdentitySharing, project::Project, role_binding::RoleBinding,
    service_account::ServiceAccount, tenant::Tenant, user::User,
};
use warden_db::WriteTxn;
use warden_db::repository::{
    GroupRepository, IdentitySharingRepository, Repository, RoleBindingRepository,
    TenantRepository,
};
use warden_db::table::Record;

/// A fresh mark stamped with the current time.
pub fn new_archive_mark() -> ArchiveMark {
    ArchiveMark::new(
        Utc::now().timestamp(),
        rand::rng().random_range(1..=i64::MAX),
    )
}

/// What a cascade does to each child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeOp {
    /// Archive live children with the mark. Children archived earlier keep
    /// their own mark.
    Archive(ArchiveMark),
    /// Restore only children carrying exactly this mark.
    Restore(ArchiveMark),
    /// Physically remove every child.
    Erase,
}

/// One step of a cascade: cleans up the children of `parent`.
pub trait Deleter {
    fn delete(&self, parent: Uuid) -> WardenResult<()>;
}

type EraseHook<'s> = fn(&WriteTxn<'s>, Uuid) -> WardenResult<()>;

/// Applies a [`CascadeOp`] to every row of `T` owned by the parent tenant.
pub struct ChildDeleter<'t, 's, T> {
    txn: &'t WriteTxn<'s>,
    op: CascadeOp,
    after_erase: Option<EraseHook<'s>>,
    _child: PhantomData<fn() -> T>,
}

impl<'t, 's, T: Record<Key = Uuid> + TenantOwned> ChildDeleter<'t, 's, T> {
    pub fn new(txn: &'t WriteTxn<'s>, op: CascadeOp) -> Self {
        Self {
            txn,
            op,
            after_erase: None,
            _child: PhantomData,
        }
    }

    /// Runs `hook` for every erased row.
    pub fn after_erase(mut self, hook: EraseHook<'s>) -> Self {
        self.after_erase = Some(hook);
        self
    }
}

impl<T: Record<Key = Uuid> + TenantOwned> Deleter for ChildDeleter<'_, '_, T> {
    fn delete(&self, parent: Uuid) -> WardenResult<()> {
        let repo = Repository::<T, _>::new(self.txn);
        let mut touched = 0;
        for row in repo.list(parent, true) {
            if apply(&repo, &*row, self.op)? {
                touched += 1;
                if let (CascadeOp::Erase, Some(hook)) = (self.op, self.after_erase) {
                    hook(self.txn, row.key())?;
                }
            }
        }
        debug!(entity = T::KIND, %parent, op = ?self.op, touched, "cascade step");
        Ok(())
    }
}

/// Sharings where the parent tenant is the source or the destination.
pub struct IdentitySharingDeleter<'t, 's> {
    txn: &'t WriteTxn<'s>,
    op: CascadeOp,
}

impl<'t, 's> IdentitySharingDeleter<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>, op: CascadeOp) -> Self {
        Self { txn, op }
    }
}

impl Deleter for IdentitySharingDeleter<'_, '_> {
    fn delete(&self, parent: Uuid) -> WardenResult<()> {
        let repo = IdentitySharingRepository::new(self.txn);
        let rows: BTreeMap<Uuid, Arc<IdentitySharing>> = repo
            .list_touching(parent, true)
            .into_iter()
            .map(|row| (row.uuid, row))
            .collect();
        for row in rows.values() {
            apply(&repo, &**row, self.op)?;
        }
        debug!(entity = IdentitySharing::KIND, %parent, op = ?self.op, "cascade step");
        Ok(())
    }
}

fn apply<T: Record>(
    repo: &Repository<'_, T, WriteTxn<'_>>,
    row: &T,
    op: CascadeOp,
) -> WardenResult<bool> {
    match op {
        CascadeOp::Archive(_) if row.is_archived() => Ok(false),
        CascadeOp::Archive(mark) => repo.archive(&row.key(), mark).map(|_| true),
        CascadeOp::Restore(mark) if row.archive_mark() == mark => {
            repo.restore(&row.key()).map(|_| true)
        }
        CascadeOp::Restore(_) => Ok(false),
        CascadeOp::Erase => repo.erase(&row.key()).map(|_| true),
    }
}

/// Removes every reference to a subject of one kind when that subject is
/// deleted on its own.
pub struct MemberStripper<'t, 's> {
    txn: &'t WriteTxn<'s>,
    kind: SubjectKind,
}

impl<'t, 's> MemberStripper<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>, kind: SubjectKind) -> Self {
        Self { txn, kind }
    }
}

impl Deleter for MemberStripper<'_, '_> {
    fn delete(&self, parent: Uuid) -> WardenResult<()> {
        strip_member(self.txn, self.kind, parent)
    }
}

/// An ordered chain of deleters.
#[derive(Default)]
pub struct Cascade<'a> {
    steps: Vec<Box<dyn Deleter + 'a>>,
}

impl<'a> Cascade<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn then(mut self, step: impl Deleter + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Runs every step in order, stopping at the first failure.
    pub fn run(&self, parent: Uuid) -> WardenResult<()> {
        for step in &self.steps {
            step.delete(parent)?;
        }
        Ok(())
    }
}

/// The children of a tenant, in the order they are processed.
pub fn tenant_cascade<'t, 's>(txn: &'t WriteTxn<'s>, op: CascadeOp) -> Cascade<'t> {
    Cascade::new()
        .then(ChildDeleter::<User>::new(txn, op).after_erase(strip_user))
        .then(ChildDeleter::<ServiceAccount>::new(txn, op).after_erase(strip_service_account))
        .then(ChildDeleter::<Group>::new(txn, op).after_erase(strip_group))
        .then(ChildDeleter::<RoleBinding>::new(txn, op))
        .then(ChildDeleter::<Project>::new(txn, op))
        .then(IdentitySharingDeleter::new(txn, op))
}

/// Tenant-level lifecycle operations.
pub struct TenantLifecycle<'t, 's> {
    txn: &'t WriteTxn<'s>,
}

impl<'t, 's> TenantLifecycle<'t, 's> {
    pub fn new(txn: &'t WriteTxn<'s>) -> Self {
        Self { txn }
    }

    /// Archives the tenant and every live child with one fresh mark.
    pub fn delete_tenant(&self, id: Uuid, origin: &Origin) -> WardenResult<ArchiveMark> {
        let tenants = TenantRepository::new(self.txn);
        let tenant = tenants.get_by_id(&id)?;
        if tenant.origin() != origin {
            return Err(WardenError::BadOrigin);
        }
        if tenant.is_archived() {
            return Err(WardenError::IsArchived);
        }

        let mark = new_archive_mark();
        tenant_cascade(self.txn, CascadeOp::Archive(mark)).run(id)?;
        tenants.archive(&id, mark)?;
        info!(tenant = %id, "tenant deleted");
        Ok(mark)
    }

    /// Restores the tenant and the children archived together with it.
    pub fn restore_tenant(&self, id: Uuid) -> WardenResult<Arc<Tenant>> {
        let tenants = TenantRepository::new(self.txn);
        let tenant = tenants.get_by_id(&id)?;
        if !tenant.is_archived() {
            return Err(WardenError::IsNotArchived);
        }

        tenant_cascade(self.txn, CascadeOp::Restore(tenant.archive)).run(id)?;
        let tenant = tenants.restore(&id)?;
        info!(tenant = %id, "tenant restored");
        Ok(tenant)
    }

    /// Physically removes an archived tenant and all of its children.
    pub fn erase_tenant(&self, id: Uuid) -> WardenResult<()> {
        let tenants = TenantRepository::new(self.txn);
        let tenant = tenants.get_by_id(&id)?;
        if !tenant.is_archived() {
            return Err(WardenError::IsNotArchived);
        }

        tenant_cascade(self.txn, CascadeOp::Erase).run(id)?;
        tenants.erase(&id)?;
        info!(tenant = %id, "tenant erased");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reference stripping
// ---------------------------------------------------------------------------

fn strip_ids(
    members: &mut Vec<MemberNotation>,
    ids: &mut Vec<Uuid>,
    kind: SubjectKind,
    id: Uuid,
) -> bool {
    let before = ids.len();
    ids.retain(|member| *member != id);
    members.retain(|m| !(m.uuid == id && m.kind == kind.as_str()));
    before != ids.len()
}

/// Removes every reference to a subject from groups, role bindings and,
/// for groups, identity sharings. Archived rows are cleaned too.
pub fn strip_member(txn: &WriteTxn<'_>, kind: SubjectKind, id: Uuid) -> WardenResult<()> {
    let groups = GroupRepository::new(txn);
    for row in groups.list_all(true) {
        let mut group = Group::clone(&row);
        let ids = match kind {
            SubjectKind::User => &mut group.users,
            SubjectKind::ServiceAccount => &mut group.service_accounts,
            SubjectKind::Group => &mut group.groups,
        };
        if strip_ids(&mut group.members, ids, kind, id) {
            group.resource_version = new_resource_version();
            groups.insert(group)?;
        }
    }

    let bindings = RoleBindingRepository::new(txn);
    for row in bindings.list_all(true) {
        let mut binding = RoleBinding::clone(&row);
        let ids = match kind {
            SubjectKind::User => &mut binding.users,
            SubjectKind::ServiceAccount => &mut binding.service_accounts,
            SubjectKind::Group => &mut binding.groups,
        };
        if strip_ids(&mut binding.members, ids, kind, id) {
            binding.resource_version = new_resource_version();
            bindings.insert(binding)?;
        }
    }

    if kind == SubjectKind::Group {
        let sharings = IdentitySharingRepository::new(txn);
        for row in sharings.find_sharing_group(id, true) {
            let mut sharing = IdentitySharing::clone(&row);
            sharing.groups.retain(|group| *group != id);
            sharing.resource_version = new_resource_version();
            sharings.insert(sharing)?;
        }
    }

    debug!(%kind, %id, "references stripped");
    Ok(())
}

/// Removes a project from the project lists of role bindings.
pub fn strip_project(txn: &WriteTxn<'_>, project: Uuid) -> WardenResult<()> {
    let bindings = RoleBindingRepository::new(txn);
    for row in bindings.list_all(true) {
        if row.projects.contains(&project) {
            let mut binding = RoleBinding::clone(&row);
            binding.projects.retain(|p| *p != project);
            binding.resource_version = new_resource_version();
            bindings.insert(binding)?;
        }
    }
    Ok(())
}

fn strip_user(txn: &WriteTxn<'_>, id: Uuid) -> WardenResult<()> {
    strip_member(txn, SubjectKind::User, id)
}

fn strip_service_account(txn: &WriteTxn<'_>, id: Uuid) -> WardenResult<()> {
    strip_member(txn, SubjectKind::ServiceAccount, id)
}

fn strip_group(txn: &WriteTxn<'_>, id: Uuid) -> WardenResult<()> {
    strip_member(txn, SubjectKind::Group, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_marks_are_live_and_distinct() {
        let a = new_archive_mark();
        let b = new_archive_mark();
        assert!(a.is_archived());
        assert_ne!(a.archiving_hash, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn strip_ids_removes_notation_of_matching_kind_only() {
        let id = Uuid::new_v4();
        let mut members = vec![MemberNotation::user(id), MemberNotation::group(id)];
        let mut users = vec![id];
        assert!(strip_ids(&mut members, &mut users, SubjectKind::User, id));
        assert!(users.is_empty());
        assert_eq!(members, vec![MemberNotation::group(id)]);
        assert!(!strip_ids(&mut members, &mut users, SubjectKind::User, id));
    }
}
