//! Tenant archive, restore and erase cascades.

use pretty_assertions::assert_eq;
use uuid::Uuid;
use warden_authz::lifecycle::tenant_cascade;
use warden_authz::service::{
    GroupService, IdentitySharingService, ProjectService, RoleBindingService, RoleService,
    ServiceAccountService, TenantService, UserService,
};
use warden_authz::{CascadeOp, Deleter, ResolverConfig, RoleResolver};
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::group::Group;
use warden_core::models::identity_sharing::IdentitySharing;
use warden_core::models::member::{MemberNotation, Principal};
use warden_core::models::project::Project;
use warden_core::models::record::{Entity, Origin};
use warden_core::models::role::{Role, RoleScope};
use warden_core::models::role_binding::{BoundRole, RoleBinding};
use warden_core::models::{service_account::ServiceAccount, tenant::Tenant, user::User};
use warden_db::MemoryStore;

fn origin() -> Origin {
    Origin::new("iam")
}

/// One tenant with a child of every kind, plus a second tenant it shares
/// a group with.
struct World {
    store: MemoryStore,
    tenant: Uuid,
    other: Uuid,
    project: Uuid,
    user: Uuid,
    service_account: Uuid,
    group: Uuid,
    binding: Uuid,
    sharing: Uuid,
    /// A group of `other` nesting the shared group.
    foreign_group: Uuid,
}

fn setup() -> World {
    let store = MemoryStore::new();
    let txn = store.write_txn();
    let tenants = TenantService::new(&txn);
    let tenant = tenants.create(Tenant::new("acme", origin())).unwrap().uuid;
    let other = tenants.create(Tenant::new("globex", origin())).unwrap().uuid;
    let project = ProjectService::new(&txn)
        .create(Project::new(tenant, "web", origin()))
        .unwrap()
        .uuid;
    let user = UserService::new(&txn)
        .create(User::new(tenant, "jane", "jane@acme.io", origin()))
        .unwrap()
        .uuid;
    let service_account = ServiceAccountService::new(&txn)
        .create(ServiceAccount::new(tenant, "deploy", origin()))
        .unwrap()
        .uuid;
    let groups = GroupService::new(&txn);
    let group = groups
        .create(Group::new(
            tenant,
            "devs",
            vec![
                MemberNotation::user(user),
                MemberNotation::service_account(service_account),
            ],
            origin(),
        ))
        .unwrap()
        .uuid;
    let foreign_group = groups
        .create(Group::new(
            other,
            "partners",
            vec![MemberNotation::group(group)],
            origin(),
        ))
        .unwrap()
        .uuid;
    RoleService::new(&txn)
        .create(Role::new("ssh", RoleScope::Project, origin()))
        .unwrap();
    let mut rb = RoleBinding::new(tenant, vec![MemberNotation::group(group)], origin());
    rb.roles = vec![BoundRole::new("ssh")];
    rb.projects = vec![project];
    let binding = RoleBindingService::new(&txn).create(rb).unwrap().uuid;
    let sharing = IdentitySharingService::new(&txn)
        .create(IdentitySharing::new(tenant, other, vec![group], origin()))
        .unwrap()
        .uuid;
    txn.commit();

    World {
        store,
        tenant,
        other,
        project,
        user,
        service_account,
        group,
        binding,
        sharing,
        foreign_group,
    }
}

struct Failing;

impl Deleter for Failing {
    fn delete(&self, _: Uuid) -> WardenResult<()> {
        Err(WardenError::Internal("cascade step failed".into()))
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

#[test]
fn deleting_tenant_archives_every_child_with_one_mark() {
    let w = setup();
    let txn = w.store.write_txn();
    let mark = TenantService::new(&txn).delete(w.tenant, &origin()).unwrap();
    txn.commit();

    let txn = w.store.write_txn();
    assert!(UserService::new(&txn).list(w.tenant, false, false).unwrap().is_empty());
    assert!(GroupService::new(&txn).list(w.tenant, false, false).unwrap().is_empty());
    assert!(ProjectService::new(&txn).list(w.tenant, false).is_empty());

    let users = UserService::new(&txn).list(w.tenant, false, true).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].archive_mark(), mark);
    assert_eq!(
        ServiceAccountService::new(&txn)
            .get(w.tenant, w.service_account)
            .unwrap()
            .archive,
        mark
    );
    assert_eq!(
        RoleBindingService::new(&txn)
            .get(w.tenant, w.binding)
            .unwrap()
            .archive,
        mark
    );
    assert_eq!(
        IdentitySharingService::new(&txn)
            .get(w.tenant, w.sharing)
            .unwrap()
            .archive,
        mark
    );
    assert!(TenantService::new(&txn).get(w.tenant).unwrap().is_archived());
    // other tenants' rows are untouched
    assert!(!GroupService::new(&txn)
        .get(w.other, w.foreign_group)
        .unwrap()
        .is_archived());
    drop(txn);

    let read = w.store.read_txn();
    let (holds, _) = RoleResolver::for_txn(&read, ResolverConfig::default())
        .check_for_project_scoped_role(Principal::User(w.user), "ssh", w.tenant, w.project)
        .unwrap();
    assert!(!holds);
}

#[test]
fn deleting_archived_tenant_is_rejected() {
    let w = setup();
    let txn = w.store.write_txn();
    let tenants = TenantService::new(&txn);
    tenants.delete(w.tenant, &origin()).unwrap();
    assert!(matches!(
        tenants.delete(w.tenant, &origin()),
        Err(WardenError::IsArchived)
    ));
}

#[test]
fn deleting_with_foreign_origin_is_rejected() {
    let w = setup();
    let txn = w.store.write_txn();
    assert!(matches!(
        TenantService::new(&txn).delete(w.tenant, &Origin::new("other")),
        Err(WardenError::BadOrigin)
    ));
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

#[test]
fn restore_brings_back_only_rows_archived_with_the_tenant() {
    let w = setup();
    let txn = w.store.write_txn();
    let users = UserService::new(&txn);
    let earlier = users
        .create(User::new(w.tenant, "gone", "gone@acme.io", origin()))
        .unwrap()
        .uuid;
    let own_mark = users.delete(w.tenant, earlier, &origin()).unwrap().archive;

    let tenants = TenantService::new(&txn);
    let mark = tenants.delete(w.tenant, &origin()).unwrap();
    assert_ne!(mark, own_mark);
    tenants.restore(w.tenant).unwrap();
    txn.commit();

    let txn = w.store.write_txn();
    let users = UserService::new(&txn);
    assert!(!users.get(w.tenant, w.user).unwrap().is_archived());
    let still_gone = users.get(w.tenant, earlier).unwrap();
    assert_eq!(still_gone.archive, own_mark);
    assert!(!GroupService::new(&txn).get(w.tenant, w.group).unwrap().is_archived());
    assert!(!TenantService::new(&txn).get(w.tenant).unwrap().is_archived());
    drop(txn);

    let read = w.store.read_txn();
    let (holds, _) = RoleResolver::for_txn(&read, ResolverConfig::default())
        .check_for_project_scoped_role(Principal::User(w.user), "ssh", w.tenant, w.project)
        .unwrap();
    assert!(holds);
}

#[test]
fn restoring_live_tenant_is_rejected() {
    let w = setup();
    let txn = w.store.write_txn();
    assert!(matches!(
        TenantService::new(&txn).restore(w.tenant),
        Err(WardenError::IsNotArchived)
    ));
}

// ---------------------------------------------------------------------------
// Erase
// ---------------------------------------------------------------------------

#[test]
fn erase_requires_archived_tenant() {
    let w = setup();
    let txn = w.store.write_txn();
    assert!(matches!(
        TenantService::new(&txn).erase(w.tenant),
        Err(WardenError::IsNotArchived)
    ));
}

#[test]
fn erase_removes_children_and_foreign_references() {
    let w = setup();
    w.store
        .update(|txn| {
            let tenants = TenantService::new(txn);
            tenants.delete(w.tenant, &origin())?;
            tenants.erase(w.tenant)
        })
        .unwrap();

    let txn = w.store.write_txn();
    assert!(matches!(
        TenantService::new(&txn).get(w.tenant),
        Err(WardenError::NotFound { .. })
    ));
    assert!(UserService::new(&txn).list(w.tenant, false, true).unwrap().is_empty());
    assert!(ServiceAccountService::new(&txn).list(w.tenant, false, true).unwrap().is_empty());
    assert!(GroupService::new(&txn).list(w.tenant, false, true).unwrap().is_empty());
    assert!(RoleBindingService::new(&txn).list(w.tenant, true).is_empty());
    assert!(ProjectService::new(&txn).list(w.tenant, true).is_empty());
    assert!(IdentitySharingService::new(&txn)
        .list_for_destination(w.other, true)
        .is_empty());

    let partners = GroupService::new(&txn).get(w.other, w.foreign_group).unwrap();
    assert!(partners.groups.is_empty());
    assert!(partners.members.is_empty());
    // roles are global and survive
    assert!(RoleService::new(&txn).get("ssh").is_ok());
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[test]
fn failed_cascade_step_commits_nothing() {
    let w = setup();
    let result = w.store.update(|txn| {
        tenant_cascade(txn, CascadeOp::Archive(warden_authz::lifecycle::new_archive_mark()))
            .then(Failing)
            .run(w.tenant)
    });
    assert!(matches!(result, Err(WardenError::Internal(_))));

    let txn = w.store.write_txn();
    let users = UserService::new(&txn).list(w.tenant, false, false).unwrap();
    assert_eq!(users.len(), 1);
    assert!(!GroupService::new(&txn).get(w.tenant, w.group).unwrap().is_archived());
}

#[test]
fn dropped_transaction_discards_tenant_delete() {
    let w = setup();
    {
        let txn = w.store.write_txn();
        TenantService::new(&txn).delete(w.tenant, &origin()).unwrap();
        assert!(UserService::new(&txn).list(w.tenant, false, false).unwrap().is_empty());
    }

    let read = w.store.read_txn();
    let (holds, _) = RoleResolver::for_txn(&read, ResolverConfig::default())
        .check_for_project_scoped_role(Principal::User(w.user), "ssh", w.tenant, w.project)
        .unwrap();
    assert!(holds);
}
