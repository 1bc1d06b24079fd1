//! Table layout: primary keys and secondary indexes of every entity.
//!
//! Index values are strings. Tenant-scoped relations use [`compound`] keys
//! so one lookup never crosses a tenant boundary.

use std::fmt::Display;

use uuid::Uuid;
use warden_core::models::{
    group::Group, identity_sharing::IdentitySharing, project::Project, role::Role,
    role_binding::RoleBinding, service_account::ServiceAccount, tenant::Tenant, user::User,
};

use crate::store::Tables;
use crate::table::{Record, Table};

/// Owning tenant of a tenant-scoped row (source tenant for sharings).
pub const TENANT_INDEX: &str = "tenant";
pub const IDENTIFIER_INDEX: &str = "identifier";
pub const EMAIL_INDEX: &str = "email";
pub const USER_MEMBER_INDEX: &str = "user";
pub const SERVICE_ACCOUNT_MEMBER_INDEX: &str = "service_account";
pub const GROUP_MEMBER_INDEX: &str = "group";
pub const INCLUDED_ROLE_INDEX: &str = "included_role";
pub const PROJECT_INDEX: &str = "project";
pub const ROLE_INDEX: &str = "role";
pub const DESTINATION_TENANT_INDEX: &str = "destination_tenant";
/// Sharings by shared group, across tenants.
pub const SHARED_GROUP_INDEX: &str = "shared_group";

/// Joins a tenant and a second component into one index value.
pub fn compound(tenant: Uuid, value: impl Display) -> String {
    format!("{tenant}\0{value}")
}

fn tenant_key(tenant: Uuid) -> String {
    tenant.to_string()
}

fn member_entries(
    tenant: Uuid,
    users: &[Uuid],
    service_accounts: &[Uuid],
    groups: &[Uuid],
) -> Vec<(&'static str, String)> {
    let users = users
        .iter()
        .map(|id| (USER_MEMBER_INDEX, compound(tenant, id)));
    let service_accounts = service_accounts
        .iter()
        .map(|id| (SERVICE_ACCOUNT_MEMBER_INDEX, compound(tenant, id)));
    let groups = groups
        .iter()
        .map(|id| (GROUP_MEMBER_INDEX, compound(tenant, id)));
    users.chain(service_accounts).chain(groups).collect()
}

macro_rules! table_accessors {
    ($field:ident) => {
        fn table(tables: &Tables) -> &Table<Self> {
            &tables.$field
        }

        fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
            &mut tables.$field
        }
    };
}

impl Record for Tenant {
    type Key = Uuid;
    const UNIQUE_INDEXES: &'static [&'static str] = &[IDENTIFIER_INDEX];

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![(IDENTIFIER_INDEX, self.identifier.to_lowercase())]
    }

    table_accessors!(tenants);
}

impl Record for Project {
    type Key = Uuid;
    const UNIQUE_INDEXES: &'static [&'static str] = &[IDENTIFIER_INDEX];

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (TENANT_INDEX, tenant_key(self.tenant_uuid)),
            (
                IDENTIFIER_INDEX,
                compound(self.tenant_uuid, self.identifier.to_lowercase()),
            ),
        ]
    }

    table_accessors!(projects);
}

impl Record for User {
    type Key = Uuid;
    const UNIQUE_INDEXES: &'static [&'static str] = &[EMAIL_INDEX];

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (TENANT_INDEX, tenant_key(self.tenant_uuid)),
            (
                IDENTIFIER_INDEX,
                compound(self.tenant_uuid, self.identifier.to_lowercase()),
            ),
            (
                EMAIL_INDEX,
                compound(self.tenant_uuid, self.email.to_lowercase()),
            ),
        ]
    }

    table_accessors!(users);
}

impl Record for ServiceAccount {
    type Key = Uuid;
    const UNIQUE_INDEXES: &'static [&'static str] = &[IDENTIFIER_INDEX];

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (TENANT_INDEX, tenant_key(self.tenant_uuid)),
            (
                IDENTIFIER_INDEX,
                compound(self.tenant_uuid, self.identifier.to_lowercase()),
            ),
        ]
    }

    table_accessors!(service_accounts);
}

impl Record for Group {
    type Key = Uuid;
    const UNIQUE_INDEXES: &'static [&'static str] = &[IDENTIFIER_INDEX];

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (TENANT_INDEX, tenant_key(self.tenant_uuid)),
            (
                IDENTIFIER_INDEX,
                compound(self.tenant_uuid, self.identifier.to_lowercase()),
            ),
        ];
        entries.extend(member_entries(
            self.tenant_uuid,
            &self.users,
            &self.service_accounts,
            &self.groups,
        ));
        entries
    }

    table_accessors!(groups);
}

impl Record for Role {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        self.included_roles
            .iter()
            .map(|included| (INCLUDED_ROLE_INDEX, included.name.clone()))
            .collect()
    }

    table_accessors!(roles);
}

impl Record for RoleBinding {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let tenant = self.tenant_uuid;
        let mut entries = vec![(TENANT_INDEX, tenant_key(tenant))];
        entries.extend(member_entries(
            tenant,
            &self.users,
            &self.service_accounts,
            &self.groups,
        ));
        entries.extend(
            self.projects
                .iter()
                .map(|id| (PROJECT_INDEX, compound(tenant, id))),
        );
        entries.extend(
            self.roles
                .iter()
                .map(|role| (ROLE_INDEX, compound(tenant, &role.name))),
        );
        entries
    }

    table_accessors!(role_bindings);
}

impl Record for IdentitySharing {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (TENANT_INDEX, tenant_key(self.source_tenant_uuid)),
            (
                DESTINATION_TENANT_INDEX,
                tenant_key(self.destination_tenant_uuid),
            ),
        ];
        entries.extend(
            self.groups
                .iter()
                .map(|id| (SHARED_GROUP_INDEX, id.to_string())),
        );
        entries
    }

    table_accessors!(identity_sharings);
}
