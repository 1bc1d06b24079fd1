//! Role queries accepted on the command line.

use clap::{Subcommand, ValueEnum};
use serde_json::{Value, json};
use uuid::Uuid;
use warden_authz::{ResolverConfig, RoleResolver};
use warden_core::models::member::Principal;
use warden_db::Txn;

use crate::error::ServerError;

/// Kind of subject a query is asked about. Groups are not principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrincipalKind {
    User,
    #[value(name = "service_account")]
    ServiceAccount,
}

impl PrincipalKind {
    pub fn principal(self, id: Uuid) -> Principal {
        match self {
            Self::User => Principal::User(id),
            Self::ServiceAccount => Principal::ServiceAccount(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Query {
    /// Whether a subject holds a role in a tenant, or in one of its
    /// projects when a project is given.
    Check {
        kind: PrincipalKind,
        subject: Uuid,
        role: String,
        tenant: Uuid,
        project: Option<Uuid>,
    },
    /// Users and service accounts holding a role.
    Members {
        role: String,
        tenant: Uuid,
        project: Option<Uuid>,
    },
    /// Whether a group, or a group containing it, holds a role.
    Group { group: Uuid, role: String },
    /// Whether a subject is shared into a foreign tenant.
    Shared {
        kind: PrincipalKind,
        subject: Uuid,
        tenant: Uuid,
    },
}

impl Query {
    /// Runs the query against one snapshot of the store.
    pub fn run(&self, txn: &impl Txn, config: ResolverConfig) -> Result<Value, ServerError> {
        let resolver = RoleResolver::for_txn(txn, config);
        let answer = match self {
            Self::Check {
                kind,
                subject,
                role,
                tenant,
                project,
            } => {
                let principal = kind.principal(*subject);
                let (holds, params) = match project {
                    Some(project) => resolver
                        .check_for_project_scoped_role(principal, role, *tenant, *project)?,
                    None => resolver.check_for_tenant_scoped_role(principal, role, *tenant)?,
                };
                json!({ "has_role": holds, "params": params })
            }
            Self::Members {
                role,
                tenant,
                project,
            } => {
                let (users, service_accounts) = match project {
                    Some(project) => {
                        resolver.find_members_with_project_scoped_role(role, *tenant, *project)?
                    }
                    None => resolver.find_members_with_tenant_scoped_role(role, *tenant)?,
                };
                json!({ "users": users, "service_accounts": service_accounts })
            }
            Self::Group { group, role } => {
                json!({ "has_role": resolver.check_group_for_role(*group, role)? })
            }
            Self::Shared {
                kind,
                subject,
                tenant,
            } => {
                let principal = kind.principal(*subject);
                json!({ "shared": resolver.is_shared_with_tenant(principal, *tenant)? })
            }
        };
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use warden_core::models::member::MemberNotation;
    use warden_core::models::record::Origin;
    use warden_core::models::role::{Role, RoleScope};
    use warden_core::models::role_binding::{BoundRole, RoleBinding};
    use warden_core::models::{tenant::Tenant, user::User};
    use warden_db::MemoryStore;

    use super::*;

    #[test]
    fn check_answers_with_params() {
        let store = MemoryStore::new();
        let txn = store.write_txn();
        let tenant = txn.insert(Tenant::new("acme", Origin::new("iam"))).unwrap();
        let user = txn
            .insert(User::new(tenant.uuid, "jane", "jane@acme.io", Origin::new("iam")))
            .unwrap();
        txn.insert(Role::new("viewer", RoleScope::Tenant, Origin::new("iam")))
            .unwrap();
        let mut rb = RoleBinding::new(
            tenant.uuid,
            vec![MemberNotation::user(user.uuid)],
            Origin::new("iam"),
        );
        rb.users = vec![user.uuid];
        rb.roles = vec![BoundRole::new("viewer")];
        rb.valid_till = 42;
        txn.insert(rb).unwrap();
        txn.commit();

        let query = Query::Check {
            kind: PrincipalKind::User,
            subject: user.uuid,
            role: "viewer".into(),
            tenant: tenant.uuid,
            project: None,
        };
        let read = store.read_txn();
        let answer = query.run(&read, ResolverConfig::default()).unwrap();
        assert_eq!(answer["has_role"], true);
        assert_eq!(answer["params"]["valid_till"], 42);

        let members = Query::Members {
            role: "viewer".into(),
            tenant: tenant.uuid,
            project: None,
        }
        .run(&read, ResolverConfig::default())
        .unwrap();
        assert_eq!(members["users"], json!([user.uuid]));
        assert_eq!(members["service_accounts"], json!([]));
    }

    #[test]
    fn unknown_subject_is_an_error() {
        let store = MemoryStore::new();
        let query = Query::Shared {
            kind: PrincipalKind::ServiceAccount,
            subject: Uuid::new_v4(),
            tenant: Uuid::new_v4(),
        };
        assert!(matches!(
            query.run(&store.read_txn(), ResolverConfig::default()),
            Err(ServerError::Warden(_))
        ));
    }
}
