//! Member notation resolution for groups and role bindings.

use std::collections::BTreeSet;

use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::member::{MemberNotation, Members, SubjectKind};
use warden_core::models::{group::Group, service_account::ServiceAccount, user::User};
use warden_db::Txn;
use warden_db::repository::Repository;
use warden_db::table::Record;

/// Turns `{type, uuid}` notations into typed id lists.
pub struct MemberResolver<'t, X> {
    txn: &'t X,
}

impl<'t, X: Txn> MemberResolver<'t, X> {
    pub fn new(txn: &'t X) -> Self {
        Self { txn }
    }

    /// Resolves `notations` in order.
    ///
    /// Every referenced entity must exist and be live. A repeated id is
    /// kept once, at its first position.
    pub fn resolve(&self, notations: &[MemberNotation]) -> WardenResult<Members> {
        let mut members = Members::default();
        let mut seen: BTreeSet<(SubjectKind, Uuid)> = BTreeSet::new();

        for notation in notations {
            let kind = notation.subject_kind()?;
            if !seen.insert((kind, notation.uuid)) {
                continue;
            }
            match kind {
                SubjectKind::User => {
                    self.require_live::<User>(notation.uuid)?;
                    members.users.push(notation.uuid);
                }
                SubjectKind::ServiceAccount => {
                    self.require_live::<ServiceAccount>(notation.uuid)?;
                    members.service_accounts.push(notation.uuid);
                }
                SubjectKind::Group => {
                    self.require_live::<Group>(notation.uuid)?;
                    members.groups.push(notation.uuid);
                }
            }
        }

        Ok(members)
    }

    fn require_live<T: Record<Key = Uuid>>(&self, id: Uuid) -> WardenResult<()> {
        let row = Repository::<T, X>::new(self.txn).get_by_id(&id)?;
        if row.is_archived() {
            return Err(WardenError::IsArchived);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use warden_core::models::record::{ArchiveMark, Origin};
    use warden_core::models::tenant::Tenant;
    use warden_db::MemoryStore;

    use super::*;

    fn fixture() -> (MemoryStore, Uuid, Uuid, Uuid) {
        let store = MemoryStore::new();
        let txn = store.write_txn();
        let tenant = txn
            .insert(Tenant::new("acme", Origin::new("iam")))
            .unwrap()
            .uuid;
        let user = txn
            .insert(User::new(tenant, "alice", "alice@acme.io", Origin::new("iam")))
            .unwrap()
            .uuid;
        let sa = txn
            .insert(ServiceAccount::new(tenant, "ci", Origin::new("iam")))
            .unwrap()
            .uuid;
        let group = txn
            .insert(Group::new(tenant, "devs", Vec::new(), Origin::new("iam")))
            .unwrap()
            .uuid;
        txn.commit();
        (store, user, sa, group)
    }

    #[test]
    fn splits_by_kind_and_drops_duplicates() {
        let (store, user, sa, group) = fixture();
        let txn = store.read_txn();
        let members = MemberResolver::new(&txn)
            .resolve(&[
                MemberNotation::group(group),
                MemberNotation::user(user),
                MemberNotation::service_account(sa),
                MemberNotation::user(user),
            ])
            .unwrap();
        assert_eq!(
            members,
            Members {
                users: vec![user],
                service_accounts: vec![sa],
                groups: vec![group],
            }
        );
    }

    #[test]
    fn missing_member_is_not_found() {
        let (store, user, _, _) = fixture();
        let txn = store.read_txn();
        // a user id used as a group reference does not resolve
        let err = MemberResolver::new(&txn)
            .resolve(&[MemberNotation::group(user)])
            .unwrap_err();
        assert!(matches!(err, WardenError::NotFound { ref entity, .. } if entity == "group"));
    }

    #[test]
    fn unknown_kind_is_malformed() {
        let (store, user, _, _) = fixture();
        let txn = store.read_txn();
        let err = MemberResolver::new(&txn)
            .resolve(&[MemberNotation {
                kind: "robot".into(),
                uuid: user,
            }])
            .unwrap_err();
        assert!(matches!(err, WardenError::MalformedMember(_)));
    }

    #[test]
    fn archived_member_is_rejected() {
        let (store, user, _, _) = fixture();
        let txn = store.write_txn();
        warden_db::repository::UserRepository::new(&txn)
            .archive(&user, ArchiveMark::new(1, 1))
            .unwrap();
        let err = MemberResolver::new(&txn)
            .resolve(&[MemberNotation::user(user)])
            .unwrap_err();
        assert!(matches!(err, WardenError::IsArchived));
    }
}
