//! Typed tables with secondary indexes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::Arc;

use warden_core::models::record::Entity;

use crate::error::DbError;
use crate::store::Tables;

/// An entity that can be stored in a [`Table`].
pub trait Record: Entity + Send + Sync + 'static {
    type Key: Ord + Clone + Display + Send + Sync + 'static;

    /// Indexes on which no two rows may share a value.
    const UNIQUE_INDEXES: &'static [&'static str] = &[];

    fn key(&self) -> Self::Key;

    /// `(index name, value)` pairs under which this row is reachable.
    /// A row may appear several times in one multi-valued index.
    fn index_entries(&self) -> Vec<(&'static str, String)>;

    fn table(tables: &Tables) -> &Table<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

type Index<K> = BTreeMap<String, BTreeSet<K>>;

pub struct Table<T: Record> {
    rows: BTreeMap<T::Key, Arc<T>>,
    indexes: BTreeMap<&'static str, Index<T::Key>>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            indexes: BTreeMap::new(),
        }
    }
}

impl<T: Record> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            indexes: self.indexes.clone(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &T::Key) -> Option<Arc<T>> {
        self.rows.get(key).cloned()
    }

    /// All rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.rows.values()
    }

    /// Rows indexed under `value` in `index`, in key order.
    pub fn lookup<'a>(
        &'a self,
        index: &str,
        value: &str,
    ) -> impl Iterator<Item = &'a Arc<T>> + use<'a, T> {
        self.indexes
            .get(index)
            .and_then(|idx| idx.get(value))
            .into_iter()
            .flatten()
            .filter_map(|key| self.rows.get(key))
    }

    /// Inserts or replaces the row with the same key, returning the
    /// previous row.
    pub fn insert(&mut self, record: T) -> Result<Option<Arc<T>>, DbError> {
        let key = record.key();
        let entries = record.index_entries();

        for (index, value) in &entries {
            if !T::UNIQUE_INDEXES.contains(index) {
                continue;
            }
            let taken = self
                .indexes
                .get(index)
                .and_then(|idx| idx.get(value))
                .is_some_and(|keys| keys.iter().any(|k| *k != key));
            if taken {
                return Err(DbError::UniqueViolation {
                    entity: T::KIND.to_string(),
                    index: (*index).to_string(),
                    value: value.replace('\0', "/"),
                });
            }
        }

        let previous = self.remove(&key);
        for (index, value) in entries {
            self.indexes
                .entry(index)
                .or_default()
                .entry(value)
                .or_default()
                .insert(key.clone());
        }
        self.rows.insert(key, Arc::new(record));
        Ok(previous)
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<Arc<T>> {
        let previous = self.rows.remove(key)?;
        for (index, value) in previous.index_entries() {
            if let Some(idx) = self.indexes.get_mut(index) {
                if let Some(keys) = idx.get_mut(&value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        idx.remove(&value);
                    }
                }
            }
        }
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use warden_core::models::member::MemberNotation;
    use warden_core::models::record::Origin;
    use warden_core::models::{group::Group, tenant::Tenant};

    use super::*;
    use crate::schema::{IDENTIFIER_INDEX, USER_MEMBER_INDEX, compound};

    fn group(tenant: Uuid, identifier: &str, users: Vec<Uuid>) -> Group {
        let mut g = Group::new(tenant, identifier, Vec::<MemberNotation>::new(), Origin::new("iam"));
        g.users = users;
        g
    }

    #[test]
    fn replacing_a_row_moves_its_index_entries() {
        let tenant = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut table = Table::<Group>::default();

        let mut g = group(tenant, "admins", vec![u1]);
        table.insert(g.clone()).unwrap();
        assert_eq!(table.lookup(USER_MEMBER_INDEX, &compound(tenant, u1)).count(), 1);

        g.users = vec![u2];
        let previous = table.insert(g).unwrap();
        assert!(previous.is_some());
        assert_eq!(table.lookup(USER_MEMBER_INDEX, &compound(tenant, u1)).count(), 0);
        assert_eq!(table.lookup(USER_MEMBER_INDEX, &compound(tenant, u2)).count(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unique_index_rejects_second_owner() {
        let mut table = Table::<Tenant>::default();
        table.insert(Tenant::new("acme", Origin::new("iam"))).unwrap();

        let err = table
            .insert(Tenant::new("ACME", Origin::new("iam")))
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref index, .. } if index == IDENTIFIER_INDEX));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_clears_every_index() {
        let tenant = Uuid::new_v4();
        let user = Uuid::new_v4();
        let mut table = Table::<Group>::default();
        let g = group(tenant, "ops", vec![user]);
        let key = g.uuid;
        table.insert(g).unwrap();

        assert!(table.remove(&key).is_some());
        assert!(table.is_empty());
        assert_eq!(table.lookup(USER_MEMBER_INDEX, &compound(tenant, user)).count(), 0);
        // identifier is free again
        table.insert(group(tenant, "ops", vec![])).unwrap();
    }
}
