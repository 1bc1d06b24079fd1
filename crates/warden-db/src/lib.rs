//! Warden Database: the in-memory entity store and repository
//! implementations.
//!
//! This crate provides:
//! - A snapshot-isolated store with a single serialized writer ([`MemoryStore`])
//! - Indexed tables and the index layout ([`table`], [`schema`])
//! - JSON snapshot export and import ([`Snapshot`])
//! - Repositories implementing the `warden-core` informer traits ([`repository`])

mod error;
pub mod repository;
pub mod schema;
mod snapshot;
mod store;
pub mod table;

pub use error::DbError;
pub use snapshot::Snapshot;
pub use store::{MemoryStore, ReadTxn, Tables, Txn, WriteTxn};
