//! Warden Core: domain models, error taxonomy and the narrow informer
//! traits shared by the entity store and the role resolution engine.
//!
//! Nothing in this crate touches storage. The store crate implements the
//! traits in [`repository`] over a transaction snapshot; tests implement
//! them with in-memory fakes.

pub mod error;
pub mod graph;
pub mod models;
pub mod repository;
