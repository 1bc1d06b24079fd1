//! Domain models for Warden.
//!
//! Every persisted entity carries a resource version, an origin and an
//! archive mark; see [`record`] for the shared pieces.

pub mod group;
pub mod identity_sharing;
pub mod member;
pub mod project;
pub mod record;
pub mod role;
pub mod role_binding;
pub mod service_account;
pub mod tenant;
pub mod user;
