//! Warden Authz: role resolution over the IAM entity graph, the entity
//! services that keep that graph consistent, and cascading lifecycle.

pub mod config;
pub mod lifecycle;
pub mod members;
pub mod resolver;
pub mod service;
pub mod sharing;

pub use config::ResolverConfig;
pub use lifecycle::{CascadeOp, Deleter, TenantLifecycle};
pub use members::MemberResolver;
pub use resolver::{EffectiveParams, RoleResolver, TxnRoleResolver};
