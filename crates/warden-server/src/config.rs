//! Process configuration.

use std::path::PathBuf;

use clap::Args;
use warden_authz::ResolverConfig;

const DEFAULT_LOG_FILTER: &str = "warden=info";

/// Settings shared by every query. Each flag can also be given through the
/// environment.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// `tracing` filter directive.
    #[arg(long = "log", env = "WARDEN_LOG", default_value = DEFAULT_LOG_FILTER, global = true)]
    pub log_filter: String,

    /// JSON store snapshot loaded at startup. The store starts empty
    /// without one.
    #[arg(long = "snapshot", env = "WARDEN_SNAPSHOT", global = true)]
    pub snapshot_path: Option<PathBuf>,

    /// Ignore role bindings whose validity has ended.
    #[arg(long, env = "WARDEN_SKIP_EXPIRED", global = true)]
    pub skip_expired: bool,
}

impl ServerConfig {
    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            skip_expired_bindings: self.skip_expired,
        }
    }
}
