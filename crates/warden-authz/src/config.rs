//! Resolution configuration.

/// Configuration for the role resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Ignore bindings whose non-zero `valid_till` is not after the current
    /// UTC time (default: false).
    pub skip_expired_bindings: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            skip_expired_bindings: false,
        }
    }
}
