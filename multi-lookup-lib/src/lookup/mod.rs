//! Resolution backends.
//!
//! The pipeline treats name resolution as a black box behind the
//! [`Resolve`] trait. The system backend asks the operating system
//! resolver; tests and embedders can plug in any closure.

/// Operating system resolver with per-lookup timeouts
pub mod system;

pub use system::SystemResolver;

use crate::types::LookupStatus;

/// A blocking hostname → address lookup.
///
/// Called from resolver worker threads, possibly many at once, so
/// implementations must be thread-safe. Every call is a single attempt.
pub trait Resolve: Send + Sync {
    fn resolve(&self, hostname: &str) -> LookupStatus;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> LookupStatus + Send + Sync,
{
    fn resolve(&self, hostname: &str) -> LookupStatus {
        self(hostname)
    }
}
