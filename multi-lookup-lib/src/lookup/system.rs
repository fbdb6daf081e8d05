//! System DNS resolver.
//!
//! Lookups go through `tokio::net::lookup_host`, which runs `getaddrinfo`
//! on the runtime's blocking pool, and are bounded by `tokio::time::timeout`.
//! Resolver worker threads call in synchronously through
//! [`Handle::block_on`], so a slow lookup only stalls the thread waiting
//! for it.

use super::Resolve;
use crate::error::LookupError;
use crate::types::{LookupConfig, LookupStatus};
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use tokio::runtime::Handle;

/// Resolver backed by the operating system's name service.
///
/// The handle must belong to a multi-thread runtime that stays alive for
/// as long as the resolver is used, and [`resolve`](Resolve::resolve) must
/// not be called from inside that runtime's async context.
#[derive(Clone, Debug)]
pub struct SystemResolver {
    handle: Handle,
    timeout: Duration,
}

impl SystemResolver {
    /// Create a resolver with a custom per-lookup timeout.
    pub fn new(handle: Handle, timeout: Duration) -> Self {
        Self { handle, timeout }
    }

    /// Create a resolver using the timeout from a run configuration.
    pub fn from_config(handle: Handle, config: &LookupConfig) -> Self {
        Self::new(handle, config.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lookup(&self, hostname: &str) -> Result<Vec<IpAddr>, LookupError> {
        let query = (hostname.to_string(), 0u16);
        let outcome = self
            .handle
            .block_on(async { tokio::time::timeout(self.timeout, tokio::net::lookup_host(query)).await });

        match outcome {
            Err(_) => Err(LookupError::timeout(hostname, self.timeout)),
            Ok(Err(e)) if is_not_found(&e) => Ok(Vec::new()),
            Ok(Err(e)) => Err(LookupError::resolution(hostname, e.to_string())),
            Ok(Ok(addrs)) => {
                let mut ips: Vec<IpAddr> = Vec::new();
                for addr in addrs {
                    if !ips.contains(&addr.ip()) {
                        ips.push(addr.ip());
                    }
                }
                Ok(ips)
            }
        }
    }
}

impl Resolve for SystemResolver {
    fn resolve(&self, hostname: &str) -> LookupStatus {
        // Literals never need a query
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return LookupStatus::Resolved(vec![ip]);
        }

        match self.lookup(hostname) {
            Ok(ips) => {
                tracing::debug!(hostname, count = ips.len(), "lookup complete");
                LookupStatus::from_addrs(ips)
            }
            Err(e) => {
                tracing::debug!(hostname, error = %e, "lookup failed");
                LookupStatus::from_error(&e)
            }
        }
    }
}

/// Whether a resolver error means "this name does not exist".
///
/// `getaddrinfo` failures come back as uncategorized I/O errors, so the
/// message is the only thing that tells NXDOMAIN apart from a broken
/// network.
pub(crate) fn is_not_found(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }

    let msg = err.to_string().to_lowercase();
    msg.contains("not known")
        || msg.contains("no address associated")
        || msg.contains("nodename nor servname")
        || msg.contains("no such host")
        || msg.contains("host not found")
        || msg.contains("nxdomain")
}
