//! Resolver workers: drain the queue, resolve, append results.

use crate::lookup::Resolve;
use crate::output::OutputWriter;
use crate::queue::BoundedQueue;
use crate::types::{LookupConfig, LookupStatus, ResultRecord, WorkItem};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

/// Per-worker tallies, summed by the coordinator after join.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolverStats {
    pub resolved: u64,
    pub unresolved: u64,
    pub errors: u64,
    pub written: u64,
    pub write_failures: u64,
}

impl ResolverStats {
    pub fn merge(&mut self, other: ResolverStats) {
        self.resolved += other.resolved;
        self.unresolved += other.unresolved;
        self.errors += other.errors;
        self.written += other.written;
        self.write_failures += other.write_failures;
    }
}

/// Loop until the queue reports shutdown-and-empty.
///
/// A failed lookup or a failed append never ends the loop.
pub(crate) fn run<W: Write>(
    id: usize,
    queue: &BoundedQueue<WorkItem>,
    resolver: &dyn Resolve,
    writer: &OutputWriter<W>,
    config: &LookupConfig,
) -> ResolverStats {
    let mut stats = ResolverStats::default();

    while let Some(item) = queue.dequeue() {
        let status = resolve_once(resolver, &item.hostname);

        match &status {
            LookupStatus::Resolved(_) => stats.resolved += 1,
            LookupStatus::Unresolved => stats.unresolved += 1,
            LookupStatus::Error(reason) => {
                tracing::warn!(hostname = %item.hostname, reason = %reason, "lookup failed");
                stats.errors += 1;
            }
        }

        let record = ResultRecord::new(item.hostname, status);
        match writer.write_record(&record, config) {
            Ok(()) => stats.written += 1,
            Err(e) => {
                tracing::error!(hostname = %record.hostname, error = %e, "failed to append result");
                stats.write_failures += 1;
            }
        }
    }

    tracing::debug!(resolver = id, processed = stats.written + stats.write_failures, "resolver finished");
    stats
}

/// Call the backend once, turning a panic into an error outcome.
fn resolve_once(resolver: &dyn Resolve, hostname: &str) -> LookupStatus {
    match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(hostname))) {
        Ok(status) => status,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "resolver panicked".to_string());
            LookupStatus::Error(format!("resolver panicked: {}", reason))
        }
    }
}
