//! Core data types for batch hostname resolution.
//!
//! This module defines the items that travel through the pipeline, the
//! result records written to the output file, the run configuration and the
//! report returned at the end of a run.

use crate::error::LookupError;
use crate::pipeline::Phase;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Marker written in place of an address when a hostname does not resolve.
pub const DEFAULT_NOT_FOUND_MARKER: &str = "NOT_FOUND";

/// Default number of slots in the shared hostname queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Upper bound for resolver threads, mirrors the CLI validation.
pub const MAX_RESOLVER_THREADS: usize = 100;

/// Upper bound for queue capacity.
pub const MAX_QUEUE_CAPACITY: usize = 100_000;

/// One hostname waiting in the queue, tagged with the input file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub hostname: String,
    pub source_file_index: usize,
}

impl WorkItem {
    pub fn new<H: Into<String>>(hostname: H, source_file_index: usize) -> Self {
        Self {
            hostname: hostname.into(),
            source_file_index,
        }
    }
}

/// Outcome of resolving a single hostname.
///
/// Every variant is terminal for that hostname: nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
    /// The hostname resolved to at least one address
    Resolved(Vec<IpAddr>),

    /// The resolver answered that the name does not exist
    Unresolved,

    /// The lookup failed (timeout, refused, backend error, ...)
    Error(String),
}

impl LookupStatus {
    /// Build a status from a list of addresses, empty meaning "not found".
    pub fn from_addrs(addrs: Vec<IpAddr>) -> Self {
        if addrs.is_empty() {
            Self::Unresolved
        } else {
            Self::Resolved(addrs)
        }
    }

    /// Build an error status from a lookup error.
    pub fn from_error(err: &LookupError) -> Self {
        Self::Error(err.to_string())
    }
}

/// Which address families are written for a resolved hostname.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4 and IPv6, in resolver order
    #[default]
    Any,

    /// Only IPv4 addresses
    V4,

    /// Only IPv6 addresses
    V6,
}

impl AddressFamily {
    pub fn matches(&self, addr: &IpAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }
}

impl FromStr for AddressFamily {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" => Ok(AddressFamily::Any),
            "v4" | "ipv4" | "4" => Ok(AddressFamily::V4),
            "v6" | "ipv6" | "6" => Ok(AddressFamily::V6),
            other => Err(LookupError::config(format!(
                "Invalid address family '{}'. Use any, v4 or v6",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::Any => write!(f, "any"),
            AddressFamily::V4 => write!(f, "v4"),
            AddressFamily::V6 => write!(f, "v6"),
        }
    }
}

/// A hostname together with its lookup outcome, written exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub hostname: String,
    pub status: LookupStatus,
}

impl ResultRecord {
    pub fn new(hostname: String, status: LookupStatus) -> Self {
        Self { hostname, status }
    }

    /// Render the record as one complete `<hostname>,<result>` line.
    ///
    /// The returned string always ends with a newline so a single write
    /// appends exactly one record.
    pub fn format_line(&self, config: &LookupConfig) -> String {
        let result = match &self.status {
            LookupStatus::Resolved(addrs) => {
                let mut matching = addrs.iter().filter(|a| config.address_family.matches(a));
                if config.all_addresses {
                    let joined = matching.map(|a| a.to_string()).collect::<Vec<_>>().join(",");
                    if joined.is_empty() {
                        config.not_found_marker.clone()
                    } else {
                        joined
                    }
                } else {
                    match matching.next() {
                        Some(addr) => addr.to_string(),
                        None => config.not_found_marker.clone(),
                    }
                }
            }
            LookupStatus::Unresolved | LookupStatus::Error(_) => config.not_found_marker.clone(),
        };

        format!("{},{}\n", self.hostname, result)
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Number of resolver worker threads
    /// Default: available parallelism, Range: 1-100
    pub resolver_threads: usize,

    /// Number of slots in the shared queue
    /// Default: 10, Range: 1-100000
    pub queue_capacity: usize,

    /// Deadline for a single lookup
    /// Default: 5 seconds
    pub timeout: Duration,

    /// Written instead of an address for hostnames that do not resolve
    pub not_found_marker: String,

    /// Write every address instead of the first one
    pub all_addresses: bool,

    /// Address families to keep when formatting results
    pub address_family: AddressFamily,

    /// Append to an existing output file instead of truncating it
    pub append: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, MAX_RESOLVER_THREADS);

        Self {
            resolver_threads: threads,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout: Duration::from_secs(5),
            not_found_marker: DEFAULT_NOT_FOUND_MARKER.to_string(),
            all_addresses: false,
            address_family: AddressFamily::Any,
            append: false,
        }
    }
}

impl LookupConfig {
    /// Set the number of resolver threads.
    pub fn with_resolver_threads(mut self, threads: usize) -> Self {
        self.resolver_threads = threads;
        self
    }

    /// Set the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the per-lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the not-found marker.
    pub fn with_not_found_marker<M: Into<String>>(mut self, marker: M) -> Self {
        self.not_found_marker = marker.into();
        self
    }

    /// Write all addresses for each hostname.
    pub fn with_all_addresses(mut self, enabled: bool) -> Self {
        self.all_addresses = enabled;
        self
    }

    /// Restrict the written addresses to one family.
    pub fn with_address_family(mut self, family: AddressFamily) -> Self {
        self.address_family = family;
        self
    }

    /// Append to the output file instead of truncating it.
    pub fn with_append(mut self, enabled: bool) -> Self {
        self.append = enabled;
        self
    }

    /// Check every constraint a run depends on.
    ///
    /// A zero capacity or zero resolver count would deadlock the pipeline,
    /// so both are rejected here before any thread starts.
    pub fn validate(&self) -> Result<(), LookupError> {
        if self.resolver_threads == 0 || self.resolver_threads > MAX_RESOLVER_THREADS {
            return Err(LookupError::config(format!(
                "Resolver threads must be between 1 and {}",
                MAX_RESOLVER_THREADS
            )));
        }

        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(LookupError::config(format!(
                "Queue capacity must be between 1 and {}",
                MAX_QUEUE_CAPACITY
            )));
        }

        if self.timeout.is_zero() {
            return Err(LookupError::config("Timeout must be greater than zero"));
        }

        if self.not_found_marker.is_empty()
            || self.not_found_marker.contains(',')
            || self.not_found_marker.contains('\n')
        {
            return Err(LookupError::config(
                "Not-found marker must be non-empty and contain no commas or newlines",
            ));
        }

        Ok(())
    }
}

/// Counters describing one finished run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    /// Input files handed to the run
    pub input_files: usize,

    /// Paths of input files that could not be opened or fully read
    pub failed_inputs: Vec<String>,

    /// Hostnames pushed into the queue by all requesters
    pub enqueued: u64,

    /// Hostnames that resolved to at least one address
    pub resolved: u64,

    /// Hostnames the resolver reported as nonexistent
    pub unresolved: u64,

    /// Hostnames whose lookup failed
    pub errors: u64,

    /// Records successfully appended to the output
    pub written: u64,

    /// Records whose append failed
    pub write_failures: u64,

    /// Resolver threads that actually ran
    pub resolver_threads: usize,

    /// Largest queue length observed during the run
    pub queue_high_water: usize,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,

    /// Pipeline phases the run went through, in order
    pub phases: Vec<Phase>,
}

impl RunReport {
    /// Hostnames that went through a resolver, whatever the outcome.
    pub fn processed(&self) -> u64 {
        self.resolved + self.unresolved + self.errors
    }

    /// Last phase the run reached; `Terminated` once the output is closed.
    pub fn final_phase(&self) -> Option<Phase> {
        self.phases.last().copied()
    }
}
