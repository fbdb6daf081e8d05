//! # Multi Lookup Library
//!
//! Resolve large batches of hostnames with a bounded producer/consumer
//! pipeline: one requester thread per input file feeds a fixed-capacity
//! queue, a pool of resolver threads drains it and appends
//! `<hostname>,<result>` lines to a single shared output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multi_lookup_lib::{LookupConfig, Pipeline, SystemResolver};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LookupConfig::default().with_resolver_threads(8);
//!     let resolver = SystemResolver::from_config(tokio::runtime::Handle::current(), &config);
//!     let pipeline = Pipeline::new(config, resolver)?;
//!
//!     let report = tokio::task::spawn_blocking(move || {
//!         pipeline.run_to_path(&["names1.txt", "names2.txt"], "results.txt")
//!     })
//!     .await??;
//!
//!     println!("{} hostnames resolved", report.resolved);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Backpressure**: requesters block while the queue is full
//! - **Clean shutdown**: resolvers exit once every requester is done and the
//!   queue has drained
//! - **Serialized output**: every record is one uninterrupted line
//! - **Pluggable resolution**: anything implementing [`Resolve`], closures
//!   included

// Re-export main public API types and functions
pub use config::{
    load_env_config, parse_duration, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    OutputConfig,
};
pub use error::LookupError;
pub use lookup::{Resolve, SystemResolver};
pub use output::OutputWriter;
pub use pipeline::{Phase, Pipeline};
pub use queue::BoundedQueue;
pub use types::{
    AddressFamily, LookupConfig, LookupStatus, ResultRecord, RunReport, WorkItem,
    DEFAULT_NOT_FOUND_MARKER, DEFAULT_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY, MAX_RESOLVER_THREADS,
};

// Public modules
pub mod lookup;

// Internal modules - these are not part of the public API
mod config;
mod error;
mod output;
mod pipeline;
mod queue;
mod requester;
mod resolver;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LookupError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
