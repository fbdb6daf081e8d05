//! Pipeline orchestration and completion coordination.
//!
//! A run owns one [`PipelineContext`] holding the queue, the output guard
//! and the phase tracker. Every worker thread borrows it for the duration of
//! a thread scope, so nothing outlives the run and nothing is global.
//!
//! Shutdown protocol, driven only by the coordinator:
//!
//! 1. join every requester
//! 2. wait until resolvers have drained the queue
//! 3. signal shutdown under the queue lock and wake all blocked resolvers
//! 4. join every resolver, then flush and close the output once

use crate::error::LookupError;
use crate::lookup::Resolve;
use crate::output::OutputWriter;
use crate::queue::BoundedQueue;
use crate::requester::{self, RequesterOutcome};
use crate::resolver::{self, ResolverStats};
use crate::types::{LookupConfig, RunReport, WorkItem};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Instant;

/// Lifecycle of a run. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Phase {
    /// Requesters and resolvers are active
    Running = 0,

    /// Every requester is done, resolvers are still emptying the queue
    Draining = 1,

    /// Queue drained and shutdown signaled; resolvers are exiting
    ShutdownSignaled = 2,

    /// Every resolver has exited and the output is closed
    Terminated = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Running,
            1 => Phase::Draining,
            2 => Phase::ShutdownSignaled,
            _ => Phase::Terminated,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Running => write!(f, "running"),
            Phase::Draining => write!(f, "draining"),
            Phase::ShutdownSignaled => write!(f, "shutdown-signaled"),
            Phase::Terminated => write!(f, "terminated"),
        }
    }
}

/// Monotonic phase cell.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    current: AtomicU8,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            current: AtomicU8::new(Phase::Running as u8),
        }
    }

    pub(crate) fn get(&self) -> Phase {
        Phase::from_u8(self.current.load(Ordering::SeqCst))
    }

    /// Move forward to `next`; moving backwards is a no-op.
    pub(crate) fn advance(&self, next: Phase) -> bool {
        let prev = self.current.fetch_max(next as u8, Ordering::SeqCst);
        let moved = prev < next as u8;
        if moved {
            tracing::info!(from = %Phase::from_u8(prev), to = %next, "pipeline phase changed");
        }
        moved
    }
}

/// Shared state for one run, borrowed by every worker.
pub(crate) struct PipelineContext<'a, W: Write> {
    pub(crate) config: &'a LookupConfig,
    pub(crate) resolver: &'a dyn Resolve,
    pub(crate) queue: BoundedQueue<WorkItem>,
    pub(crate) writer: OutputWriter<W>,
    pub(crate) phase: PhaseTracker,
}

impl<'a, W: Write> PipelineContext<'a, W> {
    pub(crate) fn new(
        config: &'a LookupConfig,
        resolver: &'a dyn Resolve,
        output: W,
    ) -> Result<Self, LookupError> {
        Ok(Self {
            config,
            resolver,
            queue: BoundedQueue::new(config.queue_capacity)?,
            writer: OutputWriter::new(output),
            phase: PhaseTracker::new(),
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn advance(&self, next: Phase) -> bool {
        self.phase.advance(next)
    }
}

/// Batch resolver: requester threads in, resolver threads out.
///
/// # Example
///
/// ```rust
/// use multi_lookup_lib::{LookupConfig, LookupStatus, Pipeline};
///
/// let config = LookupConfig::default()
///     .with_resolver_threads(2)
///     .with_queue_capacity(1);
/// let pipeline = Pipeline::new(config, |_: &str| LookupStatus::Unresolved).unwrap();
///
/// let inputs: [&str; 0] = [];
/// let (report, output) = pipeline.run_into(&inputs, Vec::new()).unwrap();
/// assert_eq!(report.enqueued, 0);
/// assert!(output.is_empty());
/// ```
pub struct Pipeline<R: Resolve> {
    config: LookupConfig,
    resolver: R,
}

impl<R: Resolve> Pipeline<R> {
    /// Create a pipeline, validating the configuration up front.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero queue capacity, a resolver
    /// count outside 1-100, a zero timeout or an unusable not-found marker.
    pub fn new(config: LookupConfig, resolver: R) -> Result<Self, LookupError> {
        config.validate()?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Resolve every hostname in `inputs` into the file at `output`.
    ///
    /// The output is opened once, for writing, before any worker starts;
    /// failing to open it is fatal. It is truncated unless the config asks
    /// for append mode.
    ///
    /// An output that is also one of the inputs is rejected before anything
    /// is opened: its requester would read back the results being written.
    pub fn run_to_path<P, Q>(&self, inputs: &[P], output: Q) -> Result<RunReport, LookupError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let output = output.as_ref();
        let display = output.to_string_lossy();

        if let Some(input) = inputs
            .iter()
            .map(|input| input.as_ref())
            .find(|input: &&Path| same_file(input, output))
        {
            return Err(LookupError::output_file(
                display,
                format!("'{}' is also an input file", input.display()),
            ));
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if self.config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options
            .open(output)
            .map_err(|e| LookupError::output_file(display.clone(), e.to_string()))?;

        match self.run_into(inputs, file) {
            Ok((report, _file)) => Ok(report),
            Err(LookupError::OutputFile { message, .. }) => {
                Err(LookupError::output_file(display, message))
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve every hostname in `inputs` into `output`, returning the
    /// report together with the flushed writer.
    ///
    /// Input files that cannot be opened are skipped and listed in
    /// [`RunReport::failed_inputs`].
    pub fn run_into<P, W>(&self, inputs: &[P], output: W) -> Result<(RunReport, W), LookupError>
    where
        P: AsRef<Path>,
        W: Write + Send,
    {
        let started = Instant::now();
        let ctx = PipelineContext::new(&self.config, &self.resolver, output)?;
        let mut report = RunReport {
            input_files: inputs.len(),
            ..Default::default()
        };
        let mut totals = ResolverStats::default();
        let mut phases = vec![ctx.phase()];

        tracing::info!(
            inputs = inputs.len(),
            resolvers = self.config.resolver_threads,
            capacity = self.config.queue_capacity,
            "starting lookup run"
        );

        thread::scope(|s| -> Result<(), LookupError> {
            let ctx = &ctx;

            let mut resolvers = Vec::with_capacity(self.config.resolver_threads);
            for id in 0..self.config.resolver_threads {
                let spawned = thread::Builder::new()
                    .name(format!("resolver-{}", id))
                    .spawn_scoped(s, move || {
                        resolver::run(id, &ctx.queue, ctx.resolver, &ctx.writer, ctx.config)
                    });
                match spawned {
                    Ok(handle) => resolvers.push(handle),
                    Err(e) => tracing::warn!(resolver = id, error = %e, "failed to start resolver thread"),
                }
            }

            if resolvers.is_empty() {
                return Err(LookupError::internal("no resolver thread could be started"));
            }
            if resolvers.len() < self.config.resolver_threads {
                tracing::warn!(
                    running = resolvers.len(),
                    requested = self.config.resolver_threads,
                    "continuing with fewer resolver threads"
                );
            }
            report.resolver_threads = resolvers.len();

            let mut requesters = Vec::with_capacity(inputs.len());
            for (index, input) in inputs.iter().enumerate() {
                let path = input.as_ref();
                let spawned = thread::Builder::new()
                    .name(format!("requester-{}", index))
                    .spawn_scoped(s, move || requester::run(&ctx.queue, index, path));
                match spawned {
                    Ok(handle) => requesters.push((path, handle)),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to start requester thread");
                        report.failed_inputs.push(path.display().to_string());
                    }
                }
            }

            for (path, handle) in requesters {
                match handle.join() {
                    Ok(outcome) => record_requester(&mut report, outcome),
                    Err(_) => {
                        tracing::error!(path = %path.display(), "requester thread panicked");
                        report.failed_inputs.push(path.display().to_string());
                    }
                }
            }

            if !ctx.queue.is_empty() && ctx.advance(Phase::Draining) {
                phases.push(Phase::Draining);
            }
            ctx.queue.wait_until_drained();
            ctx.queue.signal_shutdown();
            if ctx.advance(Phase::ShutdownSignaled) {
                phases.push(Phase::ShutdownSignaled);
            }

            for handle in resolvers {
                match handle.join() {
                    Ok(stats) => totals.merge(stats),
                    Err(_) => tracing::error!("resolver thread panicked"),
                }
            }

            Ok(())
        })?;

        report.queue_high_water = ctx.queue.high_water();
        report.resolved = totals.resolved;
        report.unresolved = totals.unresolved;
        report.errors = totals.errors;
        report.written = totals.written;
        report.write_failures = totals.write_failures;

        let output = ctx
            .writer
            .finish()
            .map_err(|e| LookupError::output_file("output", e.to_string()))?;
        if ctx.phase.advance(Phase::Terminated) {
            phases.push(Phase::Terminated);
        }
        report.phases = phases;

        report.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            enqueued = report.enqueued,
            resolved = report.resolved,
            unresolved = report.unresolved,
            errors = report.errors,
            failed_inputs = report.failed_inputs.len(),
            elapsed_ms = report.elapsed_ms,
            "lookup run finished"
        );

        Ok((report, output))
    }
}

/// Whether `a` and `b` name the same file. Paths that cannot be resolved
/// are compared as given.
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn record_requester(report: &mut RunReport, outcome: RequesterOutcome) {
    report.enqueued += outcome.enqueued;
    if let Some(err) = outcome.error {
        tracing::debug!(index = outcome.index, error = %err, "requester reported a failure");
        report.failed_inputs.push(outcome.path.display().to_string());
    }
}
