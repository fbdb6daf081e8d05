//! Multi Lookup CLI Application
//!
//! Resolves every hostname found in a set of input files into one output
//! file of `<hostname>,<address>` lines, using multi-lookup-lib's bounded
//! requester/resolver pipeline.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::{style, Term};
use multi_lookup_lib::{
    load_env_config, parse_duration, AddressFamily, ConfigManager, EnvConfig, FileConfig,
    LookupConfig, Pipeline, SystemResolver, MAX_QUEUE_CAPACITY, MAX_RESOLVER_THREADS,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for multi-lookup
#[derive(Parser, Debug)]
#[command(name = "multi-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve hostnames from many input files concurrently")]
#[command(
    long_about = "Resolve hostnames from many input files concurrently.\n\nOne requester thread reads each input file into a bounded queue; a pool of resolver threads drains it and writes one '<hostname>,<address>' line per hostname to the output file."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Input files with whitespace-separated hostnames
    #[arg(value_name = "INPUTFILE", required = true, num_args = 1.., help_heading = "Files")]
    pub inputs: Vec<PathBuf>,

    /// Output file for the results (truncated unless --append)
    #[arg(value_name = "OUTPUTFILE", required = true, help_heading = "Files")]
    pub output: PathBuf,

    /// Number of resolver threads (default: CPU count, max: 100)
    #[arg(short = 'r', long = "resolvers", value_name = "N", help_heading = "Performance")]
    pub resolvers: Option<usize>,

    /// Capacity of the shared hostname queue (default: 10)
    #[arg(short = 'q', long = "queue-capacity", value_name = "C", help_heading = "Performance")]
    pub queue_capacity: Option<usize>,

    /// Per-lookup timeout, e.g. 500ms, 5s, 1m (default: 5s)
    #[arg(short = 't', long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Marker written for hostnames that do not resolve (default: NOT_FOUND)
    #[arg(long = "not-found", value_name = "MARKER", help_heading = "Output Format")]
    pub not_found: Option<String>,

    /// Write every address of a hostname instead of the first one
    #[arg(short = 'a', long = "all-addresses", help_heading = "Output Format")]
    pub all_addresses: bool,

    /// Only write IPv4 addresses
    #[arg(short = '4', long = "ipv4", conflicts_with = "ipv6", help_heading = "Output Format")]
    pub ipv4: bool,

    /// Only write IPv6 addresses
    #[arg(short = '6', long = "ipv6", help_heading = "Output Format")]
    pub ipv6: bool,

    /// Append to the output file instead of truncating it
    #[arg(long = "append", help_heading = "Output Format")]
    pub append: bool,

    /// Print the run report as JSON on stdout
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Show a spinner and a styled summary on stderr
    #[arg(short = 's', long = "summary", help_heading = "Output Format")]
    pub summary: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logs (per-lookup details)
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = Args::parse();

    init_logging(&args);

    if let Err(e) = validate_args(&args) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }

    tracing::info!("multi-lookup v{} starting", env!("CARGO_PKG_VERSION"));

    match run_lookup(args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            process::exit(1);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the flags.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("multi_lookup={0},multi_lookup_lib={0}", level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(resolvers) = args.resolvers {
        if resolvers == 0 || resolvers > MAX_RESOLVER_THREADS {
            return Err(format!(
                "Resolvers must be between 1 and {}",
                MAX_RESOLVER_THREADS
            ));
        }
    }

    if let Some(capacity) = args.queue_capacity {
        if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
            return Err(format!(
                "Queue capacity must be between 1 and {}",
                MAX_QUEUE_CAPACITY
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_duration(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '500ms', '5s', '2m'",
                timeout
            ));
        }
    }

    if let Some(marker) = &args.not_found {
        if marker.is_empty() || marker.contains(',') || marker.contains('\n') {
            return Err("Not-found marker must be non-empty and contain no commas".to_string());
        }
    }

    Ok(())
}

/// Main lookup logic. Returns the process exit code.
async fn run_lookup(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    tracing::debug!(?config, "effective configuration");

    let resolver = SystemResolver::from_config(tokio::runtime::Handle::current(), &config);
    let pipeline = Pipeline::new(config, resolver)?;

    let spinner = if args.summary && Term::stderr().is_term() {
        Some(ui::Spinner::start(format!(
            "Resolving hostnames from {} file{}...",
            args.inputs.len(),
            if args.inputs.len() == 1 { "" } else { "s" }
        )))
    } else {
        None
    };

    // The pipeline blocks on OS threads; keep it off the async workers so
    // the resolver's lookups can still be driven by the runtime
    let inputs = args.inputs.clone();
    let output = args.output.clone();
    let outcome =
        tokio::task::spawn_blocking(move || pipeline.run_to_path(&inputs, &output)).await;

    if let Some(s) = spinner {
        s.stop().await;
    }

    let report = outcome??;

    if args.json {
        ui::print_json_report(&report)?;
    }
    if args.summary {
        ui::print_summary(&report, &args.output);
    }

    if report.write_failures > 0 {
        eprintln!(
            "{} {} result(s) could not be written to '{}'",
            style("Error:").red().bold(),
            report.write_failures,
            args.output.display()
        );
        return Ok(1);
    }

    Ok(0)
}

/// Build LookupConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (ML_*)
/// 3. Config file (explicit --config / ML_CONFIG, or discovered)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<LookupConfig, Box<dyn std::error::Error>> {
    let mut config = LookupConfig::default();
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config(args.verbose);

    // Step 1: Config file
    let explicit_path = args.config.clone().or_else(|| env_config.config.clone());
    if let Some(path) = explicit_path {
        tracing::info!(path = %path, "using explicit config file");
        let file_config = config_manager
            .load_file(&path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
        config = merge_file_config_into_lookup_config(config, file_config);
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => {
                config = merge_file_config_into_lookup_config(config, file_config);
            }
            Err(e) => tracing::warn!(error = %e, "config discovery failed"),
        }
    }

    // Step 2: Environment variables
    config = apply_environment_config(config, env_config);

    // Step 3: CLI arguments
    apply_cli_args_to_config(config, args)
}

/// Merge FileConfig into LookupConfig
fn merge_file_config_into_lookup_config(
    mut config: LookupConfig,
    file_config: FileConfig,
) -> LookupConfig {
    if let Some(defaults) = file_config.defaults {
        if let Some(resolvers) = defaults.resolvers {
            config.resolver_threads = resolvers;
        }
        if let Some(capacity) = defaults.queue_capacity {
            config.queue_capacity = capacity;
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration) {
            config.timeout = timeout;
        }
    }

    if let Some(output) = file_config.output {
        if let Some(marker) = output.not_found_marker {
            config.not_found_marker = marker;
        }
        if let Some(all) = output.all_addresses {
            config.all_addresses = all;
        }
        if let Some(family) = output.family {
            config.address_family = family;
        }
        if let Some(append) = output.append {
            config.append = append;
        }
    }

    config
}

/// Apply ML_* environment overrides
fn apply_environment_config(mut config: LookupConfig, env_config: EnvConfig) -> LookupConfig {
    if let Some(resolvers) = env_config.resolvers {
        config.resolver_threads = resolvers;
    }
    if let Some(capacity) = env_config.queue_capacity {
        config.queue_capacity = capacity;
    }
    if let Some(timeout) = env_config.timeout {
        config.timeout = timeout;
    }
    if let Some(marker) = env_config.not_found_marker {
        config.not_found_marker = marker;
    }
    if let Some(all) = env_config.all_addresses {
        config.all_addresses = all;
    }
    if let Some(family) = env_config.family {
        config.address_family = family;
    }
    if let Some(append) = env_config.append {
        config.append = append;
    }

    config
}

/// Apply CLI arguments to config (highest precedence).
///
/// Boolean flags only override when passed, so `false` never clobbers a
/// value coming from the environment or a config file.
fn apply_cli_args_to_config(
    mut config: LookupConfig,
    args: &Args,
) -> Result<LookupConfig, Box<dyn std::error::Error>> {
    if let Some(resolvers) = args.resolvers {
        config.resolver_threads = resolvers;
    }
    if let Some(capacity) = args.queue_capacity {
        config.queue_capacity = capacity;
    }
    if let Some(timeout) = &args.timeout {
        config.timeout =
            parse_duration(timeout).ok_or_else(|| format!("Invalid timeout '{}'", timeout))?;
    }
    if let Some(marker) = &args.not_found {
        config.not_found_marker = marker.clone();
    }
    if args.all_addresses {
        config.all_addresses = true;
    }
    if args.ipv4 {
        config.address_family = AddressFamily::V4;
    } else if args.ipv6 {
        config.address_family = AddressFamily::V6;
    }
    if args.append {
        config.append = true;
    }

    config.validate()?;
    Ok(config)
}
