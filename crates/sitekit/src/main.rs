// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! sitekit - lead capture and offline caching for small business websites.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod leads;
mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sitekit_config::SitekitConfig;
use sitekit_core::FormType;

/// sitekit - lead capture and offline caching for small business websites.
#[derive(Parser, Debug)]
#[command(name = "sitekit", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway, cache worker and lead pipeline.
    Serve,
    /// Validate and submit one lead.
    Submit(SubmitArgs),
    /// Inspect or re-deliver the local lead log.
    Leads {
        #[command(subcommand)]
        action: LeadsAction,
    },
    /// Inspect the cache worker.
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },
    /// Manage sitekit configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long, default_value = "contact")]
    form_type: FormType,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    message: Option<String>,
    /// Page the form was submitted from.
    #[arg(long)]
    page: Option<String>,
    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum LeadsAction {
    /// Show stored leads, oldest first.
    List {
        /// Only leads no channel has delivered yet.
        #[arg(long)]
        pending: bool,
        #[arg(long)]
        json: bool,
    },
    /// Retry delivery of every locally stored lead.
    Sync,
}

#[derive(Subcommand, Debug)]
enum WorkerAction {
    /// Show the active version and cache stores.
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and report every problem.
    Check {
        /// Print the effective configuration as TOML.
        #[arg(long)]
        show: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> SitekitConfig {
    let loaded = match path {
        Some(path) => sitekit_config::load_and_validate_path(path),
        None => sitekit_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            sitekit_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Submit(args)) => leads::run_submit(&config, args).await,
        Some(Commands::Leads { action }) => match action {
            LeadsAction::List { pending, json } => leads::run_list(&config, pending, json).await,
            LeadsAction::Sync => leads::run_sync(&config).await,
        },
        Some(Commands::Worker {
            action: WorkerAction::Status { json },
        }) => status::run_worker_status(&config, json).await,
        Some(Commands::Config {
            action: ConfigAction::Check { show },
        }) => run_config_check(&config, show),
        None => {
            println!("sitekit: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Loading already validated the config; report success and optionally dump it.
fn run_config_check(config: &SitekitConfig, show: bool) -> Result<(), sitekit_core::SitekitError> {
    println!(
        "sitekit: configuration is valid (site.name={}, cache store {})",
        config.site.name,
        config.worker.cache_name()
    );
    if show {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| sitekit_core::SitekitError::Config(format!("cannot render config: {e}")))?;
        println!("{rendered}");
    }
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitekit={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
