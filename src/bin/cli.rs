//! FHIR Terminology Server Backup CLI
//!
//! Local execution entry point: backs up the configured resource types,
//! optionally tars the day's output, then prunes expired directories.

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use fhir_backup::{
    error::{AppError, Result},
    models::{Config, RunContext},
    pipeline,
    utils::http::HttpTransport,
};

/// Terminology Server Backup
#[derive(Parser, Debug)]
#[command(name = "fhir-backup", version, about = "Terminology Server Backup")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "fhir-backup.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up all configured resource types, then archive and prune
    Run {
        /// The FHIR endpoint of the server
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Resource types to back up (repeat the flag for several)
        #[arg(short, long = "resource-type")]
        resource_types: Vec<String>,

        /// Raw `Name: value` header to pass with every request.
        /// Use for authentication if required; repeat if multiple.
        #[arg(long = "header")]
        headers: Vec<String>,

        /// Destination directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Remove folders from at least (>=) these many days ago (0 for no removal)
        #[arg(short, long)]
        delete_days: Option<u32>,

        /// Create a tarball from the downloaded files
        #[arg(short, long)]
        tarball: bool,

        /// Number of parallel GETs to carry out
        #[arg(short = 'l', long)]
        parallel: Option<usize>,
    },

    /// Only remove dated directories past the retention threshold
    Prune {
        /// Destination directory to prune
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Remove folders from at least (>=) these many days ago
        #[arg(short, long)]
        delete_days: Option<u32>,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Run {
            endpoint,
            resource_types,
            headers,
            out_dir,
            delete_days,
            tarball,
            parallel,
        } => {
            if let Some(endpoint) = endpoint {
                config.server.endpoint = endpoint;
            }
            if !resource_types.is_empty() {
                config.backup.resource_types = resource_types;
            }
            if !headers.is_empty() {
                config.server.headers = headers;
            }
            if let Some(out_dir) = out_dir {
                config.backup.output_dir = out_dir;
            }
            if let Some(delete_days) = delete_days {
                config.retention.delete_days = delete_days;
            }
            if tarball {
                config.retention.tarball = true;
            }
            if let Some(parallel) = parallel {
                config.backup.parallel = parallel;
            }
            config.normalize();
            config.validate()?;

            // One date for the whole run, even across midnight.
            let run_date = Local::now().date_naive();
            let ctx = RunContext::new(&config, run_date);
            log_settings(&ctx);

            let transport = HttpTransport::new(&config.server)?;
            let summary = pipeline::run_backup(&ctx, &transport).await?;

            if ctx.archive {
                pipeline::run_archive(&ctx.output_root, ctx.run_date).await?;
            }
            pipeline::run_prune(&ctx.output_root, ctx.retention_days, ctx.run_date).await?;

            report_summary(&summary);
            if !summary.is_complete() {
                return Err(AppError::Incomplete(summary.failure_count()));
            }
            log::info!("Backup complete!");
        }

        Command::Prune {
            out_dir,
            delete_days,
        } => {
            if let Some(out_dir) = out_dir {
                config.backup.output_dir = out_dir;
            }
            if let Some(delete_days) = delete_days {
                config.retention.delete_days = delete_days;
            }

            let today = Local::now().date_naive();
            let outcomes = pipeline::run_prune(
                &config.backup.output_dir,
                config.retention.delete_days,
                today,
            )
            .await?;

            let deleted = outcomes.iter().filter(|o| o.deleted).count();
            log::info!("Pruned {} of {} candidate(s)", deleted, outcomes.len());
        }

        Command::Validate => {
            log::info!("Validating configuration from {}...", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!("    endpoint: {}", config.server.endpoint);
            log::info!(
                "    resource types: {}",
                config.backup.resource_types.join(", ")
            );
            log::info!("    output dir: {}", config.backup.output_dir.display());
        }
    }

    Ok(())
}

/// Echo the effective settings, like the run header of a cron log.
fn log_settings(ctx: &RunContext) {
    log::info!("Executing at {}", Local::now().to_rfc3339());
    log::info!(" - endpoint: {}", ctx.endpoint);
    log::info!(" - resource types: {}", ctx.resource_types.join(", "));
    log::info!(" - output root: {}", ctx.output_root.display());
    log::info!(" - run date: {}", ctx.run_date);
    log::info!(" - parallel: {}", ctx.concurrency);
    log::info!(" - delete days: {}", ctx.retention_days);
    log::info!(" - tarball: {}", ctx.archive);
}

/// Per-type counts plus every recorded failure.
fn report_summary(summary: &pipeline::RunSummary) {
    log::info!(
        "Fetched {}/{} resource(s) across {} type(s)",
        summary.total_fetched(),
        summary.total_discovered(),
        summary.types.len()
    );
    for type_summary in &summary.types {
        log::info!(
            " - {}: {}/{} fetched",
            type_summary.resource_type,
            type_summary.fetched,
            type_summary.discovered
        );
        for failure in &type_summary.failures {
            log::warn!(
                "   failed: {} ({})",
                failure.descriptor.fetch_url,
                failure.error
            );
        }
    }
}
