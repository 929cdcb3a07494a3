use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use chrono::Utc;
use tracing_subscriber::EnvFilter;

use sftpsweep::cli::args::Cli;
use sftpsweep::cli::output::{self, SpinnerObserver, SweepReport};
use sftpsweep::cli::settings::RunSettings;
use sftpsweep::common::config::{Config, OutputFormat};
use sftpsweep::common::errors::PruneError;
use sftpsweep::pruner::{
    self, Cutoff, EntryFilter, Interrupt, PruneOptions, RemovalList, TracingObserver, INTERRUPTED_MESSAGE,
};
use sftpsweep::remote::SftpSession;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_interrupt(&e) => {
            eprintln!("{}", INTERRUPTED_MESSAGE);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sftpsweep: {:#}", e);
            eprintln!("           for help use --help");
            ExitCode::from(2)
        }
    }
}

/// `-v` count to a filter for our own target; RUST_LOG wins when set
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sftpsweep={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<PruneError>().is_some_and(PruneError::is_interrupted))
}

fn run(cli: &Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = RunSettings::resolve(cli, &config);

    // Everything that can be rejected without the server is checked first
    let filter = EntryFilter::new(settings.exclude.as_deref(), settings.include.as_deref())?;
    let cutoff = Cutoff::from_age_days(Utc::now(), settings.age_days)?;

    if cli.verbose > 0 {
        output::print_banner(&settings, &cutoff);
    }

    // Installed before connecting so a stuck handshake can still be abandoned
    let interrupt = Interrupt::new();
    if let Err(e) = interrupt.install_ctrlc_handler() {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let start = Instant::now();
    let mut session = SftpSession::connect(&settings.connect)
        .context("Failed to open SFTP session")?;

    let options = PruneOptions::new(cutoff)
        .with_filter(filter)
        .dry_run(settings.list_only);

    let show_progress = cli.verbose == 0 && settings.format == OutputFormat::Human;
    let spinner = show_progress.then(SpinnerObserver::new);
    let mut removals = RemovalList::new();

    let result = match spinner {
        Some(mut spinner) => {
            let mut observer = (TracingObserver, (&mut removals, &mut spinner));
            let result = pruner::prune(&mut session, &settings.directory, &options, &mut observer, &interrupt);
            spinner.finish();
            result
        }
        None => {
            let mut observer = (TracingObserver, &mut removals);
            pruner::prune(&mut session, &settings.directory, &options, &mut observer, &interrupt)
        }
    }
    .with_context(|| format!("Sweep of '{}' on {} stopped", settings.directory, settings.connect.host))?;

    drop(session);

    tracing::info!(
        files = result.deleted_count,
        bytes = result.deleted_bytes,
        newest = result.newest_retained,
        all_gone = result.all_removable,
        "found files"
    );

    let report = SweepReport::new(&settings, &cutoff, &result, removals, start.elapsed().as_secs_f64());

    match settings.format {
        OutputFormat::Human => output::print_report(&report),
        OutputFormat::Json => output::print_report_json(&report)?,
        OutputFormat::Quiet => output::print_report_quiet(&report),
    }

    Ok(())
}
