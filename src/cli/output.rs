use chrono::{DateTime, Utc};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use super::settings::RunSettings;
use crate::common::format::{self, epoch_to_datetime, format_size_colored, format_timestamp};
use crate::pruner::{Cutoff, PruneObserver, RemovalList, TraversalResult};

/// Everything reported at the end of a run
#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub host: String,
    pub directory: String,
    pub cutoff: Option<DateTime<Utc>>,
    pub list_only: bool,
    pub deleted_files: u64,
    pub deleted_bytes: u64,
    pub deleted_dirs: usize,
    /// Newest modification time of anything left in place
    pub newest_retained: Option<DateTime<Utc>>,
    /// Everything below the root went (or would go)
    pub all_removable: bool,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovalList>,
}

impl SweepReport {
    pub fn new(
        settings: &RunSettings,
        cutoff: &Cutoff,
        result: &TraversalResult,
        removals: RemovalList,
        duration_secs: f64,
    ) -> Self {
        Self {
            host: settings.connect.host.clone(),
            directory: settings.directory.clone(),
            cutoff: cutoff.to_datetime(),
            list_only: settings.list_only,
            deleted_files: result.deleted_count,
            deleted_bytes: result.deleted_bytes,
            deleted_dirs: removals.dirs.len(),
            newest_retained: epoch_to_datetime(result.newest_retained),
            all_removable: result.all_removable,
            duration_secs,
            removed: settings.detailed.then_some(removals),
        }
    }
}

/// Print the run banner shown at verbosity 1 and above
pub fn print_banner(settings: &RunSettings, cutoff: &Cutoff) {
    eprintln!("Verbose mode on");
    eprintln!("{}", "─".repeat(60).dimmed());
    eprintln!("  username       : {}", settings.connect.user);
    eprintln!("  host           : {}", settings.connect.host);
    eprintln!("  directory      : {}", settings.directory);
    eprintln!("  exclude pattern: {}", settings.exclude.as_deref().unwrap_or("-"));
    eprintln!("  include pattern: {}", settings.include.as_deref().unwrap_or("-"));
    eprintln!("  list only      : {}", settings.list_only);
    eprintln!(
        "  min file age   : {} days => keep files newer than {}",
        settings.age_days,
        cutoff
            .to_datetime()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string())
    );
    eprintln!("{}", "─".repeat(60).dimmed());
}

/// Print the sweep report in human-readable format
pub fn print_report(report: &SweepReport) {
    println!();
    let (icon, mode_label) = if report.list_only {
        ("ℹ️", "List only")
    } else {
        ("🔥", "Deleted")
    };

    println!(
        "  {} {} — {}, {} in {}:{}",
        icon,
        mode_label.bold(),
        format::format_count(report.deleted_files).cyan(),
        format_size_colored(report.deleted_bytes),
        report.host,
        report.directory,
    );
    println!("{}", "─".repeat(60).dimmed());

    format::print_kv(
        "Directories emptied",
        &report.deleted_dirs.to_string(),
    );
    format::print_kv(
        "Newest retained",
        &report
            .newest_retained
            .map(format_timestamp)
            .unwrap_or_else(|| "nothing retained".to_string()),
    );
    format::print_kv(
        "Everything under root gone",
        if report.all_removable { "yes" } else { "no" },
    );
    format::print_kv("Took", &format::format_duration(report.duration_secs));

    if let Some(ref removed) = report.removed {
        if !removed.is_empty() {
            println!();
            for path in &removed.files {
                println!("    {} {}", "-".red(), path);
            }
            for path in &removed.dirs {
                println!("    {} {}/", "-".red(), path.dimmed());
            }
        }
    }

    if report.list_only && report.deleted_files > 0 {
        println!();
        println!(
            "  {} Run without {} to delete.",
            "💡",
            "--list-only".cyan()
        );
    }
    println!();
}

/// Print the report as JSON
pub fn print_report_json(report: &SweepReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// One tab-separated line: deleted file count, deleted bytes
pub fn print_report_quiet(report: &SweepReport) {
    println!("{}", quiet_line(report));
}

fn quiet_line(report: &SweepReport) -> String {
    format!("{}\t{}", report.deleted_files, report.deleted_bytes)
}

/// Spinner showing the directory currently being walked
pub struct SpinnerObserver {
    pb: ProgressBar,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl PruneObserver for SpinnerObserver {
    fn enter_dir(&mut self, path: &str) {
        self.pb.set_message(format!("Scanning {}", path));
    }
}

impl Drop for SpinnerObserver {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
