mod commands;
mod logging;
mod progress;

use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, DecideArgs, OutputFormat, PruneArgs, ScanArgs, ShowArgs};
use dotenv::dotenv;
use dupescout_core::{
    AppConfig, CancelFlag, EngineOutcome, Error, ReportStore, ScanEngine, ScanOptions,
    ScanReport,
};
use indicatif::HumanBytes;
use progress::CliReporter;
use tracing::error;

const EXIT_OK: i32 = 0;
/// Also the catch-all for failures outside the scan exit-code contract.
const EXIT_NO_MATCH: i32 = 1;
const EXIT_BAD_ROOT: i32 = 2;
const EXIT_WRITE_FAILED: i32 = 3;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match dupescout_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(EXIT_NO_MATCH);
        }
    };

    let args = Cli::parse();

    let code = match args.command {
        Some(Commands::Scan(scan_args)) => run_scan(&config, &scan_args),
        Some(Commands::Show(show_args)) => run_show(&show_args),
        Some(Commands::Decide(decide_args)) => run_decide(&decide_args),
        Some(Commands::Prune(prune_args)) => run_prune(&config, &prune_args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            EXIT_OK
        }
        None => {
            let _ = Cli::command().print_long_help();
            EXIT_OK
        }
    };

    process::exit(code);
}

fn run_scan(config: &AppConfig, args: &ScanArgs) -> i32 {
    let mut scan_config = config.clone();
    if !args.extensions.is_empty() {
        scan_config.allowed_extensions = args.extensions.clone();
    }

    let options = ScanOptions::from_config(&args.root, !args.no_recursive, &scan_config);
    let engine = ScanEngine::new(scan_config);
    let reporter = CliReporter::new();
    let cancel = CancelFlag::new();

    let outcome = match engine.scan(&options, args.report.as_deref(), &reporter, &cancel) {
        Ok(outcome) => outcome,
        Err(err @ Error::InvalidRoot { .. }) => {
            error!("{}", err);
            return EXIT_BAD_ROOT;
        }
        Err(err @ Error::ReportWrite { .. }) => {
            error!("{}", err);
            return EXIT_WRITE_FAILED;
        }
        Err(err) => {
            error!("{}", err);
            return EXIT_NO_MATCH;
        }
    };

    match args.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&outcome.report) {
            Ok(doc) => println!("{}", doc),
            Err(err) => {
                error!("Error rendering report: {}", err);
                return EXIT_NO_MATCH;
            }
        },
        OutputFormat::Human => print_scan_summary(&outcome, args.detailed),
    }

    if outcome.files_matched == 0 {
        eprintln!(
            "No files matched the extension allow-list under {}",
            args.root.display()
        );
        return EXIT_NO_MATCH;
    }
    EXIT_OK
}

fn run_show(args: &ShowArgs) -> i32 {
    match ReportStore::load(&args.report) {
        Ok(report) => {
            print_report(&report, args.detailed);
            EXIT_OK
        }
        Err(err) => {
            error!("{}", err);
            EXIT_NO_MATCH
        }
    }
}

fn run_decide(args: &DecideArgs) -> i32 {
    match ReportStore::apply_decision(&args.report, &args.group, &args.keep, &args.delete) {
        Ok(report) => {
            let resolved = report.decisions.len();
            let total = report.groups.len();
            println!(
                "Recorded decision for group '{}' — {} of {} groups resolved",
                args.group, resolved, total
            );
            EXIT_OK
        }
        Err(err @ Error::ReportWrite { .. }) => {
            error!("{}", err);
            EXIT_WRITE_FAILED
        }
        Err(err) => {
            error!("{}", err);
            EXIT_NO_MATCH
        }
    }
}

fn run_prune(config: &AppConfig, args: &PruneArgs) -> i32 {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.report_dir.clone().into());
    let older_than = chrono::Utc::now() - chrono::Duration::days(args.older_than_days);

    match ReportStore::prune(&dir, older_than, args.force) {
        Ok(removed) if removed.is_empty() => {
            println!("Nothing to prune in {}", dir.display());
            EXIT_OK
        }
        Ok(removed) => {
            for path in &removed {
                println!("Removed {}", path.display());
            }
            println!("{} report(s) pruned", removed.len());
            EXIT_OK
        }
        Err(err) => {
            error!("{}", err);
            EXIT_NO_MATCH
        }
    }
}

fn print_scan_summary(outcome: &EngineOutcome, detailed: bool) {
    println!();
    println!(
        "Scan: {}, Group: {}, Write: {}",
        format!("{:.2}s", outcome.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", outcome.group_duration.as_secs_f64()).green(),
        format!("{:.2}s", outcome.write_duration.as_secs_f64()).green(),
    );
    if outcome.files_skipped > 0 {
        println!(
            "{} file(s) skipped due to per-file errors (see log)",
            format!("{}", outcome.files_skipped).yellow()
        );
    }
    print_report(&outcome.report, detailed);

    if let Some(path) = &outcome.report_path {
        println!("\nReport: {}", path.display());
    }
}

fn print_report(report: &ScanReport, detailed: bool) {
    let meta = &report.metadata;
    println!();
    println!("{}", "SCAN RESULTS".bold());
    println!("Directory scanned: {}", meta.root_path.display());
    println!(
        "Files matched: {} of {} visited{}",
        meta.files_matched,
        meta.files_scanned,
        if meta.recursive { " (recursive)" } else { "" },
    );
    println!(
        "Duplicate groups: {} ({} resolved)",
        meta.group_count,
        report.decisions.len()
    );
    println!(
        "Potential space savings: {}",
        format!("{}", HumanBytes(report.wasted_bytes())).cyan()
    );

    if report.groups.is_empty() {
        println!("\n{}", "No duplicate candidates found.".green());
        return;
    }

    for (i, group) in report.groups.iter().enumerate() {
        println!(
            "\n{} '{}' [{}]  confidence {}",
            format!("Group {}:", i + 1).bold(),
            group.base_token,
            group.detection_method,
            format!("{:.0}%", group.confidence * 100.0).yellow(),
        );
        println!(
            "  id: {}  files: {}  total size: {}",
            group.group_id,
            group.members.len(),
            HumanBytes(group.total_size()),
        );

        if let Some(decision) = report.decisions.get(&group.group_id) {
            println!(
                "  decision: keep {} / delete {} file(s)",
                decision.keep.display(),
                decision.delete.len()
            );
        }

        if detailed {
            for member in &group.members {
                println!(
                    "    - {} ({}, modified {})",
                    member.path.display(),
                    HumanBytes(member.size),
                    member.modified_at.format("%Y-%m-%d %H:%M"),
                );
            }
            if let Some(largest) = group.largest_member() {
                println!("    largest: {}", largest.filename);
            }
            if let Some(newest) = group.newest_member() {
                println!("    newest:  {}", newest.filename);
            }
        }
    }
}
