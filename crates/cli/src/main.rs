mod config;
mod secrets;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use config::{DEFAULT_CONFIG_FILE, Settings};
use listing::{HeadhunterClient, VacancyCollection};
use pipeline::FilterStatus;
use responder::{Responder, RunReport, build_matcher, dump_to_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// jobsift - search vacancies, screen them with AI and apply
#[derive(Parser)]
#[command(name = "jobsift")]
#[command(
    about = "Search hh.ru vacancies, screen them against your resume and apply",
    long_about = None
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Log as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, filter and optionally apply to vacancies
    Run(RunArgs),

    /// Print the version
    Version,
}

#[derive(Args)]
struct RunArgs {
    /// Do not exclude vacancies already applied to
    #[arg(short = 'f', long)]
    do_not_exclude_applied: bool,

    /// Apply to the remaining vacancies without asking
    #[arg(short = 'y', long, conflicts_with = "exclude_remaining")]
    auto_approve: bool,

    /// Append the remaining vacancies to the exclude file
    #[arg(long)]
    exclude_remaining: bool,

    /// File with vacancies to exclude (overrides the configuration)
    #[arg(short, long)]
    exclude_file: Option<PathBuf>,

    /// Write the remaining vacancies to this file as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.json);

    match cli.command {
        Commands::Run(args) => {
            until_interrupted(handle_run(&cli.config, args), tokio::signal::ctrl_c()).await?
        }
        Commands::Version => println!("jobsift {}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}

/// Drive `work` unless `interrupt` resolves first, which is an error so the
/// process exits non-zero.
async fn until_interrupted<W, I>(work: W, interrupt: I) -> Result<()>
where
    W: Future<Output = Result<()>>,
    I: Future,
{
    tokio::select! {
        result = work => result,
        _ = interrupt => {
            warn!(reason = "interrupted", "exiting");
            bail!("interrupted")
        }
    }
}

/// `RUST_LOG` wins unless `--debug` is given; the default level is info.
fn init_tracing(debug: bool, json: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Handle the 'run' command
async fn handle_run(config_path: &Path, args: RunArgs) -> Result<()> {
    let mut settings = Settings::load(config_path)?;
    if let Some(exclude_file) = args.exclude_file {
        settings.exclude_file = Some(exclude_file);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting jobsift");
    if let Ok(pretty) = serde_json::to_string_pretty(&settings) {
        debug!("starting with config:\n{pretty}");
    }

    let token = settings.resolve_token().context("loading headhunter token")?;
    let client = HeadhunterClient::new(token)?.with_user_agent(settings.user_agent.clone());

    let options = settings.run_options(args.do_not_exclude_applied);
    let matcher = build_matcher(&options.ai, &settings.ai.gemini.api_key, &settings.ai.prompt)
        .context("configuring ai assistance")?;
    let responder = Responder::new(Arc::new(client), options).with_matcher(matcher);

    let report = responder.run().await?;
    print_steps(&report);

    if report.vacancies.is_empty() {
        info!(reason = "no vacancies left", "exiting");
        return Ok(());
    }

    print_vacancies(&report.vacancies);

    if let Some(path) = &args.dump {
        dump_to_file(&report.vacancies, path)?;
        println!(
            "{} Dumped {} vacancies to {}",
            "✓".green(),
            report.vacancies.len(),
            path.display()
        );
    }

    if args.exclude_remaining {
        let total = responder.exclude_remaining(&report.vacancies)?;
        println!(
            "{} Appended {} vacancies to the exclude file ({} entries)",
            "✓".green(),
            report.vacancies.len(),
            total
        );
    } else if args.auto_approve {
        let applied = responder.apply(&report.resume, &report.vacancies).await?;
        println!("{} Applied to {} vacancies", "✓".green(), applied);
    } else {
        println!(
            "{}",
            format!(
                "{} vacancies left. Re-run with --auto-approve to apply \
                 or --exclude-remaining to skip them.",
                report.vacancies.len()
            )
            .yellow()
        );
    }

    Ok(())
}

/// Helper function to print per-filter counts and statuses
fn print_steps(report: &RunReport) {
    println!("{}", format!("Found {} vacancies", report.found).bold().blue());

    for (step, status) in report.steps.iter().zip(&report.statuses) {
        let label = if step.skipped {
            format!("{} (disabled)", step.filter).dimmed().to_string()
        } else {
            step.filter.green().to_string()
        };
        println!(
            "  {}: {} -> {} (dropped {}){}",
            label,
            step.step.initial,
            step.step.left,
            step.step.dropped,
            format_status(status)
        );
    }
}

fn format_status(status: &FilterStatus) -> String {
    let mut parts: Vec<String> = status.details.iter().map(|(k, v)| format!("{k}={v}")).collect();
    if let Some(reason) = &status.reason {
        parts.insert(0, format!("reason={reason}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join(", "))
    }
}

/// Helper function to print the remaining vacancies grouped by employer
fn print_vacancies(vacancies: &VacancyCollection) {
    println!("{}", "Vacancies by employer:".bold().blue());

    for (employer, entries) in vacancies.report_by_employer() {
        println!("{}", employer.bold());
        for entry in entries {
            let name = entry.get("name").map(String::as_str).unwrap_or_default();
            let url = entry.get("url").map(String::as_str).unwrap_or_default();
            println!("  {} {}", "•".cyan(), name);
            if !url.is_empty() {
                println!("    {}", url.dimmed());
            }
            let extra = entry
                .iter()
                .filter(|(k, v)| !matches!(**k, "name" | "url") && !v.is_empty());
            for (key, value) in extra {
                println!("    {key}: {value}");
            }
        }
    }
}
