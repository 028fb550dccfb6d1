//! stool - developer utilities from the command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use stool::notify::{default_title, BarkNotifier, Notifier, DEFAULT_BARK_SERVER};
use stool::ranges::{generate_time_ranges, parse_date, partition_dates, IntervalSpec};
use stool::status::{DeleteFilter, StatusMonitor};
use stool::types::OutputFormat;
use stool::utils::db::with_db_snapshot;
use stool::utils::format::{
    format_csv, format_json, format_pairs_csv, format_pairs_json, format_pairs_table, format_table, print_banner,
    print_cmd,
};
use stool::utils::fs::del_by_size;
use stool::utils::hash::get_md5;
use stool::utils::logging::init_logger;
use stool::utils::paths::{default_status_db, expand_dir};
use stool::utils::time::parse_instant;

#[derive(Parser)]
#[command(name = "stool")]
#[command(author, version, about = "Developer utilities: date ranges, hashing, cleanup, notifications, status heartbeats")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a date span into segments
    Ranges {
        /// First day, YYYY-MM-DD
        start: String,
        /// Last day, YYYY-MM-DD
        end: String,
        /// monthly, yearly, quarterly, weekly, daily, or a number of days
        #[arg(short, long, default_value = "monthly")]
        interval: String,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Split a date span into calendar months
    Months {
        start: String,
        end: String,
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print the MD5 digest of a string
    Md5 { text: String },
    /// Delete files under a directory that are smaller than a threshold
    Clean {
        dir: String,
        /// File name suffix to match
        #[arg(long, default_value = ".html")]
        ext: String,
        /// Files below this many bytes are removed
        #[arg(long, default_value_t = 3 * 1024)]
        min_size: u64,
    },
    /// Send a push notification
    Notify {
        message: String,
        /// Defaults to the running command line
        #[arg(long)]
        title: Option<String>,
        #[arg(long, env = "BARK_KEY", hide_env_values = true)]
        key: Option<String>,
        #[arg(long, env = "BARK_SERVER", default_value = DEFAULT_BARK_SERVER)]
        server: String,
    },
    /// Record and inspect service status/stats
    Status {
        /// SQLite database file
        #[arg(long, env = "STOOL_STATUS_DB")]
        db: Option<PathBuf>,
        #[command(subcommand)]
        action: StatusAction,
    },
}

#[derive(Subcommand)]
enum StatusAction {
    /// Merge a JSON object into a stats record
    Save {
        category: String,
        /// JSON object, e.g. '{"rows": 10}'
        data: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Record a service heartbeat
    Heartbeat {
        service: String,
        #[arg(long, default_value = "running")]
        state: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Print records of a category as JSON
    Load {
        category: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// List known categories
    Categories,
    /// Delete records by id, category and/or update time
    Delete {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logger(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    if cli.verbose {
        print_cmd();
    }

    match cli.command {
        Commands::Ranges {
            start,
            end,
            interval,
            format,
        } => run_ranges(&start, &end, &interval, format),
        Commands::Months { start, end, format } => run_ranges(&start, &end, "monthly", format),
        Commands::Md5 { text } => {
            println!("{}", get_md5(&text));
            Ok(())
        }
        Commands::Clean { dir, ext, min_size } => run_clean(&dir, &ext, min_size),
        Commands::Notify {
            message,
            title,
            key,
            server,
        } => run_notify(&message, title, key, &server).await,
        Commands::Status { db, action } => {
            let db = db
                .or_else(default_status_db)
                .context("no status database path; pass --db or set STOOL_STATUS_DB")?;
            run_status(&db, action)
        }
    }
}

fn run_ranges(start: &str, end: &str, interval: &str, format: OutputFormat) -> anyhow::Result<()> {
    let spec = IntervalSpec::from(interval);

    if spec == IntervalSpec::Unrecognized {
        log::warn!("unrecognized interval {:?}, returning the span as one range", interval);
        let pairs = generate_time_ranges(start, end, spec)?;
        let output = match format {
            OutputFormat::Table => {
                print_banner();
                println!("{} {} .. {} ({:?})\n", "Ranges:".bold(), start, end, interval);
                format_pairs_table(&pairs)
            }
            OutputFormat::Json => format_pairs_json(&pairs),
            OutputFormat::Csv => format_pairs_csv(&pairs),
        };
        println!("{}", output);
        return Ok(());
    }

    let segments = partition_dates(parse_date(start)?, parse_date(end)?, spec);

    if segments.is_empty() && matches!(format, OutputFormat::Table) {
        println!("{}", "Empty span: start is after end.".yellow());
        return Ok(());
    }

    let output = match format {
        OutputFormat::Table => {
            print_banner();
            println!("{} {} .. {} ({})\n", "Ranges:".bold(), start, end, spec);
            format_table(&segments)
        }
        OutputFormat::Json => format_json(&segments),
        OutputFormat::Csv => format_csv(&segments),
    };
    println!("{}", output);
    Ok(())
}

fn run_clean(dir: &str, ext: &str, min_size: u64) -> anyhow::Result<()> {
    let dir = expand_dir(dir)?;
    let stats = del_by_size(&dir, ext, min_size).with_context(|| format!("cleaning {}", dir.display()))?;

    println!(
        "{} {} of {} files ({} of {} bytes)",
        "Deleted".bold(),
        stats.deleted.to_string().red(),
        stats.total,
        stats.deleted_size,
        stats.total_size
    );
    Ok(())
}

async fn run_notify(message: &str, title: Option<String>, key: Option<String>, server: &str) -> anyhow::Result<()> {
    let notifier = BarkNotifier::new(server, key.as_deref().unwrap_or_default())?;
    let title = title.unwrap_or_else(default_title);
    notifier.send(&title, message).await?;
    println!("{} {}", "✓".green(), "Notification sent".dimmed());
    Ok(())
}

fn parse_opt_instant(raw: Option<&str>) -> anyhow::Result<Option<chrono::DateTime<chrono::Utc>>> {
    raw.map(parse_instant).transpose().map_err(Into::into)
}

fn run_status(db: &Path, action: StatusAction) -> anyhow::Result<()> {
    match action {
        StatusAction::Save { category, data, id } => {
            let value: serde_json::Value = serde_json::from_str(&data).context("data must be a JSON object")?;
            let map = value.as_object().context("data must be a JSON object")?;
            let monitor = StatusMonitor::open(db)?;
            if !monitor.save(&category, map, id.as_deref())? {
                println!("{}", "Nothing to save.".yellow());
            }
        }
        StatusAction::Heartbeat { service, state, id } => {
            let monitor = StatusMonitor::open(db)?;
            monitor.save_status(&service, &state, id.as_deref(), None)?;
        }
        StatusAction::Load { category, start, end } => {
            let start = parse_opt_instant(start.as_deref())?;
            let end = parse_opt_instant(end.as_deref())?;
            let records = with_db_snapshot(db, |snapshot| StatusMonitor::open(snapshot)?.load(&category, start, end))?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        StatusAction::Categories => {
            let categories = with_db_snapshot(db, |snapshot| StatusMonitor::open(snapshot)?.load_categories())?;
            for category in categories {
                println!("  {} {}", "•".cyan(), category);
            }
        }
        StatusAction::Delete {
            id,
            category,
            start,
            end,
        } => {
            let filter = DeleteFilter {
                id,
                category,
                start: parse_opt_instant(start.as_deref())?,
                end: parse_opt_instant(end.as_deref())?,
            };
            let deleted = StatusMonitor::open(db)?.delete(&filter)?;
            println!("{} {} record(s)", "Deleted".bold(), deleted);
        }
    }
    Ok(())
}
