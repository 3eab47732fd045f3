use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sigalab_assist::decode_extraction_str;
use sigalab_core::{
    chronological_series, AccountRegistry, ExamLedger, ExamRecord, HistoryReport,
    RangeClassifier, RegistrationForm, TrackerConfig,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "sigalab-cli",
    about = "Reports and classification over an exported lab-exam history."
)]
struct Args {
    /// JSON file with classifier thresholds.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a JSON export of exam records.
    Report {
        #[arg(short, long)]
        input: PathBuf,
        /// Only records of this user.
        #[arg(long)]
        owner: Option<String>,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Chronological values of one exam type.
    Series {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        exam: String,
    },
    /// Classify one result against a reference range.
    Classify {
        #[arg(long, allow_negative_numbers = true)]
        value: f64,
        #[arg(long)]
        range: String,
    },
    /// Append the exams of a document-extraction reply to a ledger file.
    Import {
        #[arg(long)]
        reply: PathBuf,
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        owner: String,
        /// Date for exams the document does not date (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create an account from a sign-up form JSON file.
    Register {
        #[arg(long)]
        accounts: PathBuf,
        #[arg(long)]
        form: PathBuf,
    },
    /// Check a password read from stdin and print the profile.
    Login {
        #[arg(long)]
        accounts: PathBuf,
        #[arg(short, long)]
        username: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sigalab=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Report { input, owner, json } => {
            let records = filter_owner(load_records(&input)?, owner.as_deref());
            let report = HistoryReport::build(&records, &config);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Series { input, exam } => {
            let records = load_records(&input)?;
            for point in chronological_series(&records, &exam) {
                println!("{}\t{}", point.date, point.value);
            }
        }
        Command::Classify { value, range } => {
            let classification = RangeClassifier::new(config.classifier).classify(value, &range);
            println!("{}", classification.label);
        }
        Command::Import {
            reply,
            ledger,
            owner,
            date,
        } => {
            let text = std::fs::read_to_string(&reply)
                .with_context(|| format!("Could not read file {:?}", reply))?;
            let default_date = date.unwrap_or_else(|| Utc::now().date_naive());
            let exams = decode_extraction_str(&text, default_date)?;

            let mut store = if ledger.exists() {
                let raw = std::fs::read_to_string(&ledger)
                    .with_context(|| format!("Could not read file {:?}", ledger))?;
                ExamLedger::from_json_str(&raw)?
            } else {
                ExamLedger::new()
            };

            let imported = exams.len();
            for exam in exams {
                store.add(&owner, exam.into_draft())?;
            }
            std::fs::write(&ledger, store.to_json_string()?)
                .with_context(|| format!("Could not write file {:?}", ledger))?;
            info!(imported, total = store.len(), "ledger updated");
        }
        Command::Register { accounts, form } => {
            let raw = std::fs::read_to_string(&form)
                .with_context(|| format!("Could not read file {:?}", form))?;
            let form: RegistrationForm =
                serde_json::from_str(&raw).context("Invalid registration form")?;

            let mut registry = load_accounts(&accounts)?;
            let profile = registry.register(form)?;
            std::fs::write(&accounts, registry.to_json_string()?)
                .with_context(|| format!("Could not write file {:?}", accounts))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Login { accounts, username } => {
            let registry = load_accounts(&accounts)?;
            let mut password = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut password)
                .context("Could not read password from stdin")?;
            let profile =
                registry.authenticate(&username, password.trim_end_matches(['\r', '\n']))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<TrackerConfig> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read file {:?}", path))?;
    Ok(TrackerConfig::from_json_str(&raw)?)
}

fn load_records(path: &Path) -> anyhow::Result<Vec<ExamRecord>> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("Could not read file {:?}", path))?;
    Ok(ExamLedger::from_json_str(&raw)?.records().to_vec())
}

fn load_accounts(path: &Path) -> anyhow::Result<AccountRegistry> {
    if !path.exists() {
        return Ok(AccountRegistry::new());
    }
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("Could not read file {:?}", path))?;
    Ok(AccountRegistry::from_json_str(&raw)?)
}

fn filter_owner(records: Vec<ExamRecord>, owner: Option<&str>) -> Vec<ExamRecord> {
    match owner {
        Some(owner) => records
            .into_iter()
            .filter(|record| record.owner_id == owner)
            .collect(),
        None => records,
    }
}

fn print_report(report: &HistoryReport) {
    let dashboard = &report.dashboard;
    println!(
        "Generated at: {}\nTotal exams: {}\nLatest exam: {}\nMost frequent: {}",
        report.generated_at,
        dashboard.total_exams,
        dashboard.latest_exam_name.as_deref().unwrap_or("-"),
        dashboard.most_frequent_exam.as_deref().unwrap_or("-"),
    );

    println!("\nLaboratories:");
    for entry in report.laboratories.iter() {
        println!("  {}: {}", display_or_unknown(&entry.key), entry.count);
    }
    println!("Requesting doctors:");
    for entry in report.doctors.iter() {
        println!("  {}: {}", display_or_unknown(&entry.key), entry.count);
    }

    println!("\nLatest results:");
    for trend in &report.trends {
        if let Some(point) = trend.latest() {
            println!(
                "  {} = {}{} ({}) [{}] on {}",
                trend.exam_name,
                point.value,
                trend
                    .unit
                    .as_deref()
                    .map(|unit| format!(" {unit}"))
                    .unwrap_or_default(),
                point.reference_range,
                point.status.label(),
                point.date,
            );
        }
    }
}

fn display_or_unknown(key: &str) -> &str {
    if key.is_empty() {
        "Não informado"
    } else {
        key
    }
}
