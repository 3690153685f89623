//! minotor - web analytics reports
//!
//! Reads analytics events from the document store and prints period reports,
//! event tables and CSV exports.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/minotor/data.db (~/.local/share/minotor/data.db)
//! - Logs: $XDG_STATE_HOME/minotor/ (~/.local/state/minotor/)
//! - Config: $XDG_CONFIG_HOME/minotor/config.toml (~/.config/minotor/config.toml)

mod export;
mod render;

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use minotor_core::analytics::{AnalyticsService, Period, PeriodReport};
use minotor_core::auth::{AuthClient, AuthOutcome, AuthSession, Credentials, FailureKind};
use minotor_core::dispatch::Dispatcher;
use minotor_core::repository::EventRepository;
use minotor_core::{CanonicalEvent, Config, Database};

/// Environment variable read before prompting for a password
const PASSWORD_ENV: &str = "MINOTOR_PASSWORD";

#[derive(Parser)]
#[command(name = "minotor")]
#[command(about = "Web analytics reports from the Minot'Or event store")]
#[command(version)]
struct Cli {
    /// Sign in with this email before reading (password from MINOTOR_PASSWORD or prompt)
    #[arg(long, global = true, value_name = "EMAIL")]
    login: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summary report for a period
    Report {
        /// Time window: today, week, month or all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Rows shown per table (text format only)
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Table of individual events
    Events {
        /// Time window: today, week, month or all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Write the events of a period as CSV
    Export {
        /// Time window: today, week, month or all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List store collections and the candidates probed for events
    Collections,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Values produced by background jobs
enum Job {
    Login(AuthOutcome),
    Report(PeriodReport),
    Events(Vec<CanonicalEvent>),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        minotor_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("minotor starting");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let mut dispatcher: Dispatcher<Job> = Dispatcher::new(runtime.handle().clone());

    if let Some(email) = &cli.login {
        let session = login(&mut dispatcher, &config, email)?;
        let name = session
            .full_name()
            .or_else(|| session.email().map(str::to_string))
            .unwrap_or_else(|| email.clone());
        eprintln!("Signed in as {} ({})", name, session.role.display_name());
    }

    let repository = open_repository(&config);

    match cli.command {
        Command::Report {
            period,
            format,
            top,
        } => {
            let service = AnalyticsService::new(Arc::new(repository));
            dispatcher.spawn_blocking(move || Ok(Job::Report(service.report(period))));
            let Job::Report(report) = wait_for(&mut dispatcher, "Loading events...")? else {
                bail!("unexpected result from report job");
            };

            match format {
                OutputFormat::Text => print!("{}", render::report(&report, top)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("failed to serialize report")?
                ),
            }
        }
        Command::Events { period, limit } => {
            let mut events = load_events(&mut dispatcher, repository, period)?;
            let total = events.len();
            events.truncate(limit);
            print!("{}", render::events(&events, Utc::now()));
            if total > events.len() {
                println!("({} of {} events shown)", events.len(), total);
            }
        }
        Command::Export { period, output } => {
            let events = load_events(&mut dispatcher, repository, period)?;
            let file = File::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            export::write_csv(BufWriter::new(file), &events)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Exported {} event(s) to {}", events.len(), output.display());
            tracing::info!(path = %output.display(), count = events.len(), "CSV export written");
        }
        Command::Collections => {
            println!("Database: {}", config.store.database_path().display());
            println!("Log: {}", minotor_core::logging::log_file_path().display());
            let overview = repository
                .collection_overview()
                .context("failed to list collections")?;
            print!("{}", render::collections(&overview, repository.collections()));
        }
    }

    Ok(())
}

/// Open the configured store, degrading to a disconnected repository.
fn open_repository(config: &Config) -> EventRepository {
    let db_path = config.store.database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let opened = Database::open(&db_path).and_then(|db| {
        db.migrate()?;
        Ok(db)
    });

    match opened {
        Ok(db) => EventRepository::new(Arc::new(db), &config.store),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Document store unavailable");
            EventRepository::disconnected(&config.store)
        }
    }
}

fn load_events(
    dispatcher: &mut Dispatcher<Job>,
    repository: EventRepository,
    period: Period,
) -> Result<Vec<CanonicalEvent>> {
    let service = AnalyticsService::new(Arc::new(repository));
    dispatcher.spawn_blocking(move || Ok(Job::Events(service.events_by_period(period))));
    match wait_for(dispatcher, "Loading events...")? {
        Job::Events(events) => Ok(events),
        _ => bail!("unexpected result from events job"),
    }
}

/// Block on the next completion while a spinner runs.
fn wait_for(dispatcher: &mut Dispatcher<Job>, message: &str) -> Result<Job> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let completion = dispatcher.blocking_next();
    spinner.finish_and_clear();

    let completion = completion.context("background job did not report back")?;
    Ok(completion.into_result()?)
}

fn login(dispatcher: &mut Dispatcher<Job>, config: &Config, email: &str) -> Result<AuthSession> {
    let credentials = Credentials::new(email, read_password()?);
    credentials.validate()?;

    let client = AuthClient::new(config.auth.clone()).context("invalid auth configuration")?;
    let base_url = client.base_url().to_string();
    dispatcher.spawn(async move { Ok(Job::Login(client.login(&credentials).await)) });

    match wait_for(dispatcher, "Signing in...")? {
        Job::Login(AuthOutcome::Success(session)) => Ok(session),
        Job::Login(AuthOutcome::Failure(failure)) => {
            let hint = match failure.kind() {
                FailureKind::Credentials => "check your email and password".to_string(),
                FailureKind::Role => "ask an administrator for sales access".to_string(),
                FailureKind::Remote => format!("is the identity service running at {}?", base_url),
            };
            bail!("{} ({})", failure, hint)
        }
        _ => bail!("unexpected result from login job"),
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
