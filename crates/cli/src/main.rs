mod config;
mod error;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use storage::{EventStore, SessionStore, SqliteStorage};
use tracker::{
    EmitStatus, ScreenViewEvent, SelfDescribingEvent, SelfDescribingJson, Snowplow,
    StructuredEvent, Subject, TimingEvent, Tracker,
};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "snowplow.toml";
const DB_FILE: &str = "events.db";

#[derive(Parser)]
#[command(name = "snowplow")]
#[command(about = "Track events and deliver them to a Snowplow collector", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track an event, then send everything queued
    Track {
        #[command(subcommand)]
        event: TrackCommand,

        #[command(flatten)]
        common: TrackArgs,
    },
    /// Send all queued events
    Flush {
        #[command(flatten)]
        send: SendArgs,
    },
    /// Show the number of queued events
    Pending,
    /// Show the stored client session
    Session,
    /// Drop all queued events
    Clear,
}

#[derive(Subcommand)]
enum TrackCommand {
    /// A category/action event
    Structured {
        #[arg(long)]
        category: String,
        #[arg(long)]
        action: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        property: Option<String>,
        #[arg(long)]
        value: Option<f64>,
    },
    /// A screen view
    ScreenView {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// A user timing in milliseconds
    Timing {
        #[arg(long)]
        category: String,
        #[arg(long)]
        variable: String,
        #[arg(long)]
        timing: u64,
        #[arg(long)]
        label: Option<String>,
    },
    /// A custom event described by an Iglu schema
    SelfDescribing {
        #[arg(long)]
        schema: String,
        /// Event data as a JSON object
        #[arg(long)]
        data: String,
    },
}

#[derive(Args)]
struct TrackArgs {
    /// Context entities as a JSON array of {"schema": ..., "data": ...}
    #[arg(long, global = true)]
    context: Option<String>,

    /// User id attached to the event
    #[arg(long, global = true)]
    user_id: Option<String>,

    #[command(flatten)]
    send: SendArgs,
}

#[derive(Args)]
struct SendArgs {
    /// Seconds to wait for the collector before giving up
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,
}

/// Outcome counts collected from the emitter callback.
#[derive(Debug, Default)]
struct SendReport {
    sent: AtomicUsize,
    will_retry: AtomicUsize,
    dropped: AtomicUsize,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    logging::init(&config.logging.level);

    let db_path = config.db_path(&default_db_path());
    tracing::debug!(config = %cli.config.display(), db = %db_path.display(), "configuration loaded");

    match cli.command {
        Commands::Track { event, common } => cmd_track(&config, &db_path, event, common).await,
        Commands::Flush { send } => cmd_flush(&config, &db_path, send.timeout).await,
        Commands::Pending => {
            let count = cmd_pending(&db_path)?;
            println!("{count} event(s) queued in {}", db_path.display());
            Ok(())
        }
        Commands::Session => cmd_session(&db_path),
        Commands::Clear => {
            let removed = cmd_clear(&db_path)?;
            println!("Dropped {removed} queued event(s).");
            Ok(())
        }
    }
}

async fn cmd_track(
    config: &Config,
    db_path: &Path,
    event: TrackCommand,
    common: TrackArgs,
) -> Result<()> {
    let context = common
        .context
        .as_deref()
        .map(parse_contexts)
        .transpose()?
        .unwrap_or_default();

    let subject = common.user_id.as_deref().map(|user_id| {
        let mut subject = Subject::new();
        subject.set_user_id(user_id);
        subject
    });

    let report = Arc::new(SendReport::default());
    let tracker = create_tracker(config, db_path, subject, Arc::clone(&report))?;

    let event_id = match event {
        TrackCommand::Structured {
            category,
            action,
            label,
            property,
            value,
        } => {
            let mut event = StructuredEvent::new(category, action).with_context(context);
            if let Some(label) = label {
                event = event.label(label);
            }
            if let Some(property) = property {
                event = event.property(property);
            }
            if let Some(value) = value {
                event = event.value(value);
            }
            tracker.track(&event)?
        }
        TrackCommand::ScreenView { name, id } => {
            let mut event = ScreenViewEvent::new().with_context(context);
            if let Some(name) = name {
                event = event.name(name);
            }
            if let Some(id) = id {
                event = event.id(id);
            }
            tracker.track(&event)?
        }
        TrackCommand::Timing {
            category,
            variable,
            timing,
            label,
        } => {
            let mut event = TimingEvent::new(category, variable, timing).with_context(context);
            if let Some(label) = label {
                event = event.label(label);
            }
            tracker.track(&event)?
        }
        TrackCommand::SelfDescribing { schema, data } => {
            let data = serde_json::from_str(&data)
                .map_err(|source| Error::InvalidJson { arg: "data", source })?;
            let event = SelfDescribingEvent::new(SelfDescribingJson::new(schema, data))
                .with_context(context);
            tracker.track(&event)?
        }
    };
    println!("Tracked event {event_id}");

    send(&tracker, &report, common.send.timeout).await
}

async fn cmd_flush(config: &Config, db_path: &Path, timeout: u64) -> Result<()> {
    if !db_path.exists() {
        return Err(Error::DatabaseNotFound {
            path: db_path.to_path_buf(),
        });
    }

    let report = Arc::new(SendReport::default());
    let tracker = create_tracker(config, db_path, None, Arc::clone(&report))?;
    send(&tracker, &report, timeout).await
}

fn cmd_pending(db_path: &Path) -> Result<usize> {
    let store = open_store(db_path)?;
    Ok(store.count_events()?)
}

fn cmd_session(db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    match store.get_session()? {
        Some(session) => {
            let pretty = serde_json::to_string_pretty(&session).map_err(storage::Error::from)?;
            println!("{pretty}");
        }
        None => println!("No session stored."),
    }
    Ok(())
}

fn cmd_clear(db_path: &Path) -> Result<usize> {
    let store = open_store(db_path)?;
    let count = store.count_events()?;
    store.delete_all_event_rows()?;
    Ok(count)
}

/// Build and register a tracker whose emitter reports into `report`.
fn create_tracker(
    config: &Config,
    db_path: &Path,
    subject: Option<Subject>,
    report: Arc<SendReport>,
) -> Result<Arc<Tracker>> {
    let network = config.network()?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let callback = move |ids: Vec<String>, status: EmitStatus| {
        let counter = match status {
            EmitStatus::Success => &report.sent,
            EmitStatus::FailedWillRetry => &report.will_retry,
            EmitStatus::FailedWontRetry => &report.dropped,
        };
        counter.fetch_add(ids.len(), Ordering::Relaxed);
    };
    let emitter = config
        .emitter(db_path)?
        .request_callback(Arc::new(callback), &EmitStatus::ALL);
    let session = config.session(db_path)?;

    Ok(Snowplow::create_tracker(
        config.tracker(),
        &network,
        &emitter,
        session.as_ref(),
        subject,
    )?)
}

/// Flush the tracker, giving up after `timeout` seconds.
async fn send(tracker: &Tracker, report: &SendReport, timeout: u64) -> Result<()> {
    match tokio::time::timeout(Duration::from_secs(timeout), tracker.flush()).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(timeout_secs = timeout, "collector did not accept all events in time");
            tracker.stop().await;
        }
    }

    let remaining = tracker.emitter().event_store().count_events()?;
    println!(
        "Sent {} event(s), {} failed and will be retried, {} dropped, {remaining} still queued.",
        report.sent.load(Ordering::Relaxed),
        report.will_retry.load(Ordering::Relaxed),
        report.dropped.load(Ordering::Relaxed),
    );
    Ok(())
}

fn parse_contexts(raw: &str) -> Result<Vec<SelfDescribingJson>> {
    serde_json::from_str(raw).map_err(|source| Error::InvalidJson { arg: "context", source })
}

fn open_store(db_path: &Path) -> Result<SqliteStorage> {
    if !db_path.exists() {
        return Err(Error::DatabaseNotFound {
            path: db_path.to_path_buf(),
        });
    }

    Ok(SqliteStorage::open(db_path)?)
}

fn default_db_path() -> PathBuf {
    dirs_data_dir()
        .unwrap_or_else(|| ".snowplow".into())
        .join(DB_FILE)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join("Library/Application Support/snowplow"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("snowplow"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("snowplow"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::Payload;

    #[test]
    fn parses_track_structured() {
        let cli = Cli::try_parse_from([
            "snowplow",
            "track",
            "structured",
            "--category",
            "shop",
            "--action",
            "add",
            "--value",
            "2.5",
            "--user-id",
            "u1",
        ])
        .unwrap();

        match cli.command {
            Commands::Track {
                event: TrackCommand::Structured {
                    category,
                    action,
                    value,
                    label,
                    ..
                },
                common,
            } => {
                assert_eq!(category, "shop");
                assert_eq!(action, "add");
                assert_eq!(value, Some(2.5));
                assert!(label.is_none());
                assert_eq!(common.user_id.as_deref(), Some("u1"));
                assert_eq!(common.send.timeout, 30);
            }
            _ => panic!("expected track structured"),
        }
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }

    #[test]
    fn timing_requires_a_number() {
        let parsed = Cli::try_parse_from([
            "snowplow", "track", "timing", "--category", "c", "--variable", "v", "--timing", "x",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_contexts() {
        let contexts = parse_contexts(
            r#"[{"schema": "iglu:com.acme/a/jsonschema/1-0-0", "data": {"k": 1}},
                {"schema": "iglu:com.acme/b/jsonschema/1-0-0", "data": []}]"#,
        )
        .unwrap();

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].schema(), "iglu:com.acme/a/jsonschema/1-0-0");
        assert_eq!(contexts[0].data()["k"], 1);
    }

    #[test]
    fn malformed_context_is_rejected() {
        assert!(matches!(
            parse_contexts(r#"[{"data": {}}]"#),
            Err(Error::InvalidJson { arg: "context", .. })
        ));
        assert!(parse_contexts("not json").is_err());
    }

    #[test]
    fn pending_and_clear_work_on_the_queue() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join(DB_FILE);
        {
            let store = SqliteStorage::open(&db_path).unwrap();
            for i in 0..3 {
                let mut payload = Payload::new();
                payload.add("eid", format!("e{i}"));
                store.add_event(&payload).unwrap();
            }
        }

        assert_eq!(cmd_pending(&db_path).unwrap(), 3);
        assert_eq!(cmd_clear(&db_path).unwrap(), 3);
        assert_eq!(cmd_pending(&db_path).unwrap(), 0);
    }

    #[test]
    fn missing_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("absent.db");

        assert!(matches!(cmd_pending(&db_path), Err(Error::DatabaseNotFound { .. })));
        assert!(matches!(cmd_session(&db_path), Err(Error::DatabaseNotFound { .. })));
    }
}
