//! CLI binary for classroom-convert.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, drives the tracker, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use classroom_convert::{
    classify, is_convertible, join_room_uuid, should_convert, Animation, ClientConfig,
    ConversionStep, ConversionTracker, ConvertError, FileRecord, FileRecordStore,
    InMemoryFileStore, JobIndicator, ReqwestDispatcher, StatusObserver, SubmitError, Submitter,
    TriggerOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal status presenter ────────────────────────────────────────────────

/// Shows a spinner while any file is converting and logs each step change.
struct CliStatusObserver {
    bar: ProgressBar,
    converting: AtomicUsize,
}

impl CliStatusObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        Arc::new(Self {
            bar,
            converting: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StatusObserver for CliStatusObserver {
    fn on_step_changed(&self, file_id: &str, from: ConversionStep, to: ConversionStep) {
        match JobIndicator::animation_change(from.into(), to.into()) {
            Some(Animation::Start) => {
                if self.converting.fetch_add(1, Ordering::SeqCst) == 0 {
                    self.bar.enable_steady_tick(Duration::from_millis(80));
                }
            }
            Some(Animation::Stop) => {
                if self.converting.fetch_sub(1, Ordering::SeqCst) == 1 {
                    self.bar.disable_steady_tick();
                }
            }
            None => {}
        }
        let n = self.converting.load(Ordering::SeqCst);
        self.bar.set_message(format!("{n} submission(s) in flight"));

        let mark = match JobIndicator::from(to) {
            JobIndicator::Error => red("✗"),
            JobIndicator::Converting => dim("…"),
            JobIndicator::Idle => green("✓"),
        };
        self.bar
            .println(format!("  {mark} {file_id}  {}", dim(&format!("{from} → {to}"))));
    }

    fn on_submission_failed(&self, file_id: &str, error: &SubmitError) {
        let msg = error.to_string();
        // Truncate very long error messages to keep output tidy.
        let msg = if msg.chars().count() > 80 {
            format!("{}\u{2026}", msg.chars().take(79).collect::<String>())
        } else {
            msg
        };
        self.bar.println(format!("  {} {file_id}  {}", red("✗"), red(&msg)));
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Which conversion would these files get?
  classroom-convert classify lecture.pptx notes.docx photo.png

  # Would a file in a given step be submitted?
  classroom-convert check notes.docx --step converting

  # Submit one stored file for conversion
  classroom-convert --base-url https://api.example.com --token $TOKEN submit abc-123

  # Submit every eligible file of a storage listing (JSON array of records)
  classroom-convert --base-url https://api.example.com batch listing.json

  # Extract the room UUID from a join link
  classroom-convert join-link 'x-agora-flat-client://joinRoom?roomUUID=abc'

ENVIRONMENT VARIABLES:
  CLASSROOM_API_BASE_URL  API server base URL
  CLASSROOM_API_TOKEN     Bearer token
  CLASSROOM_API_TIMEOUT   Request timeout in seconds
  RUST_LOG                Log filter (overrides --verbose)
"#;

/// Classify, check, and submit whiteboard document conversions.
#[derive(Parser, Debug)]
#[command(
    name = "classroom-convert",
    version,
    about = "Classify, check, and submit whiteboard document conversions",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API server base URL.
    #[arg(long, global = true, env = "CLASSROOM_API_BASE_URL", default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Bearer token for the API server.
    #[arg(long, global = true, env = "CLASSROOM_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "CLASSROOM_API_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Maximum concurrent submissions in batch mode.
    #[arg(short, long, global = true, default_value_t = 4)]
    concurrency: usize,

    /// Output JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the conversion kind of each path or URL.
    Classify {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Decide whether a file in the given step would be submitted.
    Check {
        input: String,
        /// Current step: none, submitting, converting, done, failed.
        #[arg(long, default_value = "none")]
        step: ConversionStep,
    },
    /// Submit one file for conversion.
    Submit {
        file_uuid: String,
        /// File path or URL; when given, the eligibility check runs first.
        #[arg(long)]
        file: Option<String>,
    },
    /// Submit every eligible file in a JSON listing.
    Batch { listing: PathBuf },
    /// Print the room UUID carried by a join link.
    JoinLink { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Classify { ref inputs } => run_classify(inputs, cli.json),
        Command::Check { ref input, step } => run_check(input, step, cli.json),
        Command::JoinLink { ref url } => run_join_link(url, cli.json),
        Command::Submit {
            ref file_uuid,
            ref file,
        } => run_submit(&cli, file_uuid, file.as_deref(), show_progress).await,
        Command::Batch { ref listing } => run_batch(&cli, listing, show_progress).await,
    }
}

fn run_classify(inputs: &[String], json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = inputs
            .iter()
            .map(|i| serde_json::json!({ "input": i, "kind": classify(i) }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for input in inputs {
        let kind = classify(input)
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{kind:<8} {input}");
    }
    Ok(())
}

fn run_check(input: &str, step: ConversionStep, json: bool) -> Result<()> {
    let record = FileRecord::new("cli", input).with_step(step);
    let convertible = is_convertible(input);
    let should = should_convert(&record);
    if json {
        let out = serde_json::json!({
            "input": input,
            "step": step,
            "convertible": convertible,
            "kind": classify(input),
            "shouldConvert": should,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Convertible:    {convertible}");
        if let Some(kind) = classify(input) {
            println!("Kind:           {kind}");
        }
        println!("Step:           {step}");
        println!("Should convert: {should}");
    }
    Ok(())
}

fn run_join_link(url: &str, json: bool) -> Result<()> {
    let room = join_room_uuid(url).with_context(|| format!("'{url}' is not a join-room link"))?;
    if json {
        println!("{}", serde_json::json!({ "roomUUID": room }));
    } else {
        println!("{room}");
    }
    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.base_url.clone())
        .request_timeout_secs(cli.timeout)
        .concurrency(cli.concurrency);
    if let Some(ref token) = cli.token {
        builder = builder.token(token.clone());
    }
    builder.build().context("Invalid configuration")
}

async fn run_submit(
    cli: &Cli,
    file_uuid: &str,
    file: Option<&str>,
    show_progress: bool,
) -> Result<()> {
    let config = build_config(cli)?;
    let dispatcher = Arc::new(ReqwestDispatcher::new(&config)?);

    let response = match file {
        // Without a file name there is nothing to classify: submit directly.
        None => {
            let bar = show_progress.then(|| {
                let o = CliStatusObserver::new();
                o.bar.set_message(format!("submitting {file_uuid}"));
                o.bar.enable_steady_tick(Duration::from_millis(80));
                o
            });
            let submitter = Submitter::new(dispatcher, &config);
            let result = submitter.submit(file_uuid)?.outcome().await;
            if let Some(o) = bar {
                o.finish();
            }
            result.map_err(|source| ConvertError::SubmitFailed {
                file_id: file_uuid.to_string(),
                source,
            })?
        }
        Some(file) => {
            let store = Arc::new(InMemoryFileStore::new());
            store.insert(FileRecord::new(file_uuid, file));
            let observer = show_progress.then(CliStatusObserver::new);
            let mut tracker = ConversionTracker::new(store, dispatcher, &config);
            if let Some(ref o) = observer {
                tracker = tracker.with_observer(o.clone());
            }
            let outcome = tracker.trigger(file_uuid).await;
            if let Some(o) = observer {
                o.finish();
            }
            match outcome.context("Conversion submission failed")? {
                TriggerOutcome::Started(response) => response,
                TriggerOutcome::Skipped { step } => {
                    if !cli.quiet {
                        eprintln!(
                            "{} {} not submitted (convertible: {}, step: {})",
                            dim("–"),
                            bold(file_uuid),
                            is_convertible(file),
                            step
                        );
                    }
                    return Ok(());
                }
            }
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("taskUUID:  {}", response.task_uuid);
        println!("taskToken: {}", response.task_token);
        if !cli.quiet {
            eprintln!("{} conversion started for {}", green("✔"), bold(file_uuid));
        }
    }
    Ok(())
}

async fn run_batch(cli: &Cli, listing: &Path, show_progress: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(listing)
        .await
        .with_context(|| format!("Failed to read listing {:?}", listing))?;
    let records: Vec<FileRecord> =
        serde_json::from_str(&text).context("Listing must be a JSON array of file records")?;

    let config = build_config(cli)?;
    let dispatcher = Arc::new(ReqwestDispatcher::new(&config)?);
    let store: Arc<InMemoryFileStore> = Arc::new(records.into_iter().collect());
    let observer = show_progress.then(CliStatusObserver::new);
    let mut tracker = ConversionTracker::new(store.clone(), dispatcher, &config);
    if let Some(ref o) = observer {
        tracker = tracker.with_observer(o.clone());
    }

    let results = tracker.trigger_all().await?;
    if let Some(o) = observer {
        o.finish();
    }

    let started = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(TriggerOutcome::Started(_))))
        .count();
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&store.list().await?)?);
    } else if !cli.quiet {
        eprintln!(
            "{}  {} started  {} failed  ({} eligible)",
            if failed == 0 { green("✔") } else { red("✘") },
            bold(&started.to_string()),
            red(&failed.to_string()),
            results.len()
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} conversion submission(s) failed");
    }
    Ok(())
}
