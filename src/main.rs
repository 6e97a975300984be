//! # docdock CLI (`dock`)
//!
//! Terminal front end for the knowledge-jar backend: attach documents,
//! pick knowledge indexes, and talk to the assistant.
//!
//! ## Usage
//!
//! ```bash
//! dock --config ./config/dock.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dock health` | Probe backend liveness |
//! | `dock indexes` | List available knowledge indexes |
//! | `dock select <names>...` | Select the active index (or indexes) |
//! | `dock toggle <name>` | Toggle one index in the tracked selection |
//! | `dock current` | Show the backend's current selection |
//! | `dock add <files>...` | Ingest local files into source records |
//! | `dock chat <message>...` | Send a chat message |
//! | `dock analyze [files]...` | Generate a handover document from files |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docdock::config::{self, Config};
use docdock::gateway::{ChatPayload, Gateway, Reply};
use docdock::ingest;
use docdock::models::{ChatMessage, UuidIds};
use docdock::registry::Registry;
use docdock::sidebar::Sidebar;

/// docdock CLI — attach documents, select knowledge indexes, and chat
/// against the knowledge-jar assistant backend.
#[derive(Parser)]
#[command(
    name = "dock",
    about = "docdock — client-side document ingestion and index selection for the knowledge-jar backend",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dock.toml")]
    config: PathBuf,

    /// Backend base URL, overriding the config file (which then becomes
    /// optional).
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe backend liveness.
    ///
    /// Uses a 5-second timeout and always prints a status line — failures
    /// are reported, never thrown.
    Health,

    /// List available knowledge indexes with document counts.
    Indexes,

    /// Select the active index (one name) or index set (several names).
    ///
    /// Selecting several names overwrites the backend's previous
    /// selection; it is not additive.
    Select {
        /// Index names to activate.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Toggle one index in the tracked selection.
    ///
    /// Loads the index list, applies the default selection, then toggles
    /// the given name. Removing the last selected index is refused.
    Toggle {
        /// Index name to toggle.
        name: String,
    },

    /// Show the backend's current index and full selected set.
    Current,

    /// Ingest local files into source records.
    ///
    /// Text files are decoded locally; PDFs are uploaded for backend-side
    /// extraction; anything else gets an unsupported-type placeholder.
    /// Per-file failures never abort the batch.
    Add {
        /// Files to ingest.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Send a chat message to the assistant.
    Chat {
        /// The message text (words are joined with spaces).
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Generate a handover document from the given files.
    ///
    /// Ingests the files, builds an analysis prompt from their content,
    /// and prints the backend's JSON reply (or raw text when the reply is
    /// not JSON).
    Analyze {
        /// Files to analyze.
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docdock=warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Health => run_health(&cfg).await?,
        Commands::Indexes => run_indexes(&cfg).await?,
        Commands::Select { names } => run_select(&cfg, &names).await?,
        Commands::Toggle { name } => run_toggle(&cfg, &name).await?,
        Commands::Current => run_current(&cfg).await?,
        Commands::Add { files } => run_add(&cfg, &files).await?,
        Commands::Chat { message } => run_chat(&cfg, &message).await?,
        Commands::Analyze { files } => run_analyze(&cfg, &files).await?,
    }

    Ok(())
}

/// Config file, with `--base-url` as an override or a full substitute.
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => match &cli.base_url {
            Some(url) => return Ok(Config::minimal(url.trim_end_matches('/'))),
            None => return Err(e),
        },
    };
    if let Some(url) = &cli.base_url {
        cfg.backend.base_url = url.trim_end_matches('/').to_string();
    }
    Ok(cfg)
}

async fn run_health(cfg: &Config) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    let health = registry.check_health().await;
    if health.connected {
        println!("connected ({})", health.status.as_deref().unwrap_or("ok"));
    } else {
        println!(
            "disconnected: {}",
            health.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn run_indexes(cfg: &Config) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    let list = registry.list_indexes().await?;

    if list.indexes.is_empty() {
        println!("No indexes available.");
        return Ok(());
    }

    println!("{:<28} {:>10} {:>8}", "INDEX", "DOCUMENTS", "CURRENT");
    for idx in &list.indexes {
        println!(
            "{:<28} {:>10} {:>8}",
            idx.name,
            idx.document_count,
            if idx.is_current { "yes" } else { "" }
        );
    }
    println!();
    println!("current: {}", list.current_index);
    Ok(())
}

async fn run_select(cfg: &Config, names: &[String]) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    if let [name] = names {
        let reply = registry.select_index(name).await?;
        println!("current index: {}", reply.current_index);
    } else {
        let reply = registry.select_multiple(names).await?;
        println!("selected: {}", reply.selected_indexes.join(", "));
    }
    Ok(())
}

async fn run_toggle(cfg: &Config, name: &str) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    let mut sidebar = Sidebar::new();
    sidebar.reload_indexes(&registry).await?;

    match sidebar.toggle_index(name, &registry).await {
        Some(change) => {
            let names: Vec<&str> = change.selected.iter().map(|d| d.name.as_str()).collect();
            println!("selected: {}", names.join(", "));
        }
        None => println!("no-op: at least one index must stay selected"),
    }
    Ok(())
}

async fn run_current(cfg: &Config) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    let current = registry.current_selection().await?;
    println!("current index: {}", current.current_index);
    if !current.selected_indexes.is_empty() {
        println!("selected: {}", current.selected_indexes.join(", "));
    }
    Ok(())
}

async fn run_add(cfg: &Config, files: &[PathBuf]) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    let mut sidebar = Sidebar::new();

    // Nonfatal: ingestion still works without index metadata, uploads just
    // go untargeted.
    if sidebar.reload_indexes(&registry).await.is_err() {
        eprintln!("warning: index list unavailable, uploading without index targeting");
    }

    let ids = UuidIds;
    let selected: Vec<String> = sidebar.selection().to_vec();
    let batch = ingest::ingest_files(files, &selected, &registry, &ids).await;
    sidebar.attach(batch);

    println!("{:<38} {:<26} {:<24} {:>8}", "ID", "NAME", "TYPE", "CHARS");
    for record in sidebar.records() {
        println!(
            "{:<38} {:<26} {:<24} {:>8}",
            record.id,
            record.name,
            record.mime_type,
            record.content.chars().count()
        );
    }
    println!();
    println!("ingested {} file(s)", sidebar.records().len());
    Ok(())
}

async fn run_chat(cfg: &Config, message: &[String]) -> anyhow::Result<()> {
    let gateway = Gateway::new(cfg.backend.clone())?;
    let messages = vec![
        ChatMessage::system("You are the knowledge-jar handover assistant."),
        ChatMessage::user(message.join(" ")),
    ];
    let reply = gateway.chat(&messages).await?;
    println!("{}", reply);
    Ok(())
}

async fn run_analyze(cfg: &Config, files: &[PathBuf]) -> anyhow::Result<()> {
    let registry = Registry::new(&cfg.backend)?;
    let mut sidebar = Sidebar::new();
    if sidebar.reload_indexes(&registry).await.is_err() {
        eprintln!("warning: index list unavailable, uploading without index targeting");
    }

    let ids = UuidIds;
    let selected: Vec<String> = sidebar.selection().to_vec();
    let batch = ingest::ingest_files(files, &selected, &registry, &ids).await;
    sidebar.attach(batch);

    // First 2000 characters per file keeps the prompt bounded.
    let file_context: Vec<String> = sidebar
        .records()
        .iter()
        .map(|r| {
            let content: String = r.content.chars().take(2000).collect();
            format!("[file: {}]\n{}", r.name, content)
        })
        .collect();

    let payload = ChatPayload::json_object(vec![
        ChatMessage::system(
            "You are a handover-document writer. Respond with a JSON document only.",
        ),
        ChatMessage::user(format!(
            "Analyze the following material and produce a handover document as JSON. \
             Use sample data if no material is given:\n\n{}",
            file_context.join("\n\n---\n")
        )),
    ]);

    let gateway = Gateway::new(cfg.backend.clone())?;
    match gateway.send("/analyze", &payload).await? {
        Reply::Structured(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Reply::Raw(text) => println!("{}", text),
    }
    Ok(())
}
