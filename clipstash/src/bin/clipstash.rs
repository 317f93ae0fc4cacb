//! Inspect a persisted clipboard history
//!
//! Run with: cargo run --bin clipstash -- --db history.sqlite list --favorites

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipstash::{ClipboardStore, Selection, SqlitePersistence, StashConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite history database
    #[arg(short, long, default_value = "clipstash.sqlite")]
    db: PathBuf,

    /// Optional TOML config (capacity, clear_policy, all_view_policy, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filtered history, newest first
    List {
        /// Only favorites
        #[arg(long, conflicts_with = "tag")]
        favorites: bool,

        /// Only items carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Case-insensitive search over content and tag names
        #[arg(short, long, default_value = "")]
        query: String,

        /// Preview length per row
        #[arg(long, default_value_t = 80)]
        width: usize,
    },
    /// Print every known tag with its icon and color
    Tags,
    /// Clear the history using the configured clear policy
    Clear,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            StashConfig::from_toml_str(&source)?
        }
        None => StashConfig::default(),
    };

    let persistence = SqlitePersistence::open(&args.db)
        .with_context(|| format!("opening history at {}", args.db.display()))?;
    let store = ClipboardStore::open(Arc::new(persistence), config);

    match args.command {
        Command::List { favorites, tag, query, width } => {
            let selection = match (favorites, tag) {
                (true, _) => Selection::Favorites,
                (false, Some(tag)) => Selection::Tag(tag),
                (false, None) => Selection::All,
            };
            for item in store.view(&selection, &query) {
                let marker = if item.is_favorite() { "*" } else { " " };
                let tags: Vec<&str> = item.tags().iter().collect();
                println!(
                    "{} {} {}  {}  [{}]",
                    marker,
                    item.id(),
                    item.created_at().format("%Y-%m-%d %H:%M:%S"),
                    item.preview(width),
                    tags.join(", ")
                );
            }
        }
        Command::Tags => {
            for name in store.all_tags() {
                let style = store.tag_style(&name);
                println!("{:<20} {:<45} #{:08x}", name, style.icon, style.rgba);
            }
        }
        Command::Clear => {
            let removed = store.clear();
            println!("Removed {} items", removed);
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
