//! Vocabulary store CLI.
//!
//! Provides the `vocab` binary with subcommands over the two storage pools
//! (small: settings and legacy data, large: entries, statistics, cache),
//! backed by SQLite files under a data directory. The legacy-data migration
//! runs on every invocation before the command dispatches; it is idempotent.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use vocab_core::{EntryDraft, EntryId, PageSource};
use vocab_store::{
    backup, keys, migrate, stats, CacheConfig, LookupCache, SettingsStore, SortKey, SqlitePool,
    StorageError, WordStore,
};

/// Vocabulary capture store and tools.
#[derive(Parser)]
#[command(name = "vocab", about = "Vocabulary capture store and tools")]
struct Cli {
    /// Directory holding the pool databases.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Save a word or phrase (merges into an existing entry with the same text).
    Add {
        text: String,

        /// Translation in the configured user language.
        #[arg(long)]
        translation: Option<String>,

        /// Primary dictionary meaning.
        #[arg(long)]
        meaning: Option<String>,

        /// Phonetic transcription.
        #[arg(long)]
        phonetic: Option<String>,

        /// Surrounding-text snippet.
        #[arg(long)]
        context: Option<String>,

        /// Page URL the capture came from.
        #[arg(long)]
        url: Option<String>,
    },

    /// List stored entries.
    List {
        /// Sort order: date, alpha, kind.
        #[arg(long, default_value = "date")]
        sort: String,
    },

    /// Case-insensitive search over text, translation, and context.
    Search { query: String },

    /// Delete an entry by id.
    Remove { id: String },

    /// Mark an entry reviewed.
    Review { id: String },

    /// Record a completed review session (extends the daily streak).
    ReviewComplete,

    /// Show statistics.
    Stats,

    /// Export entries and statistics as JSON.
    Export {
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import a previously exported snapshot, replacing current data.
    Import { file: PathBuf },

    /// Show cache usage counters.
    CacheStats,

    /// Remove expired cache entries.
    CacheSweep,

    /// Remove the least-used 20% of cache entries.
    CacheOptimize,

    /// Delete all stored entries.
    Clear,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(&cli.data_dir)?;
    let small_path = cli.data_dir.join("small.db");
    let large_path = cli.data_dir.join("large.db");

    let mut small = SqlitePool::open(
        small_path.to_str().ok_or("data dir path is not valid UTF-8")?,
        keys::SMALL_POOL_QUOTA,
    )?;
    let mut large = SqlitePool::open(
        large_path.to_str().ok_or("data dir path is not valid UTF-8")?,
        keys::LARGE_POOL_QUOTA,
    )?;

    // Safe on every startup; copies legacy data at most once.
    let report = migrate(&small, &mut large)?;
    if !report.is_noop() {
        tracing::info!(?report, "legacy data migrated");
    }

    let settings = SettingsStore::new(&mut small).load()?;

    match cli.command {
        Commands::Add {
            text,
            translation,
            meaning,
            phonetic,
            context,
            url,
        } => {
            let mut draft = EntryDraft::new(text);
            draft.translation = translation;
            draft.meaning = meaning;
            draft.phonetic = phonetic;
            draft.context = context;
            draft.source = url.map(|url| PageSource {
                url: Some(url),
                ..Default::default()
            });

            let mut store = WordStore::new(&mut large, settings.max_words);
            let stored = store.upsert(draft)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }

        Commands::List { sort } => {
            let sort = parse_sort(&sort)?;
            let store = WordStore::new(&mut large, settings.max_words);
            for entry in store.list_sorted(sort)? {
                let translation = entry.translation.as_deref().unwrap_or("-");
                println!("{}  {}  {}", entry.id, entry.text, translation);
            }
        }

        Commands::Search { query } => {
            let store = WordStore::new(&mut large, settings.max_words);
            for entry in store.search(&query)? {
                println!("{}  {}", entry.id, entry.text);
            }
        }

        Commands::Remove { id } => {
            let id: EntryId = id.parse()?;
            let mut store = WordStore::new(&mut large, settings.max_words);
            if store.delete(id)? {
                println!("removed");
            } else {
                return Err(Box::new(StorageError::NotFound { key: id.to_string() }));
            }
        }

        Commands::Review { id } => {
            let id: EntryId = id.parse()?;
            let mut store = WordStore::new(&mut large, settings.max_words);
            if !store.mark_reviewed(id)? {
                return Err(Box::new(StorageError::NotFound { key: id.to_string() }));
            }
            println!("marked reviewed");
        }

        Commands::ReviewComplete => {
            let stats = stats::record_review_complete(&mut large)?;
            println!("current streak: {} day(s)", stats.current_streak);
        }

        Commands::Stats => {
            let stats = stats::recompute(&mut large)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Export { out } => {
            let snapshot = backup::export(&large)?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match out {
                Some(path) => fs::write(path, json)?,
                None => println!("{json}"),
            }
        }

        Commands::Import { file } => {
            let snapshot: backup::Snapshot = serde_json::from_str(&fs::read_to_string(file)?)?;
            backup::import(&mut large, &snapshot)?;
            println!("imported {} entries", snapshot.entries.len());
        }

        Commands::CacheStats => {
            let cache = LookupCache::new(&mut large, CacheConfig::from_settings(&settings));
            println!("{}", serde_json::to_string_pretty(&cache.stats()?)?);
        }

        Commands::CacheSweep => {
            let mut cache = LookupCache::new(&mut large, CacheConfig::from_settings(&settings));
            println!("removed {} expired entries", cache.sweep_expired()?);
        }

        Commands::CacheOptimize => {
            let mut cache = LookupCache::new(&mut large, CacheConfig::from_settings(&settings));
            println!("removed {} cold entries", cache.optimize()?);
        }

        Commands::Clear => {
            let mut store = WordStore::new(&mut large, settings.max_words);
            store.clear()?;
            println!("cleared");
        }
    }

    Ok(())
}

fn parse_sort(sort: &str) -> Result<SortKey, String> {
    match sort {
        "date" => Ok(SortKey::Date),
        "alpha" | "alphabetical" => Ok(SortKey::Alphabetical),
        "kind" | "type" => Ok(SortKey::Kind),
        other => Err(format!("unknown sort order: {other}")),
    }
}
