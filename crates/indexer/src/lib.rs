//! # promptdir indexer
//!
//! Keeps an in-memory index of a directory of markdown prompts in sync with
//! the files on disk.
//!
//! ## Pipeline
//!
//! ```text
//! Root directory
//!     │
//!     ├──> DirectoryScanner (skips hidden entries)
//!     │      └─> *.md relative paths
//!     │
//!     ├──> Record loader (front matter + preview)
//!     │      └─> PromptRecord
//!     │
//!     ├──> IndexCache (name → record)
//!     │
//!     └──> ChangeWatcher (notify → WatchEvent channel → IndexCache)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use promptdir_indexer::{IndexConfig, PromptFiles};
//!
//! #[tokio::main]
//! async fn main() -> promptdir_indexer::Result<()> {
//!     let files = PromptFiles::new(IndexConfig::new("/path/to/prompts"));
//!     for record in files.list_all().await? {
//!         println!("{}: {}", record.name, record.preview);
//!     }
//!     files.shutdown();
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod facade;
mod front_matter;
mod loader;
mod resolver;
mod scanner;
mod stats;
mod template;
mod watcher;

pub use cache::IndexCache;
pub use config::{
    default_root, IndexConfig, WatcherConfig, DEFAULT_MAX_DEPTH, LOAD_CONCURRENCY_ENV,
    MAX_DEPTH_ENV, ROOT_ENV,
};
pub use error::{IndexerError, Result};
pub use facade::{NewPrompt, PromptFiles};
pub use front_matter::{parse_front_matter, render_document, ParsedDocument};
pub use loader::{load_record, try_load_record};
pub use resolver::NameResolver;
pub use scanner::{DirectoryScanner, ScanReport, ScanWarning};
pub use stats::LoadStats;
pub use template::{placeholders, substitute_arguments};
pub use watcher::{translate_event, ChangeWatcher, WatchEvent, WatchEventKind};

pub use promptdir_protocol::{sanitize_name, Attributes, PromptRecord};
