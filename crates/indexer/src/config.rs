use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ROOT_ENV: &str = "PROMPTDIR_ROOT";
pub const MAX_DEPTH_ENV: &str = "PROMPTDIR_MAX_DEPTH";
pub const LOAD_CONCURRENCY_ENV: &str = "PROMPTDIR_LOAD_CONCURRENCY";

pub const DEFAULT_MAX_DEPTH: usize = 32;
const MAX_DEPTH_LIMIT: usize = 256;
const MAX_LOAD_CONCURRENCY: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Capacity of the channel between the OS callback and the cache consumer.
    pub channel_capacity: usize,
    /// Only used by polling backends.
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            poll_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub root: PathBuf,
    pub max_depth: usize,
    pub load_concurrency: usize,
    pub watcher: WatcherConfig,
}

impl IndexConfig {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
            load_concurrency: default_load_concurrency(),
            watcher: WatcherConfig::default(),
        }
    }

    /// Build a config from `PROMPTDIR_*` environment variables.
    pub fn from_env() -> Self {
        let root = std::env::var_os(ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_root);
        let mut config = Self::new(root);
        config.max_depth = parse_bounded(
            std::env::var(MAX_DEPTH_ENV).ok().as_deref(),
            DEFAULT_MAX_DEPTH,
            MAX_DEPTH_LIMIT,
        );
        config.load_concurrency = parse_bounded(
            std::env::var(LOAD_CONCURRENCY_ENV).ok().as_deref(),
            default_load_concurrency(),
            MAX_LOAD_CONCURRENCY,
        );
        config
    }

    #[must_use]
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.clamp(1, MAX_DEPTH_LIMIT);
        self
    }

    #[must_use]
    pub fn with_load_concurrency(mut self, limit: usize) -> Self {
        self.load_concurrency = limit.clamp(1, MAX_LOAD_CONCURRENCY);
        self
    }
}

/// `<home>/.promptdir/prompts`, or `./prompts` when no home directory is known.
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".promptdir").join("prompts"))
        .unwrap_or_else(|| PathBuf::from("prompts"))
}

fn default_load_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_LOAD_CONCURRENCY)
}

fn parse_bounded(raw: Option<&str>, default_value: usize, max: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, max)
}
