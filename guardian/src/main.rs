//! guardian — AI code review with a persistent issue store.
//!
//! Two entry modes share one binary and one SQLite store:
//!
//! - **Review** (default): collect code from files, a directory, stdin, or
//!   the staged git diff; stream each piece through a local Ollama-compatible
//!   model; render the review live to stdout; persist structured issues.
//! - **Manager** (`--manage`): a ratatui TUI over the store for triaging the
//!   recorded issues — status changes, filtering, comment threads.
//!
//! The store path defaults to `.guardian/issues.db` in the working directory,
//! so a review in one terminal and the manager in another see the same data.

mod input;
mod manager;
mod ollama;
mod prompt;
mod render;
mod review;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use ollama::OllamaClient;
use review::ReviewRequest;

#[derive(Debug, Parser)]
#[command(name = "guardian", version, about = "AI code review with a persistent issue store")]
struct Cli {
    /// Files to review. With no files, code is read from stdin.
    files: Vec<PathBuf>,

    /// Review every .py file under this directory instead.
    #[arg(short, long, conflicts_with = "files")]
    directory: Option<PathBuf>,

    /// Review the staged Python changes in the current git repository.
    #[arg(long, conflicts_with_all = ["files", "directory"])]
    staged: bool,

    /// Extra review rules appended to the prompt, read from this file.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Model identifier, overriding the config file.
    #[arg(short, long)]
    model: Option<String>,

    /// Model service base URL, overriding the config file.
    #[arg(long)]
    url: Option<String>,

    /// Path to the issue store.
    #[arg(long, default_value = ".guardian/issues.db")]
    db: String,

    /// Disable ANSI styling; stream the raw markdown verbatim.
    #[arg(long)]
    plain: bool,

    /// Debug-level logging on stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Open the issue manager TUI instead of running a review.
    #[arg(long)]
    manage: bool,
}

/// Optional config file values; every field has a default so a missing or
/// partial file is fine.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    theme: String,
    model: String,
    url: String,
    idle_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            model: ollama::DEFAULT_MODEL.to_owned(),
            url: ollama::DEFAULT_URL.to_owned(),
            idle_timeout_secs: ollama::DEFAULT_IDLE_TIMEOUT.as_secs(),
        }
    }
}

/// Returns the path to the guardian config file.
///
/// Prefers `$XDG_CONFIG_HOME/guardian/config.toml`; falls back to
/// `~/.config/guardian/config.toml` when the env var is absent.
fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("guardian").join("config.toml")
}

/// Loads the config file. Config errors are soft failures printed to stderr;
/// defaults always apply.
fn load_config() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("guardian: config parse error in {:?}: {}", path, e);
            Config::default()
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "guardian=debug,guardian_core=debug" } else { "guardian=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    // stderr, so logs never interleave with the rendered review on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn collect_requests(cli: &Cli) -> anyhow::Result<Vec<ReviewRequest>> {
    if cli.staged {
        return match input::staged_python_diff(Path::new("."))? {
            Some(request) => Ok(vec![request]),
            None => anyhow::bail!("no staged Python changes to review"),
        };
    }
    if let Some(dir) = &cli.directory {
        let requests = input::from_directory(dir)?;
        if requests.is_empty() {
            anyhow::bail!("no Python files found under {}", dir.display());
        }
        return Ok(requests);
    }
    if !cli.files.is_empty() {
        let requests = input::from_files(&cli.files);
        if requests.is_empty() {
            anyhow::bail!("none of the given files could be read");
        }
        return Ok(requests);
    }
    if std::io::stdin().is_terminal() {
        anyhow::bail!("no input: pass files, --directory, --staged, or pipe code on stdin");
    }
    Ok(vec![input::from_stdin()?])
}

/// Creates the store file's parent directory if it is missing. Both entry
/// modes need this before `open_db` — the default path lives under
/// `.guardian/`, which does not exist in a fresh working directory.
fn ensure_store_dir(db_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config();
    ensure_store_dir(&cli.db)?;

    if cli.manage {
        // No tracing on the manager path: stderr carries the TUI.
        let theme = manager::theme::Theme::from_name(&config.theme);
        return manager::run(theme, &cli.db).await;
    }

    init_logging(cli.verbose);

    let requests = collect_requests(&cli)?;
    let rules = input::read_rules(cli.rules.as_deref())?;

    let store = guardian_core::db::open_db(&cli.db)
        .await
        .with_context(|| format!("opening issue store {}", cli.db))?;

    let client = OllamaClient::new(
        cli.url.as_deref().unwrap_or(&config.url),
        cli.model.as_deref().unwrap_or(&config.model),
        Duration::from_secs(config.idle_timeout_secs),
    )?;

    // Styling is for humans; piped stdout gets the raw markdown.
    let plain = cli.plain || !std::io::stdout().is_terminal();
    let failures = review::run_reviews(&client, &store, &requests, &rules, plain).await;
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_store_dir_creates_missing_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("state").join("issues.db");
        ensure_store_dir(db.to_str().unwrap()).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }

    #[test]
    fn ensure_store_dir_accepts_bare_filename() {
        ensure_store_dir("issues.db").unwrap();
    }
}
