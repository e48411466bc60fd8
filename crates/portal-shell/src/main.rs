//! Portal Shell - Main Entry Point
//!
//! Usage: `portal-shell [BASE_URL] [CONFIG_JSON]`

mod portal;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portal_a11y::{A11yConfig, A11yContext, JsonFileStore, MemoryStore, PreferenceStore};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::portal::PortalShell;

fn load_config(path: &str) -> Result<A11yConfig> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("cannot read config {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {path}"))
}

fn preferences_path() -> PathBuf {
    std::env::var_os("PORTAL_PREFERENCES")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("portal-preferences.json"))
}

/// Durable store at `path`, or a session-only store when the file cannot be read
fn open_store(path: &Path) -> Box<dyn PreferenceStore> {
    match JsonFileStore::open(path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::error!("Cannot open preferences {}: {}; using session storage", path.display(), err);
            Box::new(MemoryStore::new())
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let base = args.next().unwrap_or_else(|| "https://portal.example/".to_string());
    let base = Url::parse(&base).with_context(|| format!("invalid base URL {base}"))?;
    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => A11yConfig::default(),
    };

    let prefs = preferences_path();
    let store = open_store(&prefs);
    tracing::info!("Starting portal shell at {} (preferences in {})", base, prefs.display());

    let mut shell = PortalShell::new(base);
    let mut doc = shell.render()?;
    let mut ctx = A11yContext::new(config, store);
    session::run(&mut ctx, &mut shell, &mut doc)?;

    println!("portal-a11y v{} session finished", portal_a11y::VERSION);
    Ok(())
}
