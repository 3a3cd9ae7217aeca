//! Polling-based config-directory reload, mirroring `router-api`'s
//! `fs_watch` log-watcher idiom: a `tokio::time::interval` tick checks
//! mtimes and swaps a fresh snapshot into an `ArcSwap` when anything changed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::config::ConfigLoader;
use crate::engine::Engine;
use crate::redirs;

/// Spawns a background task that re-reads `config_dir` every `interval` and
/// publishes a new [`Engine`] into `shared` whenever the directory changed.
/// Load errors are logged and the previous snapshot is kept in place.
pub fn spawn_reload_task(
    shared: Arc<ArcSwap<Engine>>,
    config_dir: PathBuf,
    server_name: Option<String>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut loader = ConfigLoader::new();
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it, caller already loaded once

        loop {
            ticker.tick().await;
            match loader.load_dir(&config_dir, false) {
                Ok(Some((defs, destinations))) => {
                    redirs!(info, "config directory {} changed, reloading", config_dir.display());
                    shared.store(Arc::new(Engine::new(defs, destinations, server_name.clone())));
                }
                Ok(None) => {}
                Err(err) => {
                    redirs!(
                        error,
                        "failed to reload config directory {}: {}",
                        config_dir.display(),
                        err
                    );
                }
            }
        }
    })
}
