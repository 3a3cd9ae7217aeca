//! Server configuration, mirroring `_settings.py`'s layered environment
//! defaults: CLI flags override environment variables, which override the
//! hardcoded defaults below. Variable names match the external-interfaces
//! contract exactly (`SERVER_NAME`, `CONFIG_DEFS_DIRECTORY`, `DEBUG_APP`,
//! `WATCH_CONFIGS`, `WATCH_CONFIGS_INTERVAL`, `APP_BASE_ROUTE`); network
//! binding knobs (`--ip`/`--port`/workers) have no counterpart there and
//! keep a `REDIR_`-prefixed name to avoid colliding with a hosting
//! platform's own environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "redir-server", version, about = "PID/IRI redirect and rewrite server")]
struct Cli {
    #[arg(long)]
    ip: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long = "config-dir")]
    config_dir: Option<PathBuf>,

    #[arg(long)]
    server_name: Option<String>,

    /// Disable the background config-directory reload watcher.
    #[arg(long)]
    no_watch: bool,
}

pub struct Settings {
    pub ip: String,
    pub port: u16,
    pub config_dir: PathBuf,
    pub server_name: Option<String>,
    pub default_proto: String,
    pub base_route: String,
    pub debug: bool,
    pub watch_configs: bool,
    pub watch_interval: Duration,
    pub workers: usize,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

const TRUTH_STRINGS: &[&str] = &["true", "1", "t", "yes"];

fn bool_ish_env(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => TRUTH_STRINGS.contains(&v.to_ascii_lowercase().as_str()),
        Err(_) => default,
    }
}

impl Settings {
    pub fn load() -> Settings {
        let cli = Cli::parse();

        let ip = cli.ip.unwrap_or_else(|| env_or("REDIR_IP", "0.0.0.0"));
        let port = cli
            .port
            .unwrap_or_else(|| env_or("REDIR_PORT", "8080").parse().unwrap_or(8080));
        let config_dir = cli
            .config_dir
            .unwrap_or_else(|| PathBuf::from(env_or("CONFIG_DEFS_DIRECTORY", "./config")));
        let server_name = cli
            .server_name
            .or_else(|| std::env::var("SERVER_NAME").ok())
            .or_else(|| Some("localhost".to_string()))
            .filter(|s| !s.is_empty());
        let default_proto = env_or("REDIR_DEFAULT_PROTO", "https");
        let base_route = env_or("APP_BASE_ROUTE", "");
        let debug = bool_ish_env("DEBUG_APP", false);
        let watch_configs = !cli.no_watch && bool_ish_env("WATCH_CONFIGS", true);
        let watch_interval_secs: u64 = env_or("WATCH_CONFIGS_INTERVAL", "300").parse().unwrap_or(300);
        let workers: usize = env_or("REDIR_WORKERS", "2").parse().unwrap_or(2);

        Settings {
            ip,
            port,
            config_dir,
            server_name,
            default_proto,
            base_route,
            debug,
            watch_configs,
            watch_interval: Duration::from_secs(watch_interval_secs),
            workers,
        }
    }
}
