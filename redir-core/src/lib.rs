//! Core PID/IRI redirect and rewrite engine.
//!
//! Framework-agnostic: nothing here depends on an HTTP server. `redir-server`
//! adapts `actix-web` requests into [`headers::HeaderBag`] and calls
//! [`engine::Engine::make_redir`]; `redir-cli` uses [`config::ConfigLoader`]
//! directly to validate a config directory offline.
//!
//! Each config file under the loaded directory configures one virtual host
//! via a `[default]` block plus top-level `[redirects]`/`[rewrites]` tables;
//! `[dests]` entries are shared across every file. See [`config`] for the
//! loader and [`model`] for the resulting data shapes.

/// Tags every log line the way the original service's `[REDIRS]`-prefixed
/// logging did, so operators can `grep '\[REDIRS\]'` across both.
#[macro_export]
macro_rules! redirs {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        log::$level!(concat!("[REDIRS] ", $fmt) $(, $arg)*);
    };
}

pub mod config;
pub mod destinations;
pub mod engine;
pub mod error;
pub mod headers;
pub mod host;
pub mod model;
pub mod negotiation;
pub mod watch;

pub use config::ConfigLoader;
pub use engine::{Engine, Outcome, RequestContext};
pub use error::{ConfigError, EngineError};
pub use headers::HeaderBag;
