//! # Redir Server
//!
//! HTTP surface for the PID/IRI redirect and rewrite engine. This binary is
//! deliberately thin: request handling here is limited to adapting
//! `actix-web` requests into `redir_core`'s framework-agnostic types and
//! turning an `Outcome` into an HTTP response. All matching logic lives in
//! `redir-core`.
//!
//! ## Bootstrap order
//!
//! 1. Load settings (CLI flags, then environment variables, then defaults)
//! 2. Load the config directory into an `Engine`
//! 3. Register HTTP routes
//! 4. Start the background reload watcher, if enabled
//!
//! ## Network
//!
//! By default the service listens on 0.0.0.0:8080. This can be overridden
//! with `--ip`/`--port` or the `REDIR_IP`/`REDIR_PORT` environment variables.

mod handlers;
mod settings;

use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use arc_swap::ArcSwap;
use redir_core::{config::ConfigLoader, engine::Engine, redirs};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = settings::Settings::load();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", if settings.debug { "debug" } else { "info" });
    }
    env_logger::init();

    redirs!(info, "loading config directory {}", settings.config_dir.display());
    let mut loader = ConfigLoader::new();
    let (defs, destinations) = loader
        .load_dir(&settings.config_dir, true)
        .expect("failed to load config directory")
        .expect("initial load always returns Some");

    let engine = Engine::new(defs, destinations, settings.server_name.clone());
    let shared = Arc::new(ArcSwap::from_pointee(engine));

    if settings.watch_configs {
        redirs!(info, "starting config watcher, interval {}s", settings.watch_interval.as_secs());
        redir_core::watch::spawn_reload_task(
            shared.clone(),
            settings.config_dir.clone(),
            settings.server_name.clone(),
            settings.watch_interval,
        );
    }

    let bind_address = format!("{}:{}", settings.ip, settings.port);
    redirs!(info, "starting HTTP server on {}...", bind_address);

    let default_proto = settings.default_proto.clone();
    let base_route = settings.base_route.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(shared.clone()))
            .app_data(web::Data::new(default_proto.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope(&base_route)
                    .service(
                        web::resource("/redir")
                            .route(web::get().to(handlers::redir))
                            .route(web::head().to(handlers::redir))
                            .route(web::method(actix_web::http::Method::OPTIONS).to(handlers::options)),
                    )
                    .service(
                        web::resource("/{path:.*}")
                            .route(web::get().to(handlers::path_redirect))
                            .route(web::head().to(handlers::path_redirect))
                            .route(web::method(actix_web::http::Method::OPTIONS).to(handlers::options)),
                    ),
            )
    })
    .bind(&bind_address)?
    .workers(settings.workers)
    .run()
    .await
}
