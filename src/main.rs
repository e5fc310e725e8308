use editor_gateway::{
    config::{process_token_from_env, Settings},
    handlers,
    utils::logging::{init_logging_with_config, LogConfig},
    AppState, GitHubStore, TokenResolver,
};

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Make dotenv optional since env vars can come from Docker
    dotenv().ok();

    let settings = match Settings::new() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to load settings: {}", e),
            ));
        }
    };

    init_logging_with_config(LogConfig::from(&settings.logging))?;

    let token_resolver = TokenResolver::new(process_token_from_env());
    if token_resolver.has_process_token() {
        info!("Using process-wide GitHub token; per-request tokens are ignored");
    } else {
        warn!("GITHUB_TOKEN not set; requests must supply their own token");
    }

    let store = match GitHubStore::new(&settings.github) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to initialize GitHub client: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to initialize GitHub client: {}", e),
            ));
        }
    };

    let app_state = web::Data::new(AppState::new(
        settings.clone(),
        token_resolver,
        store.clone(),
        store,
    ));

    let bind_address = format!("{}:{}", settings.network.bind_address, settings.network.port);
    info!("Starting HTTP server on {}", bind_address);

    let server_settings = settings.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        if server_settings.network.allowed_origins.is_empty() {
            cors = cors.allow_any_origin();
        } else {
            for origin in &server_settings.network.allowed_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(handlers::json_config(server_settings.network.json_limit_bytes))
            .app_data(app_state.clone())
            .configure(handlers::config)
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
        info!("Initiating graceful shutdown");
        server_handle.stop(true).await;
    });

    server.await?;

    info!("HTTP server stopped");
    Ok(())
}
