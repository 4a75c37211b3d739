use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use once_cell::sync::Lazy;
use tracing_actix_web::TracingLogger;

use community_hub::{
    db::postgres::create_pool,
    graceful_shutdown::shutdown_signal,
    handlers::system::STARTED_AT,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::AppConfig,
    telemetry::init_tracing,
    AppState,
};

fn build_cors(config: &AppConfig) -> Cors {
    let origins = config.cors_origins();

    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Lazy::force(&STARTED_AT);

    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_json);
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = match create_pool(&config.database_url, config.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::error!("Migrations failed: {}", e);
            std::process::exit(1);
        }
        tracing::info!("Migrations applied");
    }

    let app_state = web::Data::new(AppState::new(&config, pool.clone()));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "Starting {} v{} on {} with {} workers",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        config.worker_count
    );

    let cors_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(AuthMiddleware)
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_config))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count.max(1))
    .bind(server_addr)?
    .run();

    let handle = server.handle();

    tokio::select! {
        res = server => res,
        received = shutdown_signal() => {
            handle.stop(true).await;
            pool.close().await;
            tracing::info!(signal = %received, "Server stopped");
            Ok(())
        }
    }
}
