use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use crypto_core::jwt;
use db_pool::create_pool;
use post_service::config::{Config, StorageBackend, SERVICE_NAME};
use post_service::db::{InMemoryPostStore, PgPostStore, PostStore};
use post_service::handlers;
use post_service::metrics::serve_metrics;
use post_service::middleware::JwtAuthMiddleware;
use post_service::services::PostService;
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_store(config: &Config) -> io::Result<Arc<dyn PostStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-process post store; data is lost on restart");
            Ok(Arc::new(InMemoryPostStore::new()))
        }
        StorageBackend::Postgres => {
            let db_config = config.storage.database.clone().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "database config missing")
            })?;
            db_config.log_config();

            let pool = create_pool(db_config)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

            let store = PgPostStore::new(pool);
            store
                .run_migrations()
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(store))
        }
    }
}

/// Post Service
///
/// # Routes
///
/// - `POST /api/posts` - create a post, the caller becomes its author
/// - `GET /api/posts` - posts by any of `authorIds`, sorted
/// - `PATCH /api/posts/{post_id}` - update authors, tags or text
/// - `GET /api/health`, `GET /api/health/live`, `GET /metrics` - unauthenticated
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    jwt::initialize_jwt_validation_only(&config.jwt.public_key_pem).map_err(|e| {
        tracing::error!("JWT initialization failed: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let store = build_store(&config).await?;
    let service = web::Data::new(PostService::new(store));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(
        env = %config.app.env,
        production = config.is_production(),
        "Starting {} at {}",
        SERVICE_NAME,
        bind_address
    );


    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PATCH"])
            .allow_any_header()
            .max_age(3600);
        for origin in cors_config.origins() {
            cors = if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            };
        }

        App::new()
            .app_data(service.clone())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .route("/metrics", web::get().to(serve_metrics))
            .service(web::scope("/api/health").configure(handlers::health::configure))
            .service(
                web::scope("/api")
                    .wrap(JwtAuthMiddleware)
                    .configure(handlers::configure),
            )
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))??;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            if let Ok(Err(e)) = server_task.await {
                tracing::error!("HTTP server exited with error: {}", e);
            }
        }
    }

    tracing::info!("{} shut down", SERVICE_NAME);
    Ok(())
}
