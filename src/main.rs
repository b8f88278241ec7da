//! Rail booking server
//!
//! Seat allocation, fares and live availability over HTTP.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use rail_api::{configure, AppState};
use rail_auth::JwtService;
use rail_cache::{CachedCatalog, RedisCache};
use rail_core::AppConfig;
use rail_db::{create_pool, run_migrations, PgBookingRepository, PgCatalogRepository};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type Catalog = CachedCatalog<PgCatalogRepository>;

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rail_booking={0},rail_api={0},rail_services={0},rail_db={0},rail_cache={0},actix_web=info,sqlx=warn",
            log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// Connect to Redis when configured. Failures leave the catalog uncached.
async fn connect_cache(url: Option<&str>) -> Option<Arc<RedisCache>> {
    let url = url?;

    match RedisCache::new(url).await {
        Ok(cache) => {
            info!("Reference data cache connected");
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!("Redis unavailable, serving catalog from the database: {}", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting rail booking server v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    info!(
        "Database connection established with {} max connections",
        config.database.max_connections
    );

    let cache = connect_cache(config.redis.url.as_deref()).await;
    let catalog: Arc<Catalog> = Arc::new(CachedCatalog::new(
        Arc::new(PgCatalogRepository::new(pool.clone())),
        cache,
        config.redis.default_ttl_secs,
    ));
    let bookings = Arc::new(PgBookingRepository::new(pool.clone()));

    let state = web::Data::new(AppState::new(
        catalog,
        bookings,
        config.booking.clone(),
        config.fare.clone(),
    ));

    let jwt_expiration_secs = config.auth.jwt_expiration_minutes * 60;
    let jwt_service = Arc::new(JwtService::new(&config.auth.jwt_secret, jwt_expiration_secs));

    info!(
        "JWT service configured with {} second token expiration",
        jwt_expiration_secs
    );

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let server_config = server_config.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                origin
                    .to_str()
                    .map(|o| server_config.allows_origin(o))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_body",
                        "message": error_message,
                        "status": 400
                    })),
                )
                .into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message,
                        "status": 400
                    })),
                )
                .into()
            }))
            // Middleware
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure::<Catalog, PgBookingRepository>)
            // Root redirect to health
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
