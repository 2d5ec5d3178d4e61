use actix_cors::Cors;
use actix_web::{dev::Service, middleware, web, App, HttpServer};
use anyhow::{anyhow, Context};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wallet_api::{
    config::{Config, LoggingConfig, StorageBackend, StorageConfig},
    handlers, metrics,
    services::WalletService,
};
use wallet_core::{MemoryStore, PostgresStore, WalletStore};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn WalletStore>> {
    match storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory wallet store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(
                &storage.url,
                storage.max_connections,
                storage.min_connections,
            )
            .await
            .context("Failed to connect to database")?;
            store
                .ensure_schema()
                .await
                .context("Failed to prepare database schema")?;

            info!("Database connected successfully");
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    init_tracing(&config.logging);
    info!("Starting Wallet API on {}:{}", config.server.host, config.server.port);

    metrics::register_metrics(&metrics::REGISTRY).context("Failed to register metrics")?;

    let store = open_store(&config.storage).await?;
    let wallet_service = Arc::new(WalletService::new(store));

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    let path = res
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string());
                    metrics::HTTP_REQUESTS_TOTAL
                        .with_label_values(&[&method, &path, res.status().as_str()])
                        .inc();
                    Ok(res)
                }
            })
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(web::Data::new(wallet_service.clone()))
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
