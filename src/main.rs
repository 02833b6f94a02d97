use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use boni_buddy::config::{LoggingSettings, Settings};
use boni_buddy::core::Coordinator;
use boni_buddy::routes::{self, AppState};
use boni_buddy::services::{spawn_expiry_sweeper, Outbox, StartLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting BoniBuddy matchmaking service...");

    let expiry = settings.matching.expiry_policy();
    let coordinator = Arc::new(Coordinator::new(settings.matching.window()).with_expiry(expiry));

    info!(
        "Coordinator initialized (window: {} min, request TTL: {:?} min, pending TTL: {:?} min)",
        settings.matching.window_minutes,
        settings.matching.request_ttl_mins,
        settings.matching.pending_ttl_mins
    );

    let outbox = Arc::new(Outbox::new(
        settings.outbox.max_per_user,
        settings.outbox.max_users,
        settings.outbox.idle(),
    ));

    let limiter = Arc::new(StartLimiter::new(
        settings.rate_limit.max_starts,
        settings.rate_limit.window_mins,
        settings.rate_limit.max_tracked_users,
    ));

    info!(
        "Start limiter initialized ({} starts per {} min)",
        settings.rate_limit.max_starts, settings.rate_limit.window_mins
    );

    if expiry.is_enabled() {
        let period = Duration::from_secs(settings.matching.sweep_interval_secs.max(1));
        spawn_expiry_sweeper(coordinator.clone(), outbox.clone(), period);
        info!("Expiry sweeper running every {}s", period.as_secs());
    }

    let app_state = AppState {
        coordinator,
        outbox,
        limiter,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(2);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
