//! Service entry-point: loads settings, configures logging, and runs the HTTP
//! server.

use actix_web::web;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use microservice::inbound::http::health::HealthState;
use microservice::server::{ServerConfig, create_server};
use microservice::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load_from_args(std::env::args_os()).map_err(std::io::Error::other)?;
    let config = ServerConfig::from_settings(&settings).map_err(std::io::Error::other)?;
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(microservice::server::initialize_metrics());

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
