//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;

pub use config::ServerConfig;
#[cfg(feature = "metrics")]
pub use metrics::initialize_metrics;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
use crate::doc::ApiDoc;
use crate::inbound::http::ErrorResponder;
use crate::inbound::http::health::{HealthState, health, live, ready};
use crate::inbound::http::ping::ping;
use crate::settings::HostEnvironment;

/// Per-worker inputs for [`build_app`].
#[derive(Clone)]
pub struct AppDependencies {
    /// Shared readiness and liveness flags.
    pub health_state: web::Data<HealthState>,
    /// Host environment deciding detail redaction and Swagger exposure.
    pub environment: HostEnvironment,
}

/// Assemble the application: tracing outermost, the error responder inside
/// it, then the routes. Swagger UI is mounted at `/docs` in development only.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        environment,
    } = deps;
    let expose_docs = environment.is_development();

    let api = web::scope("/api/v1").service(ping);

    App::new()
        .app_data(health_state)
        .wrap(ErrorResponder::new(environment))
        .wrap(Trace)
        .service(api)
        .service(health)
        .service(ready)
        .service(live)
        .configure(move |cfg| {
            if expose_docs {
                cfg.service(
                    SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
                );
            }
        })
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing binding, environment, and optional metrics settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        environment,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    info!(%bind_addr, environment = environment.name(), "starting HTTP server");
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            environment: environment.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
