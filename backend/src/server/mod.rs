//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ConfigError, ServerConfig, ServerSettings};
pub use state_builders::build_store;

use state_builders::build_http_state;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use dolly_backend::Trace;
#[cfg(debug_assertions)]
use dolly_backend::doc::ApiDoc;
use dolly_backend::domain::ports::LogisticsStore;
use dolly_backend::inbound::http::diagnostics::{carrier_probe, lifecycle_trail};
use dolly_backend::inbound::http::error::{json_error_handler, query_error_handler};
use dolly_backend::inbound::http::health::{HealthState, live, ready};
use dolly_backend::inbound::http::queue::{list_removed, remove_from_queue, restore_from_archive};
use dolly_backend::inbound::http::scans::{capture_scan, undo_last_scan};
use dolly_backend::inbound::http::sessions::{complete_session, list_sessions};
use dolly_backend::inbound::http::shipments::{
    batch_details, complete_shipment, pending_shipments,
};
use dolly_backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(capture_scan)
        .service(undo_last_scan)
        .service(complete_session)
        .service(list_sessions)
        .service(pending_shipments)
        .service(batch_details)
        .service(complete_shipment)
        .service(remove_from_queue)
        .service(list_removed)
        .service(restore_from_archive)
        .service(lifecycle_trail)
        .service(carrier_probe);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over `store`.
///
/// # Parameters
/// - `health_state`: shared readiness state, marked ready once the socket is bound.
/// - `config`: resolved [`ServerConfig`] with binding, carrier and station settings.
/// - `store`: logistics store shared with the readiness probe.
///
/// # Errors
/// Propagates [`std::io::Error`] when building the carrier client or binding
/// the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    store: Arc<dyn LogisticsStore>,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config, store)?;
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
