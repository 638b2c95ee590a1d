use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web::{self, Data};
use actix_web::{App, HttpResponse, HttpServer};
use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::metrics::MetricStore;

pub struct AppState {
    pub store: Arc<MetricStore>,
}

async fn get_metrics(app_state: Data<AppState>) -> HttpResponse {
    match app_state.store.export_metrics() {
        Ok(metrics) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(metrics),
        Err(e) => {
            error!("Error exporting metrics: {e:?}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

/// `GET /metrics` and a 404 for everything else.
pub fn metrics_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(get_metrics))
        .default_service(web::to(not_found));
}

/// Binds the listener up front so a taken port fails startup instead of a background task.
/// The returned server stops when `cancellation_token` is cancelled.
pub fn start_server(
    host: &str,
    port: u16,
    store: Arc<MetricStore>,
    cancellation_token: CancellationToken,
) -> std::io::Result<Server> {
    info!("Starting metrics server at http://{host}:{port}/metrics");
    let app_state = Data::new(AppState { store });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(metrics_routes)
    })
    .disable_signals()
    .bind((host, port))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        cancellation_token.cancelled().await;
        info!("Stopping metrics server");
        handle.stop(true).await;
    });

    Ok(server)
}
