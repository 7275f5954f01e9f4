use crate::cli::ServeArgs;
use crate::infra::{demo_applications, AppState, InMemoryDocumentStore, InMemoryExportService};
use crate::routes::with_review_routes;
use admission_review::config::AppConfig;
use admission_review::error::AppError;
use admission_review::telemetry;
use admission_review::workflows::review::DocumentReviewService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

const EXPORT_BASE_URL: &str = "https://files.admissions.local";

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = if args.seed_demo {
        let applications = demo_applications();
        info!(count = applications.len(), "seeding sample applications");
        InMemoryDocumentStore::seeded(applications)
    } else {
        InMemoryDocumentStore::default()
    };
    let review_service = Arc::new(DocumentReviewService::new(
        Arc::new(store),
        Arc::new(InMemoryExportService::new(EXPORT_BASE_URL)),
        config.review.clone(),
    ));

    let app = with_review_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admission review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
