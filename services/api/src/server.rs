use crate::cli::ServeArgs;
use crate::infra::{build_world, AppState};
use crate::routes::with_ledger_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use benchledger::config::AppConfig;
use benchledger::error::AppError;
use benchledger::telemetry;
use benchledger::workflows::allocation::import_roster;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let world = build_world(&config.ledger);

    if let Some(path) = args.roster.take() {
        let file = std::fs::File::open(&path)?;
        let summary = import_roster(world.service.as_ref(), file, Local::now().date_naive())
            .map_err(|err| {
                AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
            })?;
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "roster loaded from {}",
            path.display()
        );
        for warning in &summary.warnings {
            warn!("{warning}");
        }
    }

    let app = with_ledger_routes(world.service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "allocation ledger service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
