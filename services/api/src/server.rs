use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAdvertRepository, InMemoryCms, LoggingEventPublisher};
use crate::routes::with_advert_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grant_admin::adverts::{AdvertDefinition, CmsGateway, ContentfulClient, GrantAdvertService};
use grant_admin::config::AppConfig;
use grant_admin::error::AppError;
use grant_admin::telemetry;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (cms, locale): (Arc<dyn CmsGateway>, String) = match config.contentful.clone() {
        Some(contentful) => {
            info!(
                space_id = %contentful.space_id,
                environment_id = %contentful.environment_id,
                "publishing grant adverts to contentful"
            );
            let locale = contentful.locale.clone();
            (Arc::new(ContentfulClient::new(contentful)?), locale)
        }
        None => {
            warn!("contentful is not configured; published adverts stay in memory");
            (Arc::new(InMemoryCms::default()), "en-US".to_string())
        }
    };
    if config.auth.lambda_secret.is_none() {
        warn!("no lambda secret configured; lambda routes will reject every request");
    }

    let service = Arc::new(
        GrantAdvertService::new(
            Arc::new(InMemoryAdvertRepository::default()),
            Arc::new(LoggingEventPublisher::default()),
            cms,
            Arc::new(AdvertDefinition::standard()),
        )
        .with_locale(locale),
    );

    let app = with_advert_routes(service, config.auth.lambda_secret.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "grant advert admin service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
