use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredMailer, InMemoryApplicationRepository, LogMailer};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use course_staffing::applications::{
    ApplicationService, IntakePolicy, SmtpMailer, StaticCourseCatalog,
};
use course_staffing::config::{AppConfig, MailConfig};
use course_staffing::error::AppError;
use course_staffing::telemetry;
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

    let catalog = StaticCourseCatalog::from_path(&config.intake.courses_path)?;
    info!(
        path = %config.intake.courses_path.display(),
        courses = catalog.len(),
        "course catalog loaded"
    );

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let mailer = Arc::new(build_mailer(&config.mail)?);
    let application_service = Arc::new(ApplicationService::new(
        repository,
        Arc::new(catalog),
        mailer,
        IntakePolicy::new(config.intake.max_resume_bytes),
        config.mail.signature.clone(),
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "course staffing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_mailer(config: &MailConfig) -> Result<ConfiguredMailer, AppError> {
    match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp, &config.from_address)?;
            info!(relay = %smtp.host, from = %config.from_address, "smtp delivery enabled");
            Ok(ConfiguredMailer::Smtp(mailer))
        }
        None => {
            warn!("APP_SMTP_HOST not set; status e-mails will only be logged");
            Ok(ConfiguredMailer::Log(LogMailer))
        }
    }
}
