use actix_web::{web, App, HttpServer};
use raseed_backend::config::AppConfig;
use raseed_backend::infra::StateBuilder;
use raseed_backend::middleware::{cors_middleware, RequestTrace, StructuredLogger, TraceSpan};
use raseed_backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // A missing .env is fine; the runtime environment may provide everything.
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let http = reqwest::Client::new();
    let app_state = match StateBuilder::from_config(&config, http) {
        Ok(builder) => builder.build(),
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    info!(host = %config.host, port = config.port, "starting Raseed backend");

    let data = web::Data::new(app_state);
    let origins = config.cors_allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
