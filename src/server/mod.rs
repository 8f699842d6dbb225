//! The JSON web server that listens for prediction requests

use crate::classifier::{self, Classifier};
use crate::config::{ResponseStyle, Settings};
use crate::error::ServiceError;
use crate::preprocess::Preprocessor;
use crate::torch::TorchClassifier;
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

mod protocol;
pub mod routes;

pub use protocol::{ImageRequest, PredictResponse};

/// Shared by every request handler. The classifier is loaded once before the
/// server starts and never mutated afterwards.
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub preprocessor: Preprocessor,
    pub response: ResponseStyle,
    pub include_probabilities: bool,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, settings: &Settings) -> Self {
        AppState {
            classifier,
            preprocessor: Preprocessor::new(settings.layout, settings.invert),
            response: settings.response,
            include_probabilities: settings.include_probabilities,
        }
    }
}

/// Register the routes and the JSON body settings on an `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .error_handler(|err, _req| ServiceError::MalformedPayload(err.to_string()).into());

    cfg.app_data(json)
        .service(routes::root)
        .service(routes::predict);
}

/// Load the model named in `settings` and check it accepts the configured
/// input layout
pub fn load_classifier(settings: &Settings) -> Result<Arc<dyn Classifier>> {
    let model = TorchClassifier::new(&settings.model_path)?;
    classifier::verify_layout(&model, settings.layout).with_context(|| {
        format!(
            "model {} does not match layout {:?}",
            settings.model_path, settings.layout
        )
    })?;
    Ok(Arc::new(model))
}

/// Serve until the process is stopped
pub async fn run(settings: Settings, classifier: Arc<dyn Classifier>) -> Result<()> {
    let state = web::Data::new(AppState::new(classifier, &settings));
    let addr = settings.bind_addr();

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::Logger::default())
            .wrap(Cors::permissive())
            .configure(configure)
    });
    if settings.workers > 0 {
        server = server.workers(settings.workers);
    }

    info!("listening on {}:{}", addr.0, addr.1);
    server
        .bind(addr.clone())
        .with_context(|| format!("failed to bind {}:{}", addr.0, addr.1))?
        .run()
        .await?;

    Ok(())
}
