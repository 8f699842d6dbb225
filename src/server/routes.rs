//! The user-facing JSON routes: a liveness check and digit prediction

use super::protocol::{ImageRequest, PredictResponse};
use super::AppState;
use crate::classifier;
use crate::error::ServiceError;
use crate::payload;
use actix_web::{get, post, web, Responder};
use anyhow::anyhow;
use std::collections::HashMap;
use tracing::debug;

type Result<T> = std::result::Result<T, ServiceError>;

#[get("/")]
pub async fn root() -> impl Responder {
    web::Json(HashMap::from([("Hello", "World")]))
}

/// Decode, normalize and classify the posted image. The work runs on the
/// blocking thread pool since a forward pass holds the CPU.
#[post("/predict")]
pub async fn predict(
    req: web::Json<ImageRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let ImageRequest { image_data } = req.into_inner();
    debug!(payload_len = image_data.len(), "got prediction request");

    let model = state.classifier.clone();
    let preprocessor = state.preprocessor;

    let prediction = web::block(move || {
        let bytes = payload::decode_data_url(&image_data)?;
        let input = preprocessor.normalize(&bytes)?;
        classifier::predict(model.as_ref(), &input)
    })
    .await
    .map_err(|err| ServiceError::Inference(anyhow!(err)))??;

    Ok(web::Json(PredictResponse::new(
        &prediction,
        state.response,
        state.include_probabilities,
    )))
}
