use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use std::collections::HashMap;

/// Everything that can go wrong while serving a prediction request
#[derive(Debug)]
pub enum ServiceError {
    /// The request is not a `<prefix>,<base64>` data URL, or its body is not
    /// the expected JSON
    MalformedPayload(String),

    /// The decoded bytes are not an image
    Decode(image::ImageError),

    /// The image decoded but could not be turned into a model input
    Preprocessing(String),

    /// The model failed to produce a usable prediction
    Inference(anyhow::Error),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::MalformedPayload(msg) => write!(f, "malformed payload: {msg}"),
            ServiceError::Decode(err) => write!(f, "could not decode image: {err}"),
            ServiceError::Preprocessing(msg) => write!(f, "could not preprocess image: {msg}"),
            ServiceError::Inference(err) => write!(f, "inference failed: {err}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Decode(err) => Some(err),
            ServiceError::Inference(err) => Some(&**err),
            _ => None,
        }
    }
}

impl actix_web::error::ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        let err = HashMap::from([("errors", vec![self.to_string()])]);

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(err)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<base64::DecodeError> for ServiceError {
    fn from(err: base64::DecodeError) -> Self {
        ServiceError::MalformedPayload(err.to_string())
    }
}

impl From<image::ImageError> for ServiceError {
    fn from(err: image::ImageError) -> Self {
        ServiceError::Decode(err)
    }
}
