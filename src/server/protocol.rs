use crate::classifier::{Class, Prediction};
use crate::config::{ResponseStyle, TOP_N};
use serde::{Deserialize, Serialize};

/// Body of `POST /predict`: an image encoded as a base64 data URL
#[derive(Deserialize)]
pub struct ImageRequest {
    pub image_data: String,
}

impl std::fmt::Debug for ImageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageRequest {{ image_data: <{} bytes> }}", self.image_data.len())
    }
}

/// Body of a successful `POST /predict`
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PredictResponse {
    Digit {
        predicted_digit: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        probs: Option<Vec<f32>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        top3: Option<Vec<Class>>,
    },
    Message {
        message: String,
    },
}

impl PredictResponse {
    pub fn new(prediction: &Prediction, style: ResponseStyle, include_probabilities: bool) -> Self {
        match style {
            ResponseStyle::Digit if include_probabilities => PredictResponse::Digit {
                predicted_digit: prediction.digit,
                probs: Some(prediction.probabilities.clone()),
                top3: Some(prediction.top(TOP_N)),
            },
            ResponseStyle::Digit => PredictResponse::Digit {
                predicted_digit: prediction.digit,
                probs: None,
                top3: None,
            },
            ResponseStyle::Message => PredictResponse::Message {
                message: format!("Prediction made {}", prediction.digit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prediction() -> Prediction {
        Prediction {
            digit: 7,
            probabilities: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.25, 0.5, 0.25, 0.0],
        }
    }

    #[test]
    fn test_digit_body() {
        let body = PredictResponse::new(&prediction(), ResponseStyle::Digit, false);
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"predicted_digit": 7}));
    }

    #[test]
    fn test_message_body() {
        let body = PredictResponse::new(&prediction(), ResponseStyle::Message, true);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"message": "Prediction made 7"})
        );
    }

    #[test]
    fn test_probabilities_body() {
        let body = PredictResponse::new(&prediction(), ResponseStyle::Digit, true);
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["predicted_digit"], 7);
        assert_eq!(value["probs"].as_array().unwrap().len(), 10);
        assert_eq!(
            value["top3"],
            json!([
                {"digit": 7, "probability": 0.5},
                {"digit": 6, "probability": 0.25},
                {"digit": 8, "probability": 0.25},
            ])
        );
    }
}
