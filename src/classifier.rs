//! Running a digit classifier and picking its answer

use crate::config::{InputLayout, NUM_CLASSES, TOP_N};
use crate::error::ServiceError;
use crate::preprocess::DigitTensor;
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// A loaded model that maps a normalized image to one probability per digit.
/// Implementations are read-only after construction and shared across
/// request handlers.
pub trait Classifier: Send + Sync {
    fn probabilities(&self, input: &DigitTensor) -> Result<Vec<f32>>;
}

/// A single class and how likely the model thinks it is
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Class {
    pub digit: usize,
    pub probability: f32,
}

/// The outcome of one inference
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub digit: usize,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// The `n` most probable classes, most probable first. Equal
    /// probabilities keep the lower digit first; NaNs are skipped as in
    /// `argmax`.
    pub fn top(&self, n: usize) -> Vec<Class> {
        let mut classes: Vec<Class> = self
            .probabilities
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_nan())
            .map(|(digit, &probability)| Class { digit, probability })
            .collect();
        classes.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        classes.truncate(n);
        classes
    }
}

/// Index of the largest value; on ties the first one wins. NaNs are skipped.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if v <= max => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Check that `classifier` accepts inputs shaped as `layout` by running it on
/// an all-black image. Model files do not declare their input shape, so a
/// probe is the only way to catch a layout mismatch before serving traffic.
pub fn verify_layout(classifier: &dyn Classifier, layout: InputLayout) -> Result<()> {
    let probe = DigitTensor::zeros(layout);
    let outputs = classifier
        .probabilities(&probe)
        .with_context(|| format!("model rejected an input of shape {:?}", layout.shape()))?;

    if outputs.len() != NUM_CLASSES {
        bail!(
            "model produced {} outputs for an input of shape {:?}, expected {NUM_CLASSES}",
            outputs.len(),
            layout.shape()
        );
    }

    info!("model accepts inputs of shape {:?}", layout.shape());
    Ok(())
}

/// Run `classifier` on `input` and select the predicted digit
#[tracing::instrument(skip_all)]
pub fn predict(classifier: &dyn Classifier, input: &DigitTensor) -> Result<Prediction, ServiceError> {
    let probabilities = classifier
        .probabilities(input)
        .map_err(ServiceError::Inference)?;
    debug!("class probabilities: {probabilities:?}");

    if probabilities.len() != NUM_CLASSES {
        return Err(ServiceError::Inference(anyhow!(
            "model returned {} outputs, expected {NUM_CLASSES}",
            probabilities.len()
        )));
    }

    let digit = argmax(&probabilities)
        .ok_or_else(|| ServiceError::Inference(anyhow!("model returned no usable probabilities")))?;
    let prediction = Prediction {
        digit,
        probabilities,
    };
    info!(digit, top = ?prediction.top(TOP_N), "predicted digit");

    Ok(prediction)
}
