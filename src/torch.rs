//! Code for loading and running a (trained) TorchScript digit classifier

use crate::classifier::Classifier;
use crate::preprocess::DigitTensor;
use anyhow::{Context, Result};
use std::path::Path;
use tch::{no_grad, Device, Kind, Tensor};
use tracing::info;

/// A TorchScript model, loaded once and run on the CPU
#[derive(Debug)]
pub struct TorchClassifier {
    /// The loaded torch model
    model: tch::CModule,
}

impl TorchClassifier {
    pub fn new<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let filename = filename.as_ref();
        let mut model = tch::CModule::load_on_device(filename, Device::Cpu)
            .with_context(|| format!("failed to load TorchScript model {}", filename.display()))?;
        model.set_eval();

        info!("loaded model {}", filename.display());
        Ok(TorchClassifier { model })
    }
}

impl Classifier for TorchClassifier {
    /// Forward pass followed by a softmax over the class dimension
    fn probabilities(&self, input: &DigitTensor) -> Result<Vec<f32>> {
        let shape = input.shape();
        let image = Tensor::from_slice(input.values()).reshape(shape.as_slice());

        let output = no_grad(|| self.model.forward_ts(&[image]))?
            .softmax(-1, Some(Kind::Float))
            .flatten(0, -1);

        Ok(Vec::<f32>::try_from(&output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{self, verify_layout};
    use crate::config::InputLayout;
    use crate::preprocess::Preprocessor;
    use crate::testutil;
    use std::path::PathBuf;

    /// Trace a fixed 784 -> 10 linear layer over channels-last inputs and save
    /// it as a TorchScript file. `flatten(1, 3)` only works on rank-4 inputs,
    /// so rank-3 inputs fail like they would on a real channels-last model.
    fn linear_model(name: &str) -> PathBuf {
        let weight = Tensor::arange(7840i64, (Kind::Float, Device::Cpu)).reshape([784, 10]) / 7840.0;
        let example = Tensor::zeros([1, 28, 28, 1], (Kind::Float, Device::Cpu));
        let mut forward = |inputs: &[Tensor]| vec![inputs[0].flatten(1, 3).matmul(&weight)];
        let module =
            tch::CModule::create_by_tracing("DigitLinear", "forward", &[example], &mut forward)
                .unwrap();

        let path = std::env::temp_dir().join(format!(
            "digitserve-{name}-{}.pt",
            std::process::id()
        ));
        module.save(&path).unwrap();
        path
    }

    #[test]
    fn test_missing_model() {
        let err = TorchClassifier::new("models/does_not_exist.pt").unwrap_err();
        assert!(err.to_string().contains("does_not_exist.pt"));
    }

    #[test]
    fn test_probabilities() {
        let path = linear_model("probabilities");
        let model = TorchClassifier::new(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let png = testutil::png_bytes(&testutil::white_image(28, 28));
        let input = Preprocessor::new(InputLayout::Rank4, false)
            .normalize(&png)
            .unwrap();
        let probabilities = model.probabilities(&input).unwrap();

        assert_eq!(probabilities.len(), 10);
        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-4, "sum was {total}");
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));

        // every weight column grows with the class index, so an all-white
        // image lands on the last class
        let prediction = classifier::predict(&model, &input).unwrap();
        assert_eq!(prediction.digit, 9);
    }

    #[test]
    fn test_verify_layout() {
        let path = linear_model("layout");
        let model = TorchClassifier::new(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(verify_layout(&model, InputLayout::Rank4).is_ok());
        assert!(verify_layout(&model, InputLayout::Rank3).is_err());
    }
}
