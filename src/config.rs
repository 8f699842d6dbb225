//! Service configuration. Settings are layered from built-in defaults, an
//! optional TOML file and `DIGITSERVE_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Side length of the square image the model was trained on
pub const IMAGE_SIDE: u32 = 28;

/// Number of digit classes the model predicts over
pub const NUM_CLASSES: usize = 10;

/// How many of the most probable classes to report when probabilities are
/// included in the response
pub const TOP_N: usize = 3;

/// Config file read when no path is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "digitserve.toml";

const ENV_PREFIX: &str = "DIGITSERVE";

/// The tensor shape the loaded model expects as input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// `(1, 28, 28)`
    Rank3,
    /// `(1, 28, 28, 1)`, channels last
    Rank4,
}

impl InputLayout {
    pub fn shape(&self) -> Vec<i64> {
        let side = IMAGE_SIDE as i64;
        match self {
            InputLayout::Rank3 => vec![1, side, side],
            InputLayout::Rank4 => vec![1, side, side, 1],
        }
    }
}

/// Which JSON body a successful prediction is rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    /// `{"predicted_digit": 7}`
    Digit,
    /// `{"message": "Prediction made 7"}`
    Message,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    /// Path to the TorchScript model file
    pub model_path: String,

    pub layout: InputLayout,

    /// Invert pixel intensities after grayscale conversion
    pub invert: bool,

    pub response: ResponseStyle,

    /// Add the full probability vector and the top classes to digit responses
    pub include_probabilities: bool,

    /// Number of HTTP worker threads. 0 keeps the actix default
    pub workers: usize,

    /// Used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: 8000,
            model_path: "models/digit_recognizer.pt".into(),
            layout: InputLayout::Rank4,
            invert: false,
            response: ResponseStyle::Digit,
            include_probabilities: false,
            workers: 0,
            log_filter: "info,actix_web=info".into(),
        }
    }
}

impl Settings {
    /// Load settings. An explicitly given file must exist; the default file
    /// is optional.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("model_path", defaults.model_path)?
            .set_default("layout", "rank4")?
            .set_default("invert", defaults.invert)?
            .set_default("response", "digit")?
            .set_default("include_probabilities", defaults.include_probabilities)?
            .set_default("workers", defaults.workers as i64)?
            .set_default("log_filter", defaults.log_filter)?;

        builder = match file {
            Some(path) => builder.add_source(File::from(Path::new(path)).required(true)),
            None => builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to read configuration")?
            .try_deserialize::<Settings>()
            .context("invalid configuration")?;

        Ok(settings)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
