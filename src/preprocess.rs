//! Image normalization: raw image bytes in, fixed-shape model input out.
//!
//! The steps run in a fixed order (grayscale, optional inversion, resize,
//! scale) because the model was trained on images produced exactly this way;
//! reordering them changes the numbers the model sees.

use crate::config::{InputLayout, IMAGE_SIDE};
use crate::error::ServiceError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgb};
use tracing::debug;

/// Bicubic resampling, the default filter of the imaging library the model's
/// training data went through
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// A normalized 28x28 grayscale image, row-major, every value in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct DigitTensor {
    values: Vec<f32>,
    layout: InputLayout,
}

impl DigitTensor {
    /// An all-black input, used to probe a freshly loaded model
    pub fn zeros(layout: InputLayout) -> Self {
        DigitTensor {
            values: vec![0.0; (IMAGE_SIDE * IMAGE_SIDE) as usize],
            layout,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn layout(&self) -> InputLayout {
        self.layout
    }

    pub fn shape(&self) -> Vec<i64> {
        self.layout.shape()
    }
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded
fn luma(Rgb([r, g, b]): Rgb<u8>) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Alpha is discarded, not composited
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        Luma([luma(*rgb.get_pixel(x, y))])
    })
}

/// Converts decoded images into model inputs
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    layout: InputLayout,
    invert: bool,
}

impl Preprocessor {
    pub fn new(layout: InputLayout, invert: bool) -> Self {
        Preprocessor { layout, invert }
    }

    /// Decode `bytes` as an image and normalize it
    pub fn normalize(&self, bytes: &[u8]) -> Result<DigitTensor, ServiceError> {
        let image = image::load_from_memory(bytes)?;
        self.normalize_image(&image)
    }

    #[tracing::instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn normalize_image(&self, image: &DynamicImage) -> Result<DigitTensor, ServiceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ServiceError::Preprocessing(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let mut gray = to_grayscale(image);
        if self.invert {
            imageops::invert(&mut gray);
        }

        let resized = imageops::resize(&gray, IMAGE_SIDE, IMAGE_SIDE, RESIZE_FILTER);
        debug!("resized image to {}x{}", resized.width(), resized.height());

        let values = resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();

        Ok(DigitTensor {
            values,
            layout: self.layout,
        })
    }
}
