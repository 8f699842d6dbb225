//! Images built in memory for tests

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage};
use std::io::Cursor;

pub fn white_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255])))
}

/// A dark vertical stroke on a white background, roughly a "1"
pub fn digit_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mid = width / 2;
    for y in height / 5..height - height / 5 {
        for x in mid.saturating_sub(width / 16)..=mid {
            img.put_pixel(x, y, Rgb([20, 20, 20]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

/// Encode like a browser canvas `toDataURL("image/png")`
pub fn data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}
