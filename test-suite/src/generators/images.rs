//! Raster image fixtures

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Solid-colour PNG
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    encode(RgbaImage::from_pixel(width, height, Rgba(rgba)), ImageFormat::Png)
}

/// PNG with a transparent left half
pub fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 30, 30, 255])
        }
    });
    encode(image, ImageFormat::Png)
}

/// Solid-colour JPEG
pub fn jpeg_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Jpeg)
        .expect("encoding to memory cannot fail");
    out.into_inner()
}

/// `data:image/png;base64,...` URL for a solid PNG
pub fn png_data_url(width: u32, height: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png_bytes(width, height, [20, 120, 200, 255]))
    )
}

fn encode(image: RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .expect("encoding to memory cannot fail");
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_signature() {
        let png = png_bytes(4, 2, [1, 2, 3, 255]);
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn test_data_url_prefix() {
        assert!(png_data_url(2, 2).starts_with("data:image/png;base64,iVBOR"));
    }
}
