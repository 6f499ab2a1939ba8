use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use lookalike::{Embedding, Extractor};

/// Images narrower than this have "no face".
pub const MIN_FACE_WIDTH: u32 = 8;

/// Fake recognizer: the embedding of an image is its size in hundreds of
/// pixels, `[w / 100, h / 100]`.
pub struct SizeExtractor;

impl Extractor for SizeExtractor {
    fn extract(&mut self, image: &DynamicImage) -> anyhow::Result<Option<Embedding>> {
        let (w, h) = image.dimensions();
        if w < MIN_FACE_WIDTH {
            return Ok(None);
        }
        Ok(Some(Embedding::from(vec![w as f32 / 100.0, h as f32 / 100.0])))
    }
}

pub fn write_image(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::new(width, height).save(path).unwrap();
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
