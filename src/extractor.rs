//! The boundary to the face recognizer.
//!
//! The rest of the crate only sees [`Extractor`]: image in, at most one
//! embedding out. Decoding of image files and uploads happens here so every
//! extractor receives an already decoded [`DynamicImage`].

use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::Embedding;

/// File name extensions accepted for uploaded query photos.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

const ALLOWED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

pub trait Extractor {
    /// Embedding of the first face found in `image`, `Ok(None)` when there
    /// is no face.
    fn extract(&mut self, image: &DynamicImage) -> anyhow::Result<Option<Embedding>>;
}

#[cfg(feature = "onnx")]
impl Extractor for lookalike_vision::Pipeline {
    fn extract(&mut self, image: &DynamicImage) -> anyhow::Result<Option<Embedding>> {
        self.first_face(image)
    }
}

/// Outcome of running an extractor on one image file.
#[derive(Debug)]
pub enum Extraction {
    Face(Embedding),
    NoFace,
    Failed(String),
}

/// Decode the image at `path` and extract from it. Never fails: decode and
/// extractor errors are reported as [`Extraction::Failed`].
pub fn extract_file<E: Extractor + ?Sized>(extractor: &mut E, path: &Path) -> Extraction {
    let image = match image::open(path) {
        Ok(image) => image,
        Err(e) => return Extraction::Failed(format!("decoding {}: {e}", path.display())),
    };
    match extractor.extract(&image) {
        Ok(Some(embedding)) => Extraction::Face(embedding),
        Ok(None) => Extraction::NoFace,
        Err(e) => Extraction::Failed(format!("{e:#}")),
    }
}

/// Whether `file_name` carries one of the [`ALLOWED_EXTENSIONS`].
pub fn allowed_file(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Sniff and decode an uploaded image, rejecting containers other than
/// PNG, JPEG, GIF, BMP and WebP.
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(bytes)
        .map_err(|_| Error::UnsupportedFormat("unrecognised image data".to_string()))?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| Error::ExtractionFailure(format!("decoding upload: {e}")))
}
