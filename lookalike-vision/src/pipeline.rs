use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;
use ort::session::Session;

use crate::embedding::Embedding;
use crate::face;

/// Locations of the two ONNX models the pipeline runs.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub detector: PathBuf,
    pub recognizer: PathBuf,
}

/// Full pipeline: detect faces → align → encode
pub struct Pipeline {
    detector: Session,
    encoder: Session,
    score_threshold: f32,
    nms_threshold: f32,
}

impl Pipeline {
    pub fn new(models: &ModelPaths, score_threshold: f32, nms_threshold: f32) -> Result<Self> {
        Ok(Self {
            detector: crate::model::detector_session(&models.detector)?,
            encoder: crate::model::recognizer_session(&models.recognizer)?,
            score_threshold,
            nms_threshold,
        })
    }

    /// Embedding of the first detected face, or `None` when the detector
    /// finds nothing above the score threshold.
    pub fn first_face(&mut self, img: &DynamicImage) -> Result<Option<Embedding>> {
        let detections = face::detect_faces(
            &mut self.detector,
            img,
            self.score_threshold,
            self.nms_threshold,
        )
        .context("detecting faces")?;

        let Some(first) = detections.first() else {
            return Ok(None);
        };
        log::debug!(
            "{} face(s) detected, using score {:.3}",
            detections.len(),
            first.score
        );

        let aligned = face::align_face(img, first, face::RECOGNIZER_INPUT);
        let embedding = face::encode_face(&mut self.encoder, &aligned).context("encoding face")?;
        Ok(Some(embedding))
    }
}
