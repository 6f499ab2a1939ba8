//! YuNet detector post-processing.
//!
//! The 2023mar YuNet graph emits twelve tensors, four per feature level
//! (strides 8, 16 and 32), in the order
//! `cls_8, cls_16, cls_32, obj_8, obj_16, obj_32, bbox_8, .., kps_8, ..`.
//! Each tensor is `[1, cells, channels]` where `cells = (input / stride)^2`.
//!
//! Decoding is anchor-free: a cell at grid position `(row, col)` predicts
//! a box centre `(col + dx, row + dy) * stride`, a size
//! `exp(dw|dh) * stride`, and five landmarks `(col + kx, row + ky) * stride`.
//! The confidence of a cell is `sqrt(cls * obj)`.

use anyhow::{bail, Result};
use ndarray::{ArrayView2, ArrayViewD};

pub const STRIDES: [usize; 3] = [8, 16, 32];

/// A face found by the detector, in pixel coordinates of the image that was
/// fed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: [f32; 4], // x, y, w, h
    pub score: f32,
    pub landmarks: [f32; 10], // right eye, left eye, nose tip, mouth corners
}

impl Detection {
    /// Apply `p' = p * scale + offset` to every coordinate. Widths and
    /// heights only scale.
    pub fn rescale(&self, scale: f32, offset: (f32, f32)) -> Self {
        let mut landmarks = self.landmarks;
        for point in landmarks.chunks_exact_mut(2) {
            point[0] = point[0] * scale + offset.0;
            point[1] = point[1] * scale + offset.1;
        }
        Self {
            bbox: [
                self.bbox[0] * scale + offset.0,
                self.bbox[1] * scale + offset.1,
                self.bbox[2] * scale,
                self.bbox[3] * scale,
            ],
            score: self.score,
            landmarks,
        }
    }

    fn iou(&self, other: &Detection) -> f32 {
        let (a, b) = (&self.bbox, &other.bbox);
        let left = a[0].max(b[0]);
        let top = a[1].max(b[1]);
        let right = (a[0] + a[2]).min(b[0] + b[2]);
        let bottom = (a[1] + a[3]).min(b[1] + b[3]);
        if right <= left || bottom <= top {
            return 0.0;
        }
        let inter = (right - left) * (bottom - top);
        inter / (a[2] * a[3] + b[2] * b[3] - inter)
    }
}

/// The four prediction maps of one feature level.
pub struct Level<'a> {
    pub stride: usize,
    pub cls: ArrayView2<'a, f32>,
    pub obj: ArrayView2<'a, f32>,
    pub bbox: ArrayView2<'a, f32>,
    pub kps: ArrayView2<'a, f32>,
}

/// Group the raw output tensors into per-stride [`Level`]s, checking every
/// shape against the input size.
pub fn split_levels<'a>(outputs: &[ArrayViewD<'a, f32>], input_size: usize) -> Result<Vec<Level<'a>>> {
    if outputs.len() != 4 * STRIDES.len() {
        bail!("expected {} detector outputs, got {}", 4 * STRIDES.len(), outputs.len());
    }

    let map = |index: usize, channels: usize, cells: usize| -> Result<ArrayView2<'a, f32>> {
        let tensor = &outputs[index];
        let shape = tensor.shape();
        if shape != [1, cells, channels] {
            bail!("detector output {index} has shape {shape:?}, expected [1, {cells}, {channels}]");
        }
        Ok(tensor.clone().into_shape_with_order((cells, channels))?)
    };

    STRIDES
        .iter()
        .enumerate()
        .map(|(i, &stride)| {
            let side = input_size / stride;
            let cells = side * side;
            Ok(Level {
                stride,
                cls: map(i, 1, cells)?,
                obj: map(i + 3, 1, cells)?,
                bbox: map(i + 6, 4, cells)?,
                kps: map(i + 9, 10, cells)?,
            })
        })
        .collect()
}

/// Decode every cell scoring at least `score_threshold` into a detection in
/// input-canvas pixels.
pub fn decode(levels: &[Level<'_>], score_threshold: f32, input_size: usize) -> Vec<Detection> {
    let mut detections = Vec::new();

    for level in levels {
        let side = input_size / level.stride;
        let stride = level.stride as f32;

        for cell in 0..side * side {
            let cls = level.cls[[cell, 0]].clamp(0.0, 1.0);
            let obj = level.obj[[cell, 0]].clamp(0.0, 1.0);
            let score = (cls * obj).sqrt();
            if score < score_threshold {
                continue;
            }

            let row = (cell / side) as f32;
            let col = (cell % side) as f32;
            let b = level.bbox.row(cell);

            let cx = (col + b[0]) * stride;
            let cy = (row + b[1]) * stride;
            let w = b[2].exp() * stride;
            let h = b[3].exp() * stride;

            let k = level.kps.row(cell);
            let mut landmarks = [0.0f32; 10];
            for p in 0..5 {
                landmarks[p * 2] = (col + k[p * 2]) * stride;
                landmarks[p * 2 + 1] = (row + k[p * 2 + 1]) * stride;
            }

            detections.push(Detection {
                bbox: [cx - w / 2.0, cy - h / 2.0, w, h],
                score,
                landmarks,
            });
        }
    }

    detections
}

/// Greedy non-maximum suppression. The result is ordered by score, highest
/// first.
pub fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
