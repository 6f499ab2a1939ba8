use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::{Array1, Array4, ArrayD, IxDyn};
use ort::{session::Session, value::Value};

use crate::embedding::Embedding;
use crate::yunet::{self, Detection};

pub const DETECTOR_INPUT: u32 = 640;
pub const RECOGNIZER_INPUT: u32 = 112;

// ArcFace reference eye positions for a 112x112 crop, image-left eye first.
const REFERENCE_EYES: [(f32, f32); 2] = [(38.2946, 51.6963), (73.5318, 51.5014)];

/// Pack an RGB image into a `[1, 3, H, W]` BGR tensor with values in 0..=255.
fn bgr_planar(img: &RgbImage) -> Array4<f32> {
    let (w, h) = img.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, Rgb([r, g, b])) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = *b as f32;
        tensor[[0, 1, y, x]] = *g as f32;
        tensor[[0, 2, y, x]] = *r as f32;
    }
    tensor
}

/// Detect faces with YuNet. Coordinates are in pixels of `img` and the list
/// is ordered by score, highest first.
pub fn detect_faces(
    session: &mut Session,
    img: &DynamicImage,
    score_threshold: f32,
    nms_threshold: f32,
) -> Result<Vec<Detection>> {
    // Letterbox into the fixed square input so faces keep their aspect ratio
    let (width, height) = img.dimensions();
    let scale = DETECTOR_INPUT as f32 / width.max(height) as f32;
    let fit_w = ((width as f32 * scale) as u32).clamp(1, DETECTOR_INPUT);
    let fit_h = ((height as f32 * scale) as u32).clamp(1, DETECTOR_INPUT);
    let offset_x = (DETECTOR_INPUT - fit_w) / 2;
    let offset_y = (DETECTOR_INPUT - fit_h) / 2;

    let mut canvas = RgbImage::new(DETECTOR_INPUT, DETECTOR_INPUT);
    let fitted = img.resize_exact(fit_w, fit_h, FilterType::Triangle).to_rgb8();
    image::imageops::overlay(&mut canvas, &fitted, offset_x as i64, offset_y as i64);

    let input = Value::from_array(bgr_planar(&canvas))?;
    let outputs = session.run(ort::inputs![input])?;

    let mut tensors = Vec::new();
    for (_name, output) in outputs.iter() {
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        tensors.push(ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())?);
    }
    let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();

    let levels = yunet::split_levels(&views, DETECTOR_INPUT as usize)
        .context("parsing detector outputs")?;
    let raw = yunet::decode(&levels, score_threshold, DETECTOR_INPUT as usize);

    // Undo the letterbox: canvas -> original pixels
    let inverse = 1.0 / scale;
    let shift = (
        -(offset_x as f32) * inverse,
        -(offset_y as f32) * inverse,
    );
    let detections = raw.iter().map(|d| d.rescale(inverse, shift)).collect();

    Ok(yunet::nms(detections, nms_threshold))
}

/// Warp the face so its eyes land on the reference positions of a
/// `size`x`size` crop. Uses the similarity transform fixed by the two eye
/// landmarks and bilinear sampling; pixels mapped outside `img` stay black.
pub fn align_face(img: &DynamicImage, detection: &Detection, size: u32) -> DynamicImage {
    let unit = size as f32 / RECOGNIZER_INPUT as f32;
    let (p1, p2) = (
        (detection.landmarks[0], detection.landmarks[1]),
        (detection.landmarks[2], detection.landmarks[3]),
    );
    let (q1, q2) = (
        (REFERENCE_EYES[0].0 * unit, REFERENCE_EYES[0].1 * unit),
        (REFERENCE_EYES[1].0 * unit, REFERENCE_EYES[1].1 * unit),
    );

    // As complex numbers: dst = q1 + z * (src - p1), z = (q2 - q1) / (p2 - p1).
    // Sampling needs the inverse, src = p1 + (dst - q1) / z.
    let (sx, sy) = (p2.0 - p1.0, p2.1 - p1.1);
    let (dx, dy) = (q2.0 - q1.0, q2.1 - q1.1);
    let src_len = sx * sx + sy * sy;
    let dst_len = dx * dx + dy * dy;

    let mut out = RgbImage::new(size, size);
    if src_len == 0.0 || dst_len == 0.0 {
        return DynamicImage::ImageRgb8(out);
    }
    // 1/z = (p2 - p1) / (q2 - q1)
    let inv_re = (sx * dx + sy * dy) / dst_len;
    let inv_im = (sy * dx - sx * dy) / dst_len;

    let src = img.to_rgb8();
    let (w, h) = src.dimensions();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (ux, uy) = (x as f32 - q1.0, y as f32 - q1.1);
        let fx = p1.0 + ux * inv_re - uy * inv_im;
        let fy = p1.1 + ux * inv_im + uy * inv_re;
        if fx < 0.0 || fy < 0.0 || fx > (w - 1) as f32 || fy > (h - 1) as f32 {
            continue;
        }
        *pixel = bilinear(&src, fx, fy);
    }

    DynamicImage::ImageRgb8(out)
}

fn bilinear(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);
    let (tx, ty) = (x - x0 as f32, y - y0 as f32);

    let corners = [
        (img.get_pixel(x0, y0), (1.0 - tx) * (1.0 - ty)),
        (img.get_pixel(x1, y0), tx * (1.0 - ty)),
        (img.get_pixel(x0, y1), (1.0 - tx) * ty),
        (img.get_pixel(x1, y1), tx * ty),
    ];
    let mut rgb = [0.0f32; 3];
    for (px, weight) in corners {
        for c in 0..3 {
            rgb[c] += px[c] as f32 * weight;
        }
    }
    Rgb(rgb.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

/// Run SFace on an aligned crop and return the unit-length embedding.
pub fn encode_face(session: &mut Session, face: &DynamicImage) -> Result<Embedding> {
    let crop = face
        .resize_exact(RECOGNIZER_INPUT, RECOGNIZER_INPUT, FilterType::Triangle)
        .to_rgb8();
    let input = Value::from_array(bgr_planar(&crop))?;
    let outputs = session.run(ort::inputs![input])?;
    let (_shape, data) = outputs[0].try_extract_tensor::<f32>()?;

    Ok(Embedding::new(Array1::from(data.to_vec())).normalized())
}
