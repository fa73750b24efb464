//! Builtin deterministic engine
//!
//! In-process provider for development and tests: detections, embeddings, and
//! attribute scores are derived from the pixel content itself, so identical
//! inputs always produce identical outputs. No model files and no network.
//! Model names and metrics are checked against the wrapped library's
//! published tables, which keeps "unknown model" failures identical to the
//! real engine's.

use image::RgbImage;

use super::error::FaceApiError;
use super::types::{
    Attribute, ConfidenceMap, DetectedFace, FaceAnalysis, FaceRegion, FaceRepresentation,
    FaceVerification,
};

const GENDER_LABELS: [&str; 2] = ["Woman", "Man"];
const EMOTION_LABELS: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "sad", "surprise", "neutral",
];
const RACE_LABELS: [&str; 6] = [
    "asian",
    "indian",
    "black",
    "white",
    "middle eastern",
    "latino hispanic",
];

/// Embedding dimensionality and per-metric verification thresholds, as
/// published by the wrapped library for each recognition model.
struct ModelProfile {
    dim: usize,
    cosine: f64,
    euclidean: f64,
    euclidean_l2: f64,
}

fn model_profile(name: &str) -> Option<ModelProfile> {
    let profile = |dim, cosine, euclidean, euclidean_l2| ModelProfile {
        dim,
        cosine,
        euclidean,
        euclidean_l2,
    };
    match name {
        "VGG-Face" => Some(profile(4096, 0.68, 1.17, 1.17)),
        "Facenet" => Some(profile(128, 0.40, 10.0, 0.80)),
        "Facenet512" => Some(profile(512, 0.30, 23.56, 1.04)),
        "OpenFace" => Some(profile(128, 0.10, 0.55, 0.55)),
        "DeepFace" => Some(profile(4096, 0.23, 64.0, 0.64)),
        "DeepID" => Some(profile(160, 0.015, 45.0, 0.17)),
        "ArcFace" => Some(profile(512, 0.68, 4.15, 1.13)),
        "Dlib" => Some(profile(128, 0.07, 0.6, 0.4)),
        "SFace" => Some(profile(128, 0.593, 10.734, 1.055)),
        _ => None,
    }
}

pub struct BuiltinEngine;

impl BuiltinEngine {
    pub fn new() -> Self {
        Self
    }

    /// Whole-frame detection whose confidence grows with image contrast.
    /// A flat frame has nothing to anchor a face on and yields no detections.
    pub fn extract_faces(&self, image: &RgbImage) -> Result<Vec<DetectedFace>, FaceApiError> {
        let stats = ImageStats::of(image);
        if stats.contrast < 1e-4 {
            return Ok(Vec::new());
        }

        let (width, height) = image.dimensions();
        let confidence = (0.5 + stats.contrast * 4.0).min(0.99) as f32;
        Ok(vec![DetectedFace {
            facial_area: FaceRegion::full_frame(width, height),
            confidence,
        }])
    }

    pub fn represent(
        &self,
        image: &RgbImage,
        model_name: &str,
    ) -> Result<FaceRepresentation, FaceApiError> {
        let profile = model_profile(model_name).ok_or_else(|| {
            FaceApiError::Engine(format!("Invalid model_name passed - {model_name}"))
        })?;

        let (width, height) = image.dimensions();
        Ok(FaceRepresentation {
            embedding: pixel_embedding(image, profile.dim),
            facial_area: FaceRegion::full_frame(width, height),
        })
    }

    pub fn verify(
        &self,
        img1: &RgbImage,
        img2: &RgbImage,
        model_name: &str,
        metric: &str,
    ) -> Result<FaceVerification, FaceApiError> {
        let profile = model_profile(model_name).ok_or_else(|| {
            FaceApiError::Engine(format!("Invalid model_name passed - {model_name}"))
        })?;

        let a = pixel_embedding(img1, profile.dim);
        let b = pixel_embedding(img2, profile.dim);

        // embeddings are L2-normalized, so euclidean and euclidean_l2 agree
        let (distance, threshold) = match metric {
            "cosine" => (cosine_distance(&a, &b), profile.cosine),
            "euclidean" => (euclidean_distance(&a, &b), profile.euclidean),
            "euclidean_l2" => (euclidean_distance(&a, &b), profile.euclidean_l2),
            other => {
                return Err(FaceApiError::Engine(format!(
                    "Invalid distance_metric passed - {other}"
                )))
            }
        };

        Ok(FaceVerification {
            verified: distance <= threshold,
            distance,
            threshold,
            similarity_metric: metric.to_string(),
        })
    }

    pub fn analyze(
        &self,
        image: &RgbImage,
        attributes: &[Attribute],
    ) -> Result<FaceAnalysis, FaceApiError> {
        let stats = ImageStats::of(image);
        let (width, height) = image.dimensions();

        let mut analysis = FaceAnalysis {
            region: FaceRegion::full_frame(width, height),
            ..Default::default()
        };

        for attribute in attributes {
            match attribute {
                Attribute::Age => {
                    analysis.age = Some((18.0 + stats.mean_luma * 42.0).round());
                }
                Attribute::Gender => {
                    let (scores, dominant) = score_distribution(&GENDER_LABELS, stats.seed, 0x01);
                    analysis.gender = scores;
                    analysis.dominant_gender = Some(dominant);
                }
                Attribute::Emotion => {
                    let (scores, dominant) = score_distribution(&EMOTION_LABELS, stats.seed, 0x02);
                    analysis.emotion = scores;
                    analysis.dominant_emotion = Some(dominant);
                }
                Attribute::Race => {
                    let (scores, dominant) = score_distribution(&RACE_LABELS, stats.seed, 0x03);
                    analysis.race = scores;
                    analysis.dominant_race = Some(dominant);
                }
            }
        }

        Ok(analysis)
    }
}

/// Aggregate pixel statistics feeding the deterministic outputs.
struct ImageStats {
    /// Mean luminance in [0, 1].
    mean_luma: f64,
    /// Luminance standard deviation in [0, 1].
    contrast: f64,
    /// FNV-1a hash of the raw pixel bytes.
    seed: u64,
}

impl ImageStats {
    fn of(image: &RgbImage) -> Self {
        let raw = image.as_raw();

        let mut seed: u64 = 0xcbf29ce484222325;
        for &byte in raw {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(0x100000001b3);
        }

        let pixel_count = (image.width() as u64 * image.height() as u64).max(1) as f64;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for pixel in image.pixels() {
            let luma = luminance(&pixel.0);
            sum += luma;
            sum_sq += luma * luma;
        }
        let mean = sum / pixel_count;
        let variance = (sum_sq / pixel_count - mean * mean).max(0.0);

        Self {
            mean_luma: mean,
            contrast: variance.sqrt(),
            seed,
        }
    }
}

fn luminance(rgb: &[u8; 3]) -> f64 {
    (0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64) / 255.0
}

/// Sample the image's luminance on a fixed grid to produce an embedding of
/// exactly `dim` values, then L2-normalize. Identical images always map to
/// identical embeddings.
fn pixel_embedding(image: &RgbImage, dim: usize) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let grid = (dim as f64).sqrt().ceil() as u32;

    let mut values = Vec::with_capacity(dim);
    for i in 0..dim as u32 {
        let gx = i % grid;
        let gy = i / grid;
        let x = (gx * width / grid).min(width - 1);
        let y = (gy * height / grid).min(height - 1);
        values.push(luminance(&image.get_pixel(x, y).0) as f32);
    }

    let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut values {
            *value /= norm;
        }
    }
    values
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += (*x as f64) * (*y as f64);
        norm_a += (*x as f64) * (*x as f64);
        norm_b += (*y as f64) * (*y as f64);
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 {
        (1.0 - dot / denom).max(0.0)
    } else {
        1.0
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = (*x - *y) as f64;
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

/// Deterministic pseudo-random percentage distribution over the given labels,
/// seeded by the pixel hash. Returns the distribution and the dominant label.
fn score_distribution(labels: &[&str], seed: u64, salt: u64) -> (ConfidenceMap, String) {
    let mut state = seed ^ salt.wrapping_mul(0x9e3779b97f4a7c15);
    let mut weights = Vec::with_capacity(labels.len());
    for _ in labels {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        weights.push(((state >> 33) & 0xffff) as f64 + 1.0);
    }

    let total: f64 = weights.iter().sum();
    let mut dominant = 0;
    for (i, weight) in weights.iter().enumerate() {
        if *weight > weights[dominant] {
            dominant = i;
        }
    }

    let scores = labels
        .iter()
        .zip(weights.iter())
        .map(|(label, weight)| (label.to_string(), weight / total * 100.0))
        .collect();

    (scores, labels[dominant].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 11 % 256) as u8, (y * 17 % 256) as u8, ((x * y) % 256) as u8])
        })
    }

    #[test]
    fn test_flat_frame_has_no_faces() {
        let engine = BuiltinEngine::new();
        let blank = RgbImage::from_pixel(64, 64, image::Rgb([127, 127, 127]));
        let faces = engine.extract_faces(&blank).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn test_textured_frame_detects_one_face() {
        let engine = BuiltinEngine::new();
        let faces = engine.extract_faces(&textured_image(64, 48)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].facial_area.w, 64);
        assert_eq!(faces[0].facial_area.h, 48);
        assert!(faces[0].confidence > 0.5);
    }

    #[test]
    fn test_embedding_matches_model_dimensionality() {
        let engine = BuiltinEngine::new();
        let image = textured_image(32, 32);
        for (model, dim) in [
            ("VGG-Face", 4096),
            ("Facenet", 128),
            ("Facenet512", 512),
            ("ArcFace", 512),
            ("SFace", 128),
        ] {
            let result = engine.represent(&image, model).unwrap();
            assert_eq!(result.embedding.len(), dim, "model {model}");
        }
    }

    #[test]
    fn test_embedding_is_normalized() {
        let result = BuiltinEngine::new()
            .represent(&textured_image(32, 32), "Facenet")
            .unwrap();
        let norm: f32 = result.embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_model_is_an_engine_error() {
        let err = BuiltinEngine::new()
            .represent(&textured_image(8, 8), "NotAModel")
            .unwrap_err();
        assert!(err.to_string().contains("NotAModel"));
    }

    #[test]
    fn test_verify_identical_images() {
        let image = textured_image(64, 64);
        let result = BuiltinEngine::new()
            .verify(&image, &image, "VGG-Face", "cosine")
            .unwrap();
        assert!(result.verified);
        assert!(result.distance < result.threshold);
        assert!(result.distance < 1e-6);
        assert_eq!(result.similarity_metric, "cosine");
    }

    #[test]
    fn test_verify_unknown_metric() {
        let image = textured_image(16, 16);
        let err = BuiltinEngine::new()
            .verify(&image, &image, "VGG-Face", "manhattan")
            .unwrap_err();
        assert!(err.to_string().contains("manhattan"));
    }

    #[test]
    fn test_analyze_populates_requested_groups_only() {
        let analysis = BuiltinEngine::new()
            .analyze(&textured_image(32, 32), &[Attribute::Age, Attribute::Gender])
            .unwrap();
        assert!(analysis.age.is_some());
        assert!(analysis.dominant_gender.is_some());
        assert!(analysis.emotion.is_empty());
        assert!(analysis.dominant_race.is_none());
    }

    #[test]
    fn test_analyze_distributions_sum_to_hundred() {
        let analysis = BuiltinEngine::new()
            .analyze(
                &textured_image(32, 32),
                &[Attribute::Gender, Attribute::Emotion, Attribute::Race],
            )
            .unwrap();
        for scores in [&analysis.gender, &analysis.emotion, &analysis.race] {
            let total: f64 = scores.values().sum();
            assert!((total - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let engine = BuiltinEngine::new();
        let image = textured_image(24, 24);
        let first = engine.analyze(&image, &[Attribute::Emotion]).unwrap();
        let second = engine.analyze(&image, &[Attribute::Emotion]).unwrap();
        assert_eq!(first.dominant_emotion, second.dominant_emotion);
        assert_eq!(first.emotion, second.emotion);
    }

    #[test]
    fn test_dominant_label_has_max_confidence() {
        let analysis = BuiltinEngine::new()
            .analyze(&textured_image(40, 40), &[Attribute::Race])
            .unwrap();
        let dominant = analysis.dominant_race.unwrap();
        let dominant_score = analysis.race[&dominant];
        for score in analysis.race.values() {
            assert!(*score <= dominant_score);
        }
    }
}
