//! Face API types
//!
//! Transient request/response shapes shared between the engine providers and
//! the HTTP handlers. Field names follow the engine's wire format so provider
//! responses deserialize directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounding box of a detected face in source-image pixel coordinates,
/// mirroring the engine's `facial_area` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_eye: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_eye: Option<(u32, u32)>,
}

impl FaceRegion {
    /// Region spanning a whole frame of the given dimensions.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
            left_eye: None,
            right_eye: None,
        }
    }
}

/// A single raw detection returned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedFace {
    pub facial_area: FaceRegion,
    pub confidence: f32,
}

/// Attribute groups the analyze operation can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Age,
    Gender,
    Emotion,
    Race,
}

impl Attribute {
    /// Action name understood by the engine.
    pub fn as_action(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Emotion => "emotion",
            Self::Race => "race",
        }
    }
}

/// label -> confidence (percent) distribution for one attribute group.
pub type ConfidenceMap = HashMap<String, f64>;

/// Multi-attribute analysis of the first detected face. Only the requested
/// attribute groups are populated; the rest stay at their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceAnalysis {
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub dominant_gender: Option<String>,
    #[serde(default)]
    pub gender: ConfidenceMap,
    #[serde(default)]
    pub dominant_emotion: Option<String>,
    #[serde(default)]
    pub emotion: ConfidenceMap,
    #[serde(default)]
    pub dominant_race: Option<String>,
    #[serde(default)]
    pub race: ConfidenceMap,
    #[serde(default)]
    pub region: FaceRegion,
}

/// Embedding of the first detected face plus the region it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRepresentation {
    pub embedding: Vec<f32>,
    pub facial_area: FaceRegion,
}

/// Outcome of a pairwise verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceVerification {
    pub verified: bool,
    pub distance: f64,
    pub threshold: f64,
    pub similarity_metric: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_frame_region() {
        let region = FaceRegion::full_frame(640, 480);
        assert_eq!(region.x, 0);
        assert_eq!(region.y, 0);
        assert_eq!(region.w, 640);
        assert_eq!(region.h, 480);
    }

    #[test]
    fn test_region_serializes_without_empty_eyes() {
        let region = FaceRegion::full_frame(10, 10);
        let value = serde_json::to_value(&region).unwrap();
        assert!(value.get("left_eye").is_none());
        assert!(value.get("right_eye").is_none());
    }

    #[test]
    fn test_region_deserializes_engine_shape() {
        let json = r#"{"x": 12, "y": 8, "w": 100, "h": 120, "left_eye": [40, 50], "right_eye": null}"#;
        let region: FaceRegion = serde_json::from_str(json).unwrap();
        assert_eq!(region.w, 100);
        assert_eq!(region.left_eye, Some((40, 50)));
        assert_eq!(region.right_eye, None);
    }

    #[test]
    fn test_analysis_deserializes_partial_result() {
        // engine omits groups that were not requested
        let json = r#"{"age": 31, "dominant_gender": "Woman", "gender": {"Woman": 98.2, "Man": 1.8}}"#;
        let analysis: FaceAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.age, Some(31.0));
        assert_eq!(analysis.dominant_gender.as_deref(), Some("Woman"));
        assert!(analysis.emotion.is_empty());
    }
}
