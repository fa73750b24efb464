//! HTTP request handlers for the face routes
//!
//! Each handler validates the presence of its image field(s), decodes them,
//! delegates to the engine service, and reshapes the result into the JSON
//! envelope. Failures never propagate as raw errors: missing or undecodable
//! input is a 400 with a fixed message, an engine failure is a 500 carrying
//! the engine's text.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use image::RgbImage;
use log::error;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::shared::state::AppState;

use super::codec::decode_base64_image;
use super::error::FaceApiError;
use super::types::Attribute;

const NO_IMAGE: &str = "No image provided";
const TWO_IMAGES: &str = "Two images required (img1 and img2)";
const INVALID_IMAGE: &str = "Invalid image format";

/// Failure tiers for the face routes.
#[derive(Debug)]
pub enum FacadeError {
    /// Required field absent: 400 with a fixed message.
    MissingInput(&'static str),
    /// Field present but not decodable as an image: 400 with a fixed message.
    InvalidImage,
    /// The engine call failed: 500 with the engine's text.
    Engine(FaceApiError),
}

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingInput(message) => (StatusCode::BAD_REQUEST, message.to_string()),
            Self::InvalidImage => (StatusCode::BAD_REQUEST, INVALID_IMAGE.to_string()),
            Self::Engine(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    img1: Option<String>,
    #[serde(default)]
    img2: Option<String>,
}

fn decode_field(field: &Option<String>, missing: &'static str) -> Result<RgbImage, FacadeError> {
    let data = field.as_deref().ok_or(FacadeError::MissingInput(missing))?;
    decode_base64_image(data).map_err(|err| {
        error!("image decode failed: {err}");
        FacadeError::InvalidImage
    })
}

fn engine_failure(operation: &str) -> impl Fn(FaceApiError) -> FacadeError + '_ {
    move |err| {
        error!("{operation} error: {err}");
        FacadeError::Engine(err)
    }
}

/// POST /detect - count and return raw per-face detections.
pub async fn detect(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<serde_json::Value>, FacadeError> {
    let image = decode_field(&payload.image, NO_IMAGE)?;

    let detections = state
        .engine
        .extract_faces(&image)
        .await
        .map_err(engine_failure("face detection"))?;

    Ok(Json(json!({
        "success": true,
        "faces_detected": detections.len(),
        "detections": detections,
    })))
}

/// POST /analyze - age, gender, emotion, and race with confidence
/// distributions.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<serde_json::Value>, FacadeError> {
    let image = decode_field(&payload.image, NO_IMAGE)?;

    let analysis = state
        .engine
        .analyze(
            &image,
            &[
                Attribute::Age,
                Attribute::Gender,
                Attribute::Emotion,
                Attribute::Race,
            ],
        )
        .await
        .map_err(engine_failure("face analysis"))?;

    Ok(Json(json!({
        "success": true,
        "analysis": {
            "age": analysis.age,
            "gender": analysis.dominant_gender,
            "gender_confidence": analysis.gender,
            "emotion": analysis.dominant_emotion,
            "emotion_confidence": analysis.emotion,
            "race": analysis.dominant_race,
            "race_confidence": analysis.race,
            "region": analysis.region,
        }
    })))
}

/// POST /represent - embedding of the first detected face.
pub async fn represent(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<serde_json::Value>, FacadeError> {
    let image = decode_field(&payload.image, NO_IMAGE)?;

    let representation = state
        .engine
        .represent(&image)
        .await
        .map_err(engine_failure("face representation"))?;

    Ok(Json(json!({
        "success": true,
        "embedding": representation.embedding,
        // alias kept for callers of the previous API generation
        "descriptor": representation.embedding,
        "face_region": representation.facial_area,
        "model": state.config.model_name,
    })))
}

/// POST /verify - same-person decision for two images.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, FacadeError> {
    if payload.img1.is_none() || payload.img2.is_none() {
        return Err(FacadeError::MissingInput(TWO_IMAGES));
    }
    let img1 = decode_field(&payload.img1, TWO_IMAGES)?;
    let img2 = decode_field(&payload.img2, TWO_IMAGES)?;

    let verification = state
        .engine
        .verify(&img1, &img2)
        .await
        .map_err(engine_failure("face verification"))?;

    Ok(Json(json!({
        "success": true,
        "verified": verification.verified,
        "distance": verification.distance,
        "threshold": verification.threshold,
        "similarity_metric": verification.similarity_metric,
    })))
}

/// POST /find - detection, embedding, and partial analysis merged into one
/// response.
pub async fn find(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<serde_json::Value>, FacadeError> {
    let image = decode_field(&payload.image, NO_IMAGE)?;

    let faces = state
        .engine
        .extract_faces(&image)
        .await
        .map_err(engine_failure("face find"))?;
    let representation = state
        .engine
        .represent(&image)
        .await
        .map_err(engine_failure("face find"))?;
    let analysis = state
        .engine
        .analyze(&image, &[Attribute::Age, Attribute::Gender])
        .await
        .map_err(engine_failure("face find"))?;

    Ok(Json(json!({
        "success": true,
        "faces_detected": faces.len(),
        "embedding": representation.embedding,
        "descriptor": representation.embedding,
        "face_region": representation.facial_area,
        "age": analysis.age,
        "gender": analysis.dominant_gender,
        "gender_confidence": analysis.gender,
        "model": state.config.model_name,
    })))
}
