//! Face API Service
//!
//! Holds the resolved engine provider plus the statically configured model
//! name, detector backend, and distance metric, and exposes the four engine
//! calls the handlers delegate to. Provider selection happens once at
//! startup; model and detector names are validated by the engine at call
//! time, not here.

use image::RgbImage;

use crate::shared::config::AppConfig;

use super::builtin::BuiltinEngine;
use super::deepface::DeepFaceClient;
use super::error::FaceApiError;
use super::types::{Attribute, DetectedFace, FaceAnalysis, FaceRepresentation, FaceVerification};

enum Provider {
    DeepFace(DeepFaceClient),
    Builtin(BuiltinEngine),
}

pub struct FaceApiService {
    provider: Provider,
    model_name: String,
    detector_backend: String,
    distance_metric: String,
}

impl std::fmt::Debug for FaceApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceApiService")
            .field("model_name", &self.model_name)
            .field("detector_backend", &self.detector_backend)
            .field("distance_metric", &self.distance_metric)
            .finish()
    }
}

impl FaceApiService {
    pub fn new(config: &AppConfig) -> Result<Self, FaceApiError> {
        let provider = match config.engine_provider.as_str() {
            "deepface" => Provider::DeepFace(DeepFaceClient::new(
                &config.engine_url,
                config.engine_timeout_secs,
            )?),
            "builtin" => Provider::Builtin(BuiltinEngine::new()),
            other => {
                return Err(FaceApiError::Config(format!(
                    "unknown face engine provider: {other}"
                )))
            }
        };

        Ok(Self {
            provider,
            model_name: config.model_name.clone(),
            detector_backend: config.detector_backend.clone(),
            distance_metric: config.distance_metric.clone(),
        })
    }

    /// Raw per-face detections for an image.
    pub async fn extract_faces(&self, image: &RgbImage) -> Result<Vec<DetectedFace>, FaceApiError> {
        match &self.provider {
            Provider::DeepFace(client) => {
                client
                    .extract_faces(image, &self.model_name, &self.detector_backend)
                    .await
            }
            Provider::Builtin(engine) => engine.extract_faces(image),
        }
    }

    /// Attribute analysis of the first detected face.
    pub async fn analyze(
        &self,
        image: &RgbImage,
        attributes: &[Attribute],
    ) -> Result<FaceAnalysis, FaceApiError> {
        match &self.provider {
            Provider::DeepFace(client) => {
                client
                    .analyze(image, attributes, &self.detector_backend)
                    .await
            }
            Provider::Builtin(engine) => engine.analyze(image, attributes),
        }
    }

    /// Embedding of the first detected face.
    pub async fn represent(&self, image: &RgbImage) -> Result<FaceRepresentation, FaceApiError> {
        match &self.provider {
            Provider::DeepFace(client) => {
                client
                    .represent(image, &self.model_name, &self.detector_backend)
                    .await
            }
            Provider::Builtin(engine) => engine.represent(image, &self.model_name),
        }
    }

    /// Pairwise same-person decision.
    pub async fn verify(
        &self,
        img1: &RgbImage,
        img2: &RgbImage,
    ) -> Result<FaceVerification, FaceApiError> {
        match &self.provider {
            Provider::DeepFace(client) => {
                client
                    .verify(
                        img1,
                        img2,
                        &self.model_name,
                        &self.detector_backend,
                        &self.distance_metric,
                    )
                    .await
            }
            Provider::Builtin(engine) => {
                engine.verify(img1, img2, &self.model_name, &self.distance_metric)
            }
        }
    }
}
