//! DeepFace HTTP provider
//!
//! Client for a DeepFace-compatible serving endpoint (the library's own
//! `deepface serve` API). Images are re-encoded as data-URL JPEG, model and
//! detector names are passed through uninterpreted, and engine failures are
//! surfaced with the engine's error text kept verbatim.

use image::RgbImage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::codec::encode_image_base64;
use super::error::FaceApiError;
use super::types::{
    Attribute, DetectedFace, FaceAnalysis, FaceRegion, FaceRepresentation, FaceVerification,
};

pub struct DeepFaceClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct RepresentRequest<'a> {
    img: &'a str,
    model_name: &'a str,
    detector_backend: &'a str,
    enforce_detection: bool,
}

#[derive(Deserialize)]
struct RepresentResponse {
    results: Vec<RepresentResult>,
}

#[derive(Deserialize)]
struct RepresentResult {
    embedding: Vec<f32>,
    facial_area: FaceRegion,
    #[serde(default)]
    face_confidence: f32,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    img1: &'a str,
    img2: &'a str,
    model_name: &'a str,
    detector_backend: &'a str,
    distance_metric: &'a str,
    enforce_detection: bool,
}

#[derive(Deserialize)]
struct VerifyResponse {
    verified: bool,
    distance: f64,
    threshold: f64,
    similarity_metric: String,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    img: &'a str,
    actions: Vec<&'static str>,
    detector_backend: &'a str,
    enforce_detection: bool,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    results: Vec<FaceAnalysis>,
}

impl DeepFaceClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FaceApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FaceApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The serving API exposes no standalone detect route; detections are the
    /// regions and confidences that accompany a represent call.
    pub async fn extract_faces(
        &self,
        image: &RgbImage,
        model_name: &str,
        detector_backend: &str,
    ) -> Result<Vec<DetectedFace>, FaceApiError> {
        let results = self
            .represent_raw(image, model_name, detector_backend)
            .await?;
        Ok(results
            .into_iter()
            .map(|r| DetectedFace {
                facial_area: r.facial_area,
                confidence: r.face_confidence,
            })
            .collect())
    }

    pub async fn represent(
        &self,
        image: &RgbImage,
        model_name: &str,
        detector_backend: &str,
    ) -> Result<FaceRepresentation, FaceApiError> {
        let results = self
            .represent_raw(image, model_name, detector_backend)
            .await?;
        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| FaceApiError::Engine("engine returned no faces".to_string()))?;
        Ok(FaceRepresentation {
            embedding: first.embedding,
            facial_area: first.facial_area,
        })
    }

    pub async fn verify(
        &self,
        img1: &RgbImage,
        img2: &RgbImage,
        model_name: &str,
        detector_backend: &str,
        distance_metric: &str,
    ) -> Result<FaceVerification, FaceApiError> {
        let img1_data = data_url(img1)?;
        let img2_data = data_url(img2)?;
        let response: VerifyResponse = self
            .post_json(
                "/verify",
                &VerifyRequest {
                    img1: &img1_data,
                    img2: &img2_data,
                    model_name,
                    detector_backend,
                    distance_metric,
                    enforce_detection: false,
                },
            )
            .await?;

        Ok(FaceVerification {
            verified: response.verified,
            distance: response.distance,
            threshold: response.threshold,
            similarity_metric: response.similarity_metric,
        })
    }

    pub async fn analyze(
        &self,
        image: &RgbImage,
        attributes: &[Attribute],
        detector_backend: &str,
    ) -> Result<FaceAnalysis, FaceApiError> {
        let img_data = data_url(image)?;
        let response: AnalyzeResponse = self
            .post_json(
                "/analyze",
                &AnalyzeRequest {
                    img: &img_data,
                    actions: attributes.iter().map(Attribute::as_action).collect(),
                    detector_backend,
                    enforce_detection: false,
                },
            )
            .await?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FaceApiError::Engine("engine returned no faces".to_string()))
    }

    async fn represent_raw(
        &self,
        image: &RgbImage,
        model_name: &str,
        detector_backend: &str,
    ) -> Result<Vec<RepresentResult>, FaceApiError> {
        let img_data = data_url(image)?;
        let response: RepresentResponse = self
            .post_json(
                "/represent",
                &RepresentRequest {
                    img: &img_data,
                    model_name,
                    detector_backend,
                    enforce_detection: false,
                },
            )
            .await?;
        Ok(response.results)
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, FaceApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FaceApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            // the engine wraps failures as {"error": "..."}; unwrap that layer
            // so callers see the engine's own message
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.as_str())
                        .map(str::to_string)
                })
                .unwrap_or(text);
            return Err(FaceApiError::Engine(message));
        }

        response
            .json()
            .await
            .map_err(|e| FaceApiError::Parse(e.to_string()))
    }
}

fn data_url(image: &RgbImage) -> Result<String, FaceApiError> {
    Ok(format!(
        "data:image/jpeg;base64,{}",
        encode_image_base64(image)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| {
            image::Rgb([(x * 9 % 256) as u8, (y * 5 % 256) as u8, 80])
        })
    }

    #[tokio::test]
    async fn test_verify_maps_engine_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/verify")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"verified": true, "distance": 0.21, "threshold": 0.68,
                    "similarity_metric": "cosine", "model": "VGG-Face", "time": 1.2}"#,
            )
            .create_async()
            .await;

        let client = DeepFaceClient::new(&server.url(), 5).unwrap();
        let image = sample_image();
        let result = client
            .verify(&image, &image, "VGG-Face", "opencv", "cosine")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(result.verified);
        assert!((result.distance - 0.21).abs() < 1e-9);
        assert!((result.threshold - 0.68).abs() < 1e-9);
        assert_eq!(result.similarity_metric, "cosine");
    }

    #[tokio::test]
    async fn test_represent_takes_first_face() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/represent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": [
                    {"embedding": [0.1, 0.2, 0.3],
                     "facial_area": {"x": 4, "y": 6, "w": 10, "h": 12},
                     "face_confidence": 0.97},
                    {"embedding": [0.4, 0.5, 0.6],
                     "facial_area": {"x": 40, "y": 6, "w": 10, "h": 12},
                     "face_confidence": 0.91}
                ]}"#,
            )
            .create_async()
            .await;

        let client = DeepFaceClient::new(&server.url(), 5).unwrap();
        let result = client
            .represent(&sample_image(), "Facenet", "opencv")
            .await
            .unwrap();

        assert_eq!(result.embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(result.facial_area.x, 4);
    }

    #[tokio::test]
    async fn test_extract_faces_counts_all_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/represent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": [
                    {"embedding": [0.1], "facial_area": {"x": 0, "y": 0, "w": 5, "h": 5}, "face_confidence": 0.9},
                    {"embedding": [0.2], "facial_area": {"x": 9, "y": 0, "w": 5, "h": 5}, "face_confidence": 0.8}
                ]}"#,
            )
            .create_async()
            .await;

        let client = DeepFaceClient::new(&server.url(), 5).unwrap();
        let faces = client
            .extract_faces(&sample_image(), "Facenet", "opencv")
            .await
            .unwrap();

        assert_eq!(faces.len(), 2);
        assert!((faces[0].confidence - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_engine_error_text_is_kept_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Face could not be detected in img."}"#)
            .create_async()
            .await;

        let client = DeepFaceClient::new(&server.url(), 5).unwrap();
        let err = client
            .analyze(&sample_image(), &[Attribute::Age], "opencv")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Face could not be detected in img.");
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_a_network_error() {
        // port 9 (discard) is not listening
        let client = DeepFaceClient::new("http://127.0.0.1:9", 1).unwrap();
        let err = client
            .represent(&sample_image(), "Facenet", "opencv")
            .await
            .unwrap_err();
        assert!(matches!(err, FaceApiError::Network(_)));
    }
}
