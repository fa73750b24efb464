use std::env;
use std::str::FromStr;

/// Server configuration, loaded once at startup and passed into handler
/// construction. Model and detector names are forwarded to the engine
/// uninterpreted; the engine validates them at call time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address (default 0.0.0.0).
    pub bind: String,
    /// Listening port (default 5099).
    pub port: u16,
    /// Recognition model name, e.g. VGG-Face, Facenet, ArcFace, SFace.
    pub model_name: String,
    /// Face-localization backend name, e.g. opencv, retinaface, mtcnn.
    pub detector_backend: String,
    /// Similarity metric for verification: cosine, euclidean, euclidean_l2.
    pub distance_metric: String,
    /// Engine provider name: "deepface" (HTTP) or "builtin".
    pub engine_provider: String,
    /// Base URL of the DeepFace-compatible serving endpoint.
    pub engine_url: String,
    /// Timeout for engine HTTP calls, in seconds.
    pub engine_timeout_secs: u64,
    /// Request body limit in megabytes. Base64-encoded camera frames are
    /// large; the previous deployment accepted 50 MB JSON bodies.
    pub max_body_mb: u64,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            bind: env::var("FACE_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("FACE_API_PORT", 5099),
            model_name: env::var("DEEPFACE_MODEL").unwrap_or_else(|_| "VGG-Face".to_string()),
            detector_backend: env::var("DETECTOR_BACKEND")
                .unwrap_or_else(|_| "opencv".to_string()),
            distance_metric: env::var("DISTANCE_METRIC").unwrap_or_else(|_| "cosine".to_string()),
            engine_provider: env::var("FACE_ENGINE").unwrap_or_else(|_| "deepface".to_string()),
            engine_url: env::var("FACE_ENGINE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5005".to_string()),
            engine_timeout_secs: env_parse("FACE_ENGINE_TIMEOUT_SECS", 60),
            max_body_mb: env_parse("FACE_API_MAX_BODY_MB", 50),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
