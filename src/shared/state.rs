use crate::face_api::FaceApiService;
use crate::shared::config::AppConfig;

/// Shared application state handed to every handler behind an `Arc`.
/// Nothing in here is mutable across requests.
pub struct AppState {
    pub config: AppConfig,
    pub engine: FaceApiService,
}
