//! Face API facade
//!
//! Decodes base64 images, delegates to the configured face-analysis engine,
//! and reshapes engine results into the JSON envelope served by the HTTP
//! routes. Two engine providers are supported: a DeepFace-compatible serving
//! endpoint reached over HTTP, and a builtin deterministic engine for
//! development and tests.

mod builtin;
mod codec;
mod deepface;
mod error;
mod handlers;
mod service;
mod types;

pub use codec::{decode_base64_image, encode_image_base64, CodecError};
pub use error::FaceApiError;
pub use handlers::{analyze, detect, find, represent, verify, FacadeError};
pub use service::FaceApiService;
pub use types::{
    Attribute,
    ConfidenceMap,
    DetectedFace,
    FaceAnalysis,
    FaceRegion,
    FaceRepresentation,
    FaceVerification,
};
