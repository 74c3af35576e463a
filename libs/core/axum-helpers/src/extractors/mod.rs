//! Custom extractors for Axum handlers.
//!
//! Both extractors reject with the standard [`crate::ErrorResponse`] body.

pub mod id_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
