//! Features Module - Patient feature schema
//!
//! Layout definition plus the validated record built from request bodies.

pub mod layout;
pub mod record;

// Re-export common types
pub use layout::{feature_names, layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_SCHEMA};
pub use record::{FeatureRecord, FieldError, FieldErrors};
