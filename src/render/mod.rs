//! Rendering of document models and extraction results for inspection.

mod json;

pub use json::{to_json, JsonFormat};
