//! Domain types for Unscatter
//!
//! The task graph returned by the analysis service and the image payloads
//! that can accompany a request.

mod image;
mod level;
mod task;

pub use image::{
    ACCEPTED_MIME_TYPES, ImageError, ImagePayload, ImageRules, detect_mime_type, load_image, mime_type_for_path,
};
pub use level::{Effort, Impact, Level};
pub use task::{AnalysisResult, Task};

#[cfg(test)]
pub(crate) use image::fixtures;
