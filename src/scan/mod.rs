pub mod pipeline;
pub mod types;

pub use pipeline::ScanPipeline;
pub use types::{Category, Prediction, ScanOutcome, FRESH_MARKER};
