pub mod classifier;
pub mod labels;
pub mod manager;

pub use classifier::{OnnxClassifier, ProbabilityModel};
pub use labels::LabelMap;
pub use manager::{ModelContext, ModelManager, ModelStats};
