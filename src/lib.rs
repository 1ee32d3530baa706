pub mod config;
pub mod image;
pub mod models;
pub mod scan;
pub mod store;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use scan::{Category, Prediction};
pub use utils::error::ScanError;

pub type Result<T> = std::result::Result<T, ScanError>;
