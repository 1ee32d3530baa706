use crate::utils::error::ScanError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat};

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str, max_size: usize) -> Result<DynamicImage> {
        // 移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = if base64_data.starts_with("data:") {
            base64_data.split(',').nth(1).unwrap_or(base64_data)
        } else {
            base64_data
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        Self::from_bytes(&image_bytes, max_size)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ScanError::InvalidInput("Empty image data".to_string()));
        }

        if bytes.len() > max_size {
            return Err(ScanError::FileTooLarge(bytes.len(), max_size));
        }

        match Self::detect_format(bytes) {
            Some(format) if Self::is_supported_format(format) => {}
            Some(format) => {
                return Err(ScanError::UnsupportedFormat(format!("{:?}", format)));
            }
            None => {
                return Err(ScanError::UnsupportedFormat(
                    "unrecognized image data".to_string(),
                ));
            }
        }

        let image = image::load_from_memory(bytes)?;
        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 上传界面只接受 jpg / jpeg / png
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }
}
