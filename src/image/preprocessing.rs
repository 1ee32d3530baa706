use crate::config::TensorLayout;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// 分类模型输入的预处理参数
#[derive(Debug, Clone, Copy)]
pub struct PreprocessOptions {
    pub width: u32,
    pub height: u32,
    /// 是否缩放到 [0,1]（模型内部无 Rescaling 层时）
    pub rescale: bool,
    pub layout: TensorLayout,
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// RGB -> resize -> 可选缩放 -> 增加 batch 维度
    pub fn to_tensor(image: &DynamicImage, options: PreprocessOptions) -> Array4<f32> {
        let rgb = image.to_rgb8();
        let resized = image::imageops::resize(
            &rgb,
            options.width,
            options.height,
            FilterType::CatmullRom,
        );

        let scale = if options.rescale { 1.0 / 255.0 } else { 1.0 };
        let (w, h) = (options.width as usize, options.height as usize);

        match options.layout {
            TensorLayout::Nhwc => Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                resized.get_pixel(x as u32, y as u32)[c] as f32 * scale
            }),
            TensorLayout::Nchw => Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
                resized.get_pixel(x as u32, y as u32)[c] as f32 * scale
            }),
        }
    }
}
