use crate::{
    image::{ImageLoader, ImagePreprocessor, PreprocessOptions},
    models::ModelContext,
    scan::{Prediction, ScanOutcome},
    utils::error::ScanError,
    Config, Result,
};
use image::DynamicImage;
use std::time::Instant;

/// 扫描流水线：解码 -> 预处理 -> 推理 -> top-1
pub struct ScanPipeline;

impl ScanPipeline {
    /// 处理base64图像
    pub fn process_base64(
        context: &ModelContext,
        config: &Config,
        base64_data: &str,
    ) -> Result<ScanOutcome> {
        let start_time = Instant::now();
        let image = ImageLoader::from_base64(base64_data, config.server_config.max_request_size)?;
        Self::process_image(context, config, &image, start_time)
    }

    /// 处理上传的字节流
    pub fn process_bytes(context: &ModelContext, config: &Config, bytes: &[u8]) -> Result<ScanOutcome> {
        let start_time = Instant::now();
        let image = ImageLoader::from_bytes(bytes, config.server_config.max_request_size)?;
        Self::process_image(context, config, &image, start_time)
    }

    fn process_image(
        context: &ModelContext,
        config: &Config,
        image: &DynamicImage,
        start_time: Instant,
    ) -> Result<ScanOutcome> {
        tracing::debug!(
            "Scanning image {}x{} (rescale: {})",
            image.width(),
            image.height(),
            !context.has_rescaling()
        );

        let prediction = Self::scan(context, config, image)?;
        let processing_time = start_time.elapsed().as_secs_f32();

        tracing::info!(
            "Scan completed: label={}, probability={:.4}, time={:.3}s",
            prediction.label,
            prediction.probability,
            processing_time
        );

        Ok(ScanOutcome::new(prediction, processing_time))
    }

    /// 单张图像推理
    pub fn scan(context: &ModelContext, config: &Config, image: &DynamicImage) -> Result<Prediction> {
        let (width, height) = config.image_size;
        let options = PreprocessOptions {
            width,
            height,
            rescale: !context.has_rescaling(),
            layout: config.layout,
        };

        let input = ImagePreprocessor::to_tensor(image, options);
        let probs = context.classifier().predict(input)?;

        Self::top1(&probs, context)
    }

    /// 取最大概率类别；不做阈值过滤，不重新归一化
    pub fn top1(probs: &[f32], context: &ModelContext) -> Result<Prediction> {
        let (index, probability) = argmax(probs).ok_or_else(|| {
            ScanError::Inference("Model returned an empty probability vector".to_string())
        })?;

        Ok(Prediction {
            label: context.labels().resolve(index),
            probability,
        })
    }
}

/// 忽略 NaN，相等时取第一个
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}
