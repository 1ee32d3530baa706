use crate::config::RescalePolicy;
use crate::models::{LabelMap, OnnxClassifier, ProbabilityModel};
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;

/// 已加载的模型上下文：分类器、类别映射以及是否需要外部缩放
pub struct ModelContext {
    classifier: Arc<dyn ProbabilityModel>,
    labels: LabelMap,
    has_rescaling: bool,
}

impl ModelContext {
    /// 从磁盘加载模型与类别映射（先模型后映射）
    pub fn load(config: &Config) -> Result<Self> {
        let classifier = Arc::new(OnnxClassifier::new(config)?);
        let labels = LabelMap::from_path(&config.labels_path)?;
        Ok(Self::new(classifier, labels, config.rescaling))
    }

    pub fn new(
        classifier: Arc<dyn ProbabilityModel>,
        labels: LabelMap,
        rescaling: RescalePolicy,
    ) -> Self {
        let has_rescaling = match rescaling {
            RescalePolicy::Auto => classifier.has_internal_rescaling(),
            RescalePolicy::Internal => true,
            RescalePolicy::External => false,
        };

        Self {
            classifier,
            labels,
            has_rescaling,
        }
    }

    pub fn classifier(&self) -> &dyn ProbabilityModel {
        self.classifier.as_ref()
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn has_rescaling(&self) -> bool {
        self.has_rescaling
    }
}

/// 模型管理器：进程内只加载一次，失败时下次请求重试
pub struct ModelManager {
    config: Config,
    context: OnceCell<Arc<ModelContext>>,
}

impl ModelManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            context: OnceCell::new(),
        }
    }

    /// 使用已构建好的上下文（测试或自定义后端）
    pub fn with_context(config: Config, context: ModelContext) -> Self {
        Self {
            config,
            context: OnceCell::with_value(Arc::new(context)),
        }
    }

    /// 启动时预加载，失败只记录警告
    pub fn warm_up(&self) {
        match self.get() {
            Ok(ctx) => tracing::info!(
                "Model ready: {} labels, internal rescaling: {}",
                ctx.labels().len(),
                ctx.has_rescaling()
            ),
            Err(e) => tracing::warn!("Model not loaded at startup: {}", e),
        }
    }

    pub fn get(&self) -> Result<Arc<ModelContext>> {
        self.context
            .get_or_try_init(|| {
                tracing::info!("Initializing model context...");
                ModelContext::load(&self.config).map(Arc::new)
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.context.get().is_some()
    }

    pub fn get_stats(&self) -> ModelStats {
        let context = self.context.get();
        ModelStats {
            loaded: context.is_some(),
            num_labels: context.map(|c| c.labels().len()).unwrap_or(0),
            has_rescaling: context.map(|c| c.has_rescaling()),
            model_path: self.config.model_path.display().to_string(),
            input_size: self.config.image_size,
            intra_threads: self.config.onnx_config.intra_threads,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub loaded: bool,
    pub num_labels: usize,
    pub has_rescaling: Option<bool>,
    pub model_path: String,
    pub input_size: (u32, u32),
    pub intra_threads: usize,
}
