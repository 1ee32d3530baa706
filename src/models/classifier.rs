use crate::utils::error::ScanError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;
use tract_onnx::prelude::Framework;

/// 概率模型接口：输入预处理后的批量张量，输出第一张图像的类别概率
pub trait ProbabilityModel: Send + Sync {
    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>>;

    /// 模型内部是否已包含像素缩放层（Rescaling / Preprocessing）
    fn has_internal_rescaling(&self) -> bool {
        false
    }
}

/// 基于 ONNX Runtime 的图像分类器
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    has_rescaling: bool,
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.exists() {
            return Err(ScanError::NotFound(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(model_path)?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ScanError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        // 动态发现输出名称
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ScanError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model input: '{}', output: '{}'",
            input_name,
            output_name
        );

        let has_rescaling = detect_rescaling(&session, model_path);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            has_rescaling,
        })
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        let predictions = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(ScanError::Inference(format!(
                        "Classification output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        // [1, N] 或 [N]，只取第一张图像
        let probs = match predictions.ndim() {
            1 => predictions.iter().copied().collect(),
            2 if predictions.shape()[0] >= 1 => predictions
                .index_axis(ndarray::Axis(0), 0)
                .iter()
                .copied()
                .collect(),
            _ => {
                return Err(ScanError::Inference(format!(
                    "Unexpected classification output shape: {:?}",
                    predictions.shape()
                )))
            }
        };

        Ok(probs)
    }

    fn has_internal_rescaling(&self) -> bool {
        self.has_rescaling
    }
}

/// 判断模型是否包含 Rescaling 层：先看计算图节点名，再看自定义元数据
fn detect_rescaling(session: &Session, model_path: &Path) -> bool {
    let from_graph = match graph_node_names(model_path) {
        Ok(names) => {
            tracing::debug!("Model graph has {} nodes", names.len());
            names_mention_rescaling(names.iter().map(String::as_str))
        }
        Err(e) => {
            tracing::warn!("Could not read graph of {}: {}", model_path.display(), e);
            false
        }
    };

    let found = from_graph || metadata_mentions_rescaling(session, model_path);

    tracing::info!("Model internal rescaling detected: {}", found);
    found
}

/// 读取 ONNX 计算图中所有节点名称
pub fn graph_node_names(model_path: &Path) -> Result<Vec<String>> {
    let proto = tract_onnx::onnx()
        .proto_model_for_path(model_path)
        .map_err(|e| ScanError::ModelLoad(format!("Failed to parse ONNX graph: {}", e)))?;

    Ok(proto
        .graph
        .map(|graph| graph.node.into_iter().map(|node| node.name).collect())
        .unwrap_or_default())
}

fn metadata_mentions_rescaling(session: &Session, model_path: &Path) -> bool {
    let metadata = match session.metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Could not read metadata of {}: {}", model_path.display(), e);
            return false;
        }
    };

    let keys = metadata.custom_keys().unwrap_or_default();
    keys.iter().any(|key| {
        let value = metadata.custom(key).ok().flatten().unwrap_or_default();
        mentions_rescaling(key) || mentions_rescaling(&value)
    })
}

pub(crate) fn names_mention_rescaling<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    names.into_iter().any(mentions_rescaling)
}

pub(crate) fn mentions_rescaling(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("rescaling") || lower.contains("preprocessing")
}
