use crate::utils::error::ScanError;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "saved_models/efficientnetv2_b0.onnx";
pub const DEFAULT_LABELS_PATH: &str = "saved_models/class_indices.json";
pub const DEFAULT_DATA_FILE: &str = "scan_data.json";
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// ONNX 分类模型路径
    pub model_path: PathBuf,

    /// 类别索引文件路径 (class_indices.json)
    pub labels_path: PathBuf,

    /// 扫描记录文件路径
    pub data_file: PathBuf,

    /// 模型输入尺寸 (宽, 高)
    pub image_size: (u32, u32),

    /// 输入张量布局
    pub layout: TensorLayout,

    /// 像素归一化策略
    pub rescaling: RescalePolicy,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

/// 输入张量布局：Keras 导出的模型为 NHWC，PyTorch 风格为 NCHW
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

/// 是否在预处理阶段将像素缩放到 [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RescalePolicy {
    /// 根据模型元数据自动判断
    Auto,
    /// 模型内部已包含 Rescaling 层
    Internal,
    /// 由预处理负责缩放
    External,
}

impl Config {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bind_addr: String,
        model_path: String,
        labels_path: String,
        data_file: String,
        image_size: u32,
        layout: TensorLayout,
        rescaling: RescalePolicy,
        dev_mode: bool,
    ) -> Result<Self> {
        if image_size == 0 {
            return Err(ScanError::Config("Image size must be positive".to_string()));
        }

        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 20 * 1024 * 1024, // 20MB
        };

        Ok(Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            labels_path: PathBuf::from(labels_path),
            data_file: PathBuf::from(data_file),
            image_size: (image_size, image_size),
            layout,
            rescaling,
            dev_mode,
            onnx_config,
            server_config,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8501".to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: PathBuf::from(DEFAULT_LABELS_PATH),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            image_size: (DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE),
            layout: TensorLayout::Nhwc,
            rescaling: RescalePolicy::Auto,
            dev_mode: false,
            onnx_config: OnnxConfig { intra_threads: 1 },
            server_config: ServerConfig {
                request_timeout: 60,
                max_request_size: 20 * 1024 * 1024,
            },
        }
    }
}
