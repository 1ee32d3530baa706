use anyhow::Result;
use clap::Parser;
use fresh_scan::config::{
    Config, RescalePolicy, TensorLayout, DEFAULT_DATA_FILE, DEFAULT_IMAGE_SIZE,
    DEFAULT_LABELS_PATH, DEFAULT_MODEL_PATH,
};
use fresh_scan::web::serve;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fresh-scan")]
#[command(about = "Produce freshness scanner powered by an ONNX image classifier")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8501")]
    bind: String,

    /// ONNX classifier path
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: String,

    /// Class index mapping (JSON)
    #[arg(long, default_value = DEFAULT_LABELS_PATH)]
    labels: String,

    /// Scan data file
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data_file: String,

    /// Model input size (square)
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    image_size: u32,

    /// Input tensor layout
    #[arg(long, value_enum, default_value_t = TensorLayout::Nhwc)]
    layout: TensorLayout,

    /// Pixel rescaling
    #[arg(long, value_enum, default_value_t = RescalePolicy::Auto)]
    rescaling: RescalePolicy,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Fresh Scan service...");
    tracing::info!("Model: {}", args.model);
    tracing::info!("Labels: {}", args.labels);

    let config = Config::new(
        args.bind,
        args.model,
        args.labels,
        args.data_file,
        args.image_size,
        args.layout,
        args.rescaling,
        args.dev,
    )?;

    serve(config).await?;

    Ok(())
}
