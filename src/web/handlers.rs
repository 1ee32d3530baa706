use crate::{
    scan::{Category, ScanOutcome, ScanPipeline},
    store::{now_timestamp, Tallies},
    utils::error::ScanError,
    web::{
        extractors::{RequestId, Validate, ValidatedJson},
        SharedState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct ScanJsonRequest {
    /// Base64编码的图像数据，可带 data URL 前缀
    pub image: String,
}

impl Validate for ScanJsonRequest {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }
        Ok(())
    }
}

/// 确认请求：客户端原样回传扫描得到的预测
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub label: String,
    pub probability: f32,
}

impl Validate for ConfirmRequest {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.label.trim().is_empty() {
            return Err("Label cannot be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err("Probability must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub label: String,
    pub category: Category,
    pub timestamp: String,
    pub tallies: Tallies,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }

    pub fn error(code: &str, message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 在阻塞线程池中执行推理或文件读写
async fn blocking<T, F>(state: &SharedState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&SharedState) -> Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| ScanError::Internal(format!("Background task failed: {}", e)))?
}

/// Multipart文件上传处理器
pub async fn scan_upload_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ScanOutcome>>> {
    tracing::info!("Processing upload scan request: request_id={}", request_id);

    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(ScanError::UnsupportedFormat(content_type.to_string()));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ScanError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data);
    }

    let image_data =
        image_data.ok_or_else(|| ScanError::InvalidInput("No image file provided".to_string()))?;

    let outcome = blocking(&state, move |state| {
        let context = state.models.get()?;
        ScanPipeline::process_bytes(&context, &state.config, &image_data)
    })
    .await?;

    Ok(Json(ApiResponse::success(outcome, request_id)))
}

/// JSON base64上传处理器
pub async fn scan_json_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ScanJsonRequest>,
) -> Result<Json<ApiResponse<ScanOutcome>>> {
    tracing::info!("Processing base64 scan request: request_id={}", request_id);

    let outcome = blocking(&state, move |state| {
        let context = state.models.get()?;
        ScanPipeline::process_base64(&context, &state.config, &request.image)
    })
    .await?;

    Ok(Json(ApiResponse::success(outcome, request_id)))
}

/// 确认并保存扫描结果
pub async fn confirm_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ConfirmRequest>,
) -> Result<Json<ApiResponse<ConfirmResponse>>> {
    tracing::info!(
        "Confirming scan: request_id={}, label={}, probability={:.4}",
        request_id,
        request.label,
        request.probability
    );

    let response = blocking(&state, move |state| {
        let context = state.models.get()?;
        if !context.labels().contains_label(&request.label) {
            return Err(ScanError::InvalidInput(format!(
                "Unknown label: {}",
                request.label
            )));
        }

        let timestamp = now_timestamp();
        let data = state.store.append(&request.label, &timestamp)?;

        Ok(ConfirmResponse {
            category: Category::from_label(&request.label),
            label: request.label,
            timestamp,
            tallies: Tallies::from_data(&data),
        })
    })
    .await?;

    Ok(Json(ApiResponse::success(response, request_id)))
}

/// 汇总数据（每次从磁盘重新读取）
pub async fn data_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
) -> Result<Json<ApiResponse<Tallies>>> {
    let tallies = blocking(&state, |state| {
        let data = state.store.load()?;
        Ok(Tallies::from_data(&data))
    })
    .await?;

    Ok(Json(ApiResponse::success(tallies, request_id)))
}

/// 清空全部数据
pub async fn clear_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
) -> Result<Json<ApiResponse<Tallies>>> {
    tracing::info!("Clearing all scan data: request_id={}", request_id);

    blocking(&state, |state| state.store.clear()).await?;

    Ok(Json(ApiResponse::success(Tallies::default(), request_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error(
            "INVALID_INPUT",
            "Invalid input: empty".to_string(),
        ))
        .unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert!(body.get("data").is_none());
        assert!(body["request_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn success_envelope_omits_error() {
        let body = serde_json::to_value(ApiResponse::success(Tallies::default(), "req-1".into()))
            .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["request_id"], "req-1");
        assert!(body.get("error").is_none());
        assert_eq!(body["data"]["total_fresh"], 0);
    }
}
