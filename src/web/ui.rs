use axum::response::{Html, IntoResponse};

/// 首页：Scanner / Result / Data 三个标签页
pub async fn index_handler() -> impl IntoResponse {
    Html(include_str!("../../templates/index.html"))
}
