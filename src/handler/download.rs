use std::path::{Path, PathBuf};

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{
    config::RelayMode,
    service::{FetchMode, OperationResult},
    state::AppState,
};

const INVALID_REQUEST: &str = "Invalid request. Please provide a JSON payload with a 'url' field.";
const EMPTY_URL: &str = "URL cannot be empty.";

pub async fn download(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<OperationResult>) {
    let kind = state.mode.payload_kind();

    let Some(url) = extract_url(&body) else {
        warn!("Rejected /download request without a url field");
        return (StatusCode::BAD_REQUEST, Json(OperationResult::error(kind, INVALID_REQUEST)));
    };

    let url = url.trim();
    if url.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(OperationResult::error(kind, EMPTY_URL)));
    }

    let mode = match state.mode {
        RelayMode::Urls => FetchMode::UrlsOnly,
        RelayMode::Download => FetchMode::Download {
            target_dir: request_dir(&state.download_root),
        },
    };

    let result = state.fetcher.fetch(url, mode).await;
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    (status, Json(result))
}

fn extract_url(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.as_object()?.get("url")?.as_str().map(str::to_string)
}

/// `<root>/ig_downloads_<YYYYmmdd_HHMMSS>_<8 hex chars>`
fn request_dir(root: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    root.join(format!("ig_downloads_{}_{}", stamp, &suffix[..8]))
}
