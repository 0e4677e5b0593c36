//! API routes for the proxy server

pub mod remote;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Background upload - with larger body limit for file uploads
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/upload/status/:job_id", get(upload::get_upload_status))
        // Synchronous remote operations
        .route("/add", post(remote::add_torrent))
        .route("/list", get(remote::list_contents))
        .route("/status", get(remote::remote_status))
        .route("/items/:item_id", delete(remote::delete_item))
}

/// GET / - liveness
async fn root() -> Json<Value> {
    Json(json!({ "message": "Seedr Proxy API is running." }))
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::testing::{test_state, FakeRemote, UploadBehavior};
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(UploadBehavior::Succeed));
        let app = build_router(test_state(&dir, remote).await);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Seedr Proxy API is running.");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(UploadBehavior::Succeed));
        let app = build_router(test_state(&dir, remote).await);

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
