//! HTTP interface of a vault server.
//!
//! | method | path | answer |
//! |---|---|---|
//! | `GET` | `/vaults/{vault}/ping` | `pong` |
//! | `GET` | `/vaults/{vault}/updates?since=ts` | `Update[]` |
//! | `GET` | `/vaults/{vault}/updates/{b64 filepath}` | `Update` or `"UNTRACKED"` |
//! | `GET` | `/vaults/{vault}/files/{b64 filepath}` | file state |
//! | `POST` | `/vaults/{vault}/files/{b64 filepath}` | `{time, newHash}` |

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use inksync_core::{PushReceipt, Update};
use inksync_sync::wire::{
    self, codes, decode_filepath, ErrorBody, FileResponse, UploadRequest, WireError,
};
use inksync_vault::{VaultError, VaultRegistry};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;

/// Build the HTTP router over a set of vaults.
pub fn build_router(registry: Arc<VaultRegistry>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/vaults/:vault/ping", get(ping))
        .route("/vaults/:vault/updates", get(updates_since))
        .route("/vaults/:vault/updates/:filepath", get(get_update))
        .route("/vaults/:vault/files/:filepath", get(get_file).post(upload_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Open the configured vaults and serve them until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    config.validate()?;
    let registry = Arc::new(config.build_registry()?);
    let router = build_router(registry.clone(), config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        vaults = ?registry.names().collect::<Vec<_>>(),
        "inksync server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SinceQuery {
    #[serde(default)]
    since: i64,
}

async fn ping(
    State(registry): State<Arc<VaultRegistry>>,
    Path(vault): Path<String>,
) -> std::result::Result<&'static str, ApiError> {
    registry.get(&vault)?;
    Ok(wire::PONG)
}

async fn updates_since(
    State(registry): State<Arc<VaultRegistry>>,
    Path(vault): Path<String>,
    Query(query): Query<SinceQuery>,
) -> std::result::Result<Json<Vec<Update>>, ApiError> {
    let vault = registry.get(&vault)?;
    Ok(Json(vault.get_updates_since(query.since).await?))
}

async fn get_update(
    State(registry): State<Arc<VaultRegistry>>,
    Path((vault, segment)): Path<(String, String)>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    let vault = registry.get(&vault)?;
    let filepath = decode_filepath(&segment)?;
    let update = vault.get_update_for(&filepath).await?;
    Ok(Json(wire::update_to_json(update.as_ref())))
}

async fn get_file(
    State(registry): State<Arc<VaultRegistry>>,
    Path((vault, segment)): Path<(String, String)>,
) -> std::result::Result<Json<FileResponse>, ApiError> {
    let vault = registry.get(&vault)?;
    let filepath = decode_filepath(&segment)?;
    let state = vault.get_current(&filepath).await?;
    Ok(Json(FileResponse::from(&state)))
}

async fn upload_file(
    State(registry): State<Arc<VaultRegistry>>,
    Path((vault, segment)): Path<(String, String)>,
    Json(body): Json<UploadRequest>,
) -> std::result::Result<Json<PushReceipt>, ApiError> {
    let vault = registry.get(&vault)?;
    let filepath = decode_filepath(&segment)?;
    let (current_hash, upload) = body.into_parts()?;
    let receipt = vault
        .push_update(upload, &filepath, current_hash.as_ref())
        .await?;
    Ok(Json(receipt))
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// An error answer: status code plus an [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    pub status_code: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status_code: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status_code,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            tracing::error!(status = %self.status_code, error = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status_code, error = %self.message, "request rejected");
        }
        let body = ErrorBody {
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status_code, Json(body)).into_response()
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        let message = err.to_string();
        match err {
            VaultError::StaleBase { .. } => Self::new(StatusCode::CONFLICT, codes::STALE_BASE, message),
            VaultError::UnknownVault(_) => Self::new(StatusCode::NOT_FOUND, codes::UNKNOWN_VAULT, message),
            VaultError::Core(_) | VaultError::ReservedPath(_) => {
                Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message)
            }
            VaultError::Store(_) | VaultError::MissingContent(_) | VaultError::DuplicateVault(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL, message)
            }
        }
    }
}

impl From<WireError> for ApiError {
    fn from(err: WireError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use inksync_core::ContentHash;
    use inksync_store::{MemoryFilesystem, MemoryStore};
    use inksync_sync::wire::encode_filepath;
    use inksync_vault::Vault;
    use tower::util::ServiceExt;

    fn test_router() -> Router {
        let mut registry = VaultRegistry::new();
        registry
            .insert(Vault::new("notes", MemoryStore::new(), MemoryFilesystem::new()))
            .unwrap();
        build_router(Arc::new(registry), 1024 * 1024)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upload(segment: &str, body: &UploadRequest) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/vaults/notes/files/{segment}"))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn ping_known_and_unknown_vault() {
        let app = test_router();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/vaults/notes/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/vaults/other/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "unknown-vault");
    }

    #[tokio::test]
    async fn upload_then_download() {
        let app = test_router();
        let segment = encode_filepath("dir/a.md");
        let request = UploadRequest {
            current_hash: String::new(),
            file: "aGVsbG8=".into(),
        };

        let response = app.clone().oneshot(upload(&segment, &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = body_json(response).await;
        assert_eq!(receipt["newHash"], ContentHash::of(b"hello").to_string());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/vaults/notes/files/{segment}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"state": "content", "content": "aGVsbG8="})
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/vaults/notes/updates?since=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let updates = body_json(response).await;
        assert_eq!(updates[0]["filepath"], "dir/a.md");
    }

    #[tokio::test]
    async fn stale_base_is_conflict() {
        let app = test_router();
        let segment = encode_filepath("a.md");
        let request = UploadRequest {
            current_hash: String::new(),
            file: wire::DELETE_MARKER.into(),
        };

        let first = app.clone().oneshot(upload(&segment, &request)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(upload(&segment, &request)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["code"], "stale-base");
    }

    #[tokio::test]
    async fn untracked_update_and_bad_segment() {
        let app = test_router();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/vaults/notes/updates/{}", encode_filepath("nope.md")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await, serde_json::json!("UNTRACKED"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/vaults/notes/files/{}", encode_filepath("../up")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reserved_path_is_bad_request() {
        let app = test_router();
        let request = UploadRequest {
            current_hash: String::new(),
            file: "eA==".into(),
        };
        let response = app
            .oneshot(upload(&encode_filepath(".inksync/vault.db"), &request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
