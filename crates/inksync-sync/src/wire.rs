//! HTTP wire format shared by [`HttpVaultApi`](crate::HttpVaultApi) and the
//! server router.
//!
//! Filepaths travel as a single URL-safe, unpadded base64 path segment.
//! File bodies travel as standard (padded) base64 inside JSON, so the
//! `DELETE` marker can never collide with an encoded payload.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use bytes::Bytes;
use inksync_core::{validate_path, ContentHash, CoreError, FileState, Update, Upload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Literal `file` value of an upload that deletes.
pub const DELETE_MARKER: &str = "DELETE";

/// Literal body of `GET /updates/{filepath}` for an untracked file.
pub const UNTRACKED_MARKER: &str = "UNTRACKED";

/// Body of `GET /ping`.
pub const PONG: &str = "pong";

/// Error codes carried in [`ErrorBody::code`].
pub mod codes {
    pub const STALE_BASE: &str = "stale-base";
    pub const UNKNOWN_VAULT: &str = "unknown-vault";
    pub const BAD_REQUEST: &str = "bad-request";
    pub const INTERNAL: &str = "internal";
}

/// Malformed wire data.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("filepath segment {0:?} is not valid base64 UTF-8")]
    Filepath(String),

    #[error("file payload is not valid base64")]
    Payload,

    #[error("malformed update: {0}")]
    Update(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Encode a filepath as one URL path segment.
pub fn encode_filepath(filepath: &str) -> String {
    URL_SAFE_NO_PAD.encode(filepath)
}

/// Decode and validate a filepath segment.
pub fn decode_filepath(segment: &str) -> Result<String, WireError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| WireError::Filepath(segment.to_string()))?;
    let filepath = String::from_utf8(raw).map_err(|_| WireError::Filepath(segment.to_string()))?;
    validate_path(&filepath)?;
    Ok(filepath)
}

/// Body of `POST /vaults/{vault}/files/{filepath}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Hash the caller last saw, `""` for untracked.
    pub current_hash: String,
    /// Base64 content, or [`DELETE_MARKER`].
    pub file: String,
}

impl UploadRequest {
    pub fn new(current_hash: Option<&ContentHash>, upload: &Upload) -> Self {
        let file = match upload {
            Upload::Content(data) => STANDARD.encode(data),
            Upload::Delete => DELETE_MARKER.to_string(),
        };
        Self {
            current_hash: ContentHash::base_to_wire(current_hash),
            file,
        }
    }

    pub fn into_parts(self) -> Result<(Option<ContentHash>, Upload), WireError> {
        let base = ContentHash::parse_base(&self.current_hash)?;
        let upload = if self.file == DELETE_MARKER {
            Upload::Delete
        } else {
            let data = STANDARD.decode(&self.file).map_err(|_| WireError::Payload)?;
            Upload::Content(Bytes::from(data))
        };
        Ok((base, upload))
    }
}

/// Body of `GET /vaults/{vault}/files/{filepath}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum FileResponse {
    Content { content: String },
    Deleted,
    NonExistent,
}

impl From<&FileState> for FileResponse {
    fn from(state: &FileState) -> Self {
        match state {
            FileState::Content(data) => Self::Content {
                content: STANDARD.encode(data),
            },
            FileState::Deleted => Self::Deleted,
            FileState::NonExistent => Self::NonExistent,
        }
    }
}

impl TryFrom<FileResponse> for FileState {
    type Error = WireError;

    fn try_from(response: FileResponse) -> Result<Self, WireError> {
        Ok(match response {
            FileResponse::Content { content } => {
                let data = STANDARD.decode(content).map_err(|_| WireError::Payload)?;
                FileState::Content(Bytes::from(data))
            }
            FileResponse::Deleted => FileState::Deleted,
            FileResponse::NonExistent => FileState::NonExistent,
        })
    }
}

/// Body of `GET /vaults/{vault}/updates/{filepath}`: a record, or the
/// `"UNTRACKED"` string.
pub fn update_to_json(update: Option<&Update>) -> Value {
    match update {
        Some(update) => serde_json::to_value(update).unwrap_or(Value::Null),
        None => Value::String(UNTRACKED_MARKER.to_string()),
    }
}

pub fn update_from_json(value: Value) -> Result<Option<Update>, WireError> {
    match value {
        Value::String(s) if s == UNTRACKED_MARKER => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(|e| WireError::Update(e.to_string())),
    }
}

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_filepath_segment_has_no_slashes() {
        let segment = encode_filepath("notes/2024/today?.md");
        assert!(!segment.contains('/'));
        assert!(!segment.contains('='));
        assert_eq!(decode_filepath(&segment).unwrap(), "notes/2024/today?.md");
    }

    #[test]
    fn test_decode_rejects_escaping_paths() {
        let segment = encode_filepath("../etc/passwd");
        assert!(matches!(decode_filepath(&segment), Err(WireError::Core(_))));
        assert!(matches!(decode_filepath("***"), Err(WireError::Filepath(_))));
    }

    #[test]
    fn test_upload_request_json_shape() {
        let base = ContentHash::of(b"old");
        let request = UploadRequest::new(Some(&base), &Upload::Content(Bytes::from_static(b"hi")));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["currentHash"], base.to_string());
        assert_eq!(json["file"], "aGk=");

        let untracked_delete = UploadRequest::new(None, &Upload::Delete);
        assert_eq!(untracked_delete.current_hash, "");
        assert_eq!(untracked_delete.file, DELETE_MARKER);
        assert_eq!(untracked_delete.into_parts().unwrap(), (None, Upload::Delete));
    }

    #[test]
    fn test_file_response_tags() {
        let json = serde_json::to_value(FileResponse::from(&FileState::NonExistent)).unwrap();
        assert_eq!(json, serde_json::json!({"state": "non-existent"}));

        let json = serde_json::to_value(FileResponse::from(&FileState::Content(Bytes::from_static(b"x"))))
            .unwrap();
        assert_eq!(json, serde_json::json!({"state": "content", "content": "eA=="}));
    }

    #[test]
    fn test_update_json_untracked_marker() {
        assert_eq!(update_to_json(None), serde_json::json!("UNTRACKED"));
        assert_eq!(update_from_json(serde_json::json!("UNTRACKED")).unwrap(), None);

        let update = Update::new("a.txt", ContentHash::Deleted, 7);
        let json = update_to_json(Some(&update));
        assert_eq!(json["hash"], "DELETED");
        assert_eq!(update_from_json(json).unwrap(), Some(update));

        assert!(update_from_json(serde_json::json!("SOMETHING")).is_err());
    }

    proptest! {
        #[test]
        fn prop_encoded_payload_never_equals_delete_marker(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let request = UploadRequest::new(None, &Upload::Content(Bytes::from(data.clone())));
            prop_assert_ne!(request.file.as_str(), DELETE_MARKER);
            let (_, upload) = request.into_parts().unwrap();
            prop_assert_eq!(upload, Upload::Content(Bytes::from(data)));
        }
    }
}
