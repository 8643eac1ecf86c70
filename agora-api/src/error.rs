use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{CommentId, PostId};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Post not found {0}")]
    PostNotFound(PostId),

    #[error("Comment not found {0}")]
    CommentNotFound(CommentId),

    #[error("Invalid parent comment {0}")]
    InvalidParent(CommentId),

    #[error("Comment content is empty")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::PostNotFound(_) => StatusCode::NOT_FOUND,
            Error::CommentNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidParent(_) => StatusCode::BAD_REQUEST,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "detail": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "detail": "permission denied",
                "type": "permission-denied",
            }),
            Error::PostNotFound(p) => json!({
                "detail": "post not found",
                "type": "post-not-found",
                "post_id": p,
            }),
            Error::CommentNotFound(c) => json!({
                "detail": "comment not found",
                "type": "comment-not-found",
                "comment_id": c,
            }),
            Error::InvalidParent(c) => json!({
                "detail": "invalid parent comment",
                "type": "invalid-parent",
                "comment_id": c,
            }),
            Error::EmptyContent => json!({
                "detail": "comment content is empty",
                "type": "empty-content",
            }),
            Error::NullByteInString(s) => json!({
                "detail": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
        })
        .expect("serializing error contents")
    }

    /// Parses an error body. Bodies without a `type` are the backend's own
    /// `{"detail": ...}` errors and become `Error::Unknown`.
    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let comment_id = || {
            data.get("comment_id")
                .and_then(|c| c.as_i64())
                .map(CommentId)
                .ok_or_else(|| anyhow!("error is about a comment without a proper comment id"))
        };
        let ty = match data.get("type") {
            None => {
                return Ok(Error::Unknown(String::from(
                    data.get("detail")
                        .and_then(|msg| msg.as_str())
                        .ok_or_else(|| anyhow!("error has neither type nor detail"))?,
                )))
            }
            Some(t) => t
                .as_str()
                .ok_or_else(|| anyhow!("error type is not a string"))?,
        };
        Ok(match ty {
            "unknown" => Error::Unknown(String::from(
                data.get("detail")
                    .and_then(|msg| msg.as_str())
                    .unwrap_or(""),
            )),
            "permission-denied" => Error::PermissionDenied,
            "post-not-found" => Error::PostNotFound(
                data.get("post_id")
                    .and_then(|p| p.as_i64())
                    .map(PostId)
                    .ok_or_else(|| anyhow!("error is a missing post without a proper post id"))?,
            ),
            "comment-not-found" => Error::CommentNotFound(comment_id()?),
            "invalid-parent" => Error::InvalidParent(comment_id()?),
            "empty-content" => Error::EmptyContent,
            "null-byte" => Error::NullByteInString(String::from(
                data.get("string")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| anyhow!("error is a null-byte-in-string without a string"))?,
            )),
            _ => return Err(anyhow!("error contents has unknown type")),
        })
    }
}
