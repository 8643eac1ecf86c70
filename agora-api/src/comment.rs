use crate::{CommentId, Error, PostId, Time, UserId, VoteType};

/// A comment as the forum API returns it: flat, with an optional reference to
/// its parent comment.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    #[serde(rename = "comment_id")]
    pub id: CommentId,
    pub post_id: PostId,
    #[serde(rename = "user_id")]
    pub author_id: UserId,
    #[serde(rename = "username", alias = "author")]
    pub author: String,
    pub content: String,
    #[serde(deserialize_with = "crate::time::deserialize")]
    pub created_at: Time,
    #[serde(default, deserialize_with = "crate::time::deserialize_option")]
    pub updated_at: Option<Time>,

    #[serde(default)]
    pub upvotes: u64,
    /// Older endpoints do not report downvotes at all
    #[serde(default)]
    pub downvotes: Option<u64>,

    #[serde(rename = "parent_comment_id", default)]
    pub parent_id: Option<CommentId>,

    /// Vote of the requesting user, when the endpoint knows it
    #[serde(default)]
    pub user_vote: Option<VoteType>,
}

/// Body of both comment creation and comment edition requests
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub content: String,
    #[serde(rename = "parent_comment_id", default)]
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn new(post_id: PostId, content: String, parent_id: Option<CommentId>) -> NewComment {
        NewComment {
            post_id,
            content,
            parent_id,
        }
    }

    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}
