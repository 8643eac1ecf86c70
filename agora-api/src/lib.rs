use bolero::generator::TypeGenerator;

mod comment;
pub use comment::{Comment, NewComment};

mod error;
pub use error::Error;

mod order;
pub use order::CommentOrder;

mod post;
pub use post::PostId;

mod time;

mod user;
pub use user::UserId;

mod vote;
pub use vote::{CommentVote, PostVote, UserVotes, VoteTally, VoteType};

pub type Time = chrono::DateTime<chrono::Utc>;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct CommentId(pub i64);

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// The `validate` functions throughout agora-api only check what the server would
// reject outright; semantic checks (does the parent exist, is it in the same post)
// need the server's data.
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

pub fn validate_content(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}
