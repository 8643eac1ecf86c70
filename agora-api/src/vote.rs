use bolero::generator::TypeGenerator;
use std::collections::HashMap;

use crate::{CommentId, PostId};

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

/// Vote counts of a post or comment, as returned by the vote endpoints
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteTally {
    #[serde(default)]
    pub message: Option<String>,
    pub upvotes: u64,
    pub downvotes: u64,

    /// Vote of the requesting user after the tally was computed
    #[serde(default)]
    pub user_vote: Option<VoteType>,
}

impl VoteTally {
    pub fn new(upvotes: u64, downvotes: u64, user_vote: Option<VoteType>) -> VoteTally {
        VoteTally {
            message: None,
            upvotes,
            downvotes,
            user_vote,
        }
    }

    /// Returns the tally after the user pressed `pressed`, `self.user_vote` being
    /// their vote before pressing.
    ///
    /// Pressing the same direction twice retracts the vote, pressing the other
    /// direction switches it.
    pub fn cast(&self, pressed: VoteType) -> VoteTally {
        let (mut up, mut down) = (self.upvotes, self.downvotes);
        let (user_vote, message) = match (self.user_vote, pressed) {
            (Some(VoteType::Up), VoteType::Up) => {
                up = up.saturating_sub(1);
                (None, "Upvote removed")
            }
            (Some(VoteType::Down), VoteType::Down) => {
                down = down.saturating_sub(1);
                (None, "Downvote removed")
            }
            (Some(VoteType::Down), VoteType::Up) => {
                up += 1;
                down = down.saturating_sub(1);
                (Some(VoteType::Up), "Switched to upvote")
            }
            (Some(VoteType::Up), VoteType::Down) => {
                down += 1;
                up = up.saturating_sub(1);
                (Some(VoteType::Down), "Switched to downvote")
            }
            (None, VoteType::Up) => {
                up += 1;
                (Some(VoteType::Up), "Upvoted successfully")
            }
            (None, VoteType::Down) => {
                down += 1;
                (Some(VoteType::Down), "Downvoted successfully")
            }
        };
        VoteTally {
            message: Some(String::from(message)),
            upvotes: up,
            downvotes: down,
            user_vote,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostVote {
    pub post_id: PostId,
    pub vote_type: VoteType,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentVote {
    pub comment_id: CommentId,
    pub vote_type: VoteType,
}

/// All the votes the requesting user has cast
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserVotes {
    #[serde(default)]
    pub post_votes: Vec<PostVote>,
    #[serde(default)]
    pub comment_votes: Vec<CommentVote>,
}

impl UserVotes {
    pub fn comment_votes(&self) -> HashMap<CommentId, VoteType> {
        self.comment_votes
            .iter()
            .map(|v| (v.comment_id, v.vote_type))
            .collect()
    }

    pub fn post_votes(&self) -> HashMap<PostId, VoteType> {
        self.post_votes
            .iter()
            .map(|v| (v.post_id, v.vote_type))
            .collect()
    }
}
