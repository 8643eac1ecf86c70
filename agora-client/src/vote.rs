use std::collections::HashMap;

use crate::{
    api::{self, CommentId, VoteType},
    Comment,
};

/// Merges the viewer's votes onto freshly fetched records.
///
/// This must run before `tree::build_tree`, as the tree only carries what the
/// flat comments carried.
pub fn overlay_votes(
    records: Vec<api::Comment>,
    votes: &HashMap<CommentId, VoteType>,
) -> Vec<Comment> {
    records
        .into_iter()
        .map(|r| {
            let vote = votes.get(&r.id).copied();
            Comment::from_record(r, vote)
        })
        .collect()
}
