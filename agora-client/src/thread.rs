use crate::{
    api::{self, CommentId, PostId, UserVotes, VoteTally},
    overlay_votes, tree, Comment, Forest,
};

/// Identifies the state of a thread a request was issued against
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ticket {
    post_id: PostId,
    generation: u64,
}

/// What the server answered to a mutation request
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    Created(api::Comment),
    Edited(api::Comment),
    Voted { id: CommentId, tally: VoteTally },
    Deleted(CommentId),
}

/// The comments of one post, as currently displayed
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thread {
    pub post_id: PostId,
    generation: u64,
    comments: Forest,
}

impl Thread {
    pub fn load(post_id: PostId, records: Vec<api::Comment>, votes: &UserVotes) -> Thread {
        let mut res = Thread {
            post_id,
            generation: 0,
            comments: Forest::new(),
        };
        res.reload(records, votes);
        res
    }

    /// Replaces the whole thread with freshly fetched comments. Responses to
    /// requests issued before the reload will be ignored.
    pub fn reload(&mut self, records: Vec<api::Comment>, votes: &UserVotes) {
        let records = records
            .into_iter()
            .filter(|c| {
                if c.post_id != self.post_id {
                    tracing::warn!(
                        comment = %c.id,
                        post = %c.post_id,
                        expected_post = %self.post_id,
                        "ignoring comment from another post"
                    );
                }
                c.post_id == self.post_id
            })
            .collect::<Vec<_>>();
        self.generation += 1;
        self.comments = tree::build_tree(overlay_votes(records, &votes.comment_votes()));
    }

    pub fn ticket(&self) -> Ticket {
        Ticket {
            post_id: self.post_id,
            generation: self.generation,
        }
    }

    pub fn comments(&self) -> &Forest {
        &self.comments
    }

    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        tree::find(&self.comments, id)
    }

    pub fn len(&self) -> usize {
        tree::len(&self.comments)
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Splices the answer to a request into the thread.
    ///
    /// Returns `false` without touching the thread if `ticket` was taken on
    /// another post or before the last reload.
    pub fn apply(&mut self, ticket: Ticket, m: Mutation) -> bool {
        if ticket != self.ticket() {
            tracing::debug!(?ticket, current = ?self.ticket(), "dropping stale response");
            return false;
        }
        self.comments = match m {
            Mutation::Created(c) => {
                if c.post_id != self.post_id {
                    tracing::warn!(
                        comment = %c.id,
                        post = %c.post_id,
                        expected_post = %self.post_id,
                        "created comment belongs to another post"
                    );
                    return false;
                }
                let c = Comment::from(c);
                if tree::find(&self.comments, c.id).is_some() {
                    tracing::warn!(comment = %c.id, "created comment already in thread");
                    return false;
                }
                tree::attach_reply(&self.comments, c)
            }
            Mutation::Edited(c) => tree::apply_edit(&self.comments, c),
            Mutation::Voted { id, tally } => tree::apply_vote(&self.comments, id, &tally),
            Mutation::Deleted(id) => tree::remove_node(&self.comments, id),
        };
        true
    }
}
