use std::{fmt, sync::Arc};

use crate::api::{self, CommentId, PostId, Time, UserId, VoteType};

/// A list of sibling comments. At the top level, the roots of a post's thread.
///
/// Nodes are shared between the versions of a tree, so that a mutation only
/// allocates the path from the root to the changed comment.
pub type Forest = im::Vector<Arc<Comment>>;

/// A comment along with all its replies.
///
/// Reply chains can be arbitrarily deep, so dropping and comparing nodes walk
/// the tree with an explicit stack. `Debug` only lists the ids of the direct
/// replies.
#[derive(Clone)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,

    pub author_id: UserId,
    pub author: String,

    pub content: String,
    pub created_at: Time,
    pub updated_at: Option<Time>,

    pub upvotes: u64,
    pub downvotes: u64,

    /// Vote of the user viewing this thread
    pub user_vote: Option<VoteType>,

    /// Child comments, in the order they were received
    pub replies: Forest,
}

impl Comment {
    /// Builds a childless node from a server record, `user_vote` taking precedence
    /// over the vote embedded in the record.
    pub fn from_record(c: api::Comment, user_vote: Option<VoteType>) -> Comment {
        Comment {
            id: c.id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            author_id: c.author_id,
            author: c.author,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
            upvotes: c.upvotes,
            downvotes: c.downvotes.unwrap_or(0),
            user_vote: user_vote.or(c.user_vote),
            replies: Forest::new(),
        }
    }

    pub fn score(&self) -> i64 {
        let up = i64::try_from(self.upvotes).unwrap_or(i64::MAX);
        let down = i64::try_from(self.downvotes).unwrap_or(i64::MAX);
        up.saturating_sub(down)
    }

    fn same_fields(&self, other: &Comment) -> bool {
        self.id == other.id
            && self.post_id == other.post_id
            && self.parent_id == other.parent_id
            && self.author_id == other.author_id
            && self.author == other.author
            && self.content == other.content
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.upvotes == other.upvotes
            && self.downvotes == other.downvotes
            && self.user_vote == other.user_vote
    }

    /// Time of the last edit, or of the creation if never edited
    pub fn last_activity(&self) -> Time {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Number of comments below this one, at any depth
    pub fn descendant_count(&self) -> usize {
        crate::tree::len(&self.replies)
    }
}

impl From<api::Comment> for Comment {
    fn from(c: api::Comment) -> Comment {
        Comment::from_record(c, None)
    }
}

impl Drop for Comment {
    fn drop(&mut self) {
        // Only descend into the replies no other tree holds on to
        let mut stack = vec![std::mem::take(&mut self.replies)];
        while let Some(mut forest) = stack.pop() {
            while let Some(reply) = forest.pop_back() {
                if let Some(mut reply) = Arc::into_inner(reply) {
                    stack.push(std::mem::take(&mut reply.replies));
                }
            }
        }
    }
}

impl PartialEq for Comment {
    fn eq(&self, other: &Comment) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.same_fields(b) || a.replies.len() != b.replies.len() {
                return false;
            }
            stack.extend(
                a.replies
                    .iter()
                    .zip(b.replies.iter())
                    .filter(|(x, y)| !Arc::ptr_eq(x, y))
                    .map(|(x, y)| (&**x, &**y)),
            );
        }
        true
    }
}

impl Eq for Comment {}

impl fmt::Debug for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comment")
            .field("id", &self.id)
            .field("post_id", &self.post_id)
            .field("parent_id", &self.parent_id)
            .field("author_id", &self.author_id)
            .field("author", &self.author)
            .field("content", &self.content)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("upvotes", &self.upvotes)
            .field("downvotes", &self.downvotes)
            .field("user_vote", &self.user_vote)
            .field(
                "replies",
                &self.replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            )
            .finish()
    }
}
