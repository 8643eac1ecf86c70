use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap, HashSet};

use agora_client::api::{
    self, CommentId, CommentVote, Error, NewComment, PostId, Time, UserId, UserVotes, VoteTally,
    VoteType,
};

/// In-memory stand-in for the forum comment endpoints.
///
/// Callers are identified by their `UserId` directly, authentication being the
/// real server's business.
pub struct MockServer {
    users: BTreeMap<UserId, DbUser>,
    posts: BTreeSet<PostId>,
    comments: BTreeMap<CommentId, api::Comment>,
    next_id: i64,
    now: Time,
}

#[derive(Debug)]
struct DbUser {
    name: String,
    comment_votes: HashMap<CommentId, VoteType>,
}

impl MockServer {
    pub fn new(now: Time) -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            posts: BTreeSet::new(),
            comments: BTreeMap::new(),
            next_id: 1,
            now,
        }
    }

    fn fresh_id(&mut self) -> i64 {
        let res = self.next_id;
        self.next_id += 1;
        res
    }

    // Every write happens one second after the previous one
    fn tick(&mut self) -> Time {
        self.now = self.now + chrono::Duration::seconds(1);
        self.now
    }

    /// Return the current number of comments, across all posts
    pub fn test_num_comments(&self) -> usize {
        self.comments.len()
    }

    pub fn admin_create_user(&mut self, name: String) -> Result<UserId, Error> {
        api::validate_string(&name)?;
        let id = UserId(self.fresh_id());
        match self.users.entry(id) {
            btree_map::Entry::Occupied(_) => Err(Error::Unknown(format!("user {id:?} exists"))),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(DbUser {
                    name,
                    comment_votes: HashMap::new(),
                });
                Ok(id)
            }
        }
    }

    fn resolve(&self, user: UserId) -> Result<&DbUser, Error> {
        self.users.get(&user).ok_or_else(|| {
            tracing::info!(%user, "refusing request from unknown user");
            Error::PermissionDenied
        })
    }

    fn resolve_mut(&mut self, user: UserId) -> Result<&mut DbUser, Error> {
        self.users.get_mut(&user).ok_or(Error::PermissionDenied)
    }

    pub fn create_post(&mut self, user: UserId) -> Result<PostId, Error> {
        self.resolve(user)?;
        let id = PostId(self.fresh_id());
        self.posts.insert(id);
        Ok(id)
    }

    fn forget_comments(&mut self, doomed: &HashSet<CommentId>) {
        self.comments.retain(|id, _| !doomed.contains(id));
        for u in self.users.values_mut() {
            u.comment_votes.retain(|id, _| !doomed.contains(id));
        }
    }

    fn with_user_vote(&self, user: UserId, c: &api::Comment) -> api::Comment {
        let mut c = c.clone();
        c.user_vote = self
            .users
            .get(&user)
            .and_then(|u| u.comment_votes.get(&c.id))
            .copied();
        c
    }

    pub fn fetch_comments(&self, user: UserId, post: PostId) -> Result<Vec<api::Comment>, Error> {
        self.resolve(user)?;
        if !self.posts.contains(&post) {
            return Err(Error::PostNotFound(post));
        }
        Ok(self
            .comments
            .values()
            .filter(|c| c.post_id == post)
            .map(|c| self.with_user_vote(user, c))
            .collect())
    }

    pub fn fetch_votes(&self, user: UserId) -> Result<UserVotes, Error> {
        let u = self.resolve(user)?;
        let mut res = UserVotes {
            // Posts cannot be voted on here
            post_votes: Vec::new(),
            comment_votes: u
                .comment_votes
                .iter()
                .map(|(&comment_id, &vote_type)| CommentVote {
                    comment_id,
                    vote_type,
                })
                .collect(),
        };
        res.comment_votes.sort_by_key(|v| v.comment_id);
        Ok(res)
    }

    pub fn create_comment(&mut self, user: UserId, c: NewComment) -> Result<api::Comment, Error> {
        let author = self.resolve(user)?.name.clone();
        c.validate()?;
        if !self.posts.contains(&c.post_id) {
            return Err(Error::PostNotFound(c.post_id));
        }
        if let Some(parent) = c.parent_id {
            match self.comments.get(&parent) {
                Some(p) if p.post_id == c.post_id => (),
                _ => return Err(Error::InvalidParent(parent)),
            }
        }
        let res = api::Comment {
            id: CommentId(self.fresh_id()),
            post_id: c.post_id,
            author_id: user,
            author,
            content: c.content,
            created_at: self.tick(),
            updated_at: None,
            upvotes: 0,
            downvotes: Some(0),
            parent_id: c.parent_id,
            user_vote: None,
        };
        self.comments.insert(res.id, res.clone());
        Ok(res)
    }

    fn owned_comment(&self, user: UserId, id: CommentId) -> Result<&api::Comment, Error> {
        self.resolve(user)?;
        let c = self.comments.get(&id).ok_or(Error::CommentNotFound(id))?;
        if c.author_id != user {
            tracing::info!(%user, comment = %id, "refusing to touch someone else's comment");
            return Err(Error::PermissionDenied);
        }
        Ok(c)
    }

    /// The edit endpoint does not report the caller's vote
    pub fn edit_comment(
        &mut self,
        user: UserId,
        id: CommentId,
        edit: NewComment,
    ) -> Result<api::Comment, Error> {
        self.owned_comment(user, id)?;
        edit.validate()?;
        let now = self.tick();
        let c = self
            .comments
            .get_mut(&id)
            .ok_or(Error::CommentNotFound(id))?;
        c.content = edit.content;
        c.updated_at = Some(now);
        Ok(c.clone())
    }

    /// Deletes a comment and, transitively, all its replies
    pub fn delete_comment(&mut self, user: UserId, id: CommentId) -> Result<(), Error> {
        self.owned_comment(user, id)?;
        let mut doomed = HashSet::new();
        doomed.insert(id);
        loop {
            let before = doomed.len();
            for c in self.comments.values() {
                if c.parent_id.map_or(false, |p| doomed.contains(&p)) {
                    doomed.insert(c.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        tracing::debug!(comment = %id, removed = doomed.len(), "deleting comment subtree");
        self.forget_comments(&doomed);
        Ok(())
    }

    pub fn vote_comment(
        &mut self,
        user: UserId,
        id: CommentId,
        pressed: VoteType,
    ) -> Result<VoteTally, Error> {
        let previous = self.resolve(user)?.comment_votes.get(&id).copied();
        let c = self
            .comments
            .get_mut(&id)
            .ok_or(Error::CommentNotFound(id))?;
        let tally = VoteTally::new(c.upvotes, c.downvotes.unwrap_or(0), previous).cast(pressed);
        c.upvotes = tally.upvotes;
        c.downvotes = Some(tally.downvotes);
        let u = self.resolve_mut(user)?;
        match tally.user_vote {
            Some(v) => u.comment_votes.insert(id, v),
            None => u.comment_votes.remove(&id),
        };
        Ok(tally)
    }
}
