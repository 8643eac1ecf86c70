use agora_client::api::{self, CommentId, NewComment, PostId, UserVotes, VoteTally, VoteType};
use anyhow::Context;

pub struct ApiConfig {
    pub host: String,
    pub token: String,
}

impl ApiConfig {
    pub fn from_env(host: String) -> anyhow::Result<ApiConfig> {
        let token =
            std::env::var("AGORA_TOKEN").context("retrieving AGORA_TOKEN environment variable")?;
        Ok(ApiConfig {
            host: host.trim_end_matches('/').to_string(),
            token,
        })
    }
}

/// Client for the forum endpoints of the backend
pub struct Api {
    config: ApiConfig,
    client: reqwest::Client,
}

impl Api {
    pub fn new(config: ApiConfig) -> Api {
        Api {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/forum/{}", self.config.host, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> anyhow::Result<reqwest::Response> {
        let resp = req
            .bearer_auth(&self.config.token)
            .send()
            .await
            .context("sending request to server")?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.bytes().await.context("reading error body")?;
        let err = api::Error::parse(&body)
            .with_context(|| format!("parsing error response with status {status}"))?;
        tracing::debug!(%status, ?err, "server refused request");
        Err(err.into())
    }

    async fn fetch<R>(&self, req: reqwest::RequestBuilder) -> anyhow::Result<R>
    where
        R: for<'de> serde::Deserialize<'de>,
    {
        self.send(req)
            .await?
            .json()
            .await
            .context("parsing response from server")
    }

    pub async fn fetch_comments(&self, post: PostId) -> anyhow::Result<Vec<api::Comment>> {
        self.fetch(self.client.get(self.url(&format!("posts/{post}/comments"))))
            .await
            .with_context(|| format!("fetching comments of post {post}"))
    }

    pub async fn fetch_votes(&self) -> anyhow::Result<UserVotes> {
        self.fetch(self.client.get(self.url("user/votes")))
            .await
            .context("fetching votes of current user")
    }

    pub async fn create_comment(&self, c: &NewComment) -> anyhow::Result<api::Comment> {
        c.validate()?;
        self.fetch(self.client.post(self.url("comments")).json(c))
            .await
            .context("creating comment")
    }

    pub async fn edit_comment(
        &self,
        id: CommentId,
        c: &NewComment,
    ) -> anyhow::Result<api::Comment> {
        c.validate()?;
        self.fetch(self.client.put(self.url(&format!("comments/{id}"))).json(c))
            .await
            .with_context(|| format!("editing comment {id}"))
    }

    pub async fn delete_comment(&self, id: CommentId) -> anyhow::Result<()> {
        self.send(self.client.delete(self.url(&format!("comments/{id}"))))
            .await
            .with_context(|| format!("deleting comment {id}"))?;
        Ok(())
    }

    pub async fn vote_comment(&self, id: CommentId, vote: VoteType) -> anyhow::Result<VoteTally> {
        let action = match vote {
            VoteType::Up => "upvote",
            VoteType::Down => "downvote",
        };
        self.fetch(self.client.post(self.url(&format!("comments/{id}/{action}"))))
            .await
            .with_context(|| format!("casting {action} on comment {id}"))
    }
}
