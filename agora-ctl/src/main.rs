use agora_client::{
    api::{CommentId, CommentOrder, NewComment, PostId, VoteType},
    prelude::*,
    tree, Mutation, Thread,
};
use anyhow::Context;

mod api;
use api::{Api, ApiConfig};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    /// Order of sibling comments: oldest, newest or top
    #[structopt(short, long)]
    sort: Option<CommentOrder>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Display the comments of a post
    Show { post: i64 },

    /// Post a top-level comment
    Comment { post: i64, content: String },

    /// Reply to a comment
    Reply {
        post: i64,
        parent: i64,
        content: String,
    },

    /// Replace the content of one of your comments
    Edit {
        post: i64,
        comment: i64,
        content: String,
    },

    /// Delete one of your comments along with its replies
    Delete { post: i64, comment: i64 },

    /// Upvote a comment, or retract your upvote
    Upvote { post: i64, comment: i64 },

    /// Downvote a comment, or retract your downvote
    Downvote { post: i64, comment: i64 },
}

impl Command {
    fn post(&self) -> PostId {
        PostId(match *self {
            Command::Show { post } => post,
            Command::Comment { post, .. } => post,
            Command::Reply { post, .. } => post,
            Command::Edit { post, .. } => post,
            Command::Delete { post, .. } => post,
            Command::Upvote { post, .. } => post,
            Command::Downvote { post, .. } => post,
        })
    }
}

async fn load(api: &Api, post: PostId) -> anyhow::Result<Thread> {
    let records = api.fetch_comments(post).await?;
    let votes = api.fetch_votes().await?;
    let thread = Thread::load(post, records, &votes);
    tracing::debug!(%post, comments = thread.len(), "loaded thread");
    Ok(thread)
}

fn print(thread: &Thread, order: CommentOrder) {
    if thread.is_empty() {
        println!("No comments on post {} yet", thread.post_id);
        return;
    }
    let sorted = order.sort(thread.comments());
    for (depth, c) in tree::walk(&sorted) {
        let vote = match c.user_vote {
            Some(VoteType::Up) => "+",
            Some(VoteType::Down) => "-",
            None => " ",
        };
        let edited = if c.updated_at.is_some() { " (edited)" } else { "" };
        println!(
            "{:indent$}{vote}[{}] {} {:+} ({} up, {} down), {}{edited}",
            "",
            c.id,
            c.author,
            c.score(),
            c.upvotes,
            c.downvotes,
            c.last_activity().format("%Y-%m-%d %H:%M"),
            indent = 2 * depth,
        );
        for line in c.content.lines() {
            println!("{:indent$}  {line}", "", indent = 2 * depth);
        }
        if depth == 0 && !c.replies.is_empty() {
            println!("  ({} replies)", c.descendant_count());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let api = Api::new(ApiConfig::from_env(opt.host)?);
    let post = opt.cmd.post();

    let mut thread = load(&api, post).await?;
    let ticket = thread.ticket();
    let mutation = match opt.cmd {
        Command::Show { .. } => None,
        Command::Comment { content, .. } => Some(Mutation::Created(
            api.create_comment(&NewComment::new(post, content, None))
                .await?,
        )),
        Command::Reply {
            parent, content, ..
        } => Some(Mutation::Created(
            api.create_comment(&NewComment::new(post, content, Some(CommentId(parent))))
                .await?,
        )),
        Command::Edit {
            comment, content, ..
        } => {
            let id = CommentId(comment);
            let parent = thread
                .find(id)
                .with_context(|| format!("comment {id} is not on post {post}"))?
                .parent_id;
            Some(Mutation::Edited(
                api.edit_comment(id, &NewComment::new(post, content, parent))
                    .await?,
            ))
        }
        Command::Delete { comment, .. } => {
            let id = CommentId(comment);
            api.delete_comment(id).await?;
            Some(Mutation::Deleted(id))
        }
        Command::Upvote { comment, .. } => {
            let id = CommentId(comment);
            let tally = api.vote_comment(id, VoteType::Up).await?;
            Some(Mutation::Voted { id, tally })
        }
        Command::Downvote { comment, .. } => {
            let id = CommentId(comment);
            let tally = api.vote_comment(id, VoteType::Down).await?;
            Some(Mutation::Voted { id, tally })
        }
    };

    if let Some(m) = mutation {
        if let Mutation::Voted { tally, .. } = &m {
            if let Some(msg) = &tally.message {
                println!("{msg}");
            }
        }
        if !thread.apply(ticket, m) {
            tracing::warn!(%post, "response did not fit the thread, refetching");
            thread = load(&api, post).await?;
        }
    }

    print(&thread, opt.sort.unwrap_or(CommentOrder::Oldest));
    Ok(())
}
