use agora_api::{Comment, CommentId, PostId, UserId, VoteType};
use chrono::{Duration, TimeZone, Utc};
use rand::{seq::SliceRandom, Rng};

const USERS: &[&str] = &["alice", "bob", "chandra", "dmitri", "eun-ji"];
const NUM_POSTS: i64 = 3;
const NUM_COMMENTS: usize = 200;

// Probability that a comment is a reply rather than a top-level comment
const REPLY_RATIO: f64 = 0.7;
// Probability that a reply points to a comment absent from the dump
const ORPHAN_RATIO: f64 = 0.02;

const COMMENT_MIN_WORDS: usize = 3;
const COMMENT_MAX_WORDS: usize = 40;

fn gen_comment_text(rng: &mut impl Rng) -> String {
    let words = rng.gen_range(COMMENT_MIN_WORDS..=COMMENT_MAX_WORDS);
    let mut res = lipsum::lipsum_words(words);
    if rng.gen_bool(0.2) {
        res.push_str("\n\n");
        res.push_str(&lipsum::lipsum(words));
    }
    res
}

fn gen_vote(rng: &mut impl Rng) -> Option<VoteType> {
    match rng.gen_range(0..4) {
        0 => Some(VoteType::Up),
        1 => Some(VoteType::Down),
        _ => None,
    }
}

/// Prints a JSON array of flat comments spread over a few posts, shaped like
/// what the comment-fetching endpoint returns
fn main() {
    let mut rng = rand::thread_rng();
    let users = USERS
        .iter()
        .enumerate()
        .map(|(i, name)| (UserId(i as i64 + 1), String::from(*name)))
        .collect::<Vec<_>>();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

    let mut comments: Vec<Comment> = Vec::with_capacity(NUM_COMMENTS);
    for i in 0..NUM_COMMENTS {
        let id = CommentId(i as i64 + 1);
        let post_id = PostId(rng.gen_range(1..=NUM_POSTS));
        let (author_id, author) = users.choose(&mut rng).unwrap().clone();
        let created_at = start + Duration::minutes(i as i64 * 7 + rng.gen_range(0..7));

        // Only reply to earlier comments of the same post, so that the dump is
        // a valid forest apart from the deliberate orphans
        let parent_id = if rng.gen_bool(ORPHAN_RATIO) {
            Some(CommentId(NUM_COMMENTS as i64 + 1 + i as i64))
        } else if rng.gen_bool(REPLY_RATIO) {
            let siblings = comments
                .iter()
                .filter(|c| c.post_id == post_id)
                .collect::<Vec<_>>();
            siblings.choose(&mut rng).map(|c| c.id)
        } else {
            None
        };
        let updated_at = match rng.gen_bool(0.1) {
            true => Some(created_at + Duration::minutes(rng.gen_range(1..600))),
            false => None,
        };

        comments.push(Comment {
            id,
            post_id,
            author_id,
            author,
            content: gen_comment_text(&mut rng),
            created_at,
            updated_at,
            upvotes: rng.gen_range(0..20),
            downvotes: match rng.gen_bool(0.9) {
                true => Some(rng.gen_range(0..10)),
                false => None,
            },
            parent_id,
            user_vote: gen_vote(&mut rng),
        });
    }

    // Shuffle so that replies sometimes come before their parent
    comments.shuffle(&mut rng);
    println!(
        "{}",
        serde_json::to_string_pretty(&comments).expect("serializing comments")
    );
}
