use bolero::generator::TypeGenerator;
use std::str::FromStr;

use anyhow::anyhow;

/// How sibling comments are ordered for display
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
pub enum CommentOrder {
    Oldest,
    Newest,
    Top,
}

impl FromStr for CommentOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<CommentOrder> {
        match s {
            "oldest" | "old" => Ok(CommentOrder::Oldest),
            "newest" | "new" => Ok(CommentOrder::Newest),
            "top" => Ok(CommentOrder::Top),
            _ => Err(anyhow!(
                "unknown comment order {s:?}, expected one of oldest, newest, top"
            )),
        }
    }
}
