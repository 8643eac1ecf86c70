mod comment;
pub use comment::{Comment, Forest};

mod order;
pub use order::OrderExt;

mod thread;
pub use thread::{Mutation, Thread, Ticket};

pub mod tree;

mod vote;
pub use vote::overlay_votes;

pub mod api {
    pub use agora_api::*;
}

pub mod prelude {
    pub use crate::OrderExt;
}
