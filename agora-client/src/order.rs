use std::{cmp::Ordering, sync::Arc};

use crate::{api::CommentOrder, tree, Comment, Forest};

pub trait OrderExt {
    fn compare(&self, a: &Comment, b: &Comment) -> Ordering;

    /// Returns `forest` with every list of siblings sorted, at any depth
    fn sort(&self, forest: &Forest) -> Forest;
}

impl OrderExt for CommentOrder {
    fn compare(&self, a: &Comment, b: &Comment) -> Ordering {
        let res = match self {
            CommentOrder::Oldest => a.created_at.cmp(&b.created_at),
            CommentOrder::Newest => b.created_at.cmp(&a.created_at),
            CommentOrder::Top => b
                .score()
                .cmp(&a.score())
                .then_with(|| b.created_at.cmp(&a.created_at)),
        };
        res.then_with(|| a.id.cmp(&b.id))
    }

    fn sort(&self, forest: &Forest) -> Forest {
        // Flatten in pre-order, remembering who is whose child
        let flat = tree::walk(forest);
        let mut nodes = Vec::with_capacity(flat.len());
        let mut children = vec![Vec::new(); flat.len()];
        let mut roots = Vec::new();
        let mut ancestors: Vec<usize> = Vec::new();
        for (i, (depth, c)) in flat.into_iter().enumerate() {
            ancestors.truncate(depth);
            match ancestors.last() {
                None => roots.push(i),
                Some(&parent) => children[parent].push(i),
            }
            ancestors.push(i);
            let mut c = c.clone();
            c.replies = Forest::new();
            nodes.push(c);
        }

        let cmp = |a: &usize, b: &usize| self.compare(&nodes[*a], &nodes[*b]);
        roots.sort_by(cmp);
        for siblings in children.iter_mut() {
            siblings.sort_by(cmp);
        }

        // Children always come after their parent in pre-order
        let mut slots = nodes.into_iter().map(Some).collect::<Vec<_>>();
        for i in (0..slots.len()).rev() {
            let replies = children[i]
                .iter()
                .filter_map(|&child| slots[child].take())
                .map(Arc::new)
                .collect::<Forest>();
            if let Some(node) = slots[i].as_mut() {
                node.replies = replies;
            }
        }
        roots
            .into_iter()
            .filter_map(|r| slots[r].take())
            .map(Arc::new)
            .collect()
    }
}
