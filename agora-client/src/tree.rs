//! Building and updating the reply tree of a post.
//!
//! All the functions here take a forest by reference and return a new one. Only
//! the nodes on the path from a root to the changed comment are copied, the rest
//! of the tree is shared with the input.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    api::{self, CommentId, VoteTally},
    Comment, Forest,
};

/// Nests a flat list of comments into a forest.
///
/// Each comment is attached to its parent, or becomes a root if it has none. A
/// comment whose parent is not in `comments` also becomes a root. Siblings keep
/// the order they had in `comments`.
pub fn build_tree(comments: Vec<Comment>) -> Forest {
    let index = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect::<HashMap<_, _>>();

    let mut children = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (i, c) in comments.iter().enumerate() {
        match c.parent_id {
            None => roots.push(i),
            Some(parent) => match index.get(&parent) {
                Some(&p) => children[p].push(i),
                None => {
                    tracing::warn!(
                        comment = %c.id,
                        parent = %parent,
                        "parent comment not found, attaching comment at root"
                    );
                    roots.push(i);
                }
            },
        }
    }

    // Pre-order walk from the roots, so that every node comes before its replies
    let mut visited = vec![false; comments.len()];
    let mut preorder = Vec::with_capacity(comments.len());
    for &r in &roots {
        visit(r, &children, &mut visited, &mut preorder);
    }
    // Only a cycle in the parent links can leave nodes unvisited. Going up from
    // an unvisited comment always ends on the cycle it hangs from.
    for i in 0..comments.len() {
        if visited[i] {
            continue;
        }
        let mut seen = HashSet::new();
        let mut on_cycle = i;
        while seen.insert(on_cycle) {
            match comments[on_cycle].parent_id.and_then(|p| index.get(&p)) {
                Some(&p) => on_cycle = p,
                None => break,
            }
        }
        tracing::warn!(
            comment = %comments[on_cycle].id,
            "comment is part of a reply cycle, attaching it at root"
        );
        if let Some(&p) = comments[on_cycle].parent_id.and_then(|p| index.get(&p)) {
            children[p].retain(|&c| c != on_cycle);
        }
        roots.push(on_cycle);
        visit(on_cycle, &children, &mut visited, &mut preorder);
    }

    // Assemble bottom-up: by the time a node is reached, its replies are built
    let mut slots = comments.into_iter().map(Some).collect::<Vec<_>>();
    for &i in preorder.iter().rev() {
        let replies = children[i]
            .iter()
            .filter_map(|&child| slots[child].take())
            .map(Arc::new)
            .collect::<Forest>();
        if let Some(node) = slots[i].as_mut() {
            node.replies = replies;
        }
    }
    let res = roots
        .into_iter()
        .filter_map(|r| slots[r].take())
        .map(Arc::new)
        .collect::<Forest>();
    tracing::debug!(roots = res.len(), total = len(&res), "built comment tree");
    res
}

fn visit(start: usize, children: &[Vec<usize>], visited: &mut [bool], out: &mut Vec<usize>) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        out.push(i);
        stack.extend(children[i].iter().rev().copied());
    }
}

/// Indices leading from the top of `forest` to the comment `target`
fn path_to(forest: &Forest, target: CommentId) -> Option<Vec<usize>> {
    let mut stack: Vec<(&Forest, usize)> = vec![(forest, 0)];
    while let Some(&(level, idx)) = stack.last() {
        match level.get(idx) {
            None => {
                stack.pop();
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
            }
            Some(c) if c.id == target => return Some(stack.iter().map(|&(_, i)| i).collect()),
            Some(c) if !c.replies.is_empty() => stack.push((&c.replies, 0)),
            Some(_) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
            }
        }
    }
    None
}

/// Replaces the comment `target` with `f(target)`, or drops it if `f` returns
/// `None`. The ancestors of `target` are copied, everything else is shared.
fn splice<F>(forest: &Forest, target: CommentId, f: F) -> Forest
where
    F: FnOnce(Comment) -> Option<Comment>,
{
    let path = match path_to(forest, target) {
        Some(path) => path,
        None => return forest.clone(),
    };

    // spine[k] is the node found by following path[..=k]
    let mut spine = Vec::with_capacity(path.len());
    let mut level = forest;
    for &i in &path {
        let node = match level.get(i) {
            Some(node) => node,
            None => unreachable!("path_to returned a path that does not exist"),
        };
        spine.push(node);
        level = &node.replies;
    }

    let mut replacement = spine.pop().map(|c| Comment::clone(c)).and_then(f);
    for (depth, ancestor) in spine.into_iter().enumerate().rev() {
        let mut ancestor = Comment::clone(ancestor);
        replace_at(&mut ancestor.replies, path[depth + 1], replacement);
        replacement = Some(ancestor);
    }
    let mut res = forest.clone();
    replace_at(&mut res, path[0], replacement);
    res
}

fn replace_at(level: &mut Forest, idx: usize, with: Option<Comment>) {
    match with {
        Some(c) => {
            level.set(idx, Arc::new(c));
        }
        None => {
            level.remove(idx);
        }
    }
}

/// Returns `forest` with the comment `target` replaced by `f(target)`.
///
/// `forest` is returned unchanged if `target` is not in it.
pub fn update_node<F>(forest: &Forest, target: CommentId, f: F) -> Forest
where
    F: FnOnce(Comment) -> Comment,
{
    splice(forest, target, |c| Some(f(c)))
}

/// Returns `forest` without the comment `target` and all its replies.
///
/// `forest` is returned unchanged if `target` is not in it.
pub fn remove_node(forest: &Forest, target: CommentId) -> Forest {
    splice(forest, target, |_| None)
}

/// Adds a newly created comment as the last reply of its parent, or as the last
/// root if it has no parent or the parent is not in `forest`.
pub fn attach_reply(forest: &Forest, reply: Comment) -> Forest {
    let parent = match reply.parent_id {
        None => {
            let mut res = forest.clone();
            res.push_back(Arc::new(reply));
            return res;
        }
        Some(parent) => parent,
    };
    if find(forest, parent).is_none() {
        tracing::warn!(
            comment = %reply.id,
            parent = %parent,
            "parent of new reply not found, attaching reply at root"
        );
        let mut res = forest.clone();
        res.push_back(Arc::new(reply));
        return res;
    }
    update_node(forest, parent, move |mut p| {
        p.replies.push_back(Arc::new(reply));
        p
    })
}

/// Applies the record the server returned after an edit. The replies and the
/// viewer's vote are kept, as the edit endpoint knows about neither.
pub fn apply_edit(forest: &Forest, edited: api::Comment) -> Forest {
    update_node(forest, edited.id, move |mut c| {
        c.content = edited.content;
        c.updated_at = edited.updated_at;
        c.upvotes = edited.upvotes;
        if let Some(downvotes) = edited.downvotes {
            c.downvotes = downvotes;
        }
        if let Some(vote) = edited.user_vote {
            c.user_vote = Some(vote);
        }
        c
    })
}

pub fn apply_vote(forest: &Forest, target: CommentId, tally: &VoteTally) -> Forest {
    update_node(forest, target, |mut c| {
        c.upvotes = tally.upvotes;
        c.downvotes = tally.downvotes;
        c.user_vote = tally.user_vote;
        c
    })
}

pub fn find(forest: &Forest, target: CommentId) -> Option<&Comment> {
    let mut stack = forest.iter().rev().map(|c| &**c).collect::<Vec<_>>();
    while let Some(c) = stack.pop() {
        if c.id == target {
            return Some(c);
        }
        stack.extend(c.replies.iter().rev().map(|r| &**r));
    }
    None
}

/// Number of comments in `forest`, at any depth
pub fn len(forest: &Forest) -> usize {
    let mut res = 0;
    let mut stack = forest.iter().collect::<Vec<_>>();
    while let Some(c) = stack.pop() {
        res += 1;
        stack.extend(c.replies.iter());
    }
    res
}

/// All the comments of `forest` in depth-first order, with their depth
pub fn walk(forest: &Forest) -> Vec<(usize, &Comment)> {
    let mut res = Vec::new();
    let mut stack = forest.iter().rev().map(|c| (0, &**c)).collect::<Vec<_>>();
    while let Some((depth, c)) = stack.pop() {
        res.push((depth, c));
        stack.extend(c.replies.iter().rev().map(|r| (depth + 1, &**r)));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::VoteType, comment::tests::node};

    fn ids(forest: &Forest) -> Vec<i64> {
        forest.iter().map(|c| c.id.0).collect()
    }

    fn get(forest: &Forest, id: i64) -> &Comment {
        find(forest, CommentId(id)).unwrap_or_else(|| panic!("comment {id} not in tree"))
    }

    fn example() -> Forest {
        build_tree(vec![
            node(1, None),
            node(2, Some(1)),
            node(3, Some(2)),
            node(4, Some(99)),
        ])
    }

    #[test]
    fn builds_example_scenario() {
        let t = example();
        assert_eq!(ids(&t), vec![1, 4]);
        assert_eq!(ids(&get(&t, 1).replies), vec![2]);
        assert_eq!(ids(&get(&t, 2).replies), vec![3]);
        assert!(get(&t, 3).replies.is_empty());
        assert!(get(&t, 4).replies.is_empty());
        assert_eq!(len(&t), 4);
    }

    #[test]
    fn removal_cascades() {
        let t = remove_node(&example(), CommentId(2));
        assert_eq!(ids(&t), vec![1, 4]);
        assert!(get(&t, 1).replies.is_empty());
        assert!(find(&t, CommentId(3)).is_none());
        assert_eq!(len(&t), 2);
    }

    #[test]
    fn siblings_keep_input_order() {
        let t = build_tree(vec![
            node(5, Some(1)),
            node(1, None),
            node(3, Some(1)),
            node(2, None),
            node(4, Some(1)),
        ]);
        assert_eq!(ids(&t), vec![1, 2]);
        assert_eq!(ids(&get(&t, 1).replies), vec![5, 3, 4]);
    }

    #[test]
    fn reply_before_parent_in_input() {
        let t = build_tree(vec![node(3, Some(2)), node(2, Some(1)), node(1, None)]);
        assert_eq!(ids(&t), vec![1]);
        assert_eq!(ids(&get(&t, 1).replies), vec![2]);
        assert_eq!(ids(&get(&t, 2).replies), vec![3]);
    }

    #[test]
    fn cycles_are_broken_at_root() {
        let t = build_tree(vec![
            node(1, None),
            node(2, Some(3)),
            node(3, Some(2)),
            node(4, Some(4)),
        ]);
        assert_eq!(ids(&t), vec![1, 2, 4]);
        assert_eq!(ids(&get(&t, 2).replies), vec![3]);
        assert!(get(&t, 3).replies.is_empty());
        assert!(get(&t, 4).replies.is_empty());
        assert_eq!(len(&t), 4);
    }

    #[test]
    fn reply_hanging_from_a_cycle_keeps_its_parent() {
        // 5 replies to 3, which is on the 2 <-> 3 cycle, and comes first
        let t = build_tree(vec![
            node(1, None),
            node(5, Some(3)),
            node(2, Some(3)),
            node(3, Some(2)),
        ]);
        assert_eq!(ids(&t), vec![1, 3]);
        assert_eq!(ids(&get(&t, 3).replies), vec![5, 2]);
        assert!(get(&t, 2).replies.is_empty());
        assert_eq!(len(&t), 4);
    }

    #[test]
    fn empty_input() {
        assert!(build_tree(Vec::new()).is_empty());
    }

    #[test]
    fn update_only_touches_target() {
        let t = build_tree(vec![
            node(1, None),
            node(2, Some(1)),
            node(3, Some(1)),
            node(4, Some(3)),
            node(5, None),
        ]);
        let u = update_node(&t, CommentId(4), |mut c| {
            c.content = String::from("edited");
            c
        });
        assert_eq!(get(&u, 4).content, "edited");
        assert_eq!(get(&t, 4).content, "comment 4");
        assert_eq!(get(&u, 2), get(&t, 2));
        assert_eq!(u[1], t[1]);
        assert_eq!(len(&u), 5);
    }

    #[test]
    fn missing_target_is_a_noop() {
        let t = example();
        assert_eq!(update_node(&t, CommentId(42), |_| node(42, None)), t);
        assert_eq!(remove_node(&t, CommentId(42)), t);
        assert_eq!(apply_vote(&t, CommentId(42), &VoteTally::new(1, 1, None)), t);
    }

    #[test]
    fn remove_root_and_leaf() {
        let t = remove_node(&example(), CommentId(4));
        assert_eq!(ids(&t), vec![1]);
        let t = remove_node(&example(), CommentId(3));
        assert!(get(&t, 2).replies.is_empty());
        let t = remove_node(&example(), CommentId(1));
        assert_eq!(ids(&t), vec![4]);
    }

    #[test]
    fn attach_reply_appends() {
        let t = attach_reply(&example(), node(5, Some(2)));
        assert_eq!(ids(&get(&t, 2).replies), vec![3, 5]);
        let t = attach_reply(&t, node(6, None));
        assert_eq!(ids(&t), vec![1, 4, 6]);
    }

    #[test]
    fn attach_reply_to_missing_parent_lands_at_root() {
        let t = attach_reply(&example(), node(7, Some(1234)));
        assert_eq!(ids(&t), vec![1, 4, 7]);
    }

    #[test]
    fn edit_keeps_replies_and_vote() {
        let t = update_node(&example(), CommentId(2), |mut c| {
            c.user_vote = Some(VoteType::Up);
            c.upvotes = 1;
            c
        });
        let mut edited = crate::comment::tests::record(2, Some(1));
        edited.content = String::from("new text");
        edited.updated_at = Some(edited.created_at + chrono::Duration::minutes(5));
        edited.upvotes = 1;
        edited.downvotes = None;
        let t = apply_edit(&t, edited.clone());
        let c = get(&t, 2);
        assert_eq!(c.content, "new text");
        assert_eq!(c.updated_at, edited.updated_at);
        assert_eq!(c.user_vote, Some(VoteType::Up));
        assert_eq!(ids(&c.replies), vec![3]);
    }

    #[test]
    fn vote_tally_is_applied() {
        let t = apply_vote(
            &example(),
            CommentId(3),
            &VoteTally::new(7, 2, Some(VoteType::Down)),
        );
        let c = get(&t, 3);
        assert_eq!((c.upvotes, c.downvotes, c.user_vote), (7, 2, Some(VoteType::Down)));
        assert_eq!(c.score(), 5);
    }

    #[test]
    fn walk_is_depth_first() {
        let t = attach_reply(&example(), node(5, Some(1)));
        assert_eq!(
            walk(&t)
                .into_iter()
                .map(|(d, c)| (d, c.id.0))
                .collect::<Vec<_>>(),
            vec![(0, 1), (1, 2), (2, 3), (1, 5), (0, 4)]
        );
        assert_eq!(get(&t, 1).descendant_count(), 3);
    }

    #[test]
    fn deep_chains_do_not_overflow() {
        const DEPTH: i64 = 10_000;
        let t = build_tree(deep_chain(DEPTH));
        assert_eq!(ids(&t), vec![0]);
        assert_eq!(len(&t), DEPTH as usize);

        let u = update_node(&t, CommentId(DEPTH - 1), |mut c| {
            c.content = String::from("bottom");
            c
        });
        assert_eq!(get(&u, DEPTH - 1).content, "bottom");

        let r = remove_node(&u, CommentId(DEPTH / 2));
        assert_eq!(len(&r), (DEPTH / 2) as usize);

        assert_eq!(build_tree(deep_chain(DEPTH)), t);
        assert_ne!(u, t);
        assert!(format!("{u:?}").contains("replies: [CommentId(1)]"));

        drop(t);
        drop(u);
        drop(r);
    }

    #[test]
    fn deep_nodes_kept_alive_elsewhere_survive_drops() {
        const DEPTH: i64 = 10_000;
        let t = build_tree(deep_chain(DEPTH));
        let middle = chain_node(&t, DEPTH / 2);
        drop(t);
        let rest = im::vector![middle];
        assert_eq!(len(&rest), (DEPTH / 2) as usize);
        assert!(find(&rest, CommentId(DEPTH - 1)).is_some());
    }

    fn deep_chain(depth: i64) -> Vec<Comment> {
        (0..depth)
            .map(|i| node(i, if i == 0 { None } else { Some(i - 1) }))
            .collect()
    }

    // The shared node at `depth` in a single chain
    fn chain_node(forest: &Forest, depth: i64) -> Arc<Comment> {
        let mut node = Arc::clone(&forest[0]);
        for _ in 0..depth {
            let next = Arc::clone(&node.replies[0]);
            node = next;
        }
        node
    }

    // Flat inputs over a small id space, so that parents often resolve
    fn gen_comments(input: &[(u8, Option<u8>)]) -> Vec<Comment> {
        let mut seen = HashSet::new();
        input
            .iter()
            .map(|(id, parent)| node(i64::from(id % 64), parent.map(|p| i64::from(p % 64))))
            .filter(|c| seen.insert(c.id))
            .collect()
    }

    fn parent_in_tree(forest: &Forest) -> HashMap<CommentId, Option<CommentId>> {
        let mut res = HashMap::new();
        let mut stack = forest.iter().map(|c| (None, c)).collect::<Vec<_>>();
        while let Some((parent, c)) = stack.pop() {
            assert!(res.insert(c.id, parent).is_none(), "duplicate {:?}", c.id);
            stack.extend(c.replies.iter().map(|r| (Some(c.id), r)));
        }
        res
    }

    #[test]
    fn fuzz_build_tree() {
        bolero::check!()
            .with_type::<Vec<(u8, Option<u8>)>>()
            .cloned()
            .for_each(|input| {
                let comments = gen_comments(&input);
                let input_ids = comments.iter().map(|c| c.id).collect::<HashSet<_>>();
                let t = build_tree(comments.clone());

                // Completeness, no duplicates
                let placed = parent_in_tree(&t);
                assert_eq!(placed.len(), comments.len());
                assert_eq!(placed.keys().copied().collect::<HashSet<_>>(), input_ids);

                // Parent resolution and orphan fallback
                for c in &comments {
                    match c.parent_id {
                        Some(p) if input_ids.contains(&p) && placed[&c.id].is_none() => {
                            // only cycle-breaking may put a resolvable comment at root
                            assert!(t.iter().any(|r| r.id == c.id));
                        }
                        Some(p) if input_ids.contains(&p) => {
                            assert_eq!(placed[&c.id], Some(p))
                        }
                        _ => assert_eq!(placed[&c.id], None),
                    }
                }

                // Sibling order follows input order
                let position = comments
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.id, i))
                    .collect::<HashMap<_, _>>();
                for (_, c) in walk(&t) {
                    let pos = c.replies.iter().map(|r| position[&r.id]).collect::<Vec<_>>();
                    assert!(pos.windows(2).all(|w| w[0] < w[1]));
                }

                // Idempotent rebuild
                assert_eq!(build_tree(comments), t);
            });
    }

    #[test]
    fn fuzz_remove_node() {
        bolero::check!()
            .with_type::<(Vec<(u8, Option<u8>)>, u8)>()
            .cloned()
            .for_each(|(input, target)| {
                let comments = gen_comments(&input);
                let t = build_tree(comments);
                let target = CommentId(i64::from(target % 64));
                let removed = match find(&t, target) {
                    None => HashSet::new(),
                    Some(c) => walk(&im::vector![Arc::new(c.clone())])
                        .into_iter()
                        .map(|(_, c)| c.id)
                        .collect::<HashSet<_>>(),
                };
                let r = remove_node(&t, target);
                let before = parent_in_tree(&t);
                let after = parent_in_tree(&r);
                assert_eq!(after.len(), before.len() - removed.len());
                for (id, parent) in before {
                    if removed.contains(&id) {
                        assert!(!after.contains_key(&id));
                    } else {
                        assert_eq!(after.get(&id), Some(&parent));
                    }
                }
            });
    }

    #[test]
    fn fuzz_update_node_locality() {
        bolero::check!()
            .with_type::<(Vec<(u8, Option<u8>)>, u8)>()
            .cloned()
            .for_each(|(input, target)| {
                let comments = gen_comments(&input);
                let t = build_tree(comments);
                let target = CommentId(i64::from(target % 64));
                let u = update_node(&t, target, |mut c| {
                    c.content.push_str(" (edited)");
                    c
                });
                let before = walk(&t);
                let after = walk(&u);
                assert_eq!(before.len(), after.len());
                for ((db, b), (da, a)) in before.into_iter().zip(after.into_iter()) {
                    assert_eq!(db, da);
                    assert_eq!(b.id, a.id);
                    if b.id == target {
                        assert_eq!(a.content, format!("{} (edited)", b.content));
                    } else {
                        assert_eq!(a.content, b.content);
                        assert_eq!(a.user_vote, b.user_vote);
                    }
                }
            });
    }
}
