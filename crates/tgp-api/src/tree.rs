//! Assembles a flat comment list into the two-level shape the portal
//! renders: roots in encounter order, each carrying its replies.

use std::collections::HashMap;

use tgp_types::models::{Comment, CommentThread};

/// Group a flat, ordered comment list into threads.
///
/// Every input comment lands in exactly one place: roots anchor a thread,
/// replies attach to their nearest root ancestor. A reply whose parent is
/// absent from the list is promoted to a root rather than dropped.
pub fn build_tree(flat: Vec<Comment>) -> Vec<CommentThread> {
    let parents: HashMap<i64, Option<i64>> =
        flat.iter().map(|c| (c.id, c.parent_id)).collect();

    let mut threads: Vec<CommentThread> = Vec::new();
    let mut root_index: HashMap<i64, usize> = HashMap::new();

    for comment in flat {
        let attach_to = root_ancestor(&parents, &comment)
            .and_then(|root_id| root_index.get(&root_id).copied());

        match attach_to {
            Some(i) => threads[i].replies.push(comment),
            None => {
                root_index.insert(comment.id, threads.len());
                threads.push(CommentThread {
                    root: comment,
                    replies: Vec::new(),
                });
            }
        }
    }

    threads
}

/// Follow parent links to the nearest ancestor that anchors a thread.
/// Returns `None` when the comment is a root or its parent is missing from
/// the list. The hop count is bounded by the list length so cyclic data
/// cannot spin forever.
fn root_ancestor(parents: &HashMap<i64, Option<i64>>, comment: &Comment) -> Option<i64> {
    let mut current = comment.parent_id?;
    if !parents.contains_key(&current) {
        return None;
    }

    for _ in 0..parents.len() {
        match parents.get(&current).copied().flatten() {
            None => return Some(current),
            Some(next) if !parents.contains_key(&next) => return Some(current),
            Some(next) => current = next,
        }
    }

    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            application_id: 1,
            user_id: 10,
            user_name: "Ada".into(),
            parent_id,
            comment_text: format!("comment {id}"),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, id as u32).unwrap(),
        }
    }

    fn total(threads: &[CommentThread]) -> usize {
        threads.iter().map(|t| 1 + t.replies.len()).sum()
    }

    #[test]
    fn root_and_reply_group_together() {
        let threads = build_tree(vec![comment(1, None), comment(2, Some(1))]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].root.id, 1);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[0].replies[0].id, 2);
    }

    #[test]
    fn every_comment_appears_exactly_once() {
        let flat = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(1)),
            comment(4, None),
            comment(5, Some(4)),
        ];
        let n = flat.len();
        let threads = build_tree(flat);

        assert_eq!(total(&threads), n);

        let mut seen: Vec<i64> = threads
            .iter()
            .flat_map(|t| std::iter::once(t.root.id).chain(t.replies.iter().map(|r| r.id)))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), n, "no comment may appear in two groups");
    }

    #[test]
    fn orphan_reply_becomes_a_root() {
        let threads = build_tree(vec![comment(7, Some(99))]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].root.id, 7);
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn deep_chain_flattens_under_nearest_root() {
        // 1 <- 2 <- 3: legacy data deeper than the portal stores today.
        let threads = build_tree(vec![comment(1, None), comment(2, Some(1)), comment(3, Some(2))]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn roots_keep_their_incoming_order() {
        let threads = build_tree(vec![
            comment(3, None),
            comment(1, None),
            comment(2, Some(3)),
        ]);
        assert_eq!(threads.iter().map(|t| t.root.id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(threads[0].replies[0].id, 2);
    }

    #[test]
    fn cyclic_parents_terminate() {
        // Corrupt data: 1 and 2 point at each other.
        let threads = build_tree(vec![comment(1, Some(2)), comment(2, Some(1))]);
        assert_eq!(total(&threads), 2);
    }

    #[test]
    fn empty_input_yields_no_threads() {
        assert!(build_tree(Vec::new()).is_empty());
    }
}
