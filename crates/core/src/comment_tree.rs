//! Flat comment list -> nested reply tree, paginated at the root level.
//!
//! The tree is assembled without recursion: one pass maps every comment to
//! its parent's arena index, an explicit stack produces a pre-order, and
//! nodes are then built leaves-first by walking that order backwards. A
//! reply whose parent is not in the input is displayed as a root.
//!
//! Serialization is iterative as well: a node renders its subtree to JSON
//! text with an explicit stack and hands the result over as a raw value.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::pagination::{paginate, Page, COMMENT_PAGE_SIZE, FIRST_PAGE};
use crate::types::{DbId, Timestamp};

/// What the tree builder needs to know about a stored comment.
pub trait ThreadedComment {
    fn id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
    fn user_name(&self) -> &str;
    fn email(&self) -> &str;
    fn created_at(&self) -> Timestamp;
}

/// Field the flat collection is sorted by before assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    UserName,
    Email,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort specification; the default is newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl CommentSort {
    fn compare<T: ThreadedComment>(&self, a: &T, b: &T) -> Ordering {
        let ordering = match self.field {
            SortField::UserName => a.user_name().cmp(b.user_name()),
            SortField::Email => a.email().cmp(b.email()),
            SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// A comment with its replies nested beneath it.
///
/// Serializes as the comment's own fields plus a `children` array.
#[derive(Debug)]
pub struct CommentNode<T> {
    pub comment: T,
    pub children: Vec<CommentNode<T>>,
}

impl<T> CommentNode<T> {
    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

// Deep reply chains would otherwise overflow the stack in the default
// recursive drop glue.
impl<T> Drop for CommentNode<T> {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

enum JsonStep<'a, T> {
    Open(&'a CommentNode<T>),
    Comma,
    Close,
}

impl<T: Serialize> CommentNode<T> {
    /// Render this subtree as JSON text without recursing per level.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        let mut stack = vec![JsonStep::Open(self)];

        while let Some(step) = stack.pop() {
            match step {
                JsonStep::Open(node) => {
                    let fields = serde_json::to_string(&node.comment)?;
                    let body = fields
                        .strip_prefix('{')
                        .and_then(|f| f.strip_suffix('}'))
                        .ok_or_else(|| {
                            serde_json::Error::custom("comment must serialize to a JSON object")
                        })?;
                    out.push('{');
                    out.push_str(body);
                    if !body.is_empty() {
                        out.push(',');
                    }
                    out.push_str("\"children\":[");

                    stack.push(JsonStep::Close);
                    for (i, child) in node.children.iter().enumerate().rev() {
                        stack.push(JsonStep::Open(child));
                        if i > 0 {
                            stack.push(JsonStep::Comma);
                        }
                    }
                }
                JsonStep::Comma => out.push(','),
                JsonStep::Close => out.push_str("]}"),
            }
        }
        Ok(out)
    }
}

impl<T: Serialize> Serialize for CommentNode<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let json = self.to_json_string().map_err(S::Error::custom)?;
        let raw = RawValue::from_string(json).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

/// Sort, assemble and paginate comments for display.
///
/// `page` is 1-based; out-of-range pages are empty. Only root nodes count
/// towards pagination, and every visible root carries its full subtree.
pub fn build_tree<T: ThreadedComment>(
    mut comments: Vec<T>,
    sort: CommentSort,
    page: u32,
) -> Page<CommentNode<T>> {
    // `sort_by` is stable, so ties keep input (id) order.
    comments.sort_by(|a, b| sort.compare(a, b));
    let roots = assemble(comments);
    paginate(roots, page, COMMENT_PAGE_SIZE)
}

/// [`build_tree`] with the default sort, first page.
pub fn build_tree_default<T: ThreadedComment>(comments: Vec<T>) -> Page<CommentNode<T>> {
    build_tree(comments, CommentSort::default(), FIRST_PAGE)
}

/// Nest `comments` (already in display order) into root nodes.
///
/// Children keep the relative order they had in the input.
pub fn assemble<T: ThreadedComment>(comments: Vec<T>) -> Vec<CommentNode<T>> {
    let n = comments.len();
    let index_of: HashMap<DbId, usize> = comments
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.id(), idx))
        .collect();

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    for (idx, comment) in comments.iter().enumerate() {
        match comment.parent_id().and_then(|p| index_of.get(&p).copied()) {
            Some(parent) if parent != idx => children_of[parent].push(idx),
            _ => roots.push(idx),
        }
    }

    // Pre-order from the real roots, then from anything left unvisited
    // (members of a parent cycle), which become roots themselves.
    let mut visited = vec![false; n];
    let mut preorder: Vec<usize> = Vec::with_capacity(n);
    let mut stack: Vec<usize> = Vec::new();
    let start_from = |start: usize,
                          visited: &mut Vec<bool>,
                          preorder: &mut Vec<usize>,
                          stack: &mut Vec<usize>| {
        stack.push(start);
        while let Some(idx) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            preorder.push(idx);
            stack.extend(children_of[idx].iter().rev().filter(|c| !visited[**c]));
        }
    };

    for &root in &roots {
        start_from(root, &mut visited, &mut preorder, &mut stack);
    }
    for idx in 0..n {
        if !visited[idx] {
            roots.push(idx);
            start_from(idx, &mut visited, &mut preorder, &mut stack);
        }
    }

    let mut items: Vec<Option<T>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode<T>>> = (0..n).map(|_| None).collect();

    for &idx in preorder.iter().rev() {
        let children = children_of[idx]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(comment) = items[idx].take() {
            built[idx] = Some(CommentNode { comment, children });
        }
    }

    roots
        .into_iter()
        .filter_map(|idx| built[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Row {
        id: DbId,
        parent: Option<DbId>,
        name: String,
        email: String,
        at: Timestamp,
    }

    impl ThreadedComment for Row {
        fn id(&self) -> DbId {
            self.id
        }
        fn parent_id(&self) -> Option<DbId> {
            self.parent
        }
        fn user_name(&self) -> &str {
            &self.name
        }
        fn email(&self) -> &str {
            &self.email
        }
        fn created_at(&self) -> Timestamp {
            self.at
        }
    }

    fn row(id: DbId, parent: Option<DbId>) -> Row {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Row {
            id,
            parent,
            name: format!("user{id}"),
            email: format!("u{id}@example.com"),
            at: base + Duration::minutes(id),
        }
    }

    fn ids<T: ThreadedComment>(nodes: &[CommentNode<T>]) -> Vec<DbId> {
        nodes.iter().map(|n| n.comment.id()).collect()
    }

    /// (id, parent id as seen in the tree) for every node.
    fn placements<T: ThreadedComment>(roots: &[CommentNode<T>]) -> Vec<(DbId, Option<DbId>)> {
        let mut out = Vec::new();
        let mut stack: Vec<(&CommentNode<T>, Option<DbId>)> =
            roots.iter().map(|r| (r, None)).collect();
        while let Some((node, parent)) = stack.pop() {
            out.push((node.comment.id(), parent));
            stack.extend(node.children.iter().map(|c| (c, Some(node.comment.id()))));
        }
        out.sort();
        out
    }

    #[test]
    fn replies_nest_under_their_parents() {
        let comments = vec![
            row(1, None),
            row(2, Some(1)),
            row(3, Some(2)),
            row(4, None),
            row(5, Some(1)),
        ];
        let roots = assemble(comments);

        assert_eq!(ids(&roots), vec![1, 4]);
        assert_eq!(ids(&roots[0].children), vec![2, 5]);
        assert_eq!(ids(&roots[0].children[0].children), vec![3]);
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn every_reply_appears_once_under_its_parent() {
        let mut comments: Vec<Row> = (1..=200)
            .map(|id| {
                let parent = if id % 3 == 0 || id == 1 { None } else { Some(id / 2) };
                row(id, parent)
            })
            .collect();
        comments.reverse();
        let expected: Vec<(DbId, Option<DbId>)> = {
            let mut v: Vec<_> = comments.iter().map(|c| (c.id, c.parent)).collect();
            v.sort();
            v
        };

        let roots = assemble(comments);
        assert_eq!(placements(&roots), expected);
        assert_eq!(roots.iter().map(CommentNode::subtree_len).sum::<usize>(), 200);
    }

    #[test]
    fn orphaned_reply_becomes_root() {
        let roots = assemble(vec![row(1, None), row(7, Some(99))]);
        assert_eq!(ids(&roots), vec![1, 7]);
    }

    #[test]
    fn parent_cycle_does_not_lose_nodes() {
        let roots = assemble(vec![row(1, Some(2)), row(2, Some(1)), row(3, Some(3))]);
        let total: usize = roots.iter().map(CommentNode::subtree_len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn deep_chain_builds_and_drops_without_recursion() {
        let depth = 100_000;
        let comments: Vec<Row> = (1..=depth)
            .map(|id| row(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();

        let page = build_tree_default(comments);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].subtree_len(), depth as usize);
    }

    #[test]
    fn deep_chain_serializes_without_recursion() {
        let depth = 100_000;
        let comments: Vec<Row> = (1..=depth)
            .map(|id| row(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();
        let page = build_tree_default(comments);

        // Run on a thread with the tokio worker's default stack size.
        let bytes = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || serde_json::to_vec(&page.items).unwrap())
            .unwrap()
            .join()
            .unwrap();

        assert!(bytes.starts_with(br#"[{"id":1,"#));
        let closing = b"]}".repeat(depth as usize);
        assert!(bytes[..bytes.len() - 1].ends_with(&closing));
        assert_eq!(bytes.iter().filter(|b| **b == b'{').count(), depth as usize);
    }

    #[test]
    fn default_sort_is_newest_first_including_children() {
        let comments = vec![row(1, None), row(2, Some(1)), row(3, None), row(4, Some(1))];
        let page = build_tree_default(comments);

        assert_eq!(ids(&page.items), vec![3, 1]);
        assert_eq!(ids(&page.items[1].children), vec![4, 2]);
    }

    #[test]
    fn sort_by_user_name_ascending_is_stable() {
        let mut a = row(1, None);
        a.name = "bob".into();
        let mut b = row(2, None);
        b.name = "alice".into();
        let mut c = row(3, None);
        c.name = "bob".into();

        let sort = CommentSort {
            field: SortField::UserName,
            order: SortOrder::Asc,
        };
        let page = build_tree(vec![a, b, c], sort, 1);
        assert_eq!(ids(&page.items), vec![2, 1, 3]);
    }

    #[test]
    fn sort_by_email_descending() {
        let sort = CommentSort {
            field: SortField::Email,
            order: SortOrder::Desc,
        };
        let page = build_tree(vec![row(1, None), row(2, None), row(3, None)], sort, 1);
        assert_eq!(ids(&page.items), vec![3, 2, 1]);
    }

    #[test]
    fn pagination_counts_roots_only() {
        let mut comments: Vec<Row> = (1..=60).map(|id| row(id, None)).collect();
        comments.extend((61..=160).map(|id| row(id, Some(1))));

        let sort = CommentSort {
            field: SortField::CreatedAt,
            order: SortOrder::Asc,
        };
        let first = build_tree(comments.clone(), sort, 1);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), 25);
        assert_eq!(first.items[0].children.len(), 100);

        let third = build_tree(comments.clone(), sort, 3);
        assert_eq!(ids(&third.items), (51..=60).collect::<Vec<_>>());

        let beyond = build_tree(comments, sort, 4);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[test]
    fn empty_input_has_no_pages() {
        let page = build_tree_default(Vec::<Row>::new());
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn node_serializes_flat_with_children() {
        let roots = assemble(vec![row(1, None), row(2, Some(1))]);
        let json = serde_json::to_value(&roots[0]).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["children"][0]["id"], 2);
        assert_eq!(json["children"][0]["children"], serde_json::json!([]));
    }

    #[test]
    fn json_text_matches_nested_layout() {
        let roots = assemble(vec![row(1, None), row(2, Some(1)), row(3, Some(1))]);
        let text = roots[0].to_json_string().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["children"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["children"][1]["id"], 3);
        assert_eq!(parsed["name"], "user1");
    }

    #[test]
    fn non_object_comment_is_a_serialization_error() {
        let node = CommentNode {
            comment: 7_i64,
            children: Vec::new(),
        };
        assert!(node.to_json_string().is_err());
        assert!(serde_json::to_string(&node).is_err());
    }

    #[test]
    fn sort_params_deserialize_from_snake_case() {
        let field: SortField = serde_json::from_str("\"user_name\"").unwrap();
        assert_eq!(field, SortField::UserName);
        let order: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(order, SortOrder::Asc);
        assert!(serde_json::from_str::<SortField>("\"User_Name\"").is_err());
    }
}
