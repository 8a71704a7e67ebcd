//! Shared query parameter types for API handlers.

use quill_core::comment_tree::{CommentSort, SortField, SortOrder};
use quill_core::pagination::FIRST_PAGE;
use serde::Deserialize;

/// `?sort_by=&order=&page=` on a comment thread.
///
/// Unknown `sort_by`/`order` values fail deserialization, which the `Query`
/// extractor turns into a 400.
#[derive(Debug, Default, Deserialize)]
pub struct CommentListParams {
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
    pub page: Option<u32>,
}

impl CommentListParams {
    pub fn sort(&self) -> CommentSort {
        let default = CommentSort::default();
        CommentSort {
            field: self.sort_by.unwrap_or(default.field),
            order: self.order.unwrap_or(default.order),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(FIRST_PAGE)
    }
}
