//! Wire shapes of the search endpoint

use serde::{Deserialize, Serialize};

use super::product::ProductRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub user_id: i64,
    pub offset: usize,
    pub limit: usize,
}

/// One page of search results
///
/// A missing `has_more` flag means there is nothing more to fetch. The page
/// length is never compared against the requested limit to guess otherwise.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default, alias = "hasMore")]
    pub has_more: bool,
}

impl SearchPage {
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
