//! Article listing filter

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default page size for article listings.
pub const DEFAULT_ARTICLE_LIMIT: u32 = 20;
/// Upper bound on article listing page size.
pub const MAX_ARTICLE_LIMIT: u32 = 100;

/// Longest accepted article id.
pub const MAX_ARTICLE_ID_LEN: usize = 128;

/// Check that `id` is usable as a single upstream path segment.
///
/// Ids are trimmed; the result must be non-empty, at most
/// [`MAX_ARTICLE_ID_LEN`] bytes and made of ASCII letters, digits, `-`, `_`
/// and `.`, and must not be a dot segment (`.` or `..`).
pub fn validate_article_id(id: &str) -> crate::Result<&str> {
    let id = id.trim();
    let well_formed = !id.is_empty()
        && id.len() <= MAX_ARTICLE_ID_LEN
        && id != "."
        && id != ".."
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if well_formed {
        Ok(id)
    } else {
        Err(crate::HuginError::InvalidInput(format!(
            "invalid article id: {id:?}"
        )))
    }
}

/// Filter and pagination for an article listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            ticker: None,
            category: None,
            page: 1,
            limit: DEFAULT_ARTICLE_LIMIT,
        }
    }
}

impl ArticleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Clamp pagination into range and canonicalise the ticker.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_ARTICLE_LIMIT);
        self.ticker = self
            .ticker
            .map(|t| t.trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty());
        self.category = self
            .category
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty());
        self
    }

    /// Key-deriver parameters. Absent fields are omitted.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(ref ticker) = self.ticker {
            params.insert("ticker".to_string(), ticker.clone());
        }
        if let Some(ref category) = self.category {
            params.insert("category".to_string(), category.clone());
        }
        params.insert("page".to_string(), self.page.to_string());
        params.insert("limit".to_string(), self.limit.to_string());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_id_must_be_one_plain_segment() {
        assert_eq!(validate_article_id(" a-17 ").unwrap(), "a-17");
        assert_eq!(validate_article_id("v1.2_x").unwrap(), "v1.2_x");
        for bad in ["", "  ", ".", "..", "a/b", "?page=1", "a%2F", "é"] {
            assert!(validate_article_id(bad).is_err(), "{bad:?}");
        }
        assert!(validate_article_id(&"a".repeat(MAX_ARTICLE_ID_LEN + 1)).is_err());
    }

    #[test]
    fn normalized_clamps_pagination() {
        let filter = ArticleFilter::new().page(0).limit(10_000).normalized();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_ARTICLE_LIMIT);
    }

    #[test]
    fn normalized_drops_blank_fields() {
        let filter = ArticleFilter::new().ticker("  ").category("").normalized();
        assert!(filter.ticker.is_none());
        assert!(filter.category.is_none());
    }

    #[test]
    fn params_include_only_present_fields() {
        let params = ArticleFilter::new().ticker(" aapl ").normalized().params();
        assert_eq!(params.get("ticker").map(String::as_str), Some("AAPL"));
        assert!(!params.contains_key("category"));
        assert_eq!(params.get("page").map(String::as_str), Some("1"));
        assert_eq!(params.get("limit").map(String::as_str), Some("20"));
    }
}
