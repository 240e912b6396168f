//! Page envelope parsing
//!
//! List and search endpoints answer with
//! `{results: [...], paging: {next: {after: "<cursor>"}}, total?}`.

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    pub results: Vec<Value>,
    /// Cursor for the next page; absent on the last page
    pub next_after: Option<String>,
    /// Only search endpoints report a total
    pub total: Option<u64>,
}

impl PageResponse {
    /// Parse a page, reading results from `results_field`. A missing results
    /// array is an empty page rather than an error.
    pub fn from_json(json: &Value, results_field: &str) -> Self {
        let results = json
            .get(results_field)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let next_after = json
            .pointer("/paging/next/after")
            .and_then(|after| match after {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        let total = json.get("total").and_then(|t| t.as_u64());

        Self {
            results,
            next_after,
            total,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_after.is_some()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_with_cursor_and_total() {
        let json = json!({
            "total": 42,
            "results": [{"id": "1"}, {"id": "2"}],
            "paging": {"next": {"after": "2", "link": "https://api.hubapi.com/..."}}
        });

        let page = PageResponse::from_json(&json, "results");

        assert_eq!(page.len(), 2);
        assert_eq!(page.next_after.as_deref(), Some("2"));
        assert_eq!(page.total, Some(42));
        assert!(page.has_more());
    }

    #[test]
    fn test_last_page() {
        let page = PageResponse::from_json(&json!({"results": [{"id": "3"}], "paging": {}}), "results");
        assert!(!page.has_more());
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_missing_results_is_empty_page() {
        let page = PageResponse::from_json(&json!({"status": "COMPLETE"}), "results");
        assert!(page.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_numeric_cursor_and_custom_field() {
        let page = PageResponse::from_json(&json!({"items": [1, 2, 3], "paging": {"next": {"after": 30}}}), "items");
        assert_eq!(page.len(), 3);
        assert_eq!(page.next_after.as_deref(), Some("30"));
    }
}
