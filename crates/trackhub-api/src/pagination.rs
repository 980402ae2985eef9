use serde::Deserialize;

/// Relay-style page metadata returned by every paginated listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    /// Opaque cursor identifying the position after the last record of
    /// this page.
    pub end_cursor: Option<String>,
}
