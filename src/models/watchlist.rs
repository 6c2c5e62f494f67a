use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WatchlistItem — One tracked ticker within a watchlist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub item_id: i64,
    pub ticker: String,
    pub subcategory: Option<String>,
}

impl WatchlistItem {
    pub fn new(item_id: i64, ticker: &str, subcategory: Option<&str>) -> Self {
        Self {
            item_id,
            ticker: ticker.to_string(),
            subcategory: subcategory.map(|s| s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Watchlist — Watchlist header row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: i64,
    pub title: String,
    pub intro: Option<String>,
    pub default_sort: Option<String>,
    /// Stored as 0 / 1.
    #[serde(default)]
    pub group_by_subcategory: i64,
}

impl Watchlist {
    pub fn groups_by_subcategory(&self) -> bool {
        self.group_by_subcategory != 0
    }
}

// ---------------------------------------------------------------------------
// WatchlistPayload — Watchlist with its items in saved order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistPayload {
    #[serde(flatten)]
    pub watchlist: Watchlist,
    pub items: Vec<WatchlistItem>,
}

// ---------------------------------------------------------------------------
// NewWatchlist / WatchlistUpdate — Write payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWatchlist {
    pub title: String,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub default_sort: Option<String>,
    #[serde(default)]
    pub group_by_subcategory: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchlistUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub default_sort: Option<String>,
    #[serde(default)]
    pub group_by_subcategory: Option<bool>,
}

impl WatchlistUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.intro.is_none()
            && self.default_sort.is_none()
            && self.group_by_subcategory.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

// ---------------------------------------------------------------------------
// Comment — Free-text note attached to a watchlist item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub box_index: i64,
    pub text: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// SortedWatchlist — Watchlist resolved for display
// ---------------------------------------------------------------------------

/// A watchlist with its items ordered by the resolved sort, plus the
/// subcategory grouping when the watchlist enables it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortedWatchlist {
    #[serde(flatten)]
    pub watchlist: Watchlist,
    pub sort: crate::sorting::SortSpec,
    /// Encoded form of `sort`.
    pub sort_key: String,
    pub items: Vec<WatchlistItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<crate::sorting::ItemGroup>>,
}
