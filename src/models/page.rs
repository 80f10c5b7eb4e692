use serde::{Deserialize, Serialize};

use super::AssetRecord;

/// One fetch result. `next_cursor == None` marks the end of the stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<AssetRecord>,
    pub next_cursor: Option<String>,
    /// Mirrors `next_cursor.is_some()` for clients that only read a flag.
    #[serde(default)]
    pub has_more: bool,
}

impl Page {
    pub fn new(items: Vec<AssetRecord>, next_cursor: Option<String>) -> Self {
        let next_cursor = next_cursor.filter(|c| !c.is_empty());
        Self {
            has_more: next_cursor.is_some(),
            items,
            next_cursor,
        }
    }
}
