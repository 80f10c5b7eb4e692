use std::collections::HashMap;

use crate::error::GatewayError;
use crate::models::AssetKind;

/// Page size used when the caller sends none or an unusable value.
pub const DEFAULT_PAGE_SIZE: u32 = 48;
/// Largest page the upstream store will hand out in one call.
pub const MAX_PAGE_SIZE: u32 = 500;

/// One page request against the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    /// Folder without trailing slashes.
    pub folder: String,
    pub include_subfolders: bool,
    pub page_size: u32,
    pub cursor: Option<String>,
    /// Sorted, de-duplicated, never empty.
    pub kinds: Vec<AssetKind>,
}

impl AssetQuery {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: normalize_folder(&folder.into()),
            include_subfolders: true,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: None,
            kinds: vec![AssetKind::Image],
        }
    }

    pub fn with_kinds(mut self, kinds: Vec<AssetKind>) -> Self {
        let mut kinds = kinds;
        kinds.sort();
        kinds.dedup();
        if kinds.is_empty() {
            kinds.push(AssetKind::Image);
        }
        self.kinds = kinds;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = clamp_page_size(page_size);
        self
    }

    pub fn with_subfolders(mut self, include: bool) -> Self {
        self.include_subfolders = include;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor.filter(|c| !c.is_empty());
        self
    }

    /// Parses the raw query string map of `GET /assets`.
    ///
    /// Accepts the legacy names `resourceTypes`/`types` for `kinds` and
    /// `nextCursor` for `cursor`. The folder is normalized but not
    /// validated here; emptiness is checked by the gateway after its
    /// configuration check.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, GatewayError> {
        let get = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| params.get(*n))
                .map(|v| v.trim().to_string())
        };

        let kinds = match get(&["kinds", "resourceTypes", "types"]) {
            Some(raw) => AssetKind::parse_list(&raw).map_err(GatewayError::BadRequest)?,
            None => vec![AssetKind::Image],
        };
        let page_size = get(&["pageSize"])
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let include_subfolders = get(&["includeSubfolders"])
            .map(|v| v == "true")
            .unwrap_or(true);

        Ok(Self::new(get(&["folder"]).unwrap_or_default())
            .with_kinds(kinds)
            .with_page_size(page_size)
            .with_subfolders(include_subfolders)
            .with_cursor(get(&["cursor", "nextCursor"])))
    }

    /// Serializes back into query parameters understood by `from_params`.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("folder", self.folder.clone()),
            ("includeSubfolders", self.include_subfolders.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("kinds", AssetKind::join(&self.kinds)),
        ];
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.clone()));
        }
        params
    }
}

fn normalize_folder(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn clamp_page_size(page_size: u32) -> u32 {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let q = AssetQuery::from_params(&params(&[("folder", "Demo")])).unwrap();
        assert_eq!(q.folder, "Demo");
        assert!(q.include_subfolders);
        assert_eq!(q.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(q.kinds, vec![AssetKind::Image]);
        assert!(q.cursor.is_none());
    }

    #[test]
    fn test_page_size_is_capped_and_sanitized() {
        let q = AssetQuery::from_params(&params(&[("pageSize", "9000")])).unwrap();
        assert_eq!(q.page_size, MAX_PAGE_SIZE);
        let q = AssetQuery::from_params(&params(&[("pageSize", "abc")])).unwrap();
        assert_eq!(q.page_size, DEFAULT_PAGE_SIZE);
        let q = AssetQuery::from_params(&params(&[("pageSize", "0")])).unwrap();
        assert_eq!(q.page_size, DEFAULT_PAGE_SIZE);
        let q = AssetQuery::from_params(&params(&[("pageSize", "2")])).unwrap();
        assert_eq!(q.page_size, 2);
    }

    #[test]
    fn test_legacy_parameter_names() {
        let q = AssetQuery::from_params(&params(&[
            ("folder", "BTS/"),
            ("types", "image,video"),
            ("nextCursor", "abc"),
        ]))
        .unwrap();
        assert_eq!(q.folder, "BTS");
        assert_eq!(q.kinds, vec![AssetKind::Image, AssetKind::Video]);
        assert_eq!(q.cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_include_subfolders_only_true_enables() {
        for (raw, expected) in [("true", true), ("false", false), ("yes", false)] {
            let q = AssetQuery::from_params(&params(&[("includeSubfolders", raw)])).unwrap();
            assert_eq!(q.include_subfolders, expected, "value {raw}");
        }
    }

    #[test]
    fn test_unknown_kind_is_bad_request() {
        let err = AssetQuery::from_params(&params(&[("kinds", "audio")])).unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }

    #[test]
    fn test_to_params_round_trips() {
        let q = AssetQuery::new("Frame 15 Photos")
            .with_kinds(vec![AssetKind::Video, AssetKind::Image])
            .with_page_size(60)
            .with_subfolders(false)
            .with_cursor(Some("next".into()));
        let map: HashMap<String, String> = q
            .to_params()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(AssetQuery::from_params(&map).unwrap(), q);
    }
}
