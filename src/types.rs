//! # Common Types
//!
//! This module contains the common types used throughout the application for
//! representing websites, their daily view counts, language selections, and
//! the aggregated chart data derived from them.

use serde::{Deserialize, Deserializer, Serialize};

/// A key used for caching aggregated chart data based on the selected languages.
///
/// This struct is used as a key in the cache to store aggregation results for a
/// specific set of selected language names.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct CacheKey {
    /// Names of the selected languages, in selection order
    pub languages: Vec<String>,
}

/// A label attached to a website identifying an associated language/category.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// The tag name, e.g. "go" or "rust"
    pub name: String,
}

/// A single day's recorded visit count for a website.
///
/// The upstream API is loose about the `count` field: it may arrive as a JSON
/// integer or as a numeric string. Anything that does not parse as a
/// non-negative integer contributes 0.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    /// Calendar date of the recorded views, e.g. "2024-01-01"
    #[serde(default)]
    pub date: String,
    /// Number of views recorded on that date
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

/// A website together with its tags and daily view records.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Website {
    /// The website URL, used as its identifier
    pub url: String,
    /// Tags attached to the website (empty when absent upstream)
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Daily view records for the website (empty when absent upstream)
    #[serde(default)]
    pub website_views: Vec<ViewRecord>,
}

/// A language that can be selected for aggregation.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Language {
    /// The language name, matched against website tag names
    pub name: String,
    /// Whether the language is currently selected for display
    #[serde(default)]
    pub displayed: bool,
}

impl Language {
    /// Convenience constructor for a selected language.
    pub fn displayed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            displayed: true,
        }
    }
}

/// Total view count for one selected language.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize)]
pub struct LanguageViews {
    /// The language name
    pub language: String,
    /// Total views across all websites tagged with the language
    pub views: u64,
}

/// One per-day view entry, annotated with the originating website.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize)]
pub struct FlattenedView {
    /// Number of views recorded on `date`
    pub count: u64,
    /// Calendar date of the recorded views
    pub date: String,
    /// URL of the website the views belong to
    pub website: String,
}

/// The product of one aggregation pass over the current data and selection.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct ChartData {
    /// Total views per selected language, in selection order
    pub views_by_language: Vec<LanguageViews>,
    /// Flattened daily view entries for websites matching the selection
    pub daily_views: Vec<FlattenedView>,
}

/// Deserialize a view count from either a JSON integer or a numeric string,
/// defaulting to 0 for anything unparseable, negative, or missing.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let count = match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_parses_from_integer_and_string() {
        let record: ViewRecord =
            serde_json::from_str(r#"{"date": "2024-01-01", "count": 3}"#).unwrap();
        assert_eq!(record.count, 3);

        let record: ViewRecord =
            serde_json::from_str(r#"{"date": "2024-01-01", "count": "5"}"#).unwrap();
        assert_eq!(record.count, 5);

        let record: ViewRecord =
            serde_json::from_str(r#"{"date": "2024-01-01", "count": " 7 "}"#).unwrap();
        assert_eq!(record.count, 7);
    }

    #[test]
    fn malformed_count_defaults_to_zero() {
        for body in [
            r#"{"date": "2024-01-01", "count": "abc"}"#,
            r#"{"date": "2024-01-01", "count": null}"#,
            r#"{"date": "2024-01-01", "count": -4}"#,
            r#"{"date": "2024-01-01"}"#,
        ] {
            let record: ViewRecord = serde_json::from_str(body).unwrap();
            assert_eq!(record.count, 0, "body: {body}");
        }
    }

    #[test]
    fn website_defaults_missing_collections() {
        let website: Website = serde_json::from_str(r#"{"url": "a"}"#).unwrap();
        assert_eq!(website.url, "a");
        assert!(website.tags.is_empty());
        assert!(website.website_views.is_empty());
    }

    #[test]
    fn language_displayed_defaults_to_false() {
        let language: Language = serde_json::from_str(r#"{"name": "go"}"#).unwrap();
        assert!(!language.displayed);
    }
}
