use crate::types::{CacheKey, ChartData, FlattenedView, Language, LanguageViews, Website};
use crate::utils::{flatten_website_views, views_by_language};

use super::cache::ChartCache;

/// Metric name for the per-language bar chart.
pub const METRIC_VIEWS_BY_LANGUAGE: &str = "Views by Language";
/// Metric name for the per-day line chart.
pub const METRIC_DAILY_VIEWS: &str = "Daily Views";

/// Main chart state
///
/// Owns the fetched website data and the language selection, and memoizes the
/// aggregation derived from them. Both aggregation functions are deterministic
/// over their inputs, so cached results stay valid until the website data or
/// the selected-language set changes.
#[derive(Clone)]
pub struct ChartState {
    pub websites: Vec<Website>,
    pub languages: Vec<Language>,
    pub plot_path: String,
    pub current_metric: String,
    pub use_log_scale: bool,
    pub update_needed: bool,
    pub chart_cache: ChartCache,
}

impl ChartState {
    /// Create a state with the given language list and default chart settings.
    pub fn new(languages: Vec<Language>) -> Self {
        Self {
            languages,
            ..Self::default()
        }
    }

    /// Replace the website data set with freshly fetched records.
    ///
    /// Invalidates all cached aggregation results.
    pub fn update_with_websites(&mut self, websites: Vec<Website>) {
        self.websites = websites;
        self.chart_cache.clear();
        self.update_needed = true;
    }

    /// The languages currently marked for display, in input order.
    pub fn selected_languages(&self) -> Vec<Language> {
        self.languages
            .iter()
            .filter(|language| language.displayed)
            .cloned()
            .collect()
    }

    /// Mark a language as displayed or hidden.
    pub fn set_displayed(&mut self, name: &str, displayed: bool) {
        for language in &mut self.languages {
            if language.name == name && language.displayed != displayed {
                language.displayed = displayed;
                self.update_needed = true;
            }
        }
    }

    /// Cache key for the current language selection.
    pub fn selection_key(&self) -> CacheKey {
        CacheKey {
            languages: self
                .languages
                .iter()
                .filter(|language| language.displayed)
                .map(|language| language.name.clone())
                .collect(),
        }
    }

    /// Aggregated data for the current selection, computed on first use and
    /// served from the cache afterwards.
    pub fn chart_data(&mut self) -> ChartData {
        let key = self.selection_key();
        if let Some(data) = self.chart_cache.get(&key) {
            return data.clone();
        }

        let selected = self.selected_languages();
        let data = ChartData {
            views_by_language: views_by_language(&self.websites, &selected),
            daily_views: flatten_website_views(&self.websites, &selected),
        };
        self.chart_cache.store(key, data.clone());
        data
    }

    /// Total views per selected language, in selection order.
    pub fn views_by_language(&mut self) -> Vec<LanguageViews> {
        self.chart_data().views_by_language
    }

    /// Flattened daily view entries for the current selection.
    pub fn daily_views(&mut self) -> Vec<FlattenedView> {
        self.chart_data().daily_views
    }

    /// Header line shown above the chart.
    pub fn header_text(&self) -> String {
        let names: Vec<String> = self
            .languages
            .iter()
            .filter(|language| language.displayed)
            .map(|language| language.name.clone())
            .collect();
        if names.is_empty() {
            "Website views".to_string()
        } else {
            format!("Website views: {}", names.join(", "))
        }
    }
}

impl Default for ChartState {
    fn default() -> Self {
        Self {
            websites: Vec::new(),
            languages: Vec::new(),
            plot_path: "views_chart.png".to_string(),
            current_metric: METRIC_VIEWS_BY_LANGUAGE.to_string(),
            use_log_scale: false,
            update_needed: false,
            chart_cache: ChartCache::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tag, ViewRecord};
    use pretty_assertions::{assert_eq, assert_ne};

    fn sample_websites() -> Vec<Website> {
        vec![
            Website {
                url: "a".to_string(),
                tags: vec![Tag {
                    name: "go".to_string(),
                }],
                website_views: vec![
                    ViewRecord {
                        date: "2024-01-01".to_string(),
                        count: 3,
                    },
                    ViewRecord {
                        date: "2024-01-02".to_string(),
                        count: 5,
                    },
                ],
            },
            Website {
                url: "b".to_string(),
                tags: vec![Tag {
                    name: "rust".to_string(),
                }],
                website_views: vec![ViewRecord {
                    date: "2024-01-01".to_string(),
                    count: 2,
                }],
            },
        ]
    }

    #[test]
    fn test_update_replaces_data_and_invalidates_cache() {
        let mut state = ChartState::new(vec![Language::displayed("go")]);
        state.update_with_websites(sample_websites());
        assert!(state.update_needed);
        assert_eq!(state.views_by_language()[0].views, 8);

        // Replacing the data must drop the cached aggregation.
        state.update_with_websites(Vec::new());
        assert_eq!(state.views_by_language()[0].views, 0);
    }

    #[test]
    fn test_chart_data_is_cached_per_selection() {
        let mut state = ChartState::new(vec![
            Language::displayed("go"),
            Language {
                name: "rust".to_string(),
                displayed: false,
            },
        ]);
        state.update_with_websites(sample_websites());

        assert!(state.chart_cache.get(&state.selection_key()).is_none());
        let first = state.chart_data();
        assert!(state.chart_cache.get(&state.selection_key()).is_some());
        assert_eq!(first, state.chart_data());

        // A different selection computes (and caches) its own entry.
        state.set_displayed("rust", true);
        let widened = state.chart_data();
        assert_eq!(widened.views_by_language.len(), 2);
        assert_ne!(first, widened);
    }

    #[test]
    fn test_selection_excludes_hidden_languages() {
        let mut state = ChartState::new(vec![
            Language::displayed("go"),
            Language {
                name: "rust".to_string(),
                displayed: false,
            },
        ]);
        state.update_with_websites(sample_websites());

        let selected = state.selected_languages();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "go");

        // Hidden languages do not reach the aggregator at all.
        assert_eq!(state.views_by_language().len(), 1);
        assert_eq!(state.daily_views().len(), 2);
    }

    #[test]
    fn test_set_displayed_marks_update_only_on_change() {
        let mut state = ChartState::new(vec![Language::displayed("go")]);
        state.set_displayed("go", true);
        assert!(!state.update_needed);
        state.set_displayed("go", false);
        assert!(state.update_needed);
    }

    #[test]
    fn test_header_text_lists_selected_languages() {
        let mut state = ChartState::new(vec![
            Language::displayed("go"),
            Language::displayed("rust"),
        ]);
        assert_eq!(state.header_text(), "Website views: go, rust");

        state.set_displayed("go", false);
        state.set_displayed("rust", false);
        assert_eq!(state.header_text(), "Website views");
    }
}
