use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::{FlattenedView, Language, LanguageViews, Website};

/// Total views per language, one entry per input language in input order.
///
/// A website counts toward a language when at least one of its tags matches the
/// language name. A website tagged with several of the given languages
/// contributes its full view sum to each of them; views are counted once per
/// (language, website) pair, not deduplicated globally.
pub fn views_by_language(websites: &[Website], languages: &[Language]) -> Vec<LanguageViews> {
    languages
        .iter()
        .map(|language| {
            let views = websites
                .iter()
                .filter(|website| website.tags.iter().any(|tag| tag.name == language.name))
                .map(|website| {
                    website
                        .website_views
                        .iter()
                        .map(|view| view.count)
                        .sum::<u64>()
                })
                .sum();
            LanguageViews {
                language: language.name.clone(),
                views,
            }
        })
        .collect()
}

/// Flatten per-website daily views into a single list annotated with the
/// originating website.
///
/// Only websites with at least one tag matching any of the given language
/// names survive the filter; their view records are emitted in website order,
/// then view order within each website.
pub fn flatten_website_views(websites: &[Website], languages: &[Language]) -> Vec<FlattenedView> {
    websites
        .iter()
        .filter(|website| {
            website
                .tags
                .iter()
                .any(|tag| languages.iter().any(|language| language.name == tag.name))
        })
        .flat_map(|website| {
            website.website_views.iter().map(|view| FlattenedView {
                count: view.count,
                date: view.date.clone(),
                website: website.url.clone(),
            })
        })
        .collect()
}

/// Sum flattened views per date, ordered chronologically.
///
/// Dates that do not parse as `YYYY-MM-DD` sort after the parseable ones, in
/// lexical order.
pub fn total_views_per_day(views: &[FlattenedView]) -> Vec<(String, u64)> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for view in views {
        *totals.entry(view.date.clone()).or_insert(0) += view.count;
    }

    let mut days: Vec<(String, u64)> = totals.into_iter().collect();
    days.sort_by(|(a, _), (b, _)| match (parse_day(a), parse_day(b)) {
        (Some(day_a), Some(day_b)) => day_a.cmp(&day_b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    days
}

fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Aggregate daily totals to reduce visual noise and improve performance
pub fn aggregate_daily_totals(data: &[(String, u64)], target_points: usize) -> Vec<(String, u64)> {
    if data.len() <= target_points {
        return data.to_vec();
    }

    let window_size = (data.len() as f64 / target_points as f64).ceil() as usize;
    let mut aggregated = Vec::new();

    for chunk in data.chunks(window_size) {
        let date = chunk[0].0.clone(); // Use first date in chunk
        let total: u64 = chunk.iter().map(|(_, views)| *views).sum();
        aggregated.push((date, total));
    }

    aggregated
}
