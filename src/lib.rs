//! # Language View Statistics Library
//!
//! `langviews` is a library for aggregating and visualizing per-website view
//! counts grouped by programming-language tag. It fetches website records
//! (URL, tags, daily view counts) from an HTTP API and turns them into chart
//! data through two pure aggregation functions.
//!
//! ## Features
//!
//! - Total view counts per selected language
//! - Flattened per-day view entries annotated with the originating website
//! - Language selection with per-selection memoization of results
//! - Async fetch of the raw website collection
//! - PNG chart rendering (bar chart per language, daily view line chart)
//!
//! ## Example
//!
//! ```
//! use langviews::types::{Language, Tag, ViewRecord, Website};
//! use langviews::ChartState;
//!
//! let mut state = ChartState::new(vec![Language::displayed("go")]);
//! state.update_with_websites(vec![Website {
//!     url: "a".to_string(),
//!     tags: vec![Tag { name: "go".to_string() }],
//!     website_views: vec![ViewRecord { date: "2024-01-01".to_string(), count: 3 }],
//! }]);
//!
//! let totals = state.views_by_language();
//! assert_eq!(totals[0].views, 3);
//! ```

pub mod app;
pub mod fetch;
pub mod plotting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::ChartState;
pub use fetch::{FetchError, WebsiteClient};
pub use types::{CacheKey, ChartData};
