pub mod aggregation;

pub use aggregation::{
    aggregate_daily_totals, flatten_website_views, total_views_per_day, views_by_language,
};
