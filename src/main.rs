//! Language View Statistics Tool
//!
//! A headless CLI that fetches per-website view counts from the websites API
//! and charts them by language tag.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use langviews::app::state::{METRIC_DAILY_VIEWS, METRIC_VIEWS_BY_LANGUAGE};
use langviews::types::Language;
use langviews::{plotting, ChartState, WebsiteClient};

#[derive(Parser, Debug)]
#[command(
    name = "langviews",
    about = "Fetch per-website view counts and chart them by language tag",
    version,
    long_about = None
)]
struct Args {
    /// Base URL of the websites API
    #[arg(short, long, default_value = "http://localhost:5000")]
    endpoint: String,

    /// Language tag to display; repeat for multiple languages
    #[arg(short, long = "language", required = true)]
    languages: Vec<String>,

    /// Chart to render
    #[arg(short, long, value_enum, default_value = "views-by-language")]
    metric: Metric,

    /// Output path for the chart PNG
    #[arg(short, long, default_value = "views_chart.png")]
    output: String,

    /// Use a logarithmic y scale
    #[arg(long)]
    log_scale: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Metric {
    /// Bar chart of total views per selected language
    ViewsByLanguage,
    /// Line chart of summed daily views
    DailyViews,
}

impl Metric {
    fn as_state_metric(self) -> &'static str {
        match self {
            Metric::ViewsByLanguage => METRIC_VIEWS_BY_LANGUAGE,
            Metric::DailyViews => METRIC_DAILY_VIEWS,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let client = WebsiteClient::new(args.endpoint.clone());
    let websites = client
        .fetch_websites(&args.languages)
        .await
        .with_context(|| format!("fetching websites from {}", args.endpoint))?;

    let languages: Vec<Language> = args
        .languages
        .iter()
        .map(|name| Language::displayed(name.clone()))
        .collect();

    let mut state = ChartState::new(languages);
    state.plot_path = args.output.clone();
    state.current_metric = args.metric.as_state_metric().to_string();
    state.use_log_scale = args.log_scale;
    state.update_with_websites(websites);

    println!("{}", state.header_text());
    println!("{:<16} {:>10}", "Language", "Views");
    for entry in state.views_by_language() {
        println!("{:<16} {:>10}", entry.language, entry.views);
    }
    println!();
    println!(
        "{} daily view records match the selection",
        state.daily_views().len()
    );

    plotting::generate_plot(&mut state).map_err(|e| anyhow::anyhow!("rendering chart: {e}"))?;
    info!(path = %state.plot_path, "chart written");

    Ok(())
}
