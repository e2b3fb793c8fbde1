use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use once_cell::sync::Lazy;
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

use crate::app::state::{ChartState, METRIC_DAILY_VIEWS};
use crate::types::ChartData;
use crate::utils::{aggregate_daily_totals, total_views_per_day};

use super::styles::{ChartStyle, ChartTheme};

pub type PlotError = Box<dyn Error + Send + Sync>;

// Global plot cache with a 5-minute expiration
static PLOT_CACHE: Lazy<Arc<TokioMutex<LruCache<PlotCacheKey, (Vec<u8>, Instant)>>>> =
    Lazy::new(|| {
        Arc::new(TokioMutex::new(LruCache::new(
            NonZeroUsize::new(10).unwrap(),
        )))
    });

#[derive(Hash, Eq, PartialEq)]
struct PlotCacheKey {
    metric: String,
    use_log_scale: bool,
    data_hash: u64,
}

impl PlotCacheKey {
    fn new(state: &ChartState, data: &ChartData) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        data.hash(&mut hasher);

        Self {
            metric: state.current_metric.clone(),
            use_log_scale: state.use_log_scale,
            data_hash: hasher.finish(),
        }
    }
}

// Helper function to wrap errors
fn wrap_err<E>(e: E) -> PlotError
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    e.into()
}

/// Render the current metric to the PNG at `state.plot_path`.
pub fn generate_plot(state: &mut ChartState) -> Result<(), PlotError> {
    let data = state.chart_data();
    let plot_path = state.plot_path.clone();
    {
        let root = BitMapBackend::new(&plot_path, (640, 480)).into_drawing_area();
        generate_plot_internal(state, &data, &root)?;
        root.present()?;
    }
    state.update_needed = false;
    debug!(path = %plot_path, metric = %state.current_metric, "chart rendered");
    Ok(())
}

/// Generate a plot based on the given chart state, returning the PNG bytes
pub async fn generate_plot_async(state: ChartState) -> Result<Vec<u8>, PlotError> {
    let mut state = state;
    let data = state.chart_data();
    let cache_key = PlotCacheKey::new(&state, &data);

    // Try to get from cache first
    if let Some((plot_data, timestamp)) = PLOT_CACHE.lock().await.get(&cache_key) {
        if timestamp.elapsed() < Duration::from_secs(300) {
            return Ok(plot_data.clone());
        }
    }

    // Generate new plot in a blocking task
    let plot_data = tokio::task::spawn_blocking(move || {
        generate_plot(&mut state)?;

        // Read the file back into a buffer
        let buffer = std::fs::read(&state.plot_path)?;
        // Clean up the temporary file
        let _ = std::fs::remove_file(&state.plot_path);
        Ok::<_, PlotError>(buffer)
    })
    .await??;

    // Cache the result
    PLOT_CACHE
        .lock()
        .await
        .put(cache_key, (plot_data.clone(), Instant::now()));

    Ok(plot_data)
}

/// Internal function to generate the plot
fn generate_plot_internal(
    state: &ChartState,
    data: &ChartData,
    root_area: &DrawingArea<BitMapBackend, Shift>,
) -> Result<(), PlotError> {
    let theme = ChartTheme::default();
    let style = ChartStyle::default();

    root_area.fill(&theme.background_color).map_err(wrap_err)?;

    let is_daily = state.current_metric == METRIC_DAILY_VIEWS;

    // One x slot per language bar, or per (downsampled) day
    let (labels, values): (Vec<String>, Vec<f64>) = if is_daily {
        let totals = aggregate_daily_totals(&total_views_per_day(&data.daily_views), 500);
        totals
            .into_iter()
            .map(|(date, views)| (date, views as f64))
            .unzip()
    } else {
        data.views_by_language
            .iter()
            .map(|entry| (entry.language.clone(), entry.views as f64))
            .unzip()
    };

    let (min_val, max_val) = if is_daily {
        calculate_adaptive_range(&values)
    } else {
        let max = values.iter().cloned().fold(0.0f64, f64::max);
        (0.0, if max > 0.0 { max * 1.1 } else { 1.0 })
    };

    let mut chart_builder = ChartBuilder::on(root_area)
        .caption(
            state.header_text(),
            ("sans-serif", style.caption_font_size)
                .into_font()
                .color(&theme.text_color),
        )
        .margin(style.margin)
        .set_all_label_area_size(style.label_area_size)
        .build_cartesian_2d(
            0f64..(labels.len() as f64),
            if state.use_log_scale {
                1.0..max_val.max(1.0)
            } else {
                min_val..max_val
            },
        )?;

    let mut mesh = chart_builder.configure_mesh();

    // Store the labels in a longer-lived variable
    let labels_clone = labels.clone();
    let x_label_formatter = move |x: &f64| {
        let idx = *x as usize;
        if idx >= labels_clone.len() {
            return String::new();
        }
        // Dates get thinned out to prevent overlap; language names all fit
        if !is_daily
            || idx == 0
            || idx == labels_clone.len() - 1
            || (idx % (labels_clone.len() / 4).max(1) == 0
                && idx > 0
                && idx < labels_clone.len() - 1)
        {
            labels_clone[idx].clone()
        } else {
            String::new()
        }
    };

    let label_font = ("sans-serif", style.font_size)
        .into_font()
        .color(&theme.text_color);
    let x_label_style = if is_daily {
        // Rotate date labels for readability
        label_font
            .clone()
            .transform(FontTransform::Rotate90)
            .pos(Pos::new(HPos::Right, VPos::Center))
    } else {
        label_font.clone().pos(Pos::new(HPos::Center, VPos::Top))
    };

    mesh.light_line_style(TRANSPARENT)
        .bold_line_style(theme.grid_color)
        .axis_style(theme.axis_color)
        .y_desc("Views")
        .label_style(label_font)
        .x_labels(labels.len().min(20).max(1))
        .x_label_formatter(&x_label_formatter)
        .x_label_style(x_label_style);

    if state.use_log_scale {
        mesh.y_label_formatter(&|y| format!("{:.1e}", y));
    } else {
        // Use K/M formatting for large numbers
        mesh.y_label_formatter(&|y| {
            if y.abs() >= 1_000_000.0 {
                format!("{:.1}M", y / 1_000_000.0)
            } else if y.abs() >= 1_000.0 {
                format!("{:.1}K", y / 1_000.0)
            } else {
                format!("{:.0}", y)
            }
        });
    }

    mesh.draw()?;

    draw_grid(&mut chart_builder, labels.len() as f64, &theme).map_err(wrap_err)?;

    if is_daily {
        draw_daily_views(&mut chart_builder, &values, &theme, &style).map_err(wrap_err)?;
    } else {
        draw_views_by_language(&mut chart_builder, &values, &theme).map_err(wrap_err)?;
    }

    Ok(())
}

fn draw_grid(
    chart_builder: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    x_max: f64,
    theme: &ChartTheme,
) -> Result<(), PlotError> {
    let y_range = chart_builder.y_range();
    let y_span = y_range.end - y_range.start;
    if y_span <= 0.0 {
        return Ok(());
    }

    // View totals range from a handful to millions depending on the site mix,
    // so derive the line spacing from the span: aim for about six horizontal
    // lines, snapped up to a 1/2/5 step.
    let raw_interval = y_span / 6.0;
    let magnitude = 10f64.powf(raw_interval.log10().floor());
    let y_interval = [1.0, 2.0, 5.0]
        .iter()
        .map(|step| step * magnitude)
        .find(|candidate| *candidate >= raw_interval)
        .unwrap_or(10.0 * magnitude);

    let grid_style = ShapeStyle::from(&theme.grid_color).stroke_width(1);
    let mut y = (y_range.start / y_interval).floor() * y_interval + y_interval;
    while y <= y_range.end {
        chart_builder.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, y), (x_max, y)],
            grid_style,
        )))?;
        y += y_interval;
    }

    // Counts never go below zero; give the baseline extra weight
    if y_range.start <= 0.0 {
        let baseline_style = ShapeStyle::from(&theme.axis_color.mix(0.3)).stroke_width(2);
        chart_builder.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (x_max, 0.0)],
            baseline_style,
        )))?;
    }

    Ok(())
}

fn draw_views_by_language(
    chart_builder: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    values: &[f64],
    theme: &ChartTheme,
) -> Result<(), PlotError> {
    let bar_width = 0.8;

    chart_builder.draw_series(values.iter().enumerate().map(|(i, views)| {
        let x0 = i as f64 + (1.0 - bar_width) / 2.0;
        let x1 = x0 + bar_width;
        Rectangle::new(
            [(x0, 0.0), (x1, *views)],
            theme.series_color.mix(0.6).filled(),
        )
    }))?;

    Ok(())
}

fn draw_daily_views(
    chart_builder: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    values: &[f64],
    theme: &ChartTheme,
    style: &ChartStyle,
) -> Result<(), PlotError> {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, views)| (i as f64, *views))
        .collect();

    // Draw a subtle glow effect under the main line
    chart_builder.draw_series(LineSeries::new(
        points.clone(),
        theme.series_color.mix(0.3).stroke_width(style.line_width * 2),
    ))?;

    chart_builder.draw_series(LineSeries::new(
        points,
        theme.series_color.stroke_width(style.line_width),
    ))?;

    Ok(())
}

pub(crate) fn calculate_adaptive_range(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let peak = sorted[sorted.len() - 1];
    let typical = sorted[(sorted.len() * 3 / 4).min(sorted.len() - 1)];

    // A single viral day can dwarf the rest of the series. When the peak sits
    // far above the upper quartile, scale to the typical range and let the
    // spike clip instead of flattening every other day.
    let display_max = if typical > 0.0 && peak > typical * 3.0 {
        typical * 1.5
    } else {
        peak * 1.1
    };

    (0.0, display_max.max(1.0))
}
