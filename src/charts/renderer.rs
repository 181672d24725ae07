//! Static Chart Renderer
//! Renders aggregation results as standalone SVG charts (pie and bar).
//!
//! Layout per chart:
//! 1. Title, centered and bold
//! 2. Plot area (pie slices, or bars with axis labels and optional legend)
//! 3. Footer caption attributing the data source

use crate::data::GroupCount;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle, TextStyle};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart rendering failed: {0}")]
    Backend(String),
    #[error("No data to plot for '{0}'")]
    EmptySeries(String),
    #[error("Grouped chart needs a two-key group count, got {0} key(s)")]
    KeyShape(usize),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Backend(e.to_string())
}

/// Default bar fill when a chart has a single series
pub const BAR_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

/// Series palette for grouped charts and pie slices
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

const CAPTION: &str = "Data From Data.gov (https://data.gov/)";
const CAPTION_AREA: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Category x series matrix feeding a bar chart.
///
/// Categories and series both keep first-occurrence order; combinations
/// absent from the source counts are zero-filled.
#[derive(Debug, Clone)]
pub struct GroupedBarData {
    pub categories: Vec<String>,
    pub series: Vec<(String, Vec<u32>)>,
}

impl GroupedBarData {
    /// Single-series data from a one-key group count; key tuples become
    /// category labels.
    pub fn from_single(counts: &GroupCount) -> Self {
        let categories = counts.entries().iter().map(|(k, _)| k.join(" ")).collect();
        let values = counts.entries().iter().map(|(_, c)| *c).collect();
        Self {
            categories,
            series: vec![(String::new(), values)],
        }
    }

    /// Pivot a two-key group count. `category_key` (0 or 1) picks which key
    /// column becomes the category axis; the other key becomes the series.
    pub fn from_group_count(counts: &GroupCount, category_key: usize) -> Result<Self, ChartError> {
        if counts.keys().len() != 2 {
            return Err(ChartError::KeyShape(counts.keys().len()));
        }
        let hue_key = 1 - category_key;

        let mut categories: Vec<String> = Vec::new();
        let mut series: Vec<(String, Vec<u32>)> = Vec::new();

        for (tuple, count) in counts.entries() {
            let cat = &tuple[category_key];
            let hue = &tuple[hue_key];

            let ci = match categories.iter().position(|c| c == cat) {
                Some(i) => i,
                None => {
                    categories.push(cat.clone());
                    for (_, values) in series.iter_mut() {
                        values.push(0);
                    }
                    categories.len() - 1
                }
            };
            let si = match series.iter().position(|(name, _)| name == hue) {
                Some(i) => i,
                None => {
                    series.push((hue.clone(), vec![0; categories.len()]));
                    series.len() - 1
                }
            };
            series[si].1[ci] += count;
        }

        Ok(Self { categories, series })
    }

    /// Reorder categories by numeric value (year axes read left-to-right
    /// chronologically, not in occurrence order).
    pub fn sort_categories_numeric(&mut self) {
        let mut idx: Vec<usize> = (0..self.categories.len()).collect();
        idx.sort_by_key(|&i| self.categories[i].parse::<i64>().unwrap_or(i64::MAX));

        self.categories = idx.iter().map(|&i| self.categories[i].clone()).collect();
        for (_, values) in &mut self.series {
            *values = idx.iter().map(|&i| values[i]).collect();
        }
    }

    fn max_count(&self) -> u32 {
        self.series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Styling and layout for one bar chart.
pub struct BarSpec<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
    pub orientation: Orientation,
    pub annotate: bool,
    pub size: (u32, u32),
}

impl<'a> BarSpec<'a> {
    pub fn new(title: &'a str, x_desc: &'a str, y_desc: &'a str) -> Self {
        Self {
            title,
            x_desc,
            y_desc,
            orientation: Orientation::Vertical,
            annotate: false,
            size: (1040, 620),
        }
    }

    pub fn horizontal(mut self) -> Self {
        self.orientation = Orientation::Horizontal;
        self
    }

    /// Print the exact count above each bar (single-series charts).
    pub fn annotated(mut self) -> Self {
        self.annotate = true;
        self
    }
}

/// Render a pie chart with percentage labels inside the slices.
pub fn render_pie(path: &Path, title: &str, counts: &GroupCount) -> Result<(), ChartError> {
    if counts.is_empty() {
        return Err(ChartError::EmptySeries(title.to_string()));
    }

    let (width, height) = (720u32, 640u32);
    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (chart_zone, caption_zone) = root.split_vertically((height - CAPTION_AREA) as i32);
    draw_caption(&caption_zone, width)?;

    let chart_zone = chart_zone
        .titled(title, title_font())
        .map_err(draw_err)?;

    let sizes: Vec<f64> = counts.entries().iter().map(|(_, c)| f64::from(*c)).collect();
    let labels: Vec<String> = counts.entries().iter().map(|(k, _)| k.join(" ")).collect();
    let colors: Vec<RGBColor> = (0..sizes.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();

    let (cw, ch) = chart_zone.dim_in_pixel();
    let center = (cw as i32 / 2, ch as i32 / 2);
    let radius = f64::from(cw.min(ch)) * 0.32;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.percentages(("sans-serif", 14).into_font().color(&BLACK));
    pie.label_style(("sans-serif", 13).into_font().color(&BLACK));
    pie.label_offset(12.0);
    chart_zone.draw(&pie).map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Render a single-series or grouped bar chart.
///
/// Horizontal charts list the first category at the top. Grouped charts get
/// a legend in the upper-right corner.
pub fn render_bar(path: &Path, spec: &BarSpec, data: &GroupedBarData) -> Result<(), ChartError> {
    if data.categories.is_empty() {
        return Err(ChartError::EmptySeries(spec.title.to_string()));
    }

    let (width, height) = spec.size;
    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (chart_zone, caption_zone) = root.split_vertically((height - CAPTION_AREA) as i32);
    draw_caption(&caption_zone, width)?;

    let chart_zone = chart_zone
        .titled(spec.title, title_font())
        .map_err(draw_err)?;

    let n = data.categories.len();
    let max = f64::from(data.max_count().max(1)) * 1.1;
    let cat_range = -0.5f64..(n as f64 - 0.5);

    let mut builder = ChartBuilder::on(&chart_zone);
    builder.margin(12).x_label_area_size(46);
    match spec.orientation {
        Orientation::Vertical => builder.y_label_area_size(64),
        Orientation::Horizontal => builder.y_label_area_size(180),
    };

    let mut chart = match spec.orientation {
        Orientation::Vertical => builder.build_cartesian_2d(cat_range, 0f64..max),
        Orientation::Horizontal => builder.build_cartesian_2d(0f64..max, cat_range),
    }
    .map_err(draw_err)?;

    // Tick positions land on whole numbers; map each to its category label.
    // Horizontal charts grow downward in category index, so the label order
    // is reversed to put the first (largest) category on top.
    let display: Vec<String> = match spec.orientation {
        Orientation::Vertical => data.categories.clone(),
        Orientation::Horizontal => data.categories.iter().rev().cloned().collect(),
    };
    let fmt_cat = move |v: &f64| -> String {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < display.len() {
            display[i as usize].clone()
        } else {
            String::new()
        }
    };
    let fmt_count = |v: &f64| format!("{:.0}", v);

    let mut mesh = chart.configure_mesh();
    mesh.axis_desc_style(FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Bold))
        .label_style(("sans-serif", 12))
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc);
    match spec.orientation {
        Orientation::Vertical => {
            mesh.disable_x_mesh()
                .x_labels(n)
                .x_label_formatter(&fmt_cat)
                .y_label_formatter(&fmt_count);
        }
        Orientation::Horizontal => {
            mesh.disable_y_mesh()
                .y_labels(n)
                .y_label_formatter(&fmt_cat)
                .x_label_formatter(&fmt_count);
        }
    }
    mesh.draw().map_err(draw_err)?;

    let k = data.series.len();
    let bar_width = 0.8 / k as f64;

    for (si, (name, values)) in data.series.iter().enumerate() {
        let color = if k == 1 {
            BAR_COLOR
        } else {
            PALETTE[si % PALETTE.len()]
        };

        let rects: Vec<Rectangle<(f64, f64)>> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0)
            .map(|(ci, v)| {
                let slot = match spec.orientation {
                    Orientation::Vertical => ci as f64,
                    Orientation::Horizontal => (n - 1 - ci) as f64,
                };
                let lo = slot - 0.4 + si as f64 * bar_width;
                let hi = lo + bar_width;
                match spec.orientation {
                    Orientation::Vertical => {
                        Rectangle::new([(lo, 0.0), (hi, f64::from(*v))], color.filled())
                    }
                    Orientation::Horizontal => {
                        Rectangle::new([(0.0, lo), (f64::from(*v), hi)], color.filled())
                    }
                }
            })
            .collect();

        let anno = chart.draw_series(rects).map_err(draw_err)?;
        if k > 1 {
            anno.label(name.as_str()).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
        }
    }

    if k > 1 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .background_style(WHITE.mix(0.85))
            .label_font(("sans-serif", 12))
            .draw()
            .map_err(draw_err)?;
    }

    if spec.annotate {
        let style = TextStyle::from(("sans-serif", 12).into_font())
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        let (_, values) = &data.series[0];
        chart
            .draw_series(values.iter().enumerate().map(|(ci, v)| {
                Text::new(v.to_string(), (ci as f64, f64::from(*v)), style.clone())
            }))
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn title_font() -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, 22.0, FontStyle::Bold)
}

fn draw_caption<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    width: u32,
) -> Result<(), ChartError> {
    let style = TextStyle::from(("sans-serif", 12).into_font()).color(&BLACK);
    // Rough centering; SVG text metrics are approximate here anyway.
    let x = width as i32 / 2 - (CAPTION.len() as i32 * 6) / 2;
    area.draw(&Text::new(CAPTION, (x, 8), style)).map_err(draw_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregator;
    use polars::prelude::*;

    fn two_key_counts() -> GroupCount {
        let df = df!(
            "Electric Vehicle Type" => ["BEV", "BEV", "PHEV", "BEV", "PHEV"],
            "Make" => ["TESLA", "NISSAN", "KIA", "TESLA", "TESLA"],
        )
        .unwrap();
        aggregator::group_count(&df, &["Electric Vehicle Type", "Make"]).unwrap()
    }

    #[test]
    fn pivot_zero_fills_missing_combinations() {
        let data = GroupedBarData::from_group_count(&two_key_counts(), 1).unwrap();
        assert_eq!(data.categories, ["TESLA", "NISSAN", "KIA"]);

        let bev = data.series.iter().find(|(n, _)| n == "BEV").unwrap();
        let phev = data.series.iter().find(|(n, _)| n == "PHEV").unwrap();
        assert_eq!(bev.1, [2, 1, 0]);
        assert_eq!(phev.1, [1, 0, 1]);
    }

    #[test]
    fn pivot_rejects_single_key_counts() {
        let df = df!("Make" => ["TESLA", "NISSAN"]).unwrap();
        let counts = aggregator::group_count(&df, &["Make"]).unwrap();
        let err = GroupedBarData::from_group_count(&counts, 0).unwrap_err();
        assert!(matches!(err, ChartError::KeyShape(1)));
    }

    #[test]
    fn numeric_sort_reorders_series_with_categories() {
        let df = df!(
            "Model Year" => [2022i32, 2012, 2022, 2015],
            "Make" => ["TESLA", "TESLA", "NISSAN", "TESLA"],
        )
        .unwrap();
        let counts = aggregator::group_count(&df, &["Make", "Model Year"]).unwrap();
        let mut data = GroupedBarData::from_group_count(&counts, 1).unwrap();
        data.sort_categories_numeric();

        assert_eq!(data.categories, ["2012", "2015", "2022"]);
        let tesla = data.series.iter().find(|(n, _)| n == "TESLA").unwrap();
        assert_eq!(tesla.1, [1, 1, 1]);
    }

    #[test]
    fn empty_counts_are_rejected_before_drawing() {
        let df = df!("Make" => ["TESLA"]).unwrap();
        let empty = aggregator::group_count(&df, &["Make"]).unwrap().top_n(0);
        let path = std::env::temp_dir().join("ev_insights_empty_test.svg");
        let err = render_pie(&path, "Empty", &empty).unwrap_err();
        assert!(matches!(err, ChartError::EmptySeries(_)));
    }
}
