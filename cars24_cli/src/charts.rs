//! SVG chart rendering with the quick-xml writer.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cars24_lib::analysis::MarketSummary;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::output::format_lakh;

pub const IMAGES_DIR: &str = "images";

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 450.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 90.0;
const GRID_LINES: usize = 4;
const BAR_COLOR: &str = "#4c72b0";
const LINE_COLOR: &str = "#dd8452";

/// One labelled value on a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
}

/// Chart description, rendered by [`render_svg`].
pub struct Chart<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub kind: ChartKind,
    pub points: Vec<Point>,
    pub format_value: fn(f64) -> String,
}

fn plain_count(v: f64) -> String {
    format!("{}", v.round() as i64)
}

fn fmt(v: f64) -> String {
    format!("{:.1}", v)
}

fn empty<W: Write>(writer: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    writer.write_event(Event::Empty(
        BytesStart::new(name).with_attributes(attrs.iter().copied()),
    ))?;
    Ok(())
}

fn text<W: Write>(writer: &mut Writer<W>, attrs: &[(&str, &str)], content: &str) -> Result<()> {
    writer.write_event(Event::Start(
        BytesStart::new("text").with_attributes(attrs.iter().copied()),
    ))?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    writer.write_event(Event::End(BytesEnd::new("text")))?;
    Ok(())
}

/// Renders a chart as a standalone SVG document.
pub fn render_svg(chart: &Chart<'_>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let (width, height) = (fmt(WIDTH), fmt(HEIGHT));
    let view_box = format!("0 0 {} {}", width, height);
    writer.write_event(Event::Start(BytesStart::new("svg").with_attributes([
        ("xmlns", "http://www.w3.org/2000/svg"),
        ("width", width.as_str()),
        ("height", height.as_str()),
        ("viewBox", view_box.as_str()),
        ("font-family", "sans-serif"),
    ])))?;

    empty(&mut writer, "rect", &[("width", "100%"), ("height", "100%"), ("fill", "white")])?;
    text(
        &mut writer,
        &[("x", &fmt(WIDTH / 2.0)), ("y", "28"), ("text-anchor", "middle"), ("font-size", "18")],
        chart.title,
    )?;

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let base_y = MARGIN_TOP + plot_h;

    if chart.points.is_empty() {
        text(
            &mut writer,
            &[("x", &fmt(WIDTH / 2.0)), ("y", &fmt(HEIGHT / 2.0)), ("text-anchor", "middle")],
            "No data",
        )?;
    } else {
        let max = chart.points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
        let max = if max > 0.0 { max * 1.1 } else { 1.0 };
        let y_of = |v: f64| base_y - v / max * plot_h;

        for i in 0..=GRID_LINES {
            let value = max * i as f64 / GRID_LINES as f64;
            let y = fmt(y_of(value));
            empty(
                &mut writer,
                "line",
                &[
                    ("x1", &fmt(MARGIN_LEFT)),
                    ("x2", &fmt(MARGIN_LEFT + plot_w)),
                    ("y1", &y),
                    ("y2", &y),
                    ("stroke", "#dddddd"),
                ],
            )?;
            text(
                &mut writer,
                &[("x", &fmt(MARGIN_LEFT - 8.0)), ("y", &y), ("text-anchor", "end"), ("font-size", "11")],
                &(chart.format_value)(value),
            )?;
        }

        let slot = plot_w / chart.points.len() as f64;
        let mut line_points: Vec<String> = Vec::new();
        for (i, point) in chart.points.iter().enumerate() {
            let center = MARGIN_LEFT + slot * (i as f64 + 0.5);
            let top = y_of(point.value);
            match chart.kind {
                ChartKind::Bar => {
                    let bar_w = slot * 0.7;
                    empty(
                        &mut writer,
                        "rect",
                        &[
                            ("x", &fmt(center - bar_w / 2.0)),
                            ("y", &fmt(top)),
                            ("width", &fmt(bar_w)),
                            ("height", &fmt(base_y - top)),
                            ("fill", BAR_COLOR),
                        ],
                    )?;
                }
                ChartKind::Line => {
                    line_points.push(format!("{},{}", fmt(center), fmt(top)));
                    empty(
                        &mut writer,
                        "circle",
                        &[("cx", &fmt(center)), ("cy", &fmt(top)), ("r", "4"), ("fill", LINE_COLOR)],
                    )?;
                }
            }

            let label_y = fmt(base_y + 16.0);
            let rotate = format!("rotate(-30 {} {})", fmt(center), label_y);
            text(
                &mut writer,
                &[
                    ("x", &fmt(center)),
                    ("y", &label_y),
                    ("text-anchor", "end"),
                    ("font-size", "11"),
                    ("transform", &rotate),
                ],
                &point.label,
            )?;
        }

        if chart.kind == ChartKind::Line && line_points.len() > 1 {
            empty(
                &mut writer,
                "polyline",
                &[
                    ("points", &line_points.join(" ")),
                    ("fill", "none"),
                    ("stroke", LINE_COLOR),
                    ("stroke-width", "2"),
                ],
            )?;
        }
    }

    // Axes
    let base = fmt(base_y);
    empty(
        &mut writer,
        "line",
        &[("x1", &fmt(MARGIN_LEFT)), ("x2", &fmt(MARGIN_LEFT)), ("y1", &fmt(MARGIN_TOP)), ("y2", &base), ("stroke", "black")],
    )?;
    empty(
        &mut writer,
        "line",
        &[("x1", &fmt(MARGIN_LEFT)), ("x2", &fmt(MARGIN_LEFT + plot_w)), ("y1", &base), ("y2", &base), ("stroke", "black")],
    )?;
    text(
        &mut writer,
        &[("x", &fmt(MARGIN_LEFT + plot_w / 2.0)), ("y", &fmt(HEIGHT - 12.0)), ("text-anchor", "middle"), ("font-size", "13")],
        chart.x_label,
    )?;
    let y_mid = fmt(MARGIN_TOP + plot_h / 2.0);
    let y_rotate = format!("rotate(-90 20 {})", y_mid);
    text(
        &mut writer,
        &[("x", "20"), ("y", &y_mid), ("text-anchor", "middle"), ("font-size", "13"), ("transform", &y_rotate)],
        chart.y_label,
    )?;

    writer.write_event(Event::End(BytesEnd::new("svg")))?;
    let buf = writer.into_inner().into_inner();
    Ok(String::from_utf8(buf)?)
}

// -- Chart builders --

pub fn price_distribution_chart(summary: &MarketSummary) -> Chart<'static> {
    Chart {
        title: "Price Distribution",
        x_label: "Price range",
        y_label: "Listings",
        kind: ChartKind::Bar,
        points: summary
            .price_bins
            .iter()
            .map(|b| Point {
                label: format!("{}-{}", format_lakh(b.lower), format_lakh(b.upper)),
                value: b.count as f64,
            })
            .collect(),
        format_value: plain_count,
    }
}

pub fn price_by_city_chart(summary: &MarketSummary) -> Chart<'static> {
    Chart {
        title: "Average Price by City",
        x_label: "City",
        y_label: "Average price",
        kind: ChartKind::Bar,
        points: summary
            .by_city
            .iter()
            .filter_map(|c| c.mean_price.map(|v| Point { label: c.city.clone(), value: v }))
            .collect(),
        format_value: format_lakh,
    }
}

pub fn listings_by_city_chart(summary: &MarketSummary) -> Chart<'static> {
    Chart {
        title: "Listings by City",
        x_label: "City",
        y_label: "Listings",
        kind: ChartKind::Bar,
        points: summary
            .by_city
            .iter()
            .map(|c| Point { label: c.city.clone(), value: c.count as f64 })
            .collect(),
        format_value: plain_count,
    }
}

pub fn price_by_year_chart(summary: &MarketSummary) -> Chart<'static> {
    Chart {
        title: "Average Price by Manufacturing Year",
        x_label: "Year",
        y_label: "Average price",
        kind: ChartKind::Line,
        points: summary
            .price_by_year
            .iter()
            .map(|y| Point { label: y.year.to_string(), value: y.mean_price })
            .collect(),
        format_value: format_lakh,
    }
}

/// Writes all charts under `<out_dir>/images/` and returns their paths.
pub fn write_charts(summary: &MarketSummary, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join(IMAGES_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create chart directory {}", dir.display()))?;

    let charts = [
        ("price_distribution.svg", price_distribution_chart(summary)),
        ("price_by_city.svg", price_by_city_chart(summary)),
        ("listings_by_city.svg", listings_by_city_chart(summary)),
        ("price_by_year.svg", price_by_year_chart(summary)),
    ];

    let mut written = Vec::with_capacity(charts.len());
    for (name, chart) in charts {
        let path = dir.join(name);
        let svg = render_svg(&chart)?;
        fs::write(&path, svg).with_context(|| format!("cannot write {}", path.display()))?;
        tracing::debug!("wrote chart {}", path.display());
        written.push(path);
    }
    Ok(written)
}
