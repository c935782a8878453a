use anyhow::{bail, Result};
use cars24_lib::analysis::{CityStats, MarketSummary, Share};
use cars24_lib::types::CarListing;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => bail!(
                "unknown output format '{}'. Valid: table, json, csv, markdown",
                other
            ),
        }
    }
}

#[derive(Tabled, Serialize)]
struct ListingRow {
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Year")]
    #[serde(rename = "Year")]
    year: String,
    #[tabled(rename = "Km")]
    #[serde(rename = "Km")]
    kilometers: String,
    #[tabled(rename = "City")]
    #[serde(rename = "City")]
    city: String,
    #[tabled(rename = "Fuel")]
    #[serde(rename = "Fuel")]
    fuel: String,
    #[tabled(rename = "Transmission")]
    #[serde(rename = "Transmission")]
    transmission: String,
    #[tabled(rename = "Source")]
    #[serde(rename = "Source")]
    source: String,
}

#[derive(Tabled, Serialize)]
struct CityRow {
    #[tabled(rename = "City")]
    #[serde(rename = "City")]
    city: String,
    #[tabled(rename = "Listings")]
    #[serde(rename = "Listings")]
    count: usize,
    #[tabled(rename = "Avg Price")]
    #[serde(rename = "Avg Price")]
    mean_price: String,
    #[tabled(rename = "Median Price")]
    #[serde(rename = "Median Price")]
    median_price: String,
    #[tabled(rename = "Min")]
    #[serde(rename = "Min")]
    min_price: String,
    #[tabled(rename = "Max")]
    #[serde(rename = "Max")]
    max_price: String,
}

#[derive(Tabled, Serialize)]
struct ShareRow {
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    label: String,
    #[tabled(rename = "Count")]
    #[serde(rename = "Count")]
    count: usize,
    #[tabled(rename = "Share")]
    #[serde(rename = "Share")]
    percent: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

// -- Row builders --

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn build_listing_rows(listings: &[CarListing]) -> Vec<ListingRow> {
    listings
        .iter()
        .map(|l| ListingRow {
            title: l.title.clone(),
            price: l.price.map(format_inr).unwrap_or_else(|| "-".to_string()),
            year: opt(l.year),
            kilometers: l.kilometers.map(format_indian).unwrap_or_else(|| "-".to_string()),
            city: l.city.clone(),
            fuel: l.fuel_type.clone(),
            transmission: l.transmission.clone(),
            source: l.source.to_string(),
        })
        .collect()
}

fn price_cell(value: Option<f64>) -> String {
    value
        .map(|v| format_inr(v.round() as i64))
        .unwrap_or_else(|| "-".to_string())
}

fn build_city_rows(stats: &[CityStats]) -> Vec<CityRow> {
    stats
        .iter()
        .map(|c| CityRow {
            city: c.city.clone(),
            count: c.count,
            mean_price: price_cell(c.mean_price),
            median_price: price_cell(c.median_price),
            min_price: c.min_price.map(format_inr).unwrap_or_else(|| "-".to_string()),
            max_price: c.max_price.map(format_inr).unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn build_share_rows(shares: &[Share]) -> Vec<ShareRow> {
    shares
        .iter()
        .map(|s| ShareRow {
            label: s.label.clone(),
            count: s.count,
            percent: format!("{:.1}%", s.percent),
        })
        .collect()
}

fn build_metric_rows(summary: &MarketSummary) -> Vec<MetricRow> {
    let o = &summary.overview;
    let mut rows = vec![
        MetricRow { metric: "Listings".into(), value: o.total.to_string() },
        MetricRow { metric: "Cities".into(), value: o.cities.to_string() },
        MetricRow { metric: "Models".into(), value: o.models.to_string() },
        MetricRow {
            metric: "Provenance".into(),
            value: format!("{} scraped, {} sample", o.scraped, o.sample),
        },
    ];
    if let Some(p) = &summary.price {
        rows.push(MetricRow { metric: "Mean price".into(), value: format_inr(p.mean.round() as i64) });
        rows.push(MetricRow { metric: "Median price".into(), value: format_inr(p.median.round() as i64) });
        rows.push(MetricRow {
            metric: "Price range".into(),
            value: format!("{} - {}", format_inr(p.min as i64), format_inr(p.max as i64)),
        });
        rows.push(MetricRow { metric: "Std deviation".into(), value: format_inr(p.std_dev.round() as i64) });
    }
    if let Some(y) = &summary.year {
        rows.push(MetricRow {
            metric: "Years".into(),
            value: format!("{} - {} (avg {:.1})", y.min, y.max, y.mean),
        });
    }
    if let Some(k) = &summary.kilometers {
        rows.push(MetricRow {
            metric: "Avg kilometers".into(),
            value: format_indian(k.mean.round() as i64),
        });
    }
    rows.push(MetricRow {
        metric: "Data quality".into(),
        value: format!("{:.1}% ({})", summary.quality.score, summary.quality.grade),
    });
    rows
}

// -- Listings --

pub fn print_listings(listings: &[CarListing], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(build_listing_rows(listings))),
        OutputFormat::Markdown => {
            let mut table = Table::new(build_listing_rows(listings));
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => print_csv(&build_listing_rows(listings))?,
        OutputFormat::Json => print_json(&listings),
    }
    Ok(())
}

// -- Summary --

pub fn print_summary(summary: &MarketSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Csv => print_csv(&build_city_rows(&summary.by_city))?,
        OutputFormat::Table | OutputFormat::Markdown => {
            let markdown = format == OutputFormat::Markdown;
            let sections: [(&str, Table); 5] = [
                ("Overview", Table::new(build_metric_rows(summary))),
                ("Cities", Table::new(build_city_rows(&summary.by_city))),
                ("Models", Table::new(build_share_rows(&summary.models))),
                ("Fuel", Table::new(build_share_rows(&summary.fuel))),
                ("Transmission", Table::new(build_share_rows(&summary.transmission))),
            ];
            for (title, mut table) in sections {
                if markdown {
                    table.with(Style::markdown());
                    println!("### {}\n\n{}\n", title, table);
                } else {
                    println!("{}\n{}\n", title, table);
                }
            }
        }
    }
    Ok(())
}

/// City breakdown as a markdown table, for the markdown report.
pub fn city_markdown(stats: &[CityStats]) -> String {
    let mut table = Table::new(build_city_rows(stats));
    table.with(Style::markdown());
    table.to_string()
}

pub fn share_markdown(shares: &[Share]) -> String {
    let mut table = Table::new(build_share_rows(shares));
    table.with(Style::markdown());
    table.to_string()
}

// -- CSV / JSON --

fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

// -- Number formatting --

/// Groups digits the Indian way: last three, then pairs (12,34,567).
pub fn format_indian(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    if digits.len() <= 3 {
        return format!("{}{}", sign, digits);
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{}{},{}", sign, groups.join(","), tail)
}

pub fn format_inr(value: i64) -> String {
    format!("₹{}", format_indian(value))
}

/// Compact rupee amount in lakhs, e.g. "₹5.25L".
pub fn format_lakh(value: f64) -> String {
    format!("₹{:.2}L", value / 100_000.0)
}
