//! Text, markdown and JSON reports written under `reports/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cars24_lib::analysis::{MarketSummary, NumericStats};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::output::{city_markdown, format_indian, format_inr, share_markdown};

pub const REPORTS_DIR: &str = "reports";

const RULE: &str = "============================================================";
const TOP_MODELS: usize = 5;

/// Run details that are not part of the statistics.
#[derive(Clone, Debug, Serialize)]
pub struct ReportContext {
    pub generated_at: DateTime<Utc>,
    pub brand: String,
    /// Why sample data replaced scraping, when known.
    pub fallback_reason: Option<String>,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    #[serde(flatten)]
    context: &'a ReportContext,
    summary: &'a MarketSummary,
}

fn rupees(v: f64) -> String {
    format_inr(v.round() as i64)
}

fn sample_share(summary: &MarketSummary) -> f64 {
    let o = &summary.overview;
    if o.total == 0 {
        0.0
    } else {
        o.sample as f64 * 100.0 / o.total as f64
    }
}

fn provenance_lines(summary: &MarketSummary, ctx: &ReportContext) -> Vec<String> {
    let o = &summary.overview;
    let mut lines = vec![
        format!("Scraped listings: {}", o.scraped),
        format!("Sample listings:  {}", o.sample),
    ];
    if o.sample > 0 {
        lines.push(format!(
            "NOTE: {:.0}% of this dataset is synthetic sample data, not real market prices.",
            sample_share(summary)
        ));
    }
    if let Some(reason) = &ctx.fallback_reason {
        lines.push(format!("Sample data was used because: {}", reason));
    }
    lines
}

fn price_lines(stats: &NumericStats) -> Vec<String> {
    vec![
        format!("Priced listings:    {}", stats.count),
        format!("Mean price:         {}", rupees(stats.mean)),
        format!("Median price:       {}", rupees(stats.median)),
        format!("Minimum price:      {}", rupees(stats.min)),
        format!("Maximum price:      {}", rupees(stats.max)),
        format!("Std deviation:      {}", rupees(stats.std_dev)),
        format!("Quartiles (Q1/Q3):  {} / {}", rupees(stats.q1), rupees(stats.q3)),
    ]
}

fn quality_lines(summary: &MarketSummary) -> Vec<String> {
    let q = &summary.quality;
    vec![
        format!("Price completeness:      {:.1}%", q.price_completeness),
        format!("Year completeness:       {:.1}%", q.year_completeness),
        format!("Kilometers completeness: {:.1}%", q.kilometers_completeness),
        format!("Complete records:        {} of {}", q.complete_records, q.total),
        format!("Quality score:           {:.1}% ({})", q.score, q.grade),
    ]
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_uppercase());
    lines.push("-".repeat(title.len()));
}

pub fn render_text_report(summary: &MarketSummary, ctx: &ReportContext) -> String {
    let o = &summary.overview;
    let mut lines = vec![
        RULE.to_string(),
        format!("CARS24 {} USED CAR MARKET ANALYSIS", ctx.brand.to_uppercase()),
        RULE.to_string(),
        format!("Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];

    section(&mut lines, "Data provenance");
    lines.extend(provenance_lines(summary, ctx));

    section(&mut lines, "Overview");
    lines.push(format!("Total listings: {}", o.total));
    lines.push(format!("Cities:         {}", o.cities));
    lines.push(format!("Models:         {}", o.models));

    section(&mut lines, "Price statistics");
    match &summary.price {
        Some(stats) => lines.extend(price_lines(stats)),
        None => lines.push("No priced listings.".to_string()),
    }
    if let Some(y) = &summary.year {
        lines.push(format!("Model years:        {:.0} - {:.0} (mean {:.1})", y.min, y.max, y.mean));
    }
    if let Some(k) = &summary.kilometers {
        lines.push(format!(
            "Kilometers:         mean {}, median {}",
            format_indian(k.mean.round() as i64),
            format_indian(k.median.round() as i64)
        ));
    }

    section(&mut lines, "City analysis");
    for c in &summary.by_city {
        let avg = c.mean_price.map(rupees).unwrap_or_else(|| "-".to_string());
        let median = c.median_price.map(rupees).unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{:<12} {:>4} listings  avg {:>12}  median {:>12}",
            c.city, c.count, avg, median
        ));
    }

    for (title, shares) in [
        ("Models", &summary.models),
        ("Fuel types", &summary.fuel),
        ("Transmissions", &summary.transmission),
    ] {
        section(&mut lines, title);
        for s in shares {
            lines.push(format!("{:<16} {:>4}  ({:.1}%)", s.label, s.count, s.percent));
        }
    }

    section(&mut lines, "Average price by year");
    for y in &summary.price_by_year {
        lines.push(format!("{}  {:>12}  ({} listings)", y.year, rupees(y.mean_price), y.count));
    }

    section(&mut lines, "Data quality");
    lines.extend(quality_lines(summary));
    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.join("\n") + "\n"
}

pub fn render_markdown_report(summary: &MarketSummary, ctx: &ReportContext) -> String {
    let o = &summary.overview;
    let mut md = format!(
        "# Cars24 {} Used Car Market Analysis\n\n_Generated {}_\n\n## Data provenance\n\n",
        ctx.brand,
        ctx.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    for line in provenance_lines(summary, ctx) {
        md.push_str(&format!("- {}\n", line));
    }

    md.push_str(&format!(
        "\n## Overview\n\n- Total listings: **{}**\n- Cities: {}\n- Models: {}\n",
        o.total, o.cities, o.models
    ));

    if let Some(stats) = &summary.price {
        md.push_str("\n## Price statistics\n\n");
        for line in price_lines(stats) {
            md.push_str(&format!("- {}\n", line.split_whitespace().collect::<Vec<_>>().join(" ")));
        }
    }

    md.push_str(&format!("\n## Cities\n\n{}\n", city_markdown(&summary.by_city)));
    md.push_str(&format!("\n## Models\n\n{}\n", share_markdown(&summary.models)));
    md.push_str(&format!("\n## Fuel types\n\n{}\n", share_markdown(&summary.fuel)));
    md.push_str(&format!("\n## Transmissions\n\n{}\n", share_markdown(&summary.transmission)));

    md.push_str("\n## Data quality\n\n");
    for line in quality_lines(summary) {
        md.push_str(&format!("- {}\n", line.split_whitespace().collect::<Vec<_>>().join(" ")));
    }

    md.push_str(
        "\n## Charts\n\n\
         ![Price distribution](../images/price_distribution.svg)\n\
         ![Average price by city](../images/price_by_city.svg)\n\
         ![Listings by city](../images/listings_by_city.svg)\n\
         ![Average price by year](../images/price_by_year.svg)\n",
    );
    md
}

pub fn render_executive_summary(summary: &MarketSummary, ctx: &ReportContext) -> String {
    let o = &summary.overview;
    let source = if o.total == 0 {
        "No data"
    } else if o.sample == 0 {
        "Scraped from cars24.com"
    } else if o.scraped == 0 {
        "Sample data (synthetic)"
    } else {
        "Mixed scraped and sample data"
    };

    let mut lines = vec![
        format!("EXECUTIVE SUMMARY - CARS24 {} ANALYSIS", ctx.brand.to_uppercase()),
        RULE.to_string(),
        format!("Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
        format!("Listings analyzed: {}", o.total),
        format!("Data source:       {} ({} scraped, {} sample)", source, o.scraped, o.sample),
        format!("Cities covered:    {}", o.cities),
        String::new(),
        "KEY FINDINGS".to_string(),
    ];

    if let Some(p) = &summary.price {
        lines.push(format!("- Median asking price is {}.", rupees(p.median)));
        lines.push(format!(
            "- Half of all priced listings fall between {} and {}.",
            rupees(p.q1),
            rupees(p.q3)
        ));
    }
    let priced_cities: Vec<_> = summary.by_city.iter().filter(|c| c.mean_price.is_some()).collect();
    let dearest = priced_cities
        .iter()
        .max_by(|a, b| a.mean_price.unwrap_or(0.0).total_cmp(&b.mean_price.unwrap_or(0.0)));
    let cheapest = priced_cities
        .iter()
        .min_by(|a, b| a.mean_price.unwrap_or(0.0).total_cmp(&b.mean_price.unwrap_or(0.0)));
    if let (Some(hi), Some(lo)) = (dearest, cheapest) {
        if hi.city != lo.city {
            lines.push(format!(
                "- {} has the highest average price ({}), {} the lowest ({}).",
                hi.city,
                rupees(hi.mean_price.unwrap_or(0.0)),
                lo.city,
                rupees(lo.mean_price.unwrap_or(0.0))
            ));
        }
    }
    if let Some(top) = summary.by_city.first() {
        lines.push(format!("- {} has the most listings ({}).", top.city, top.count));
    }
    let models: Vec<String> = summary
        .models
        .iter()
        .take(TOP_MODELS)
        .map(|s| format!("{} ({})", s.label, s.count))
        .collect();
    if !models.is_empty() {
        lines.push(format!("- Most listed models: {}.", models.join(", ")));
    }
    if let Some(fuel) = summary.fuel.first() {
        lines.push(format!("- {} is the most common fuel type ({:.0}%).", fuel.label, fuel.percent));
    }
    lines.push(format!(
        "- Data quality is {} ({:.1}%).",
        summary.quality.grade, summary.quality.score
    ));

    if o.sample > 0 {
        lines.push(String::new());
        lines.push(format!(
            "CAUTION: {:.0}% of listings are synthetic sample data. Figures illustrate the \
             pipeline and do not describe the live market.",
            sample_share(summary)
        ));
    }
    lines.push(RULE.to_string());
    lines.join("\n") + "\n"
}

pub fn render_data_quality_report(summary: &MarketSummary, ctx: &ReportContext) -> String {
    let mut lines = vec![
        "DATA QUALITY REPORT".to_string(),
        RULE.to_string(),
        format!("Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];
    section(&mut lines, "Provenance");
    lines.extend(provenance_lines(summary, ctx));
    section(&mut lines, "Completeness");
    lines.extend(quality_lines(summary));
    section(&mut lines, "Field values");
    for (name, shares) in [("Fuel", &summary.fuel), ("Transmission", &summary.transmission)] {
        let unknown = shares.iter().find(|s| s.label == "Unknown").map(|s| s.count).unwrap_or(0);
        lines.push(format!("{:<13} {} distinct, {} unknown", name, shares.len(), unknown));
    }
    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.join("\n") + "\n"
}

pub fn render_summary_json(summary: &MarketSummary, ctx: &ReportContext) -> Result<String> {
    let doc = SummaryDocument { context: ctx, summary };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Writes every report under `<out_dir>/reports/` and returns their paths.
pub fn write_reports(summary: &MarketSummary, ctx: &ReportContext, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join(REPORTS_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create report directory {}", dir.display()))?;

    let reports = [
        ("analysis_report.txt", render_text_report(summary, ctx)),
        ("analysis_report.md", render_markdown_report(summary, ctx)),
        ("executive_summary.txt", render_executive_summary(summary, ctx)),
        ("data_quality_report.txt", render_data_quality_report(summary, ctx)),
        ("summary.json", render_summary_json(summary, ctx)?),
    ];

    let mut written = Vec::with_capacity(reports.len());
    for (name, content) in reports {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("cannot write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cars24_lib::analysis::summarize;
    use cars24_lib::load_target_catalog;
    use cars24_lib::sample::generate_sample;
    use chrono::TimeZone;

    fn ctx(reason: Option<&str>) -> ReportContext {
        ReportContext {
            generated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            brand: "Maruti Suzuki".to_string(),
            fallback_reason: reason.map(str::to_string),
        }
    }

    fn sample_summary() -> MarketSummary {
        let catalog = load_target_catalog().unwrap();
        let listings = generate_sample(&catalog, &[], 50, ctx(None).generated_at);
        summarize(&listings, &catalog, 10)
    }

    #[test]
    fn test_every_report_discloses_provenance() {
        let summary = sample_summary();
        let c = ctx(Some("offline mode"));
        for report in [
            render_text_report(&summary, &c),
            render_markdown_report(&summary, &c),
            render_executive_summary(&summary, &c),
            render_data_quality_report(&summary, &c),
        ] {
            assert!(
                report.contains("Sample listings:  50") || report.contains("50 sample"),
                "{}",
                report
            );
            assert!(report.contains("100%"), "{}", report);
        }
    }

    #[test]
    fn test_text_report_sections() {
        let report = render_text_report(&sample_summary(), &ctx(None));
        assert!(report.contains("CARS24 MARUTI SUZUKI USED CAR MARKET ANALYSIS"));
        assert!(report.contains("PRICE STATISTICS"));
        assert!(report.contains("CITY ANALYSIS"));
        assert!(report.contains("Quality score:"));
    }

    #[test]
    fn test_summary_json_is_flat_context() {
        let json = render_summary_json(&sample_summary(), &ctx(Some("offline mode"))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["brand"], "Maruti Suzuki");
        assert_eq!(value["fallback_reason"], "offline mode");
        assert_eq!(value["summary"]["overview"]["sample"], 50);
        assert_eq!(value["summary"]["quality"]["grade"], "EXCELLENT");
    }

    #[test]
    fn test_write_reports_creates_files() {
        let root = std::env::temp_dir().join(format!("cars24_reports_{}", std::process::id()));
        let paths = write_reports(&sample_summary(), &ctx(None), &root).unwrap();
        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|p| p.exists()));
        assert!(root.join("reports/summary.json").exists());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
