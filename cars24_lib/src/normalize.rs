//! Fragment normalization into [`CarListing`].
//!
//! Nothing here returns an error. A value that cannot be parsed, or parses to
//! something implausible, becomes `None` (numbers) or `"Unknown"` (text).

use std::collections::HashSet;
use std::sync::LazyLock;

use cars24_api::types::{CarListing, Source};
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use tracing::debug;

use crate::extract::RawFragment;
use crate::targets::TargetCatalog;

pub const MIN_PRICE: i64 = 50_000;
pub const MAX_PRICE: i64 = 5_000_000;
pub const MIN_KILOMETERS: i64 = 1;
pub const MAX_KILOMETERS: i64 = 500_000;
pub const MIN_YEAR: i32 = 1990;

pub const UNKNOWN: &str = "Unknown";

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;
const MAX_TITLE_CHARS: usize = 150;

fn regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("invalid pattern {}: {}", pattern, e);
            None
        }
    }
}

static RE_CRORE: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"(\d+(?:\.\d+)?)\s*(?:crores?|cr)\b"));
static RE_LAKH: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"(\d+(?:\.\d+)?)\s*(?:lakhs?|lacs?)\b"));
static RE_RUPEES: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"(?:₹|\brs\.?|\binr)\s*(\d[\d,]*(?:\.\d+)?)"));
static RE_PRICE_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"price\s*[:\-]?\s*(\d[\d,]*)"));
static RE_KILOMETERS: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"(\d[\d,]*)[ \t]*(?:kms|km|kilometers|kilometres)\b"));
static RE_ODOMETER: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"odometer\s*[:\-]?\s*(\d[\d,]*)"));
static RE_YEAR: LazyLock<Option<Regex>> = LazyLock::new(|| regex(r"\b(?:19|20)\d{2}\b"));
static RE_FUEL_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"\b(petrol|cng|electric|ev|hybrid|diesel)\b"));
static RE_TRANSMISSION_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| regex(r"\b(amt|automatic|auto|cvt|manual)\b"));

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

fn scaled(raw: &str, unit: f64) -> Option<i64> {
    let value: f64 = digits_only(raw).parse().ok()?;
    Some((value * unit).round() as i64)
}

fn whole(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().take_while(|c| *c != '.').filter(|c| c.is_ascii_digit()).collect();
    cleaned.parse().ok()
}

fn captured(re: &LazyLock<Option<Regex>>, text: &str, parse: impl Fn(&str) -> Option<i64>) -> Vec<i64> {
    match re.as_ref() {
        Some(re) => re.captures_iter(text).filter_map(|c| parse(&c[1])).collect(),
        None => Vec::new(),
    }
}

/// Parses a rupee amount: `₹5,25,000`, `Rs. 4,50,000`, `6.85 Lakh`,
/// `1.1 crore` or `price: 350000`. Indian and western digit grouping are both
/// accepted. Returns the first candidate inside the plausible price range.
pub fn parse_price(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    let mut candidates = captured(&RE_CRORE, &lower, |raw| scaled(raw, CRORE));
    candidates.extend(captured(&RE_LAKH, &lower, |raw| scaled(raw, LAKH)));
    candidates.extend(captured(&RE_RUPEES, &lower, whole));
    candidates.extend(captured(&RE_PRICE_LABEL, &lower, whole));

    candidates
        .into_iter()
        .find(|p| (MIN_PRICE..=MAX_PRICE).contains(p))
}

/// Parses an odometer reading such as `42,350 km`, `18900 kms` or
/// `odometer: 5,000`.
pub fn parse_kilometers(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    let mut candidates = captured(&RE_KILOMETERS, &lower, whole);
    candidates.extend(captured(&RE_ODOMETER, &lower, whole));

    candidates
        .into_iter()
        .find(|km| (MIN_KILOMETERS..=MAX_KILOMETERS).contains(km))
}

/// First four-digit year between 1990 and `current_year`.
pub fn parse_year(text: &str, current_year: i32) -> Option<i32> {
    let year = RE_YEAR
        .as_ref()?
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .find(|y| (MIN_YEAR..=current_year).contains(y));
    year
}

fn keywords<'a>(re: &LazyLock<Option<Regex>>, lower: &'a str) -> HashSet<&'a str> {
    match re.as_ref() {
        Some(re) => re.find_iter(lower).map(|m| m.as_str()).collect(),
        None => HashSet::new(),
    }
}

/// Fuel type by keyword: Petrol, Diesel, CNG, Electric, Hybrid, "Petrol + CNG".
pub fn parse_fuel(text: &str) -> String {
    let lower = text.to_lowercase();
    let words = keywords(&RE_FUEL_WORD, &lower);
    let petrol = words.contains("petrol");
    let cng = words.contains("cng");

    let fuel = if petrol && cng {
        "Petrol + CNG"
    } else if words.contains("electric") || words.contains("ev") {
        "Electric"
    } else if words.contains("hybrid") {
        "Hybrid"
    } else if words.contains("diesel") {
        "Diesel"
    } else if cng {
        "CNG"
    } else if petrol {
        "Petrol"
    } else {
        UNKNOWN
    };
    fuel.to_string()
}

/// Transmission by keyword. AMT is checked before Automatic.
pub fn parse_transmission(text: &str) -> String {
    let lower = text.to_lowercase();
    let words = keywords(&RE_TRANSMISSION_WORD, &lower);
    let transmission = if words.contains("amt") {
        "AMT"
    } else if words.contains("automatic") || words.contains("auto") {
        "Automatic"
    } else if words.contains("cvt") {
        "CVT"
    } else if words.contains("manual") {
        "Manual"
    } else {
        UNKNOWN
    };
    transmission.to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title from the hint, else the first line naming the brand, else `"<Brand> Car"`.
pub fn pick_title(fragment: &RawFragment, catalog: &TargetCatalog) -> String {
    let usable = |s: &str| {
        let s = collapse_whitespace(s);
        (!s.is_empty() && s.chars().count() <= MAX_TITLE_CHARS).then_some(s)
    };

    if let Some(title) = fragment.title.as_deref().and_then(usable) {
        return title;
    }
    fragment
        .text
        .lines()
        .filter(|line| catalog.mentions_brand(line))
        .find_map(usable)
        .unwrap_or_else(|| format!("{} Car", catalog.brand))
}

/// Maps one fragment found on `city`'s page into a scraped listing.
pub fn normalize(
    fragment: &RawFragment,
    city: &str,
    catalog: &TargetCatalog,
    scraped_at: DateTime<Utc>,
) -> CarListing {
    let title = pick_title(fragment, catalog);
    let searchable = format!("{}\n{}", title, fragment.text);

    let price = fragment
        .price_text
        .as_deref()
        .and_then(parse_price)
        .or_else(|| parse_price(&fragment.text));

    CarListing {
        price,
        year: parse_year(&searchable, scraped_at.year()),
        kilometers: parse_kilometers(&fragment.text),
        city: catalog.standardize_city(city),
        fuel_type: parse_fuel(&searchable),
        transmission: parse_transmission(&searchable),
        source: Source::Scraped,
        scraped_at,
        title,
    }
}
