//! Listing extraction from fetched markup.
//!
//! Strategies run in a fixed order and the first one that yields any
//! fragment wins. Ordering between strategies is a heuristic, not a contract:
//! the site's markup changes and the list is expected to change with it.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::targets::TargetCatalog;

/// Container selectors tried in order by the `container-selectors` strategy.
const CONTAINER_SELECTORS: &[&str] = &[
    "article",
    r#"div[class*="card"]"#,
    r#"div[class*="item"]"#,
    r#"div[class*="listing"]"#,
    r#"div[class*="product"]"#,
    r#"a[class*="car"]"#,
    r#"div[class*="vehicle"]"#,
    "div.gtm-car-item",
];

const SCAN_SELECTOR: &str = "div, article, section, a, li";
const DATA_ATTRIBUTE_SELECTOR: &str = r#"[data-vehicle], [data-testid*="car"]"#;
const TITLE_HINT_SELECTOR: &str = r#"h1, h2, h3, h4, [class*="title"], [class*="name"]"#;
const PRICE_HINT_SELECTOR: &str = r#"[class*="price"], [class*="amount"], [class*="cost"]"#;

/// Longest text accepted as a title hint.
const MAX_TITLE_HINT_CHARS: usize = 150;

/// Raw text pulled out of one listing element, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFragment {
    /// Element text, one line per non-blank text node.
    pub text: String,
    /// Text of the first short heading/title/name element inside the fragment.
    pub title: Option<String>,
    /// Text of the first price-like element that contains a digit.
    pub price_text: Option<String>,
}

impl RawFragment {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Brand knowledge the strategies match against.
#[derive(Clone, Debug)]
pub struct ExtractRules {
    brand_keywords: Vec<String>,
}

impl ExtractRules {
    pub fn new(brand_keywords: Vec<String>) -> Self {
        Self {
            brand_keywords: brand_keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn from_catalog(catalog: &TargetCatalog) -> Self {
        Self::new(catalog.brand_keywords.clone())
    }

    fn mentions_brand(&self, lower: &str) -> bool {
        self.brand_keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

pub type StrategyFn = fn(&Html, &ExtractRules) -> Vec<RawFragment>;

/// A named extraction strategy.
#[derive(Clone, Copy)]
pub struct ExtractStrategy {
    pub name: &'static str,
    pub run: StrategyFn,
}

/// Strategies in priority order.
pub const STRATEGIES: &[ExtractStrategy] = &[
    ExtractStrategy {
        name: "container-selectors",
        run: container_selectors,
    },
    ExtractStrategy {
        name: "keyword-scan",
        run: keyword_scan,
    },
    ExtractStrategy {
        name: "data-attributes",
        run: data_attributes,
    },
    ExtractStrategy {
        name: "text-lines",
        run: text_lines,
    },
];

/// Fragments found on a page and the strategy that found them.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub strategy: Option<&'static str>,
    pub fragments: Vec<RawFragment>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Runs [`STRATEGIES`] over `markup` until one yields fragments.
///
/// Malformed or empty markup produces an empty extraction, never an error.
pub fn extract(markup: &str, rules: &ExtractRules) -> Extraction {
    extract_with(markup, rules, STRATEGIES)
}

pub fn extract_with(markup: &str, rules: &ExtractRules, strategies: &[ExtractStrategy]) -> Extraction {
    if markup.trim().is_empty() {
        return Extraction::default();
    }
    let document = Html::parse_document(markup);

    for strategy in strategies {
        let fragments = (strategy.run)(&document, rules);
        debug!("strategy {} yielded {} fragments", strategy.name, fragments.len());
        if !fragments.is_empty() {
            return Extraction {
                strategy: Some(strategy.name),
                fragments,
            };
        }
    }
    Extraction::default()
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!("skipping selector {}: {:?}", css, e);
            None
        }
    }
}

fn text_lines_of(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn joined_text(element: ElementRef<'_>) -> String {
    text_lines_of(element).join("\n")
}

fn has_price_marker(lower: &str) -> bool {
    lower.contains('₹') || lower.contains("lakh") || lower.contains("rs.") || lower.contains("price")
}

fn to_fragment(element: ElementRef<'_>) -> RawFragment {
    RawFragment {
        text: joined_text(element),
        title: first_hint(element, TITLE_HINT_SELECTOR, |t| {
            t.chars().count() <= MAX_TITLE_HINT_CHARS
        }),
        price_text: first_hint(element, PRICE_HINT_SELECTOR, |t| {
            t.chars().any(|c| c.is_ascii_digit())
        }),
    }
}

fn first_hint<F>(element: ElementRef<'_>, css: &str, accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let selector = parse_selector(css)?;
    element
        .select(&selector)
        .map(|el| text_lines_of(el).join(" "))
        .find(|t| !t.is_empty() && accept(t))
}

fn container_selectors(document: &Html, rules: &ExtractRules) -> Vec<RawFragment> {
    for css in CONTAINER_SELECTORS {
        let Some(selector) = parse_selector(css) else {
            continue;
        };
        let matches: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if matches.is_empty() {
            continue;
        }
        debug!("container selector {} matched {} elements", css, matches.len());
        let ids: HashSet<_> = matches.iter().map(|el| el.id()).collect();

        // Keep only the outermost matches so a card's own `card-*` children
        // do not become fragments of their own.
        return matches
            .into_iter()
            .filter(|el| !el.ancestors().any(|a| ids.contains(&a.id())))
            .filter(|el| {
                let lower = joined_text(*el).to_lowercase();
                rules.mentions_brand(&lower)
                    || lower.contains('₹')
                    || lower.contains("km")
                    || lower.contains("car")
            })
            .map(to_fragment)
            .collect();
    }
    Vec::new()
}

fn keyword_scan(document: &Html, rules: &ExtractRules) -> Vec<RawFragment> {
    let Some(selector) = parse_selector(SCAN_SELECTOR) else {
        return Vec::new();
    };
    let matching: Vec<ElementRef<'_>> = document
        .select(&selector)
        .filter(|el| {
            let lower = joined_text(*el).to_lowercase();
            rules.mentions_brand(&lower)
                && (lower.contains('₹') || lower.contains("km") || lower.contains("price"))
        })
        .collect();
    let ids: HashSet<_> = matching.iter().map(|el| el.id()).collect();

    // Keep only the innermost matches so a card and its wrappers yield one fragment.
    matching
        .into_iter()
        .filter(|el| {
            !el.descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .any(|d| ids.contains(&d.id()))
        })
        .map(to_fragment)
        .collect()
}

fn data_attributes(document: &Html, _rules: &ExtractRules) -> Vec<RawFragment> {
    let Some(selector) = parse_selector(DATA_ATTRIBUTE_SELECTOR) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(to_fragment)
        .filter(|f| !f.text.is_empty())
        .collect()
}

fn text_lines(document: &Html, rules: &ExtractRules) -> Vec<RawFragment> {
    text_lines_of(document.root_element())
        .into_iter()
        .filter(|line| {
            let lower = line.to_lowercase();
            rules.mentions_brand(&lower) && has_price_marker(&lower)
        })
        .map(RawFragment::from_text)
        .collect()
}
