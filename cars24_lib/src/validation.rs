use crate::error::Cars24Error;
use crate::targets::TargetCatalog;

pub const MAX_CITY_LENGTH: usize = 40;
pub const MAX_LISTINGS_PER_CITY: usize = 200;
pub const MAX_SAMPLE_SIZE: usize = 10_000;
pub const MAX_BINS: usize = 50;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, Cars24Error> {
    if input.len() > max_len {
        return Err(Cars24Error::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(Cars24Error::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a single city name against the catalog, returning its canonical name.
///
/// Unknown names get a suggestion when a catalog city is close enough.
pub fn validate_city(catalog: &TargetCatalog, input: &str) -> Result<String, Cars24Error> {
    let cleaned = sanitize_text(input, MAX_CITY_LENGTH)?;
    if let Some(city) = catalog.resolve_city(&cleaned) {
        return Ok(city.name.clone());
    }

    let lowered = cleaned.to_lowercase();
    let suggestion = catalog
        .cities
        .iter()
        .map(|c| (strsim::jaro_winkler(&lowered, &c.name.to_lowercase()), &c.name))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let known: Vec<&str> = catalog.cities.iter().map(|c| c.name.as_str()).collect();
    Err(Cars24Error::InvalidInput(match suggestion {
        Some((_, name)) => format!("unknown city '{}' (did you mean '{}'?)", cleaned, name),
        None => format!("unknown city '{}'. Valid: {}", cleaned, known.join(", ")),
    }))
}

/// Validate a comma-separated city list. Duplicates collapse, order is kept.
pub fn validate_cities(catalog: &TargetCatalog, input: &str) -> Result<Vec<String>, Cars24Error> {
    let mut cities: Vec<String> = Vec::new();
    for part in input.split(',').filter(|p| !p.trim().is_empty()) {
        let city = validate_city(catalog, part)?;
        if !cities.contains(&city) {
            cities.push(city);
        }
    }
    if cities.is_empty() {
        return Err(Cars24Error::InvalidInput(
            "at least one city is required".to_string(),
        ));
    }
    Ok(cities)
}

pub fn validate_max_per_city(value: usize) -> Result<usize, Cars24Error> {
    validate_range("max-per-city", value, MAX_LISTINGS_PER_CITY)
}

pub fn validate_sample_size(value: usize) -> Result<usize, Cars24Error> {
    validate_range("sample-size", value, MAX_SAMPLE_SIZE)
}

pub fn validate_bins(value: usize) -> Result<usize, Cars24Error> {
    validate_range("bins", value, MAX_BINS)
}

fn validate_range(name: &str, value: usize, max: usize) -> Result<usize, Cars24Error> {
    if value < 1 || value > max {
        return Err(Cars24Error::InvalidInput(format!(
            "{} must be between 1 and {}",
            name, max
        )));
    }
    Ok(value)
}
