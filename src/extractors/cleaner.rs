// ── Text cleaning helpers shared by the extractors ──────────────────────────

/// Parse a displayed currency amount: strip `£` and thousands separators.
/// "£450,000" → 450000.0 | "£1,250.50" → 1250.5 | "POA" → None
pub fn parse_price(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != '£' && *c != ',')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Parse a rank cell: drop every non-digit, then read what is left.
/// Ranks start at 1, so zero is rejected too.
/// "1,234" → 1234 | "#56 of 6976" → 566976 | "N/A" → None | "#0" → None
pub fn parse_rank(s: &str) -> Option<u32> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().filter(|rank| *rank > 0)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalise_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "Population:" → "Population"
pub fn clean_label(s: &str) -> String {
    normalise_whitespace(s).trim_end_matches(':').trim_end().to_string()
}

/// URL path form of a postcode. "NW1 6XE" → "nw16xe"
pub fn postcode_slug(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
