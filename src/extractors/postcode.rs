use regex::Regex;
use std::sync::LazyLock;

/// Outward code (one or two letters, a digit, an optional letter or digit),
/// optional whitespace, then the inward code (a digit and two letters).
static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z]{1,2}\d[A-Za-z\d]?\s*\d[A-Za-z]{2}").expect("postcode pattern is valid")
});

/// A postcode located inside an address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostcodeMatch<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// First UK-postcode-shaped substring of `address`, as written.
pub fn find_postcode(address: &str) -> Option<PostcodeMatch<'_>> {
    POSTCODE_RE.find(address).map(|m| PostcodeMatch {
        text: m.as_str(),
        start: m.start(),
        end: m.end(),
    })
}
