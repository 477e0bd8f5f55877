//! Small query helpers over `scraper` documents.

use scraper::{ElementRef, Selector};

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::cleaner::normalise_whitespace;

pub fn selector(css: &str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        css: css.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Visible text of an element, whitespace-normalised.
pub fn text_of(el: ElementRef<'_>) -> String {
    normalise_whitespace(&el.text().collect::<String>())
}

/// Text nodes that are direct children of `el`, ignoring nested elements.
pub fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|node| node.value().as_text())
        .fold(String::new(), |mut acc, t| {
            acc.push_str(t);
            acc
        })
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Nearest ancestor element matching `pred`.
pub fn closest<'a>(
    el: ElementRef<'a>,
    pred: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|anc| pred(*anc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_own_text_skips_children() {
        let doc = Html::parse_fragment("<span>£100 <b>£5</b></span>");
        let span = doc.select(&selector("span").unwrap()).next().unwrap();
        assert_eq!(own_text(span).trim(), "£100");
        assert_eq!(text_of(span), "£100 £5");
    }

    #[test]
    fn test_closest() {
        let doc = Html::parse_fragment(
            r##"<div class="tab-content"><ul><li><a href="#x">x</a></li></ul></div>"##,
        );
        let a = doc.select(&selector("a").unwrap()).next().unwrap();
        let found = closest(a, |e| e.value().name() == "div" && has_class(e, "tab-content"));
        assert!(found.is_some());
        assert!(closest(a, |e| e.value().name() == "table").is_none());
    }

    #[test]
    fn test_bad_selector_is_an_error() {
        assert!(matches!(selector("div[[").unwrap_err(), ExtractError::Selector { .. }));
    }
}
