use scraper::Html;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::cleaner::parse_price;
use crate::extractors::dom::{own_text, selector, text_of};
use crate::extractors::postcode::{PostcodeMatch, find_postcode};
use crate::models::PropertyListing;

/// Parse a property listing page.
///
/// Address, postcode and price are required; the price qualifier is optional.
pub fn parse_listing_page(html: &str) -> ExtractResult<PropertyListing> {
    let doc = Html::parse_document(html);

    let address = doc
        .select(&selector(r#"[itemprop="streetAddress"]"#)?)
        .next()
        .map(text_of)
        .ok_or(ExtractError::StructureMismatch("address"))?;

    let postcode = find_postcode(&address).ok_or(ExtractError::StructureMismatch("postcode"))?;
    let street_address = street_address(&address, postcode);

    // The asking price is the first span whose own text carries a £ sign.
    let price_text = doc
        .select(&selector("span")?)
        .find(|span| own_text(*span).contains('£'))
        .map(text_of)
        .ok_or(ExtractError::StructureMismatch("price"))?;
    let price = parse_price(&price_text).ok_or(ExtractError::ValueParseError("price"))?;

    let price_qualifier = doc
        .select(&selector(r#"[data-testid="priceQualifier"]"#)?)
        .next()
        .map(text_of)
        .filter(|q| !q.is_empty());

    debug!(
        "listing: postcode={} price={} qualifier={:?}",
        postcode.text, price, price_qualifier
    );

    Ok(PropertyListing {
        street_address,
        postcode: postcode.text.to_string(),
        price,
        price_qualifier,
        address,
    })
}

/// Address with the postcode removed.
///
/// When the postcode closes the address it is cut off whole, so a two-part
/// postcode leaves no fragment behind. Otherwise fall back to dropping the last
/// whitespace token, which is only right when the postcode's inward code is
/// that token.
fn street_address(address: &str, postcode: PostcodeMatch<'_>) -> String {
    if address[postcode.end..].trim().is_empty() {
        return address[..postcode.start].trim_end().to_string();
    }

    let tokens: Vec<&str> = address.split_whitespace().collect();
    tokens[..tokens.len().saturating_sub(1)].join(" ")
}
