use scraper::Html;
use tracing::debug;
use url::Url;

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::cleaner::parse_price;
use crate::extractors::dom::{selector, text_of};
use crate::models::SaleHistory;

/// Sold-prices search keyed on the street address.
/// e.g. `/house-prices/detail.html?country=england&locationIdentifier=REGION%5E12+High+St&searchLocation=12+High+St`
pub fn sale_history_url(base_url: &str, street_address: &str) -> ExtractResult<String> {
    let endpoint = format!("{}/house-prices/detail.html", base_url.trim_end_matches('/'));
    let region = format!("REGION^{}", street_address);

    let url = Url::parse_with_params(
        &endpoint,
        &[
            ("country", "england"),
            ("locationIdentifier", region.as_str()),
            ("searchLocation", street_address),
        ],
    )
    .map_err(|e| ExtractError::Fetch {
        url: endpoint.clone(),
        reason: e.to_string(),
    })?;

    Ok(url.into())
}

/// Every `td.soldPrice` in document order. No rows is a valid, empty history.
pub fn parse_sale_history(html: &str) -> ExtractResult<SaleHistory> {
    let doc = Html::parse_document(html);
    let cell_sel = selector("td.soldPrice")?;

    let prices = doc
        .select(&cell_sel)
        .map(|cell| parse_price(&text_of(cell)).ok_or(ExtractError::ValueParseError("sold price")))
        .collect::<ExtractResult<SaleHistory>>()?;

    debug!("sale history: {} sold prices", prices.len());
    Ok(prices)
}
