pub mod area_profile;
pub mod cleaner;
pub mod dom;
pub mod http_client;
pub mod listing;
pub mod postcode;
pub mod sale_history;

use async_trait::async_trait;
use tracing::info;

use crate::config::SourcesConfig;
use crate::error::ExtractResult;
use crate::models::{AreaProfile, PropertyListing, SaleHistory};

use self::area_profile::{area_profile_url, parse_area_profile};
use self::listing::parse_listing_page;
use self::sale_history::{parse_sale_history, sale_history_url};

// ── Fetch trait ───────────────────────────────────────────────────────────────

/// Swappable page source: the live HTTP client, or canned HTML in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> ExtractResult<String>;
}

// ── Static-HTML extractors ────────────────────────────────────────────────────

pub async fn fetch_listing(fetcher: &dyn PageFetcher, url: &str) -> ExtractResult<PropertyListing> {
    info!("Fetching listing {}", url);
    let html = fetcher.get_text(url).await?;
    parse_listing_page(&html)
}

pub async fn fetch_area_profile(
    fetcher: &dyn PageFetcher,
    sources: &SourcesConfig,
    postcode: &str,
) -> ExtractResult<AreaProfile> {
    let url = area_profile_url(&sources.street_check_base_url, postcode);
    info!("Fetching area profile for {} ({})", postcode, url);
    let html = fetcher.get_text(&url).await?;
    parse_area_profile(&html)
}

pub async fn fetch_sale_history(
    fetcher: &dyn PageFetcher,
    sources: &SourcesConfig,
    postcode: &str,
    street_address: &str,
) -> ExtractResult<SaleHistory> {
    let url = sale_history_url(&sources.sale_history_base_url, street_address)?;
    info!("Fetching sale history for {} / {} ({})", street_address, postcode, url);
    let html = fetcher.get_text(&url).await?;
    parse_sale_history(&html)
}
