//! Pipeline orchestrator: listing → (ranks ∥ area profile ∥ sale history).
//!
//! 1. Fetch and parse the listing. It yields the postcode and street address
//!    everything else is keyed on, so its failure ends the request.
//! 2. Run the three dependent extractors concurrently. Any one failing fails
//!    the whole request; no partial result is ever returned.
//!
//! Nothing is shared between calls except the read-only fetcher, config and
//! session factory. Each rank lookup opens its own browser session.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, SourcesConfig};
use crate::error::ExtractResult;
use crate::extractors::http_client::HttpClient;
use crate::extractors::{PageFetcher, fetch_area_profile, fetch_listing, fetch_sale_history};
use crate::models::AnalysisResult;
use crate::rank_lookup::webdriver::WebDriverFactory;
use crate::rank_lookup::RankLookup;
use crate::utils::Timer;

#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    ranks: RankLookup,
    sources: SourcesConfig,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, ranks: RankLookup, sources: SourcesConfig) -> Self {
        Self { fetcher, ranks, sources }
    }

    /// Live pipeline: reqwest for pages, chromedriver for the rank lookup.
    pub fn from_config(config: &AppConfig) -> ExtractResult<Self> {
        let fetcher = Arc::new(HttpClient::new(&config.http)?);
        let ranks = RankLookup::new(
            Arc::new(WebDriverFactory::new(&config.browser)),
            config.sources.rank_lookup_url.clone(),
            config.browser.wait_timeout(),
        );
        Ok(Self::new(fetcher, ranks, config.sources.clone()))
    }

    pub fn ranks(&self) -> &RankLookup {
        &self.ranks
    }

    pub fn fetcher(&self) -> &dyn PageFetcher {
        self.fetcher.as_ref()
    }

    pub fn sources(&self) -> &SourcesConfig {
        &self.sources
    }

    pub async fn analyse(&self, listing_url: &str) -> ExtractResult<AnalysisResult> {
        let mut timer = Timer::start(format!("Analysis of {}", listing_url));

        let listing = fetch_listing(self.fetcher(), listing_url).await.inspect_err(|e| {
            warn!("Listing extraction failed: {}", e);
        })?;
        info!(
            "Listing: {} | postcode {} | £{}",
            listing.address, listing.postcode, listing.price
        );
        timer.lap("listing");

        // `join!` rather than `try_join!`: every branch runs to completion, so
        // the rank lookup always reaches its session teardown.
        let (ranks, profile, sales) = tokio::join!(
            self.ranks.lookup(&listing.postcode),
            fetch_area_profile(self.fetcher(), &self.sources, &listing.postcode),
            fetch_sale_history(
                self.fetcher(),
                &self.sources,
                &listing.postcode,
                &listing.street_address
            ),
        );
        timer.lap("dependents");
        let (simd_data, geographical_data, recent_sale_prices) = match (ranks, profile, sales) {
            (Ok(r), Ok(p), Ok(s)) => (r, p, s),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                warn!("Analysis aborted: {}", e);
                return Err(e);
            }
        };

        info!(
            "=== Done in {:.2?}: {} ranks | {} area sections populated | {} past sales ===",
            timer.elapsed(),
            simd_data.len(),
            populated_sections(&geographical_data),
            recent_sale_prices.len()
        );

        Ok(AnalysisResult {
            property_details: listing,
            simd_data,
            geographical_data,
            recent_sale_prices,
        })
    }
}

fn populated_sections(profile: &crate::models::AreaProfile) -> usize {
    [
        !profile.housing.is_empty(),
        !profile.summary.is_empty(),
        !profile.culture.is_empty(),
        !profile.employment.is_empty(),
        !profile.nearby.is_empty(),
        !profile.broadband.is_empty(),
    ]
    .into_iter()
    .filter(|p| *p)
    .count()
}


#[cfg(test)]
mod tests {
    use super::fake::FakeFetcher;
    use super::*;
    use crate::error::ExtractError;
    use crate::rank_lookup::fake::{FakeFactory, Script};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    const LISTING_URL: &str = "https://listings.test/properties/123";

    const LISTING: &str = r#"<html><body>
        <h1 itemprop="streetAddress">221B Baker Street, NW1 6XE</h1>
        <div><span>£450,000</span><div data-testid="priceQualifier">Offers over</div></div>
    </body></html>"#;

    const STREETCHECK: &str = r##"<div class="tab-content">
        <a href="#summary">Summary</a>
        <div id="summary"><div class="row">
            <div class="col-md-6">Population:</div>
            <div class="col-md-6" style="font-weight: bold;">870</div>
        </div></div>
    </div>"##;

    const SOLD: &str = r#"<table>
        <tr><td class="soldPrice">£250,000</td></tr>
        <tr><td class="soldPrice">£310,500</td></tr>
    </table>"#;

    fn sources() -> SourcesConfig {
        SourcesConfig {
            street_check_base_url: "https://streetcheck.test".into(),
            sale_history_base_url: "https://sold.test".into(),
            rank_lookup_url: "https://simd.test/".into(),
        }
    }

    fn pipeline(fetcher: FakeFetcher, factory: Arc<FakeFactory>) -> (Pipeline, Arc<FakeFetcher>) {
        let fetcher = Arc::new(fetcher);
        let ranks = RankLookup::new(factory, "https://simd.test/", Duration::from_secs(1));
        (
            Pipeline::new(Arc::clone(&fetcher) as Arc<dyn PageFetcher>, ranks, sources()),
            fetcher,
        )
    }

    fn full_fetcher() -> FakeFetcher {
        FakeFetcher::default()
            .page(LISTING_URL, LISTING)
            .page("https://streetcheck.test/postcode/nw16xe", STREETCHECK)
            .page("https://sold.test/house-prices/detail.html", SOLD)
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let factory = Arc::new(FakeFactory::with_rows(&[("Income", "1,204"), ("Crime", "")]));
        let (pipeline, fetcher) = pipeline(full_fetcher(), Arc::clone(&factory));

        let result = assert_ok!(pipeline.analyse(LISTING_URL).await);

        assert_eq!(result.property_details.postcode, "NW1 6XE");
        assert_eq!(result.property_details.street_address, "221B Baker Street,");
        assert_eq!(result.property_details.price, 450000.0);
        assert_eq!(result.property_details.price_qualifier.as_deref(), Some("Offers over"));
        assert_eq!(result.simd_data.len(), 1);
        assert_eq!(result.simd_data[0].rank, 1204);
        assert_eq!(result.geographical_data.summary.get("Population").map(String::as_str), Some("870"));
        assert!(result.geographical_data.housing.is_empty());
        assert_eq!(result.recent_sale_prices, vec![250000.0, 310500.0]);

        // The postcode drives the downstream calls.
        let journal = factory.journal.lock().unwrap();
        assert!(journal.calls.iter().any(|c| c.ends_with(" NW1 6XE")));
        assert_eq!(journal.closed, 1);
        let requested = fetcher.requested.lock().unwrap();
        assert!(requested.iter().any(|u| u == "https://streetcheck.test/postcode/nw16xe"));
        assert!(requested.iter().any(|u| u.contains("searchLocation=221B+Baker+Street%2C")));
    }

    #[tokio::test]
    async fn test_identical_snapshots_give_identical_results() {
        let factory = Arc::new(FakeFactory::with_rows(&[("Income", "7"), ("Access", "12")]));
        let (pipeline, _) = pipeline(full_fetcher(), factory);

        let first = pipeline.analyse(LISTING_URL).await.unwrap();
        let second = pipeline.analyse(LISTING_URL).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_listing_failure_stops_everything() {
        let factory = Arc::new(FakeFactory::with_rows(&[("Income", "7")]));
        let fetcher = FakeFetcher::default().page(LISTING_URL, "<html><body>Gone</body></html>");
        let (pipeline, fetcher) = pipeline(fetcher, Arc::clone(&factory));

        let err = assert_err!(pipeline.analyse(LISTING_URL).await);
        assert!(matches!(err, ExtractError::StructureMismatch("address")));
        assert_eq!(fetcher.requested.lock().unwrap().len(), 1);
        assert_eq!(factory.journal.lock().unwrap().opened, 0);
    }

    #[tokio::test]
    async fn test_sibling_failure_waits_for_session_teardown() {
        let factory = Arc::new(FakeFactory::new(Script {
            clickable: true,
            results_appear: true,
            rows: vec![("Domain".into(), "Rank".into()), ("Income".into(), "7".into())],
            results_delay: Some(Duration::from_millis(100)),
            ..Default::default()
        }));
        let fetcher = FakeFetcher::default().page(LISTING_URL, LISTING);
        let (pipeline, _) = pipeline(fetcher, Arc::clone(&factory));

        let err = assert_err!(pipeline.analyse(LISTING_URL).await);
        assert!(matches!(err, ExtractError::Fetch { .. }));

        let journal = factory.journal.lock().unwrap();
        assert_eq!(journal.opened, 1);
        assert_eq!(journal.closed, 1);
    }

    #[tokio::test]
    async fn test_dependent_failure_is_fatal() {
        let factory = Arc::new(FakeFactory::with_rows(&[("Income", "7")]));
        let fetcher = FakeFetcher::default()
            .page(LISTING_URL, LISTING)
            .page("https://streetcheck.test/postcode/nw16xe", STREETCHECK);
        let (pipeline, _) = pipeline(fetcher, factory);

        let err = assert_err!(pipeline.analyse(LISTING_URL).await);
        assert!(matches!(err, ExtractError::Fetch { .. }));
    }
}
