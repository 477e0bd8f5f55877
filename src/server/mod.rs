//! HTTP front end: one query endpoint over the pipeline.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;
use url::Url;

use crate::error::ExtractError;
use crate::models::AnalysisResult;
use crate::pipeline::Pipeline;

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub url: String,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/property_analysis", get(property_analysis))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn property_analysis(
    State(pipeline): State<Arc<Pipeline>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<AnalysisResult>, ApiError> {
    Url::parse(&query.url).map_err(|e| ApiError::BadRequest(format!("invalid url: {}", e)))?;
    let result = pipeline.analyse(&query.url).await?;
    Ok(Json(result))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Extract(ExtractError),
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        ApiError::Extract(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Extract(e) => {
                error!("Analysis failed: {}", e);
                let status = match e {
                    ExtractError::AutomationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    ExtractError::Selector { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourcesConfig;
    use crate::extractors::PageFetcher;
    use crate::pipeline::fake::FakeFetcher;
    use crate::rank_lookup::RankLookup;
    use crate::rank_lookup::fake::{FakeFactory, Script};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(fetcher: FakeFetcher, factory: FakeFactory) -> Router {
        let ranks = RankLookup::new(Arc::new(factory), "https://simd.test/", Duration::from_secs(1));
        let sources = SourcesConfig {
            street_check_base_url: "https://streetcheck.test".into(),
            sale_history_base_url: "https://sold.test".into(),
            rank_lookup_url: "https://simd.test/".into(),
        };
        let fetcher: Arc<dyn PageFetcher> = Arc::new(fetcher);
        router(Arc::new(Pipeline::new(fetcher, ranks, sources)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const LISTING: &str = r#"<h2 itemprop="streetAddress">4 Rose Street, EH2 2PR</h2><span>£325,000</span>"#;

    #[tokio::test]
    async fn test_returns_aggregate_document() {
        let fetcher = FakeFetcher::default()
            .page("https://listings.test/", LISTING)
            .page("https://streetcheck.test/", "<html></html>")
            .page("https://sold.test/", "<html></html>");
        let factory = FakeFactory::with_rows(&[("Income", "88")]);

        let (status, body) = get_json(
            app(fetcher, factory),
            "/property_analysis?url=https%3A%2F%2Flistings.test%2Fp%2F1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["property_details"]["postcode"], "EH2 2PR");
        assert_eq!(body["property_details"]["street_address"], "4 Rose Street,");
        assert_eq!(body["simd_data"], json!([{ "domain": "Income", "rank": 88 }]));
        assert_eq!(body["geographical_data"]["housing"], json!({}));
        assert_eq!(body["recent_sale_prices"], json!([]));
    }

    #[tokio::test]
    async fn test_structure_mismatch_is_named() {
        let fetcher = FakeFetcher::default().page("https://listings.test/", "<span>£1</span>");
        let (status, body) = get_json(
            app(fetcher, FakeFactory::with_rows(&[])),
            "/property_analysis?url=https%3A%2F%2Flistings.test%2Fp%2F1",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().unwrap().contains("address"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let fetcher = FakeFetcher::default()
            .page("https://listings.test/", LISTING)
            .page("https://streetcheck.test/", "<html></html>")
            .page("https://sold.test/", "<html></html>");
        let factory = FakeFactory::new(Script {
            clickable: false,
            results_appear: false,
            rows: vec![],
            ..Default::default()
        });

        let (status, body) = get_json(
            app(fetcher, factory),
            "/property_analysis?url=https%3A%2F%2Flistings.test%2Fp%2F1",
        )
        .await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["detail"].as_str().unwrap().contains("submitting"));
    }

    #[tokio::test]
    async fn test_rejects_non_url() {
        let (status, _) = get_json(
            app(FakeFetcher::default(), FakeFactory::with_rows(&[])),
            "/property_analysis?url=not-a-url",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
