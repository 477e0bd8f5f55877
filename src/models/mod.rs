use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Listing ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyListing {
    pub address: String,
    pub street_address: String,
    pub postcode: String,           // always a substring of `address`
    pub price: f64,
    pub price_qualifier: Option<String>, // "Offers over", "Guide price", ...
}

// ── Deprivation ranks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankEntry {
    pub domain: String,
    pub rank: u32,
}

// ── Area profile ──────────────────────────────────────────────────────────────

/// `label → value` in document order. Re-inserting a label overwrites the
/// value but keeps the label's original position.
pub type SectionRecord = IndexMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HousingInfo {
    pub description: String,
    pub pie_chart_data: IndexMap<String, f64>,
}

pub type HousingRecord = IndexMap<String, HousingInfo>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AreaProfile {
    pub housing: HousingRecord,
    pub summary: SectionRecord,
    pub culture: SectionRecord,
    pub employment: SectionRecord,
    pub nearby: SectionRecord,
    pub broadband: SectionRecord, // sourced from the `services` tab
}

// ── Sale history ──────────────────────────────────────────────────────────────

pub type SaleHistory = Vec<f64>;

// ── Aggregate ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub property_details: PropertyListing,
    pub simd_data: Vec<RankEntry>,
    pub geographical_data: AreaProfile,
    pub recent_sale_prices: SaleHistory,
}
