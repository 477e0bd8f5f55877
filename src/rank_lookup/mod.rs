//! SIMD deprivation-rank lookup.
//!
//! The lookup site only renders ranks after a postcode is typed into a form
//! and submitted, so this drives a real browser:
//!
//!   Init → Navigating → Submitting → AwaitingResults → ExtractingRows → Done
//!
//! Both waits share one timeout; expiry is terminal (`AutomationTimeout`).
//! Every lookup opens its own session and closes it on every exit path.

pub mod webdriver;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::cleaner::parse_rank;
use crate::models::RankEntry;

const POSTCODE_INPUT: &str = "postcode";
const SUBMIT_BUTTON: &str = "postcodeButton";
const RESULTS_TABLE: &str = "componenttable";

// ── Protocol state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStage {
    Init,
    Navigating,
    Submitting,
    AwaitingResults,
    ExtractingRows,
    Done,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LookupStage::Init => "starting",
            LookupStage::Navigating => "navigating",
            LookupStage::Submitting => "submitting the postcode",
            LookupStage::AwaitingResults => "awaiting results",
            LookupStage::ExtractingRows => "extracting rows",
            LookupStage::Done => "done",
        };
        f.write_str(s)
    }
}

// ── Browser seam ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    XPath(String),
}

/// The primitives the lookup needs from a browser.
///
/// Wait methods return `Ok(false)` when the timeout expires; `Err` is kept for
/// the session itself failing.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> ExtractResult<()>;
    async fn fill(&mut self, target: &Locator, text: &str) -> ExtractResult<()>;
    async fn wait_clickable(&mut self, target: &Locator, timeout: Duration) -> ExtractResult<bool>;
    async fn wait_present(&mut self, target: &Locator, timeout: Duration) -> ExtractResult<bool>;
    /// Pointer-move onto the element, then click it.
    async fn move_and_click(&mut self, target: &Locator) -> ExtractResult<()>;
    async fn count(&mut self, target: &Locator) -> ExtractResult<usize>;
    async fn text(&mut self, target: &Locator) -> ExtractResult<String>;
    async fn close(&mut self) -> ExtractResult<()>;
}

/// Opens a fresh, exclusively owned session per lookup.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> ExtractResult<Box<dyn BrowserSession>>;
}

// ── Automator ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RankLookup {
    factory: Arc<dyn SessionFactory>,
    site_url: String,
    wait_timeout: Duration,
}

impl RankLookup {
    pub fn new(factory: Arc<dyn SessionFactory>, site_url: impl Into<String>, wait_timeout: Duration) -> Self {
        Self {
            factory,
            site_url: site_url.into(),
            wait_timeout,
        }
    }

    /// Runs on its own task: dropping the returned future does not abandon
    /// the browser session before `close` has run.
    pub async fn lookup(&self, postcode: &str) -> ExtractResult<Vec<RankEntry>> {
        let this = self.clone();
        let postcode = postcode.to_string();
        tokio::spawn(async move { this.run(&postcode).await })
            .await
            .map_err(|e| ExtractError::Browser(format!("rank lookup task failed: {}", e)))?
    }

    async fn run(&self, postcode: &str) -> ExtractResult<Vec<RankEntry>> {
        info!("Looking up deprivation ranks for {}", postcode);
        let mut session = self.factory.open().await?;

        let mut stage = LookupStage::Init;
        let outcome = self.drive(session.as_mut(), postcode, &mut stage).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        match &outcome {
            Ok(entries) => info!("{}: {} ranked domains", postcode, entries.len()),
            Err(e) => warn!("{}: rank lookup failed while {}: {}", postcode, stage, e),
        }
        outcome
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        postcode: &str,
        stage: &mut LookupStage,
    ) -> ExtractResult<Vec<RankEntry>> {
        advance(stage, LookupStage::Navigating);
        session.navigate(&self.site_url).await?;

        advance(stage, LookupStage::Submitting);
        let button = Locator::Id(SUBMIT_BUTTON.to_string());
        session.fill(&Locator::Id(POSTCODE_INPUT.to_string()), postcode).await?;
        if !session.wait_clickable(&button, self.wait_timeout).await? {
            return Err(ExtractError::AutomationTimeout(LookupStage::Submitting));
        }
        // The site's click handler misses bare clicks; it needs the hover first.
        session.move_and_click(&button).await?;

        advance(stage, LookupStage::AwaitingResults);
        let table = Locator::Id(RESULTS_TABLE.to_string());
        if !session.wait_present(&table, self.wait_timeout).await? {
            return Err(ExtractError::AutomationTimeout(LookupStage::AwaitingResults));
        }

        advance(stage, LookupStage::ExtractingRows);
        let row_count = session.count(&row_locator(None)).await?;
        let mut entries = Vec::new();

        // Row 1 is the header.
        for row in 2..=row_count {
            let domain = session.text(&cell_locator(row, 1)).await?.trim().to_string();
            let rank_text = session.text(&cell_locator(row, 2)).await?;
            let rank_text = rank_text.trim();
            if rank_text.is_empty() {
                debug!("row {} ({}): no rank, skipped", row, domain);
                continue;
            }
            let rank = parse_rank(rank_text).ok_or(ExtractError::ValueParseError("rank"))?;
            debug!("row {}: {} = {}", row, domain, rank);
            entries.push(RankEntry { domain, rank });
        }

        advance(stage, LookupStage::Done);
        Ok(entries)
    }
}

fn advance(stage: &mut LookupStage, next: LookupStage) {
    debug!("rank lookup: {:?} → {:?}", stage, next);
    *stage = next;
}

fn row_locator(row: Option<usize>) -> Locator {
    match row {
        Some(i) => Locator::XPath(format!(r#"//*[@id="{}"]/tbody/tr[{}]"#, RESULTS_TABLE, i)),
        None => Locator::XPath(format!(r#"//*[@id="{}"]/tbody/tr"#, RESULTS_TABLE)),
    }
}

fn cell_locator(row: usize, col: usize) -> Locator {
    match row_locator(Some(row)) {
        Locator::XPath(row_path) => Locator::XPath(format!("{}/td[{}]", row_path, col)),
        other => other,
    }
}
