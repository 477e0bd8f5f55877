//! Neighbourhood statistics (StreetCheck postcode pages).
//!
//! The page is a set of Bootstrap tabs. Each section has a tab link
//! `<a href="#{id}">` and a panel `<div id="{id}">` inside the same
//! `div.tab-content`. Sparse postcodes simply omit tabs, so a missing link
//! yields an empty section rather than an error.

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::cleaner::{clean_label, postcode_slug};
use crate::extractors::dom::{closest, has_class, selector, text_of};
use crate::models::{AreaProfile, HousingInfo, HousingRecord, SectionRecord};

pub fn area_profile_url(base_url: &str, postcode: &str) -> String {
    format!(
        "{}/postcode/{}",
        base_url.trim_end_matches('/'),
        postcode_slug(postcode)
    )
}

pub fn parse_area_profile(html: &str) -> ExtractResult<AreaProfile> {
    let doc = Html::parse_document(html);

    Ok(AreaProfile {
        housing: match find_panel(&doc, "housing")? {
            Some(panel) => parse_housing(panel)?,
            None => HousingRecord::new(),
        },
        summary: parse_section(&doc, "summary")?,
        culture: parse_section(&doc, "culture")?,
        employment: parse_section(&doc, "employment")?,
        nearby: parse_section(&doc, "nearby")?,
        broadband: parse_section(&doc, "services")?,
    })
}

/// Locate the content panel for `section_id`, or `None` when the page has no
/// tab for it.
fn find_panel<'a>(doc: &'a Html, section_id: &str) -> ExtractResult<Option<ElementRef<'a>>> {
    let anchor_sel = selector(&format!(r##"a[href="#{}"]"##, section_id))?;
    let Some(anchor) = doc.select(&anchor_sel).next() else {
        debug!("section {}: no tab link", section_id);
        return Ok(None);
    };

    let tab_content = closest(anchor, |el| {
        el.value().name() == "div" && has_class(el, "tab-content")
    })
    .ok_or(ExtractError::StructureMismatch("tab-content"))?;

    let panel_sel = selector(&format!(r#"div[id="{}"]"#, section_id))?;
    tab_content
        .select(&panel_sel)
        .next()
        .map(Some)
        .ok_or(ExtractError::StructureMismatch("section panel"))
}

fn parse_housing(panel: ElementRef<'_>) -> ExtractResult<HousingRecord> {
    let piece_sel = selector("div.info-piece")?;
    let h3_sel = selector("h3")?;
    let p_sel = selector("p")?;
    let chart_sel = selector("div.chartable")?;

    let mut record = HousingRecord::new();
    for piece in panel.select(&piece_sel) {
        let header = piece
            .select(&h3_sel)
            .next()
            .map(text_of)
            .ok_or(ExtractError::StructureMismatch("housing header"))?;
        let description = piece
            .select(&p_sel)
            .next()
            .map(text_of)
            .ok_or(ExtractError::StructureMismatch("housing description"))?;

        let mut info = HousingInfo {
            description,
            ..Default::default()
        };
        for segment in piece.select(&chart_sel) {
            let label = segment
                .value()
                .attr("data-label")
                .ok_or(ExtractError::StructureMismatch("data-label"))?;
            let value: f64 = segment
                .value()
                .attr("data-value")
                .ok_or(ExtractError::StructureMismatch("data-value"))?
                .trim()
                .parse()
                .map_err(|_| ExtractError::ValueParseError("data-value"))?;
            info.pie_chart_data.insert(label.to_string(), value);
        }

        record.insert(header, info);
    }

    debug!("section housing: {} info pieces", record.len());
    Ok(record)
}

/// Label/value rows. Labels are plain `col-md-6` cells, values the bold ones;
/// they pair up by position within a row.
fn parse_section(doc: &Html, section_id: &str) -> ExtractResult<SectionRecord> {
    let mut record = SectionRecord::new();
    let Some(panel) = find_panel(doc, section_id)? else {
        return Ok(record);
    };

    let row_sel = selector("div.row")?;
    let cell_sel = selector("div.col-md-6")?;

    for row in panel.select(&row_sel) {
        let (values, labels): (Vec<ElementRef<'_>>, Vec<ElementRef<'_>>) =
            row.select(&cell_sel).partition(|cell| is_bold(*cell));

        for (label, value) in labels.into_iter().zip(values) {
            record.insert(clean_label(&text_of(label)), text_of(value));
        }
    }

    debug!("section {}: {} entries", section_id, record.len());
    Ok(record)
}

fn is_bold(el: ElementRef<'_>) -> bool {
    el.value()
        .attr("style")
        .map(|style| {
            let compact: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            compact.contains("font-weight:bold")
        })
        .unwrap_or(false)
}
