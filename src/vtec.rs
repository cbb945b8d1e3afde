//! Splits a framed VTEC-bearing [`Product`] into its constituent
//! [`VtecSegment`]s, running every sub-parser over each `$$`-delimited chunk.

use crate::error::ParseError;
use crate::geo::Geometry;
use crate::parsers::latlon::LatLon;
use crate::parsers::{
    parse_hazard_tags, parse_hvtec, parse_latlon, parse_pvtec, parse_tml, parse_ugc, HVtec,
    HazardTags, PVtec, Tml, Ugc,
};
use crate::product::Product;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMERGENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(TORNADO|FLASH\s+FLOOD)\s+EMERGENCY").unwrap());
static PDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"THIS\s+IS\s+A\s+PARTICULARLY\s+DANGEROUS\s+SITUATION").unwrap());

/// One segment of an incoming VTEC-bearing product, fully sub-parsed.
///
/// `id` is unset until the VTEC aggregator assigns it (`parent.id` plus the
/// parent's pre-merge `children` count).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtecSegment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub original: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub event_number: u32,
    pub action: String,
    pub phenomena: String,
    pub significance: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Geometry>,
    pub vtec: PVtec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hvtec: Option<HVtec>,
    pub ugc: Ugc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latlon: Option<LatLon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tml: Option<Tml>,
    pub hazard_tags: HazardTags,
    pub emergency: bool,
    pub pds: bool,
    pub wfo: String,
}

fn parse_segment(segment: &str, product: &Product) -> Result<Vec<VtecSegment>, ParseError> {
    let ugc = match parse_ugc(segment, product.issued) {
        Ok(ugc) => ugc,
        Err(ParseError::UgcNotFound) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let vtecs = parse_pvtec(segment)?;
    if vtecs.is_empty() {
        return Ok(Vec::new());
    }

    let hvtec = parse_hvtec(segment);
    let latlon = parse_latlon(segment)?;
    let polygon = latlon.as_ref().map(|l| l.polygon.clone());
    let tml = parse_tml(segment, product.issued)?;
    let hazard_tags = parse_hazard_tags(segment);

    let emergency = EMERGENCY.is_match(segment);
    let pds = PDS.is_match(segment);

    Ok(vtecs
        .into_iter()
        .map(|vtec| VtecSegment {
            id: None,
            original: segment.to_string(),
            start: vtec.start,
            end: vtec.end,
            issued: product.issued,
            expires: ugc.expires,
            event_number: vtec.etn,
            action: vtec.action.clone(),
            phenomena: vtec.phenomena.clone(),
            significance: vtec.significance,
            polygon: polygon.clone(),
            wfo: vtec.wfo.clone(),
            vtec,
            hvtec: hvtec.clone(),
            ugc: ugc.clone(),
            latlon: latlon.clone(),
            tml: tml.clone(),
            hazard_tags: hazard_tags.clone(),
            emergency,
            pds,
        })
        .collect())
}

/// Splits a product's text on `$$` (discarding the trailing empty segment)
/// and sub-parses every chunk. Chunks with no UGC string are silently
/// dropped — they're boilerplate (e.g. a trailing `$$`-delimited signature
/// block), not a parse failure.
pub fn parse_vtec_segments(product: &Product) -> Result<Vec<VtecSegment>, ParseError> {
    let mut chunks: Vec<&str> = product.text.split("$$").collect();
    if chunks.len() > 1 {
        chunks.pop();
    }

    let mut segments = Vec::new();
    for chunk in chunks {
        segments.extend(parse_segment(chunk, product)?);
    }
    Ok(segments)
}
