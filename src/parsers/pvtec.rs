//! P-VTEC (primary Valid Time and Event Code) parsing.
//!
//! A P-VTEC string looks like `/O.NEW.KILN.TO.W.0023.240515T1815Z-240515T1900Z/`
//! and is the canonical hazard-tracking identifier for the product: it names
//! the action being taken, the issuing office, the phenomenon and its
//! significance, an event tracking number, and the event's validity window.

use crate::error::ParseError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PVTEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z])\.([A-Z]+)\.([A-Z]+)\.([A-Z]+)\.([A-Z])\.([0-9]+)\.([0-9TZ]+)-([0-9TZ]+)")
        .unwrap()
});

const VTEC_TYPES: &[char] = &['O', 'T', 'E', 'X'];
const VTEC_ACTIONS: &[&str] = &[
    "NEW", "CON", "EXA", "EXT", "EXB", "UPG", "CAN", "EXP", "COR", "ROU",
];
const VTEC_PHENOMENA: &[&str] = &[
    "AF", "AS", "BH", "BW", "BZ", "CF", "DF", "DS", "EC", "EH", "EW", "FA", "FF", "FG", "FL", "FR",
    "FW", "FZ", "GL", "HF", "HT", "HU", "HW", "HY", "HZ", "IS", "LE", "LO", "LS", "LW", "MA", "MF",
    "MH", "MS", "RB", "RP", "SC", "SE", "SI", "SM", "SQ", "SR", "SS", "SU", "SV", "SW", "TO", "TR",
    "TS", "TY", "UP", "WC", "WI", "WS", "WW", "ZF", "ZR",
];
const VTEC_SIGNIFICANCE: &[char] = &['W', 'A', 'Y', 'S', 'F', 'O', 'N'];

const ZERO_SENTINEL: &str = "000000T0000Z";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PVtec {
    pub original: String,
    pub kind: char,
    pub action: String,
    pub wfo: String,
    pub phenomena: String,
    pub significance: char,
    pub etn: u32,
    /// `None` means the segment carried the `000000T0000Z` sentinel and the
    /// real value must be inherited (start from the parent event, end from
    /// the segment's UGC expiry).
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Returns how many P-VTEC strings appear in `text` — used by the router to
/// decide whether a product belongs on the VTEC path.
pub fn find_pvtec(text: &str) -> usize {
    PVTEC.find_iter(text).count()
}

fn parse_vtec_timestamp(token: &str) -> Result<Option<DateTime<Utc>>, ParseError> {
    if token == ZERO_SENTINEL {
        return Ok(None);
    }
    let naive = chrono::NaiveDateTime::parse_from_str(token, "%y%m%dT%H%MZ")
        .map_err(|_| ParseError::InvalidVtecTimestamp)?;
    Ok(Some(DateTime::from_naive_utc_and_offset(naive, Utc)))
}

pub fn parse_pvtec(text: &str) -> Result<Vec<PVtec>, ParseError> {
    let mut out = Vec::new();

    for m in PVTEC.find_iter(text) {
        let original = m.as_str();
        let caps = PVTEC.captures(original).unwrap();

        let kind = caps[1].chars().next().unwrap();
        if !VTEC_TYPES.contains(&kind) {
            return Err(ParseError::InvalidVtecType(caps[1].to_string()));
        }

        let action = caps[2].to_string();
        if !VTEC_ACTIONS.contains(&action.as_str()) {
            return Err(ParseError::InvalidVtecAction(action));
        }

        // the office field encodes the WFO with a leading convention letter
        let wfo_field = &caps[3];
        let wfo = wfo_field.get(1..).unwrap_or_default().to_string();

        let phenomena = caps[4].to_string();
        if !VTEC_PHENOMENA.contains(&phenomena.as_str()) {
            return Err(ParseError::InvalidVtecPhenomena(phenomena));
        }

        let significance = caps[5].chars().next().unwrap();
        if !VTEC_SIGNIFICANCE.contains(&significance) {
            return Err(ParseError::InvalidVtecSignificance(caps[5].to_string()));
        }

        let etn: u32 = caps[6].parse().map_err(|_| ParseError::InvalidVtecEtn)?;

        let start = parse_vtec_timestamp(&caps[7])?;
        let end = parse_vtec_timestamp(&caps[8])?;

        out.push(PVtec {
            original: original.to_string(),
            kind,
            action,
            wfo,
            phenomena,
            significance,
            etn,
            start,
            end,
        });
    }

    Ok(out)
}
