//! H-VTEC (hydrologic VTEC) parsing — flood products carry this in addition to
//! the P-VTEC line. The spec treats it as an opaque verbatim capture; no
//! downstream code interprets its fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HVTEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z0-9]{5}\.[0-3UN]\.[A-Z]{2}(?:\.[0-9TZ]+){3}\.(?:OO|NO|NR|UU)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HVtec {
    pub original: String,
}

pub fn parse_hvtec(text: &str) -> Option<HVtec> {
    HVTEC.find(text).map(|m| HVtec {
        original: m.as_str().to_string(),
    })
}
