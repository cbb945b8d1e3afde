//! SEL (watch narrative) parsing — identifies the watch phenomena and number a
//! narrative statement belongs to.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ID_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Severe Thunderstorm|Tornado) Watch Number ([0-9]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sel {
    pub phenomena: String,
    pub number: u32,
}

pub fn parse_sel(text: &str) -> Result<Sel, ParseError> {
    let caps = ID_LINE.captures(text).ok_or(ParseError::InvalidWatchNumber)?;
    let phenomena = if &caps[1] == "Tornado" { "TO" } else { "SV" };
    let number: u32 = caps[2].parse().map_err(|_| ParseError::InvalidWatchNumber)?;
    Ok(Sel {
        phenomena: phenomena.to_string(),
        number,
    })
}
