//! UGC (Universal Geographic Code) parsing.
//!
//! A UGC string names the counties or zones a hazard applies to, e.g.
//! `OHC035-036-OHZ069>071-151800-`. It starts with a two-letter state code plus
//! `C` (county) or `Z` (zone), continues with dash-separated zone numbers or
//! ranges, and ends with a `DDHHMM` expiry stamp.

use crate::error::ParseError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static UGC_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[A-Z]{2}(C|Z)[A-Z0-9]{3}(-|>)").unwrap());
static UGC_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{6}-").unwrap());
static STATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]").unwrap());
static RANGE_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r">").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UgcState {
    pub name: String,
    pub kind: ZoneKind,
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    County,
    Zone,
}

impl ZoneKind {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(ZoneKind::County),
            'Z' => Some(ZoneKind::Zone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ugc {
    pub original: String,
    pub states: Vec<UgcState>,
    pub expires: DateTime<Utc>,
}

fn roll_month_year(decoded_day: u32, issued: &DateTime<Utc>) -> (i32, u32) {
    let mut year = issued.year();
    let mut month = issued.month();
    if decoded_day < issued.day() {
        month += 1;
        if month == 13 {
            month = 1;
            year += 1;
        }
    }
    (year, month)
}

pub fn parse_ugc(text: &str, issued: DateTime<Utc>) -> Result<Ugc, ParseError> {
    let start_match = UGC_START.find(text).ok_or(ParseError::UgcNotFound)?;
    let from_start = &text[start_match.start()..];

    let end_match = UGC_END.find(from_start).ok_or(ParseError::UgcNotFound)?;
    // drop the trailing '-' that UGC_END includes
    let original = from_start[..end_match.end() - 1].replace('\n', "");

    let segments: Vec<&str> = original.split('-').collect();
    let (expiry_token, segments) = segments.split_last().ok_or(ParseError::UgcNotFound)?;

    if expiry_token.len() != 6 {
        return Err(ParseError::InvalidUgcExpiry);
    }
    let day: u32 = expiry_token[0..2].parse().map_err(|_| ParseError::InvalidUgcExpiry)?;
    let hour: u32 = expiry_token[2..4].parse().map_err(|_| ParseError::InvalidUgcExpiry)?;
    let minute: u32 = expiry_token[4..6].parse().map_err(|_| ParseError::InvalidUgcExpiry)?;
    let (year, month) = roll_month_year(day, &issued);
    let expires = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or(ParseError::InvalidUgcExpiry)?;

    let mut states: Vec<UgcState> = Vec::new();
    for raw in segments {
        let mut segment = *raw;
        if STATE_PREFIX.is_match(segment) {
            let name = segment[0..2].to_string();
            let kind = segment[2..3]
                .chars()
                .next()
                .and_then(ZoneKind::from_char)
                .ok_or_else(|| ParseError::InvalidUgcRange(segment.to_string()))?;
            states.push(UgcState {
                name,
                kind,
                zones: Vec::new(),
            });
            segment = &segment[3..];
        }

        let current = states.last_mut().ok_or(ParseError::UgcNotFound)?;

        if RANGE_SEP.is_match(segment) {
            let (lo, hi) = segment
                .split_once('>')
                .ok_or_else(|| ParseError::InvalidUgcRange(segment.to_string()))?;
            let lo: u32 = lo.parse().map_err(|_| ParseError::InvalidUgcRange(segment.to_string()))?;
            let hi: u32 = hi.parse().map_err(|_| ParseError::InvalidUgcRange(segment.to_string()))?;
            for n in lo..=hi {
                current.zones.push(format!("{:03}", n));
            }
        } else {
            current.zones.push(segment.to_string());
        }
    }

    Ok(Ugc {
        original,
        states,
        expires,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 18, 0, 0).unwrap()
    }

    #[test]
    fn parses_single_zone() {
        let ugc = parse_ugc("OHC035-151800-", issued()).unwrap();
        assert_eq!(ugc.states.len(), 1);
        assert_eq!(ugc.states[0].name, "OH");
        assert_eq!(ugc.states[0].kind, ZoneKind::County);
        assert_eq!(ugc.states[0].zones, vec!["035"]);
    }

    #[test]
    fn expands_zone_range_inclusive() {
        let ugc = parse_ugc("OHZ069>071-151800-", issued()).unwrap();
        assert_eq!(ugc.states[0].zones, vec!["069", "070", "071"]);
    }

    #[test]
    fn continuation_zones_inherit_state() {
        let ugc = parse_ugc("OHC035-036-037-151800-", issued()).unwrap();
        assert_eq!(ugc.states.len(), 1);
        assert_eq!(ugc.states[0].zones, vec!["035", "036", "037"]);
    }

    #[test]
    fn multiple_states() {
        let ugc = parse_ugc("OHC035-KYC015-151800-", issued()).unwrap();
        assert_eq!(ugc.states.len(), 2);
        assert_eq!(ugc.states[1].name, "KY");
    }

    #[test]
    fn expiry_rolls_month_when_day_is_earlier() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 31, 18, 0, 0).unwrap();
        let ugc = parse_ugc("OHC035-010000-", issued).unwrap();
        assert_eq!(ugc.expires.month(), 6);
    }

    #[test]
    fn missing_ugc_errors() {
        assert_eq!(parse_ugc("nothing here", issued()).unwrap_err(), ParseError::UgcNotFound);
    }
}
