//! `TIME...MOT...LOC` parsing — storm motion and a single reference point,
//! carried by severe-weather warnings alongside their polygon.

use crate::error::ParseError;
use crate::geo::Point;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TML_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(TIME\.\.\.MOT\.\.\.LOC)([A-Za-z0-9 ]*)").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tml {
    pub original: String,
    pub time: DateTime<Utc>,
    pub direction: u32,
    pub speed: u32,
    pub location: Point,
}

pub fn parse_tml(text: &str, issued: DateTime<Utc>) -> Result<Option<Tml>, ParseError> {
    let original = match TML_LINE.find(text) {
        Some(m) => m.as_str().to_string(),
        None => return Ok(None),
    };

    let tokens: Vec<&str> = original.split_whitespace().skip(1).collect();
    if tokens.len() < 5 {
        return Err(ParseError::InvalidTml);
    }

    let time_token = tokens[0];
    if time_token.len() < 5 {
        return Err(ParseError::InvalidTml);
    }
    let hour: u32 = time_token[0..2].parse().map_err(|_| ParseError::InvalidTml)?;
    let minute: u32 = time_token[2..4].parse().map_err(|_| ParseError::InvalidTml)?;
    let time = Utc
        .with_ymd_and_hms(issued.year(), issued.month(), issued.day(), hour, minute, 0)
        .single()
        .ok_or(ParseError::InvalidTml)?;

    let direction: u32 = tokens[1]
        .get(0..3)
        .ok_or(ParseError::InvalidTml)?
        .parse()
        .map_err(|_| ParseError::InvalidTml)?;
    let speed: u32 = tokens[2]
        .get(0..2)
        .ok_or(ParseError::InvalidTml)?
        .parse()
        .map_err(|_| ParseError::InvalidTml)?;

    let lat_raw: i32 = tokens[3].parse().map_err(|_| ParseError::InvalidTml)?;
    let lon_raw: i32 = tokens[4].parse().map_err(|_| ParseError::InvalidTml)?;
    let lat = lat_raw as f64 / 100.0;
    let mut lon = -(lon_raw as f64 / 100.0);
    if lon <= -180.0 {
        lon += 360.0;
    }

    Ok(Some(Tml {
        original,
        time,
        direction,
        speed,
        location: (lon, lat),
    }))
}
