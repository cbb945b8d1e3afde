//! Mesoscale Discussion (MCD) parsing — an SPC product discussing near-term
//! severe-weather potential, optionally referencing a watch it's "concerning".

use crate::error::ParseError;
use crate::geo::Geometry;
use crate::parsers::latlon::parse_latlon;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MCD_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"Mesoscale Discussion ([0-9]{1,4})").unwrap());
static DATE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{6})Z - ([0-9]{6})Z").unwrap());
static WATCH_PROBABILITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Probability of Watch Issuance\.\.\.([0-9]+) percent").unwrap());
static CONCERNING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Concerning\.\.\.(Severe Thunderstorm|Tornado) Watch ([0-9]+)").unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mcd {
    pub id: String,
    pub number: u32,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub polygon: Option<Geometry>,
    pub watch_probability: u32,
    /// Storage id of the `Watch` this discussion concerns, if any.
    pub concerning: Option<String>,
}

fn roll_date(decoded_day: u32, hour: u32, minute: u32, reference: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut year = reference.year();
    let mut month = reference.month();
    if decoded_day < reference.day() {
        month += 1;
        if month == 13 {
            month = 1;
            year += 1;
        }
    }
    Utc.with_ymd_and_hms(year, month, decoded_day, hour, minute, 0)
        .single()
}

fn parse_ddhhmm(token: &str) -> Result<(u32, u32, u32), ParseError> {
    if token.len() != 6 {
        return Err(ParseError::MissingMcdDateLine);
    }
    let day = token[0..2].parse().map_err(|_| ParseError::MissingMcdDateLine)?;
    let hour = token[2..4].parse().map_err(|_| ParseError::MissingMcdDateLine)?;
    let minute = token[4..6].parse().map_err(|_| ParseError::MissingMcdDateLine)?;
    Ok((day, hour, minute))
}

/// Parses an MCD out of a whole product's text, given the product's issuance
/// time for month/year disambiguation.
pub fn parse_mcd(text: &str, product_issued: DateTime<Utc>) -> Result<Mcd, ParseError> {
    let id_caps = MCD_ID.captures(text).ok_or(ParseError::MissingMcdId)?;
    let number: u32 = id_caps[1].parse().map_err(|_| ParseError::MissingMcdId)?;

    let date_caps = DATE_LINE.captures(text).ok_or(ParseError::MissingMcdDateLine)?;
    let (start_day, start_hour, start_minute) = parse_ddhhmm(&date_caps[1])?;
    let (end_day, end_hour, end_minute) = parse_ddhhmm(&date_caps[2])?;

    let issued = roll_date(start_day, start_hour, start_minute, &product_issued)
        .ok_or(ParseError::MissingMcdDateLine)?;
    let expires = roll_date(end_day, end_hour, end_minute, &issued).ok_or(ParseError::MissingMcdDateLine)?;

    let polygon = parse_latlon(text)
        .map_err(|_| ParseError::MissingMcdDateLine)?
        .map(|latlon| latlon.polygon);

    let watch_probability = WATCH_PROBABILITY
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    let concerning = CONCERNING.captures(text).and_then(|c| {
        let phenomena = if &c[1] == "Tornado" { "TO" } else { "SV" };
        let watch_number: u32 = c[2].parse().ok()?;
        Some(format!(
            "{}A{:04}{}",
            phenomena,
            watch_number,
            issued.year()
        ))
    });

    let id = format!("MCD{:04}{}", number, issued.year());

    Ok(Mcd {
        id,
        number,
        issued,
        expires,
        polygon,
        watch_probability,
        concerning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 18, 0, 0).unwrap()
    }

    #[test]
    fn parses_mcd_with_concerning_watch() {
        let text = "Mesoscale Discussion 0456\n151800Z - 152000Z\n\
                     Probability of Watch Issuance...80 percent\n\
                     Concerning...Tornado Watch 123\n\
                     LAT...LON 4012 9525 4015 9490 3987 9490\n";
        let mcd = parse_mcd(text, issued()).unwrap();
        assert_eq!(mcd.id, "MCD04562024");
        assert_eq!(mcd.number, 456);
        assert_eq!(mcd.watch_probability, 80);
        assert_eq!(mcd.concerning.as_deref(), Some("TOA01232024"));
        assert!(mcd.polygon.is_some());
    }

    #[test]
    fn missing_id_errors() {
        assert_eq!(
            parse_mcd("no id here", issued()).unwrap_err(),
            ParseError::MissingMcdId
        );
    }
}
