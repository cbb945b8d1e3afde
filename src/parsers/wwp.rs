//! WWP (severe weather Watch Probability) parsing — the probability and storm
//! attribute tables SPC issues alongside a severe thunderstorm or tornado watch.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WATCH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(WS|WT) ([0-9]{1,4})").unwrap());
static PROB_TABLE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"PROBABILITY TABLE:\n").unwrap());
static ATTR_TABLE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"ATTRIBUTE TABLE:\n").unwrap());
static TABLE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"&&").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wwp {
    pub phenomena: String,
    pub number: u32,
    pub two_or_more_tor: String,
    pub strong_tor: String,
    pub ten_or_more_severe_wind: String,
    pub one_or_more_wind: String,
    pub ten_or_more_severe_hail: String,
    pub one_or_more_hail: String,
    pub six_or_more_combo: String,
    pub max_hail_in: f32,
    pub max_wind_kt: i32,
    pub max_tops_ft: i32,
    pub mean_storm_direction: u32,
    pub mean_storm_speed: u32,
    pub pds: bool,
}

fn extract_watch_id(text: &str) -> Result<(String, u32), ParseError> {
    let caps = WATCH_ID.captures(text).ok_or(ParseError::InvalidWatchNumber)?;
    let phenomena = if &caps[1] == "WS" { "SV" } else { "TO" };
    let number: u32 = caps[2].parse().map_err(|_| ParseError::InvalidWatchNumber)?;
    Ok((phenomena.to_string(), number))
}

fn table_rows(text: &str, start: &Regex) -> Result<Vec<String>, ParseError> {
    let start_match = start.find(text).ok_or(ParseError::InvalidWwpTable)?;
    let after_start = &text[start_match.end()..];
    let end_match = TABLE_END.find(after_start).ok_or(ParseError::InvalidWwpTable)?;
    let block = after_start[..end_match.start()].trim().replace("  ", "");

    block
        .lines()
        .map(|line| {
            line.split_once(':')
                .map(|(_, v)| v.to_string())
                .ok_or(ParseError::InvalidWwpTable)
        })
        .collect()
}

pub fn parse_wwp(text: &str) -> Result<Wwp, ParseError> {
    let (phenomena, number) = extract_watch_id(text)?;

    let prob_rows = table_rows(text, &PROB_TABLE_START)?;
    if prob_rows.len() < 7 {
        return Err(ParseError::InvalidWwpTable);
    }

    let attr_rows = table_rows(text, &ATTR_TABLE_START)?;
    if attr_rows.len() < 5 {
        return Err(ParseError::InvalidWwpTable);
    }

    let max_hail_in: f32 = attr_rows[0]
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidWwpTable)?;
    let max_wind_kt: i32 = attr_rows[1]
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidWwpTable)?;
    let max_tops_ft: i32 = attr_rows[2]
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidWwpTable)?;

    let mean_storm = attr_rows[3].trim();
    if mean_storm.len() < 5 {
        return Err(ParseError::InvalidWwpTable);
    }
    let mean_storm_direction: u32 = mean_storm[0..3]
        .parse()
        .map_err(|_| ParseError::InvalidWwpTable)?;
    let mean_storm_speed: u32 = mean_storm[3..5]
        .parse()
        .map_err(|_| ParseError::InvalidWwpTable)?;

    let pds = attr_rows[4].trim() == "YES";

    Ok(Wwp {
        phenomena,
        number,
        two_or_more_tor: prob_rows[0].trim().to_string(),
        strong_tor: prob_rows[1].trim().to_string(),
        ten_or_more_severe_wind: prob_rows[2].trim().to_string(),
        one_or_more_wind: prob_rows[3].trim().to_string(),
        ten_or_more_severe_hail: prob_rows[4].trim().to_string(),
        one_or_more_hail: prob_rows[5].trim().to_string(),
        six_or_more_combo: prob_rows[6].trim().to_string(),
        max_hail_in,
        max_wind_kt,
        max_tops_ft,
        mean_storm_direction,
        mean_storm_speed,
        pds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probability_and_attribute_tables() {
        let text = "WT 0123\n\
            PROBABILITY TABLE:\n\
            2+ TOR:60\n\
            STRONG TOR:30\n\
            10+ SVR WIND:70\n\
            1+ WIND:90\n\
            10+ SVR HAIL:40\n\
            1+ HAIL:85\n\
            6+ COMBO:55\n\
            &&\n\
            ATTRIBUTE TABLE:\n\
            MAX HAIL SIZE:2.00\n\
            MAX WIND GUST:70\n\
            MAX TOPS:500\n\
            STORM MOTION VECTOR:24035\n\
            PDS:YES\n\
            &&\n";
        let wwp = parse_wwp(text).unwrap();
        assert_eq!(wwp.phenomena, "TO");
        assert_eq!(wwp.number, 123);
        assert_eq!(wwp.max_hail_in, 2.0);
        assert_eq!(wwp.max_wind_kt, 70);
        assert_eq!(wwp.mean_storm_direction, 240);
        assert_eq!(wwp.mean_storm_speed, 35);
        assert!(wwp.pds);
    }
}
