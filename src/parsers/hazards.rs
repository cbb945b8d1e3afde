//! Hazard tag (`TAG...VALUE`) parsing — the free-form descriptors that appear
//! in severe thunderstorm and tornado warnings (tornado detection method,
//! damage threat, hail/wind size, waterspout presence).

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardTags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tornado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tornado_damage_threat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thunderstorm_damage_threat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hail_threat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_threat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waterspout: Option<String>,
}

fn find_and_verify(re: &Regex, allowed: &[&str], text: &str) -> Option<String> {
    let found = re.find(text)?;
    let value = found.as_str().split("...").nth(1)?.to_string();

    if !allowed.contains(&value.as_str()) {
        warn!("unusual {} tag value: {}", re.as_str(), value);
    }

    Some(value)
}

fn find_measurement(re: &Regex, text: &str) -> Option<String> {
    let found = re.find(text)?.as_str();
    found.split("...").nth(1).map(|s| s.to_string())
}

static TORNADO: Lazy<Regex> = Lazy::new(|| Regex::new(r"TORNADO\.\.\.([A-Z ]+)").unwrap());
static TORNADO_DAMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TORNADO DAMAGE THREAT\.\.\.([A-Z ]+)").unwrap());
static THUNDERSTORM_DAMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"THUNDERSTORM DAMAGE THREAT\.\.\.([A-Z ]+)").unwrap());
static HAIL_THREAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"HAIL THREAT\.\.\.([A-Z ]+)").unwrap());
static HAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*(?:HAIL|MAX HAIL SIZE)\.\.\.[><.0-9]+\s?IN").unwrap());
static WIND_THREAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"WIND THREAT\.\.\.([A-Z ]+)").unwrap());
static WIND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*(?:WIND|MAX WIND GUST)\.\.\.[><.0-9]+\s?(?:MPH|KTS)").unwrap());
static WATERSPOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r".*(?:WATERSPOUT)\.\.\..+\n").unwrap());

const TORNADO_VALUES: &[&str] = &["POSSIBLE", "RADAR INDICATED", "OBSERVED"];
const DAMAGE_THREAT_TSTM: &[&str] = &["CONSIDERABLE", "DESTRUCTIVE"];
const DAMAGE_THREAT_TOR: &[&str] = &["CONSIDERABLE", "CATASTROPHIC"];
const DETECTION_VALUES: &[&str] = &["RADAR INDICATED", "OBSERVED"];

pub fn parse_hazard_tags(text: &str) -> HazardTags {
    HazardTags {
        tornado: find_and_verify(&TORNADO, TORNADO_VALUES, text),
        tornado_damage_threat: find_and_verify(&TORNADO_DAMAGE, DAMAGE_THREAT_TOR, text),
        thunderstorm_damage_threat: find_and_verify(
            &THUNDERSTORM_DAMAGE,
            DAMAGE_THREAT_TSTM,
            text,
        ),
        hail_threat: find_and_verify(&HAIL_THREAT, DETECTION_VALUES, text),
        hail: find_measurement(&HAIL, text),
        wind_threat: find_and_verify(&WIND_THREAT, DETECTION_VALUES, text),
        wind: find_measurement(&WIND, text),
        waterspout: find_measurement(&WATERSPOUT, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_observed_tornado() {
        let text = "TORNADO...OBSERVED\nTORNADO DAMAGE THREAT...CATASTROPHIC\n";
        let tags = parse_hazard_tags(text);
        assert_eq!(tags.tornado.as_deref(), Some("OBSERVED"));
        assert_eq!(tags.tornado_damage_threat.as_deref(), Some("CATASTROPHIC"));
    }

    #[test]
    fn parses_hail_and_wind_measurements() {
        let text = "MAX HAIL SIZE...1.75 IN\nMAX WIND GUST...70 MPH\n";
        let tags = parse_hazard_tags(text);
        assert_eq!(tags.hail.as_deref(), Some("1.75 IN"));
        assert_eq!(tags.wind.as_deref(), Some("70 MPH"));
    }

    #[test]
    fn unusual_value_is_still_returned() {
        let text = "TORNADO...UNKNOWN VALUE\n";
        let tags = parse_hazard_tags(text);
        assert_eq!(tags.tornado.as_deref(), Some("UNKNOWN VALUE"));
    }

    #[test]
    fn absent_tags_are_none() {
        let tags = parse_hazard_tags("nothing here");
        assert_eq!(tags, HazardTags::default());
    }
}
