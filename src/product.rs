//! The framer: turns raw product text into a typed [`Product`], decoding its
//! WMO header, AWIPS identifier, and issuance timestamp.

use crate::error::ProductError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static AWIPS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[A-Z0-9]{4,6}[ ]*\n").unwrap());
static ISSUANCE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{3,4} (?:(?:AM|PM) [A-Za-z]{3,4}|UTC) (?:[A-Za-z]{3} ){2}[0-9]{1,2} [0-9]{4}")
        .unwrap()
});
static WMO_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9A-Z]{6} [A-Z]{4} [0-9]{6}(?: [A-Z]{3})?").unwrap());
static BIL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:BULLETIN - |URGENT - |EAS ACTIVATION REQUESTED|IMMEDIATE BROADCAST REQUESTED|FLASH - |REGULAR - |HOLD - |TEST\.\.\.)(.*)").unwrap()
});

/// Fixed UTC offsets (hours) used to decode the civil-time issuance line.
/// Standard civil offsets are used for EDT/CDT rather than the source's
/// EDT=-5/CDT=-5 table; see DESIGN.md for the reasoning.
fn timezone_offset_hours(abbr: &str) -> Option<i32> {
    Some(match abbr {
        "GMT" | "UTC" => 0,
        "AST" => -4,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        "AKST" => -9,
        "AKDT" => -8,
        "HST" => -10,
        "SST" => -11,
        "ChST" | "CHST" => 10,
        _ => return None,
    })
}

fn month_number(abbr: &str) -> Option<u32> {
    Some(match abbr {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wmo {
    pub original: String,
    pub datatype: String,
    pub wfo: String,
    pub issued: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Awips {
    pub original: String,
    pub product: String,
    pub wfo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub group: String,
    pub text: String,
    pub wmo: Wmo,
    pub awips: Awips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bil: Option<String>,
    pub issued: DateTime<Utc>,
}

fn parse_awips(text: &str) -> Result<Awips, ProductError> {
    let m = AWIPS_LINE.find(text).ok_or(ProductError::MissingAwips)?;
    let original = m.as_str().trim_end().to_string();
    if original.len() < 4 {
        return Err(ProductError::MissingAwips);
    }
    let product = original[0..3].to_string();
    let wfo = original[3..].trim_end().to_string();
    Ok(Awips { original, product, wfo })
}

/// Parses the human-readable issuance line, e.g. `1045 PM CDT Mon May 20 2024`
/// or `1630 UTC Tue Jun 4 2024`. Returns `None` if the line is absent (the
/// caller falls back to the supplied "now").
fn parse_issuance_line(text: &str) -> Result<Option<DateTime<Utc>>, ProductError> {
    let found = match ISSUANCE_LINE.find(text) {
        Some(m) => m.as_str(),
        None => return Ok(None),
    };

    let tokens: Vec<&str> = found.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(ProductError::InvalidIssuanceLine);
    }

    let time_token = tokens[0];
    if time_token.len() < 3 {
        return Err(ProductError::InvalidIssuanceLine);
    }
    let (hour_str, minute_str) = time_token.split_at(time_token.len() - 2);
    let minute: u32 = minute_str.parse().map_err(|_| ProductError::InvalidIssuanceLine)?;

    let (hour_24, tz_abbr, rest): (u32, &str, &[&str]) = if tokens.get(1) == Some(&"UTC") {
        let hour: u32 = hour_str.parse().map_err(|_| ProductError::InvalidIssuanceLine)?;
        (hour, "UTC", &tokens[2..])
    } else {
        if tokens.len() < 7 {
            return Err(ProductError::InvalidIssuanceLine);
        }
        let ampm = tokens[1];
        let tz_abbr = tokens[2];
        let mut hour: u32 = hour_str.parse().map_err(|_| ProductError::InvalidIssuanceLine)?;
        hour %= 12;
        if ampm.eq_ignore_ascii_case("PM") {
            hour += 12;
        }
        (hour, tz_abbr, &tokens[3..])
    };

    // rest = [weekday, month, day, year]
    if rest.len() != 4 {
        return Err(ProductError::InvalidIssuanceLine);
    }
    let month = month_number(rest[1]).ok_or(ProductError::InvalidIssuanceLine)?;
    let day: u32 = rest[2].parse().map_err(|_| ProductError::InvalidIssuanceLine)?;
    let year: i32 = rest[3].parse().map_err(|_| ProductError::InvalidIssuanceLine)?;

    let offset_hours = timezone_offset_hours(tz_abbr)
        .ok_or_else(|| ProductError::UnknownTimezone(tz_abbr.to_string()))?;

    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour_24, minute, 0))
        .ok_or(ProductError::InvalidIssuanceLine)?;

    let utc_naive = naive - chrono::Duration::hours(offset_hours as i64);
    Ok(Some(DateTime::<Utc>::from_naive_utc_and_offset(utc_naive, Utc)))
}

/// Decodes a WMO line's `DDHHMM` field against the already-known issuance
/// time, rolling the month (and year, at month 13) when the decoded day
/// precedes the issuance day.
fn roll_ddhhmm(ddhhmm: &str, reference: &DateTime<Utc>) -> Result<DateTime<Utc>, ProductError> {
    if ddhhmm.len() != 6 {
        return Err(ProductError::InvalidWmoTimestamp);
    }
    let day: u32 = ddhhmm[0..2].parse().map_err(|_| ProductError::InvalidWmoTimestamp)?;
    let hour: u32 = ddhhmm[2..4].parse().map_err(|_| ProductError::InvalidWmoTimestamp)?;
    let minute: u32 = ddhhmm[4..6].parse().map_err(|_| ProductError::InvalidWmoTimestamp)?;

    let mut year = reference.year();
    let mut month = reference.month();
    if day < reference.day() {
        month += 1;
        if month == 13 {
            month = 1;
            year += 1;
        }
    }

    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or(ProductError::InvalidWmoTimestamp)
}

fn parse_wmo(text: &str, issued: &DateTime<Utc>) -> Result<Wmo, ProductError> {
    let m = WMO_LINE.find(text).ok_or(ProductError::MissingWmo)?;
    let original = m.as_str().to_string();
    let tokens: Vec<&str> = original.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(ProductError::MissingWmo);
    }

    let decoded_issued = roll_ddhhmm(tokens[2], issued)?;
    let bbb = tokens.get(3).map(|s| s.to_string());

    Ok(Wmo {
        original,
        datatype: tokens[0].to_string(),
        wfo: tokens[1].to_string(),
        issued: decoded_issued,
        bbb,
    })
}

fn parse_bil(text: &str) -> Option<String> {
    BIL_LINE.find(text).map(|m| m.as_str().to_string())
}

/// The deterministic part of framing: everything derivable from the product
/// text alone, with `group` already computed. `id` is not yet known — it
/// depends on `seq`, a collision ordinal the caller looks up in the store
/// (count of existing `text_products` rows sharing this `group`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductHeaders {
    pub text: String,
    pub wmo: Wmo,
    pub awips: Awips,
    pub bil: Option<String>,
    pub issued: DateTime<Utc>,
    pub group: String,
}

/// Parses a raw product string's headers (steps 1-4 of framing: AWIPS ID,
/// issuance line, WMO line, BIL header) and computes `group`.
///
/// `now` is used as the issuance time fallback when the product carries no
/// human-readable issuance line.
pub fn frame_product_headers(text: &str, now: DateTime<Utc>) -> Result<ProductHeaders, ProductError> {
    let awips = parse_awips(text)?;

    let issued = parse_issuance_line(text)?.unwrap_or(now);

    let wmo = parse_wmo(text, &issued)?;

    let bil = parse_bil(text);

    let group = format!(
        "{}{}{}",
        awips.wfo,
        awips.product,
        issued.format("%y%m%d%H%M")
    );

    Ok(ProductHeaders {
        text: text.to_string(),
        wmo,
        awips,
        bil,
        issued,
        group,
    })
}

/// Finishes framing by assigning `id = group + seq(2)`, once the caller has
/// looked up the collision ordinal for `headers.group`.
pub fn finish_product(headers: ProductHeaders, seq: u32) -> Product {
    Product {
        id: format!("{}{:02}", headers.group, seq),
        group: headers.group,
        text: headers.text,
        wmo: headers.wmo,
        awips: headers.awips,
        bil: headers.bil,
        issued: headers.issued,
    }
}

/// Frames a raw product string into a [`Product`] in one step, for callers
/// (tests, simple archive replays) that can resolve the collision ordinal
/// synchronously from `headers.group` (the pipeline's real entry point goes
/// through [`frame_product_headers`]/[`finish_product`] directly, since the
/// store lookup for `seq` is asynchronous).
pub fn frame_product(
    text: &str,
    now: DateTime<Utc>,
    seq: impl Fn(&str) -> u32,
) -> Result<Product, ProductError> {
    let headers = frame_product_headers(text, now)?;
    let ordinal = seq(&headers.group);
    Ok(finish_product(headers, ordinal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(issuance: &str, wmo_ddhhmm: &str) -> String {
        format!(
            "TORILN\n\n{issuance}\n\nWFUS51 KILN {wmo_ddhhmm}\nTORILN\n/O.NEW.KILN.TO.W.0023.240515T1815Z-240515T1900Z/\n",
            issuance = issuance,
            wmo_ddhhmm = wmo_ddhhmm,
        )
    }

    #[test]
    fn group_and_id_are_stable_functions_of_headers() {
        let text = sample("1045 PM CDT Mon May 20 2024", "210345");
        let p1 = frame_product(&text, Utc::now(), |_| 0).unwrap();
        let p2 = frame_product(&text, Utc::now(), |_| 0).unwrap();
        assert_eq!(p1.group, p2.group);
        assert!(p1.id.starts_with(&format!("{}{}", p1.awips.wfo, p1.awips.product)));
    }

    #[test]
    fn distinct_seq_gives_distinct_ids() {
        let text = sample("1045 PM CDT Mon May 20 2024", "210345");
        let p1 = frame_product(&text, Utc::now(), |_| 0).unwrap();
        let p2 = frame_product(&text, Utc::now(), |_| 1).unwrap();
        assert_eq!(p1.group, p2.group);
        assert_ne!(p1.id, p2.id);
    }

    #[test]
    fn cdt_issuance_converts_to_utc() {
        // 1045 PM CDT May 20 -> 0345Z May 21 under standard CDT = UTC-5
        let text = sample("1045 PM CDT Mon May 20 2024", "210345");
        let p = frame_product(&text, Utc::now(), |_| 0).unwrap();
        assert_eq!(p.issued, Utc.with_ymd_and_hms(2024, 5, 21, 3, 45, 0).unwrap());
    }

    #[test]
    fn utc_issuance_line_is_used_directly() {
        let text = sample("1630 UTC Tue Jun 4 2024", "041630");
        let p = frame_product(&text, Utc::now(), |_| 0).unwrap();
        assert_eq!(p.issued, Utc.with_ymd_and_hms(2024, 6, 4, 16, 30, 0).unwrap());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let text = sample("1045 PM XYZ Mon May 20 2024", "210345");
        assert!(matches!(
            frame_product(&text, Utc::now(), |_| 0),
            Err(ProductError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn missing_awips_is_missing_awips_error() {
        assert_eq!(
            frame_product("no headers here\n", Utc::now(), |_| 0).unwrap_err(),
            ProductError::MissingAwips
        );
    }

    #[test]
    fn wmo_day_rollover_bumps_month() {
        // issued late in May, WMO DDHHMM day is "01" (earlier than issuance day) -> rolls to June
        let text = sample("1045 PM CDT Fri May 31 2024", "010345");
        let p = frame_product(&text, Utc::now(), |_| 0).unwrap();
        assert_eq!(p.wmo.issued.month(), 6);
    }
}
