//! `LAT...LON` polygon parsing.
//!
//! NWS products encode a hazard's polygon as a `LAT...LON` line followed by a run
//! of digit groups. Two encodings coexist in the wild: packed 8-digit points
//! (`LLLLNNNN`, latitude and longitude glued together) and pairs of shorter
//! tokens. Both are handled here; see `parse_point_packed`/`parse_point_pair`.

use crate::error::ParseError;
use crate::geo::{Geometry, Point};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static LATLON_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^LAT\.\.\.LON\s+(?:\d+\s+)+").unwrap());
static DIGIT_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4,}").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub original: String,
    pub points: Vec<Point>,
    pub polygon: Geometry,
}

/// Parses a packed 8-digit point `LLLLNNNN`: degrees*100 for both axes, with the
/// longitude negated and corrected for the dropped leading digit of the western
/// hemisphere (NWS omits the leading "1" of three-digit longitudes here).
fn parse_point_packed(token: &str) -> Result<Point, ParseError> {
    if token.len() < 8 {
        return Err(ParseError::InvalidLatLonPoint);
    }
    let lat_raw: i32 = token[0..4].parse().map_err(|_| ParseError::InvalidLatLonPoint)?;
    let lon_raw: i32 = token[4..8].parse().map_err(|_| ParseError::InvalidLatLonPoint)?;

    let lat = lat_raw as f64 / 100.0;
    let mut lon = -(lon_raw as f64 / 100.0);
    if lon > -20.0 {
        lon -= 100.0;
    }

    Ok((lon, lat))
}

/// Parses a `(lat, lon)` pair of short tokens: degrees*100 for both axes, with
/// the longitude negated and wrapped into [-180, 180).
fn parse_point_pair(lat: &str, lon: &str) -> Result<Point, ParseError> {
    let lat_raw: i32 = lat.parse().map_err(|_| ParseError::InvalidLatLonPoint)?;
    let lon_raw: i32 = lon.parse().map_err(|_| ParseError::InvalidLatLonPoint)?;

    let lat = lat_raw as f64 / 100.0;
    let mut lon = -(lon_raw as f64 / 100.0);
    if lon <= -180.0 {
        lon += 360.0;
    }

    Ok((lon, lat))
}

/// Parses the `LAT...LON` polygon out of a product segment's text, if present.
pub fn parse_latlon(text: &str) -> Result<Option<LatLon>, ParseError> {
    let original = match LATLON_LINE.find(text) {
        Some(m) => m.as_str().to_string(),
        None => return Ok(None),
    };

    let tokens: Vec<&str> = DIGIT_GROUP.find_iter(&original).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return Err(ParseError::InvalidLatLonPoint);
    }

    let mut points = Vec::new();
    if tokens[0].len() > 5 {
        for token in &tokens {
            points.push(parse_point_packed(token)?);
        }
    } else {
        let mut it = tokens.iter();
        while let (Some(lat), Some(lon)) = (it.next(), it.next()) {
            points.push(parse_point_pair(lat, lon)?);
        }
    }

    if points.is_empty() {
        return Err(ParseError::InvalidLatLonPoint);
    }

    let polygon = Geometry::polygon(points.clone());

    Ok(Some(LatLon {
        original,
        points,
        polygon,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_latlon_line_is_none() {
        assert_eq!(parse_latlon("nothing to see here").unwrap(), None);
    }

    #[test]
    fn packed_points_close_the_ring() {
        let text = "LAT...LON 4048 9938 4044 9929 4023 9947 4028 9957\n";
        let result = parse_latlon(text).unwrap().unwrap();
        assert_eq!(result.points.len(), 5);
        assert_eq!(result.points.first(), result.points.last());
        assert!(result.polygon.is_closed());
    }

    #[test]
    fn packed_point_western_hemisphere_fix() {
        // 9938 -> 99.38 -> negated -> -99.38 ; not > -20.0, so no further correction
        let (lon, lat) = parse_point_packed("40489938").unwrap();
        assert_eq!(lat, 40.48);
        assert_eq!(lon, -99.38);
    }

    #[test]
    fn pair_points_wrap_at_180() {
        // lon raw 18500 -> 185.00 negated -> -185.00 <= -180.0 -> +360 -> 175.00
        let (lon, lat) = parse_point_pair("4000", "18500").unwrap();
        assert_eq!(lat, 40.0);
        assert_eq!(lon, 175.0);
    }
}
