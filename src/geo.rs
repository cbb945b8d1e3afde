//! GeoJSON-shaped polygons, as produced by the LAT...LON, TML, and MCD sub-parsers.

use serde::{Deserialize, Serialize};

/// A point expressed as `(longitude, latitude)`, matching GeoJSON's axis order.
pub type Point = (f64, f64);

/// A GeoJSON `Polygon` geometry: a single linear ring, closed (first point repeated
/// at the end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Point>> },
}

impl Geometry {
    /// Build a closed polygon from a ring of points, closing it if necessary.
    pub fn polygon(mut ring: Vec<Point>) -> Self {
        if ring.first() != ring.last() {
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
        }
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Geometry::Polygon { coordinates } => coordinates
                .first()
                .map(|ring| ring.first() == ring.last())
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_open_ring() {
        let g = Geometry::polygon(vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)]);
        assert!(g.is_closed());
        match g {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates[0].first(), coordinates[0].last());
            }
        }
    }

    #[test]
    fn leaves_closed_ring_alone() {
        let ring = vec![(1.0, 2.0), (3.0, 4.0), (1.0, 2.0)];
        let g = Geometry::polygon(ring.clone());
        match g {
            Geometry::Polygon { coordinates } => assert_eq!(coordinates[0], ring),
        }
    }
}
