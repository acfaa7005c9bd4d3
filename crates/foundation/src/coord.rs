//! Coordinate primitives shared by the parsing, detection and projection layers.

use serde::{Deserialize, Serialize};

/// Longitude-first WGS84 position in degrees, the drawing model's vertex type.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    /// The same position in converter order (latitude, longitude).
    pub fn to_coord(self) -> Coord {
        Coord::new(self.lat_deg, self.lon_deg)
    }

    pub fn from_coord(c: Coord) -> Self {
        Self::new(c.east, c.north)
    }
}

/// Numeric pair in some CRS, always ordered (northing/latitude, easting/longitude).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub north: f64,
    pub east: f64,
}

impl Coord {
    pub fn new(north: f64, east: f64) -> Self {
        Self { north, east }
    }

    pub fn is_finite(&self) -> bool {
        self.north.is_finite() && self.east.is_finite()
    }
}

/// Order in which a wire format lists the two axes of a vertex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AxisOrder {
    /// Latitude/northing first (ISO 6709, manual entry).
    NorthFirst,
    /// Longitude/easting first (GeoJSON, WKT).
    EastFirst,
}

/// One number exactly as it appeared in the input.
///
/// The text is kept because digit counts carry meaning: `666666` and
/// `6666660` are the same magnitude class but different precisions.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    text: String,
    value: f64,
}

impl RawToken {
    /// Parse a plain decimal number: optional sign, digits, optional fraction.
    ///
    /// Exponents, thousands separators and comma decimals are rejected so that
    /// the result never depends on locale.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (unsigned, None),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if let Some(f) = frac_part
            && (f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()))
        {
            return None;
        }
        let value = text.parse::<f64>().ok()?;
        Some(Self {
            text: text.to_string(),
            value,
        })
    }

    /// Token for a number that arrived already decoded (e.g. a JSON number).
    ///
    /// `f64`'s `Display` never uses exponent notation, so the synthesized
    /// text always satisfies [`RawToken::parse`].
    pub fn from_number(value: f64) -> Self {
        Self {
            text: format!("{value}"),
            value,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of digits before the decimal point, sign excluded.
    pub fn integer_digits(&self) -> usize {
        let unsigned = self.text.trim_start_matches(['+', '-']);
        unsigned
            .split('.')
            .next()
            .map(|s| s.bytes().filter(u8::is_ascii_digit).count())
            .unwrap_or(0)
    }

    pub fn has_fraction(&self) -> bool {
        self.text.contains('.')
    }
}

/// Two raw tokens in the order the source format listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPair {
    pub first: RawToken,
    pub second: RawToken,
    pub order: AxisOrder,
}

impl RawPair {
    pub fn new(first: RawToken, second: RawToken, order: AxisOrder) -> Self {
        Self {
            first,
            second,
            order,
        }
    }

    /// Parse two text fields given in north-first order.
    pub fn parse_north_east(north: &str, east: &str) -> Option<Self> {
        Some(Self::new(
            RawToken::parse(north)?,
            RawToken::parse(east)?,
            AxisOrder::NorthFirst,
        ))
    }

    pub fn north(&self) -> &RawToken {
        match self.order {
            AxisOrder::NorthFirst => &self.first,
            AxisOrder::EastFirst => &self.second,
        }
    }

    pub fn east(&self) -> &RawToken {
        match self.order {
            AxisOrder::NorthFirst => &self.second,
            AxisOrder::EastFirst => &self.first,
        }
    }

    pub fn to_coord(&self) -> Coord {
        Coord::new(self.north().value(), self.east().value())
    }
}

#[cfg(test)]
mod tests {
    use super::{AxisOrder, Coord, GeoPoint, RawPair, RawToken};

    #[test]
    fn parses_plain_decimals() {
        let t = RawToken::parse(" -60.125 ").expect("token");
        assert_eq!(t.text(), "-60.125");
        assert_eq!(t.value(), -60.125);
        assert_eq!(t.integer_digits(), 2);
        assert!(t.has_fraction());

        let t = RawToken::parse("+6666666").expect("token");
        assert_eq!(t.integer_digits(), 7);
        assert!(!t.has_fraction());
    }

    #[test]
    fn rejects_locale_and_exponent_forms() {
        for bad in ["", "-", "60,5", "1e5", "60.", ".5", "6 666", "abc", "1.2.3"] {
            assert!(RawToken::parse(bad).is_none(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn number_tokens_keep_integer_digit_counts() {
        assert_eq!(RawToken::from_number(3_333_333.0).text(), "3333333");
        assert_eq!(RawToken::from_number(3_333_333.0).integer_digits(), 7);
        assert_eq!(RawToken::from_number(0.000_000_1).text(), "0.0000001");
    }

    #[test]
    fn pair_resolves_axes_by_source_order() {
        let lon_first = RawPair::new(
            RawToken::from_number(25.5),
            RawToken::from_number(60.5),
            AxisOrder::EastFirst,
        );
        assert_eq!(lon_first.north().value(), 60.5);
        assert_eq!(lon_first.east().value(), 25.5);
        assert_eq!(lon_first.to_coord(), Coord::new(60.5, 25.5));

        let lat_first = RawPair::parse_north_east("60.5", "25.5").expect("pair");
        assert_eq!(lat_first.to_coord(), lon_first.to_coord());
    }

    #[test]
    fn geo_point_and_coord_swap_axis_order() {
        let p = GeoPoint::new(24.0, 60.0);
        assert_eq!(p.to_coord(), Coord::new(60.0, 24.0));
        assert_eq!(GeoPoint::from_coord(p.to_coord()), p);
    }
}
