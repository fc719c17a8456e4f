//! Length parsing and conversion into EMU, the native coordinate system of
//! PresentationML (914400 EMU per inch, 12700 EMU per point).

use crate::types::Layout;
use serde::Deserialize;

/// EMU per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// EMU per typographic point.
pub const EMU_PER_POINT: f64 = 12_700.0;

/// Plain numbers below this value are read as inches, anything at or above
/// it is taken to be EMU already.
pub const INCH_THRESHOLD: f64 = 20.0;

/// Which page dimension a length is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal (x, width).
    X,
    /// Vertical (y, height).
    Y,
}

/// A user-supplied length.
///
/// Deserializes from a JSON number (see [`Length::Auto`]) or from a string
/// such as `"50%"`, `"12pt"`, `"1.5in"`, `"457200emu"` or `"2.5"`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "LengthRepr")]
pub enum Length {
    /// A bare number: inches below [`INCH_THRESHOLD`], EMU otherwise.
    Auto(f64),
    /// Explicit inches.
    Inches(f64),
    /// Explicit points.
    Points(f64),
    /// Explicit EMU.
    Emu(f64),
    /// Percentage of the page width or height.
    Percent(f64),
    /// Anything unparseable. Resolves to NaN.
    Invalid,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl From<LengthRepr> for Length {
    fn from(repr: LengthRepr) -> Self {
        match repr {
            LengthRepr::Number(n) => Length::Auto(n),
            LengthRepr::Text(s) => Length::parse(&s),
        }
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Length::Auto(value)
    }
}

impl From<i64> for Length {
    fn from(value: i64) -> Self {
        Length::Auto(value as f64)
    }
}

impl From<&str> for Length {
    fn from(value: &str) -> Self {
        Length::parse(value)
    }
}

impl Length {
    /// Parse a length string. Unknown formats become [`Length::Invalid`].
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        let suffixed = |suffix: &str| {
            text.strip_suffix(suffix)
                .and_then(|n| n.trim().parse::<f64>().ok())
        };

        if let Some(pct) = suffixed("%") {
            Length::Percent(pct)
        } else if let Some(pt) = suffixed("pt") {
            Length::Points(pt)
        } else if let Some(emu) = suffixed("emu") {
            Length::Emu(emu)
        } else if let Some(inches) = suffixed("in") {
            Length::Inches(inches)
        } else if let Ok(n) = text.parse::<f64>() {
            Length::Auto(n)
        } else {
            Length::Invalid
        }
    }

    /// Resolve against the page, returning EMU (possibly NaN).
    pub fn to_emu(&self, axis: Axis, layout: &Layout) -> f64 {
        match *self {
            Length::Auto(n) if n < INCH_THRESHOLD => inches_to_emu(n),
            Length::Auto(n) => n,
            Length::Inches(n) => inches_to_emu(n),
            Length::Points(n) => round_half_up(n * EMU_PER_POINT),
            Length::Emu(n) => n,
            Length::Percent(p) => round_half_up(p / 100.0 * layout.dimension(axis)),
            Length::Invalid => f64::NAN,
        }
    }

    /// Resolve a horizontal length.
    pub fn to_emu_x(&self, layout: &Layout) -> f64 {
        self.to_emu(Axis::X, layout)
    }

    /// Resolve a vertical length.
    pub fn to_emu_y(&self, layout: &Layout) -> f64 {
        self.to_emu(Axis::Y, layout)
    }
}

/// Inches to EMU, rounded.
pub fn inches_to_emu(inches: f64) -> f64 {
    round_half_up(inches * EMU_PER_INCH)
}

/// Points to EMU, rounded.
pub fn points_to_emu(points: f64) -> f64 {
    round_half_up(points * EMU_PER_POINT)
}

/// Round to the nearest integer, ties toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Convert a resolved EMU value to the integer written into XML.
///
/// NaN and infinities collapse to 0.
pub fn emu_to_int(value: f64) -> i64 {
    if value.is_finite() {
        round_half_up(value) as i64
    } else {
        0
    }
}

/// Resolve an optional length, falling back when absent.
pub fn resolve_or(value: Option<Length>, fallback: Length, axis: Axis, layout: &Layout) -> f64 {
    value.unwrap_or(fallback).to_emu(axis, layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new("test", 9_144_000, 5_143_500)
    }

    #[test]
    fn test_small_numbers_are_inches() {
        let l = layout();
        assert_eq!(Length::Auto(1.0).to_emu_x(&l), 914_400.0);
        assert_eq!(Length::Auto(0.5).to_emu_y(&l), 457_200.0);
        assert_eq!(Length::Auto(19.99).to_emu_x(&l), 18_278_856.0);
    }

    #[test]
    fn test_threshold_numbers_are_emu() {
        let l = layout();
        assert_eq!(Length::Auto(20.0).to_emu_x(&l), 20.0);
        assert_eq!(Length::Auto(457_200.0).to_emu_y(&l), 457_200.0);
    }

    #[test]
    fn test_percent_uses_axis() {
        let l = layout();
        assert_eq!(Length::parse("50%").to_emu_x(&l), 4_572_000.0);
        assert_eq!(Length::parse("50%").to_emu_y(&l), 2_571_750.0);
    }

    #[test]
    fn test_explicit_units() {
        let l = layout();
        assert_eq!(Length::parse("12pt").to_emu_x(&l), 152_400.0);
        assert_eq!(Length::parse("2in").to_emu_x(&l), 1_828_800.0);
        assert_eq!(Length::parse("5emu").to_emu_x(&l), 5.0);
        assert_eq!(Length::parse(" 3 ").to_emu_x(&l), 2_743_200.0);
    }

    #[test]
    fn test_invalid_is_nan() {
        let l = layout();
        assert!(Length::parse("wide").to_emu_x(&l).is_nan());
        assert_eq!(emu_to_int(f64::NAN), 0);
    }

    #[test]
    fn test_round_half_up_matches_ties_upward() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-0.4), 0.0);
    }

    #[test]
    fn test_deserialize_from_json() {
        let v: Vec<Length> = serde_json::from_str(r#"[1.5, "25%", "10pt", 500000]"#).unwrap();
        assert_eq!(v[0], Length::Auto(1.5));
        assert_eq!(v[1], Length::Percent(25.0));
        assert_eq!(v[2], Length::Points(10.0));
        assert_eq!(v[3], Length::Auto(500_000.0));
    }
}
