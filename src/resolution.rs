//! Resolution strings and their conversion to dots per inch.
//!
//! ImageMagick and GraphicsMagick report resolution as two fields, for example
//! `Resolution: 37.79x37.79` and `Units: PixelsPerCentimeter`. [`Dpi`] turns such
//! a pair into integer dots per inch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CENTIMETERS_PER_INCH: f64 = 2.54;

/// Unit attached to a resolution value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolutionUnit {
    PixelsPerInch,
    PixelsPerCentimeter,
    /// No unit declared. Converted as if it were pixels per inch.
    #[default]
    Undefined,
}

impl ResolutionUnit {
    /// Parses the unit name printed by `identify`. Unknown names are `Undefined`.
    pub fn from_tool_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    fn scale(self) -> f64 {
        match self {
            ResolutionUnit::PixelsPerCentimeter => CENTIMETERS_PER_INCH,
            ResolutionUnit::PixelsPerInch | ResolutionUnit::Undefined => 1.0,
        }
    }
}

impl FromStr for ResolutionUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("PixelsPerInch") {
            Ok(ResolutionUnit::PixelsPerInch)
        } else if s.eq_ignore_ascii_case("PixelsPerCentimeter") {
            Ok(ResolutionUnit::PixelsPerCentimeter)
        } else if s.eq_ignore_ascii_case("Undefined") {
            Ok(ResolutionUnit::Undefined)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for ResolutionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionUnit::PixelsPerInch => "PixelsPerInch",
            ResolutionUnit::PixelsPerCentimeter => "PixelsPerCentimeter",
            ResolutionUnit::Undefined => "Undefined",
        };
        f.write_str(name)
    }
}

/// A resolution as reported by a tool, `x` and `y` in the tool's unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
}

impl Resolution {
    /// Parses `"XxY"`. Returns `None` for anything that is not exactly two
    /// finite, non-negative numbers separated by `x`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('x');
        let x = parse_axis(parts.next()?)?;
        let y = parse_axis(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Resolution { x, y })
    }
}

fn parse_axis(part: &str) -> Option<f64> {
    let value: f64 = part.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Dots per inch on each axis. `(0, 0)` stands for "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dpi {
    pub x: u32,
    pub y: u32,
}

impl Dpi {
    pub const UNKNOWN: Dpi = Dpi { x: 0, y: 0 };

    /// Converts a resolution string and its unit to dots per inch.
    ///
    /// Malformed or empty input gives [`Dpi::UNKNOWN`] instead of an error,
    /// since tool output is best effort.
    ///
    /// ```
    /// use binmeta::{Dpi, ResolutionUnit};
    ///
    /// let dpi = Dpi::from_resolution("37.89x37.89", ResolutionUnit::PixelsPerCentimeter);
    /// assert_eq!(dpi, Dpi { x: 96, y: 96 });
    /// assert_eq!(Dpi::from_resolution("", ResolutionUnit::Undefined), Dpi::UNKNOWN);
    /// ```
    pub fn from_resolution(resolution: &str, unit: ResolutionUnit) -> Self {
        match Resolution::parse(resolution) {
            Some(res) => Dpi {
                x: to_dpi(res.x, unit),
                y: to_dpi(res.y, unit),
            },
            None => Dpi::UNKNOWN,
        }
    }

    /// Same as [`Dpi::from_resolution`], with the unit given as the tool prints it.
    pub fn from_tool_strings(resolution: &str, units: &str) -> Self {
        Self::from_resolution(resolution, ResolutionUnit::from_tool_name(units))
    }

    pub fn is_known(&self) -> bool {
        *self != Dpi::UNKNOWN
    }
}

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

// f64::round rounds half away from zero, which is half-up for non-negative values.
fn to_dpi(value: f64, unit: ResolutionUnit) -> u32 {
    (value * unit.scale()).round() as u32
}
