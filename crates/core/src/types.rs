//! Page layouts and presentation-wide settings.

use crate::error::{Error, Result};
use crate::units::{inches_to_emu, Axis};
use serde::{Deserialize, Serialize};

/// Default layout preset for new presentations.
pub const DEFAULT_LAYOUT: &str = "LAYOUT_16x9";

/// Default slide margins in inches: top, right, bottom, left.
pub const DEFAULT_SLIDE_MARGIN_IN: [f64; 4] = [0.5, 0.5, 0.5, 0.5];

/// Page dimensions of every slide in a presentation, in EMU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Name written to `p:sldSz/@type` when it is one of the built-in names.
    pub name: String,
    /// Page width in EMU.
    pub width: i64,
    /// Page height in EMU.
    pub height: i64,
}

impl Layout {
    /// Create a layout from EMU dimensions.
    pub fn new(name: impl Into<String>, width: i64, height: i64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// Look up a named preset.
    ///
    /// | Preset         | Size             |
    /// |----------------|------------------|
    /// | `LAYOUT_4x3`   | 10" x 7.5"       |
    /// | `LAYOUT_16x9`  | 10" x 5.625"     |
    /// | `LAYOUT_16x10` | 10" x 6.25"      |
    /// | `LAYOUT_WIDE`  | 13.33" x 7.5"    |
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "LAYOUT_4x3" => Ok(Self::new("screen4x3", 9_144_000, 6_858_000)),
            "LAYOUT_16x9" => Ok(Self::new("screen16x9", 9_144_000, 5_143_500)),
            "LAYOUT_16x10" => Ok(Self::new("screen16x10", 9_144_000, 5_715_000)),
            "LAYOUT_WIDE" => Ok(Self::new("custom", 12_192_000, 6_858_000)),
            other => Err(Error::UnknownLayout(other.to_string())),
        }
    }

    /// A user-defined layout given in inches.
    pub fn custom(width_in: f64, height_in: f64) -> Self {
        Self::new(
            "custom",
            inches_to_emu(width_in) as i64,
            inches_to_emu(height_in) as i64,
        )
    }

    /// Width or height as a float, for percentage resolution.
    pub fn dimension(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width as f64,
            Axis::Y => self.height as f64,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("screen16x9", 9_144_000, 5_143_500)
    }
}

/// Document properties written to `docProps/core.xml` and `docProps/app.xml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentInfo {
    /// Author and last-modified-by.
    pub author: String,
    /// Company shown in extended properties.
    pub company: String,
    /// Revision number. Must be a whole number or PowerPoint refuses the file.
    pub revision: String,
    /// Subject.
    pub subject: String,
    /// Title.
    pub title: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            author: "deckgen".to_string(),
            company: "deckgen".to_string(),
            revision: "1".to_string(),
            subject: "deckgen Presentation".to_string(),
            title: "deckgen Presentation".to_string(),
        }
    }
}

/// Theme fonts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeOptions {
    /// Major (heading) Latin typeface.
    pub head_font_face: String,
    /// Minor (body) Latin typeface.
    pub body_font_face: String,
}

impl Default for ThemeOptions {
    fn default() -> Self {
        Self {
            head_font_face: "Arial".to_string(),
            body_font_face: "Arial".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let l = Layout::preset("LAYOUT_4x3").unwrap();
        assert_eq!((l.width, l.height), (9_144_000, 6_858_000));
        let l = Layout::preset("LAYOUT_WIDE").unwrap();
        assert_eq!(l.name, "custom");
        assert!(matches!(
            Layout::preset("LAYOUT_BOGUS"),
            Err(Error::UnknownLayout(_))
        ));
    }

    #[test]
    fn test_custom_layout() {
        let l = Layout::custom(10.0, 5.625);
        assert_eq!(l, Layout::new("custom", 9_144_000, 5_143_500));
    }
}
