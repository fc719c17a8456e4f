//! Option structures for every element kind.
//!
//! Each structure enumerates the options it recognises and their defaults.
//! Deserialization rejects unknown fields, so a misspelt option in a deck
//! description is an error instead of being silently ignored.

use crate::error::{Error, Result};
use crate::fit::{FitPolicy, SourceSize};
use crate::units::Length;
use serde::Deserialize;

/// Click target of a text run, table cell or picture.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HyperlinkOptions {
    /// External URL.
    pub url: Option<String>,
    /// 1-based slide number inside this presentation.
    pub slide: Option<u32>,
    /// Hover text.
    pub tooltip: Option<String>,
}

impl HyperlinkOptions {
    /// Link to an external URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Link to another slide.
    pub fn slide(number: u32) -> Self {
        Self {
            slide: Some(number),
            ..Self::default()
        }
    }

    /// A link needs a URL or a slide reference.
    pub fn validate(&self) -> Result<()> {
        let has_url = self.url.as_deref().is_some_and(|u| !u.is_empty());
        if has_url || self.slide.is_some() {
            Ok(())
        } else {
            Err(Error::InvalidHyperlink)
        }
    }
}

/// Outline of a shape or connector.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineOptions {
    /// Width in points.
    pub width: Option<f64>,
    /// Hex colour (`RRGGBB`).
    pub color: Option<String>,
    /// Preset dash name.
    pub dash: Option<String>,
    /// Arrowhead at the start.
    pub head: Option<String>,
    /// Arrowhead at the end.
    pub tail: Option<String>,
    /// Line cap: `flat`, `rnd` or `sq`.
    pub cap: Option<String>,
}

/// Formatting of a single text run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Single underline.
    pub underline: bool,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Latin typeface.
    pub font_face: Option<String>,
    /// Hex colour.
    pub color: Option<String>,
    /// Click target.
    pub hyperlink: Option<HyperlinkOptions>,
    /// Start a new paragraph after this run.
    pub break_line: bool,
}

/// A run of text with its own formatting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextRun {
    /// The text.
    pub text: String,
    /// Run formatting.
    #[serde(default)]
    pub options: RunOptions,
}

impl TextRun {
    /// Plain run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: RunOptions::default(),
        }
    }

    /// Run with formatting.
    pub fn with_options(text: impl Into<String>, options: RunOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

/// Text content: a plain string or formatted runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    /// A plain string; `\n` starts a new paragraph.
    Plain(String),
    /// Formatted runs.
    Runs(Vec<TextRun>),
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent::Plain(String::new())
    }
}

impl From<&str> for TextContent {
    fn from(text: &str) -> Self {
        TextContent::Plain(text.to_string())
    }
}

impl From<String> for TextContent {
    fn from(text: String) -> Self {
        TextContent::Plain(text)
    }
}

impl From<Vec<TextRun>> for TextContent {
    fn from(runs: Vec<TextRun>) -> Self {
        TextContent::Runs(runs)
    }
}

/// Options of a text box or shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextOptions {
    /// Left offset.
    pub x: Option<Length>,
    /// Top offset.
    pub y: Option<Length>,
    /// Width.
    pub w: Option<Length>,
    /// Height.
    pub h: Option<Length>,
    /// Horizontal alignment (`left`, `center`, `right`, `justify`; prefixes accepted).
    pub align: Option<String>,
    /// Vertical anchor (`top`, `middle`, `bottom`; prefixes accepted).
    pub valign: Option<String>,
    /// Default font size in points.
    pub font_size: Option<f64>,
    /// Default Latin typeface.
    pub font_face: Option<String>,
    /// Default text colour.
    pub color: Option<String>,
    /// Bold for every run.
    pub bold: bool,
    /// Italic for every run.
    pub italic: bool,
    /// Underline for every run.
    pub underline: bool,
    /// Solid fill colour.
    pub fill: Option<String>,
    /// Outline.
    pub line: Option<LineOptions>,
    /// Preset geometry name (`rect` when absent).
    pub shape: Option<String>,
    /// Rotation in degrees.
    pub rotate: Option<f64>,
    /// Flip horizontally.
    pub flip_h: bool,
    /// Flip vertically.
    pub flip_v: bool,
    /// Uniform inset in inches.
    pub inset: Option<f64>,
    /// Shrink the shape to its text.
    pub autofit: bool,
    /// Line spacing in points.
    pub line_spacing: Option<f64>,
    /// Click target applied to plain-string content.
    pub hyperlink: Option<HyperlinkOptions>,
    /// Name of the layout placeholder this text fills.
    pub placeholder: Option<String>,
}

/// Shapes take the same options as text boxes.
pub type ShapeOptions = TextOptions;

/// Duotone recolouring of a picture.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorBlend {
    /// Shadow colour (default `226622`).
    pub dark_color: Option<String>,
    /// Highlight colour (default `FFFFFF`).
    pub light_color: Option<String>,
}

/// Options of a picture.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageOptions {
    /// File path or URL.
    pub path: Option<String>,
    /// Inline payload: `image/<type>;base64,<data>`.
    pub data: Option<String>,
    /// Left offset.
    pub x: Option<Length>,
    /// Top offset.
    pub y: Option<Length>,
    /// Width.
    pub w: Option<Length>,
    /// Height.
    pub h: Option<Length>,
    /// Clip to an ellipse.
    pub rounding: bool,
    /// Opacity in `[0, 1)`.
    pub opacity: Option<f64>,
    /// Duotone effect.
    pub color_blend: Option<ColorBlend>,
    /// Fit policy.
    pub object_fit: Option<FitPolicy>,
    /// Source asset dimensions, required by `cover`, `contain` and `crop`.
    pub image_format: Option<SourceSize>,
    /// Click target.
    pub hyperlink: Option<HyperlinkOptions>,
    /// Name of the layout placeholder this picture fills.
    pub placeholder: Option<String>,
    /// Rotation in degrees.
    pub rotate: Option<f64>,
    /// Flip horizontally.
    pub flip_h: bool,
    /// Flip vertically.
    pub flip_v: bool,
    /// Alternative text (defaults to the path).
    pub alt_text: Option<String>,
}

/// Kind of media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Embedded audio.
    #[default]
    Audio,
    /// Embedded video.
    Video,
    /// Linked online video.
    Online,
}

impl MediaKind {
    /// Name used as the MIME major type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Online => "online",
        }
    }
}

/// Options of an audio or video element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaOptions {
    /// Audio, video or online video.
    pub media_type: MediaKind,
    /// File path.
    pub path: Option<String>,
    /// Inline payload: `video/<type>;base64,<data>`.
    pub data: Option<String>,
    /// External link, required for online video.
    pub link: Option<String>,
    /// Left offset (default 0).
    pub x: Option<Length>,
    /// Top offset (default 0).
    pub y: Option<Length>,
    /// Width (default 2in).
    pub w: Option<Length>,
    /// Height (default 2in).
    pub h: Option<Length>,
}

/// Supported chart families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Area chart.
    Area,
    /// Bar or column chart.
    Bar,
    /// Line chart.
    Line,
    /// Pie chart.
    Pie,
    /// Doughnut chart.
    Doughnut,
}

/// One data series.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartSeries {
    /// Series name.
    pub name: String,
    /// Category labels.
    pub labels: Vec<String>,
    /// Values, one per label.
    pub values: Vec<f64>,
}

/// Options of a chart.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartOptions {
    /// Left offset (default 1in).
    pub x: Option<Length>,
    /// Top offset (default 1in).
    pub y: Option<Length>,
    /// Width (default 50%).
    pub w: Option<Length>,
    /// Height (default 50%).
    pub h: Option<Length>,
    /// Chart title; shown when set.
    pub title: Option<String>,
    /// Show the legend.
    pub show_legend: bool,
    /// Legend position: `b`, `l`, `r`, `t`, `tr`.
    pub legend_pos: Option<String>,
    /// Bar direction: `bar` or `col`.
    pub bar_dir: Option<String>,
    /// Bar grouping: `clustered`, `standard`, `stacked`, `percentStacked`.
    pub bar_grouping: Option<String>,
    /// Series colours.
    pub chart_colors: Option<Vec<String>>,
    /// Show values as data labels.
    pub show_value: bool,
    /// Number format of data labels.
    pub data_label_format_code: Option<String>,
}

/// Formatting of a table cell.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CellOptions {
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Text colour.
    pub color: Option<String>,
    /// Background fill.
    pub fill: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Latin typeface.
    pub font_face: Option<String>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical anchor.
    pub valign: Option<String>,
    /// Columns spanned.
    pub colspan: Option<u32>,
    /// Click target.
    pub hyperlink: Option<HyperlinkOptions>,
}

/// A table cell: plain text or text with options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TableCell {
    /// Plain text.
    Plain(String),
    /// Text with cell options.
    Styled {
        /// Cell text.
        text: String,
        /// Cell options.
        #[serde(default)]
        options: CellOptions,
    },
}

impl TableCell {
    /// Cell text.
    pub fn text(&self) -> &str {
        match self {
            TableCell::Plain(text) => text,
            TableCell::Styled { text, .. } => text,
        }
    }

    /// Cell options, if any.
    pub fn options(&self) -> Option<&CellOptions> {
        match self {
            TableCell::Plain(_) => None,
            TableCell::Styled { options, .. } => Some(options),
        }
    }
}

impl From<&str> for TableCell {
    fn from(text: &str) -> Self {
        TableCell::Plain(text.to_string())
    }
}

/// Column widths: one width for all columns or one per column, in inches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnWidths {
    /// Same width for every column.
    Uniform(f64),
    /// One width per column.
    PerColumn(Vec<f64>),
}

/// Table border.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BorderOptions {
    /// Width in points.
    pub pt: f64,
    /// Hex colour.
    pub color: String,
}

impl Default for BorderOptions {
    fn default() -> Self {
        Self {
            pt: 1.0,
            color: "666666".to_string(),
        }
    }
}

/// Options of a table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    /// Left offset (default 0.5in).
    pub x: Option<Length>,
    /// Top offset (default 1in).
    pub y: Option<Length>,
    /// Total width (default: page width minus side margins).
    pub w: Option<Length>,
    /// Total height; derived from rows when absent.
    pub h: Option<Length>,
    /// Column widths in inches.
    pub col_w: Option<ColumnWidths>,
    /// Row heights in inches.
    pub row_h: Option<Vec<f64>>,
    /// Font size in points (default 12).
    pub font_size: Option<f64>,
    /// Latin typeface.
    pub font_face: Option<String>,
    /// Text colour (default `000000`).
    pub color: Option<String>,
    /// Cell fill.
    pub fill: Option<String>,
    /// Bold text.
    pub bold: bool,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical anchor.
    pub valign: Option<String>,
    /// Cell border.
    pub border: Option<BorderOptions>,
    /// Cell margin in points.
    pub margin: Option<f64>,
    /// Split rows across slides when they overflow (default true).
    pub auto_page: Option<bool>,
    /// Top offset, in inches, of continuation pages.
    pub new_page_start_y: Option<f64>,
}

/// Slide number field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlideNumberOptions {
    /// Left offset.
    pub x: Option<Length>,
    /// Top offset.
    pub y: Option<Length>,
    /// Width (default 0.8in).
    pub w: Option<Length>,
    /// Height (default 0.3in).
    pub h: Option<Length>,
    /// Text colour.
    pub color: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Latin typeface.
    pub font_face: Option<String>,
}

/// Background image source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundImage {
    /// File path or URL.
    pub path: Option<String>,
    /// Inline payload.
    pub data: Option<String>,
}

/// Slide background: a colour or an image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Background {
    /// Solid colour.
    Color(String),
    /// Stretched picture.
    Image(BackgroundImage),
}

/// Background options of a slide or layout.
pub type BackgroundOptions = Background;

/// Placeholder kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    /// Title.
    Title,
    /// Body text.
    #[default]
    Body,
    /// Picture.
    Pic,
    /// Chart.
    Chart,
    /// Table.
    Tbl,
    /// Media.
    Media,
}

impl PlaceholderKind {
    /// Value of `p:ph/@type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKind::Title => "title",
            PlaceholderKind::Body => "body",
            PlaceholderKind::Pic => "pic",
            PlaceholderKind::Chart => "chart",
            PlaceholderKind::Tbl => "tbl",
            PlaceholderKind::Media => "media",
        }
    }
}

/// A named placeholder on a layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderOptions {
    /// Name referenced by slide elements.
    pub name: String,
    /// Placeholder kind.
    pub placeholder_type: PlaceholderKind,
    /// Prompt text shown in the editor.
    pub text: Option<String>,
    /// Left offset.
    pub x: Option<Length>,
    /// Top offset.
    pub y: Option<Length>,
    /// Width.
    pub w: Option<Length>,
    /// Height.
    pub h: Option<Length>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Text colour.
    pub color: Option<String>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical anchor.
    pub valign: Option<String>,
    /// Fit policy for pictures filling this placeholder.
    pub object_fit: Option<FitPolicy>,
    /// Opacity for pictures filling this placeholder.
    pub opacity: Option<f64>,
    /// Duotone effect for pictures filling this placeholder.
    pub color_blend: Option<ColorBlend>,
}

/// One element in a slide or layout description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum ElementSpec {
    /// Text box.
    Text {
        /// Content.
        text: TextContent,
        /// Options.
        #[serde(default)]
        options: TextOptions,
    },
    /// Preset shape.
    Shape {
        /// Preset geometry name.
        shape: String,
        /// Options.
        #[serde(default)]
        options: TextOptions,
    },
    /// Picture.
    Image {
        /// Options.
        options: ImageOptions,
    },
    /// Audio or video.
    Media {
        /// Options.
        options: MediaOptions,
    },
    /// Chart.
    Chart {
        /// Chart family.
        chart_type: ChartType,
        /// Series.
        data: Vec<ChartSeries>,
        /// Options.
        #[serde(default)]
        options: ChartOptions,
    },
    /// Table.
    Table {
        /// Rows of cells.
        rows: Vec<Vec<TableCell>>,
        /// Options.
        #[serde(default)]
        options: TableOptions,
    },
    /// Layout placeholder (layouts only).
    Placeholder {
        /// Options.
        options: PlaceholderOptions,
    },
}

/// A slide master (layout) definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MasterOptions {
    /// Layout name referenced by slides.
    pub title: String,
    /// Background.
    pub background: Option<Background>,
    /// Slide margins in inches: top, right, bottom, left.
    pub margin: Option<[f64; 4]>,
    /// Objects drawn on every slide using this layout.
    pub objects: Vec<ElementSpec>,
    /// Slide number field.
    pub slide_number: Option<SlideNumberOptions>,
}

/// A slide definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlideSpec {
    /// Layout name; the default layout when absent or unknown.
    pub master: Option<String>,
    /// Background.
    pub background: Option<Background>,
    /// Speaker notes.
    pub notes: Option<String>,
    /// Hide the slide in slideshow mode.
    pub hidden: bool,
    /// Slide number field.
    pub slide_number: Option<SlideNumberOptions>,
    /// Elements in z-order.
    pub elements: Vec<ElementSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperlink_validation() {
        assert!(HyperlinkOptions::url("https://example.com").validate().is_ok());
        assert!(HyperlinkOptions::slide(2).validate().is_ok());
        assert!(matches!(
            HyperlinkOptions::default().validate(),
            Err(Error::InvalidHyperlink)
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = serde_json::from_str::<ImageOptions>(r#"{"path":"a.png","sizing":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_element_spec_deserialize() {
        let json = r#"[
            {"type":"text","text":"Hello","options":{"x":1,"y":"10%","bold":true}},
            {"type":"image","options":{"path":"pic.jpg","object_fit":"cover","image_format":{"width":640,"height":480}}},
            {"type":"media","options":{"media_type":"online","link":"https://youtu.be/x"}},
            {"type":"table","rows":[["a",{"text":"b","options":{"bold":true}}]]}
        ]"#;
        let specs: Vec<ElementSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs.len(), 4);

        match &specs[1] {
            ElementSpec::Image { options } => {
                assert_eq!(options.object_fit, Some(FitPolicy::Cover));
                assert_eq!(options.image_format, Some(SourceSize::new(640.0, 480.0)));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &specs[3] {
            ElementSpec::Table { rows, .. } => {
                assert_eq!(rows[0][1].text(), "b");
                assert!(rows[0][1].options().is_some_and(|o| o.bold));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_background_variants() {
        let c: Background = serde_json::from_str(r#""FF0000""#).unwrap();
        assert_eq!(c, Background::Color("FF0000".to_string()));
        let i: Background = serde_json::from_str(r#"{"path":"bg.png"}"#).unwrap();
        assert!(matches!(i, Background::Image(_)));
    }
}
