//! Slide elements.
//!
//! Elements register their relationships when they are constructed and
//! keep the ids they were given; rendering only embeds those ids. Geometry
//! is resolved at render time against the presentation's page layout.

mod chart;
mod image;
mod media;
mod placeholder;
mod table;
mod text;

pub use chart::ChartElement;
pub use image::ImageElement;
pub use media::MediaElement;
pub use placeholder::{PlaceholderElement, SlideNumberElement};
pub use table::{TableElement, TableGeometry, TablePage};
pub use text::{LineStyle, TextElement};

use crate::rels::{rid, RelationshipRegistry};
use crate::xml::XmlNode;
use deckgen_core::units::{emu_to_int, points_to_emu};
use deckgen_core::{HyperlinkOptions, Layout, Length, Result};

/// Page-wide settings every renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Page dimensions.
    pub layout: &'a Layout,
    /// Right-to-left paragraphs.
    pub rtl: bool,
}

/// One element of a slide, layout or master.
#[derive(Debug, Clone)]
pub enum Element {
    /// Text box or preset shape.
    Text(TextElement),
    /// Picture.
    Image(ImageElement),
    /// Audio, video or online video.
    Media(MediaElement),
    /// Chart frame.
    Chart(ChartElement),
    /// Table frame.
    Table(TableElement),
    /// Layout placeholder.
    Placeholder(PlaceholderElement),
}

impl Element {
    /// Name of the layout placeholder this element fills.
    pub fn placeholder_name(&self) -> Option<&str> {
        match self {
            Element::Text(e) => e.placeholder(),
            Element::Image(e) => e.placeholder(),
            _ => None,
        }
    }

    /// Render the element. `idx` is its position in the shape tree.
    pub fn render(
        &self,
        idx: usize,
        ctx: &RenderContext,
        placeholder: Option<&PlaceholderElement>,
    ) -> XmlNode {
        match self {
            Element::Text(e) => e.render(idx, ctx, placeholder),
            Element::Image(e) => e.render(idx, ctx, placeholder),
            Element::Media(e) => e.render(idx, ctx),
            Element::Chart(e) => e.render(idx, ctx),
            Element::Table(e) => e.render(idx, ctx),
            Element::Placeholder(e) => e.render(idx, ctx),
        }
    }
}

/// Position, size and orientation of an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Left offset.
    pub x: Option<Length>,
    /// Top offset.
    pub y: Option<Length>,
    /// Width.
    pub w: Option<Length>,
    /// Height.
    pub h: Option<Length>,
    /// Rotation in degrees.
    pub rotate: Option<f64>,
    /// Horizontal flip.
    pub flip_h: bool,
    /// Vertical flip.
    pub flip_v: bool,
}

/// A frame resolved to EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    /// A frame from the four coordinates.
    pub fn new(x: Option<Length>, y: Option<Length>, w: Option<Length>, h: Option<Length>) -> Self {
        Self {
            x,
            y,
            w,
            h,
            ..Self::default()
        }
    }

    /// Fill missing coordinates from `other`.
    pub fn or(&self, other: Option<&Frame>) -> Frame {
        match other {
            Some(other) => Frame {
                x: self.x.or(other.x),
                y: self.y.or(other.y),
                w: self.w.or(other.w),
                h: self.h.or(other.h),
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Fill missing coordinates with defaults.
    pub fn or_defaults(&self, x: Length, y: Length, w: Length, h: Length) -> Frame {
        Frame {
            x: self.x.or(Some(x)),
            y: self.y.or(Some(y)),
            w: self.w.or(Some(w)),
            h: self.h.or(Some(h)),
            ..self.clone()
        }
    }

    /// Resolve to EMU. Missing coordinates are 0.
    pub fn bounds(&self, layout: &Layout) -> Bounds {
        let x = |v: Option<Length>| v.map(|l| l.to_emu_x(layout)).map(emu_to_int).unwrap_or(0);
        let y = |v: Option<Length>| v.map(|l| l.to_emu_y(layout)).map(emu_to_int).unwrap_or(0);
        Bounds {
            x: x(self.x),
            y: y(self.y),
            cx: x(self.w),
            cy: y(self.h),
        }
    }

    /// `a:xfrm` (or `p:xfrm` for graphic frames).
    pub fn xfrm(&self, tag: &str, layout: &Layout) -> XmlNode {
        let b = self.bounds(layout);
        let mut node = XmlNode::new(tag);
        if let Some(rotate) = self.rotate.filter(|r| *r != 0.0) {
            node = node.attr("rot", (rotate * 60_000.0).round() as i64);
        }
        if self.flip_h {
            node = node.attr("flipH", 1);
        }
        if self.flip_v {
            node = node.attr("flipV", 1);
        }
        node.child(XmlNode::new("a:off").attr("x", b.x).attr("y", b.y))
            .child(XmlNode::new("a:ext").attr("cx", b.cx).attr("cy", b.cy))
    }
}

/// Normalize a colour: strip `#` and upper-case hex values.
pub fn normalize_color(color: &str) -> String {
    let color = color.trim().trim_start_matches('#');
    if is_hex_color(color) {
        color.to_uppercase()
    } else {
        color.to_string()
    }
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit())
}

/// `a:srgbClr` for hex colours, `a:schemeClr` for theme colour names.
pub fn color_node(color: &str) -> XmlNode {
    let color = normalize_color(color);
    if is_hex_color(&color) {
        XmlNode::new("a:srgbClr").attr("val", color)
    } else {
        XmlNode::new("a:schemeClr").attr("val", color)
    }
}

/// `a:solidFill` with one colour.
pub fn solid_fill(color: &str) -> XmlNode {
    XmlNode::new("a:solidFill").child(color_node(color))
}

/// `algn` value from a loose alignment name.
pub fn paragraph_align(align: &str) -> Option<&'static str> {
    match align.trim().to_lowercase().chars().next()? {
        'c' | 'm' => Some("ctr"),
        'l' => Some("l"),
        'r' => Some("r"),
        'j' => Some("just"),
        _ => None,
    }
}

/// `anchor` value from a loose vertical alignment name.
pub fn vertical_anchor(valign: &str) -> Option<&'static str> {
    match valign.trim().to_lowercase().chars().next()? {
        'c' | 'm' => Some("ctr"),
        't' => Some("t"),
        'b' => Some("b"),
        _ => None,
    }
}

/// A registered click target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// Relationship id.
    pub id: u32,
    /// Jump to a slide of this presentation.
    pub slide: bool,
    /// Hover text.
    pub tooltip: Option<String>,
}

/// Fail on the first unusable link. Constructors call this before they
/// register anything, so a rejected element leaves the registry untouched.
pub(crate) fn validate_links<'a>(
    links: impl IntoIterator<Item = Option<&'a HyperlinkOptions>>,
) -> Result<()> {
    links
        .into_iter()
        .flatten()
        .try_for_each(HyperlinkOptions::validate)
}

impl LinkRef {
    /// Register a hyperlink and keep its id.
    pub fn register(link: &HyperlinkOptions, registry: &mut RelationshipRegistry) -> Result<Self> {
        let id = registry.register_hyperlink(link)?;
        Ok(Self {
            id,
            slide: link.slide.is_some(),
            tooltip: link.tooltip.clone(),
        })
    }

    /// Register an optional hyperlink.
    pub fn register_opt(
        link: Option<&HyperlinkOptions>,
        registry: &mut RelationshipRegistry,
    ) -> Result<Option<Self>> {
        link.map(|l| Self::register(l, registry)).transpose()
    }

    /// `a:hlinkClick`.
    pub fn render(&self) -> XmlNode {
        let mut node = XmlNode::new("a:hlinkClick").attr("r:id", rid(self.id));
        if self.slide {
            node = node.attr("action", "ppaction://hlinksldjump");
        }
        node.attr_opt("tooltip", self.tooltip.as_deref())
    }
}

/// Formatting of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Font size in points.
    pub font_size: Option<f64>,
    pub font_face: Option<String>,
    pub color: Option<String>,
    pub link: Option<LinkRef>,
}

impl RunStyle {
    /// `a:rPr` (or `a:endParaRPr` and friends via `tag`).
    pub fn render(&self, tag: &str) -> XmlNode {
        let mut node = XmlNode::new(tag).attr("lang", "en-US");
        if let Some(size) = self.font_size {
            node = node.attr("sz", (size * 100.0).round() as i64);
        }
        if self.bold {
            node = node.attr("b", 1);
        }
        if self.italic {
            node = node.attr("i", 1);
        }
        if self.underline {
            node = node.attr("u", "sng");
        }
        node = node.attr("dirty", 0);

        if let Some(color) = &self.color {
            node.push(solid_fill(color));
        }
        if let Some(face) = &self.font_face {
            node.push(XmlNode::new("a:latin").attr("typeface", face.as_str()));
            node.push(XmlNode::new("a:cs").attr("typeface", face.as_str()));
        }
        if let Some(link) = &self.link {
            node.push(link.render());
        }
        node
    }
}

/// `a:ln` width attribute from points.
pub fn line_width(points: f64) -> i64 {
    emu_to_int(points_to_emu(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_prefixes() {
        assert_eq!(paragraph_align("center"), Some("ctr"));
        assert_eq!(paragraph_align("Middle"), Some("ctr"));
        assert_eq!(paragraph_align("l"), Some("l"));
        assert_eq!(paragraph_align("justify"), Some("just"));
        assert_eq!(paragraph_align("x"), None);
        assert_eq!(vertical_anchor("middle"), Some("ctr"));
        assert_eq!(vertical_anchor("top"), Some("t"));
        assert_eq!(vertical_anchor("bottom"), Some("b"));
    }

    #[test]
    fn test_colors() {
        assert_eq!(
            color_node("#ff0000").to_xml().unwrap(),
            r#"<a:srgbClr val="FF0000"/>"#
        );
        assert_eq!(
            color_node("accent1").to_xml().unwrap(),
            r#"<a:schemeClr val="accent1"/>"#
        );
    }

    #[test]
    fn test_frame_fallback_and_xfrm() {
        let layout = Layout::default();
        let own = Frame::new(Some(Length::Auto(1.0)), None, None, None);
        let placeholder = Frame::new(
            Some(Length::Auto(5.0)),
            Some(Length::Auto(2.0)),
            Some(Length::Percent(50.0)),
            Some(Length::Auto(1.0)),
        );
        let frame = own.or(Some(&placeholder));
        let b = frame.bounds(&layout);
        assert_eq!(b, Bounds { x: 914_400, y: 1_828_800, cx: 4_572_000, cy: 914_400 });

        let rotated = Frame {
            rotate: Some(90.0),
            flip_h: true,
            ..frame
        };
        let xml = rotated.xfrm("a:xfrm", &layout).to_xml().unwrap();
        assert!(xml.starts_with(r#"<a:xfrm rot="5400000" flipH="1">"#));
    }

    #[test]
    fn test_run_style() {
        let style = RunStyle {
            bold: true,
            font_size: Some(14.0),
            color: Some("333333".into()),
            link: Some(LinkRef { id: 3, slide: true, tooltip: None }),
            ..RunStyle::default()
        };
        assert_eq!(
            style.render("a:rPr").to_xml().unwrap(),
            r#"<a:rPr lang="en-US" sz="1400" b="1" dirty="0"><a:solidFill><a:srgbClr val="333333"/></a:solidFill><a:hlinkClick r:id="rId3" action="ppaction://hlinksldjump"/></a:rPr>"#
        );
    }
}
