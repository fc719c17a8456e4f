//! Layout placeholders and the slide number field.

use super::image::checked_opacity;
use super::{color_node, paragraph_align, vertical_anchor, Frame, RenderContext};
use crate::schema::SLIDE_NUMBER_FIELD_ID;
use crate::xml::XmlNode;
use deckgen_core::{
    ColorBlend, FitPolicy, Length, PlaceholderKind, PlaceholderOptions, SlideNumberOptions,
};

/// Placeholder indexes on layouts start here.
pub const PLACEHOLDER_IDX_BASE: usize = 100;

/// A named placeholder on a layout.
#[derive(Debug, Clone)]
pub struct PlaceholderElement {
    options: PlaceholderOptions,
    index: usize,
    frame: Frame,
    opacity: Option<f64>,
}

impl PlaceholderElement {
    /// `position` is the placeholder's index among the layout's objects.
    pub fn new(options: PlaceholderOptions, position: usize) -> Self {
        let frame = Frame::new(options.x, options.y, options.w, options.h);
        let opacity = checked_opacity(options.opacity);
        Self {
            options,
            index: PLACEHOLDER_IDX_BASE + position,
            frame,
            opacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn kind(&self) -> PlaceholderKind {
        self.options.placeholder_type
    }

    /// Value of `p:ph/@idx`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position on the layout, used as fallback by slide elements.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Picture settings inherited by images that leave them unset.
    pub fn object_fit(&self) -> Option<FitPolicy> {
        self.options.object_fit
    }

    pub fn opacity(&self) -> Option<f64> {
        self.opacity
    }

    pub fn color_blend(&self) -> Option<&ColorBlend> {
        self.options.color_blend.as_ref()
    }

    /// `p:ph` as written on slides filling this placeholder.
    pub fn reference(&self) -> XmlNode {
        XmlNode::new("p:ph")
            .attr("type", self.kind().as_str())
            .attr("idx", self.index)
    }

    /// Render the placeholder on its layout.
    pub fn render(&self, idx: usize, ctx: &RenderContext) -> XmlNode {
        let o = &self.options;
        let mut ph = self.reference();
        if o.text.is_some() {
            ph = ph.attr("hasCustomPrompt", 1);
        }

        let nv_sp_pr = XmlNode::new("p:nvSpPr")
            .child(XmlNode::new("p:cNvPr").attr("id", idx + 2).attr("name", o.name.as_str()))
            .child(XmlNode::new("p:cNvSpPr").child(XmlNode::new("a:spLocks").attr("noGrp", 1)))
            .child(XmlNode::new("p:nvPr").child(ph));

        let frame = self.frame.or_defaults(
            Length::Auto(0.0),
            Length::Auto(0.0),
            Length::Percent(100.0),
            Length::Auto(1.0),
        );
        let sp_pr = XmlNode::new("p:spPr").child(frame.xfrm("a:xfrm", ctx.layout));

        let body_pr = XmlNode::new("a:bodyPr")
            .attr_opt("anchor", o.valign.as_deref().and_then(vertical_anchor));

        let mut level = XmlNode::new("a:lvl1pPr")
            .attr_opt("algn", o.align.as_deref().and_then(paragraph_align));
        if o.font_size.is_some() || o.color.is_some() {
            let mut def = XmlNode::new("a:defRPr");
            if let Some(size) = o.font_size {
                def = def.attr("sz", (size * 100.0).round() as i64);
            }
            if let Some(color) = &o.color {
                def.push(XmlNode::new("a:solidFill").child(color_node(color)));
            }
            level.push(def);
        }

        let mut paragraph = XmlNode::new("a:p");
        match &o.text {
            Some(text) => paragraph.push(
                XmlNode::new("a:r")
                    .child(XmlNode::new("a:rPr").attr("lang", "en-US").attr("dirty", 0))
                    .child(XmlNode::new("a:t").text(text.as_str())),
            ),
            None => paragraph.push(XmlNode::new("a:endParaRPr").attr("lang", "en-US")),
        }

        let tx_body = XmlNode::new("p:txBody")
            .child(body_pr)
            .child(XmlNode::new("a:lstStyle").child(level))
            .child(paragraph);

        XmlNode::new("p:sp").child(nv_sp_pr).child(sp_pr).child(tx_body)
    }
}

/// The slide number field.
#[derive(Debug, Clone, Default)]
pub struct SlideNumberElement {
    options: SlideNumberOptions,
}

impl SlideNumberElement {
    pub fn new(options: SlideNumberOptions) -> Self {
        Self { options }
    }

    /// Render `p:sp` with a `slidenum` field.
    pub fn render(&self, idx: usize, ctx: &RenderContext) -> XmlNode {
        let o = &self.options;
        let frame = Frame::new(o.x, o.y, o.w, o.h).or_defaults(
            Length::Auto(0.3),
            Length::Percent(90.0),
            Length::Auto(0.8),
            Length::Auto(0.3),
        );

        let nv_sp_pr = XmlNode::new("p:nvSpPr")
            .child(
                XmlNode::new("p:cNvPr")
                    .attr("id", idx + 2)
                    .attr("name", "Slide Number Placeholder"),
            )
            .child(XmlNode::new("p:cNvSpPr").child(XmlNode::new("a:spLocks").attr("noGrp", 1)))
            .child(
                XmlNode::new("p:nvPr").child(
                    XmlNode::new("p:ph")
                        .attr("type", "sldNum")
                        .attr("sz", "quarter")
                        .attr("idx", 4_294_967_295u32),
                ),
            );

        let mut def = XmlNode::new("a:defRPr");
        if let Some(size) = o.font_size {
            def = def.attr("sz", (size * 100.0).round() as i64);
        }
        if let Some(color) = &o.color {
            def.push(XmlNode::new("a:solidFill").child(color_node(color)));
        }
        if let Some(face) = &o.font_face {
            def.push(XmlNode::new("a:latin").attr("typeface", face.as_str()));
        }

        let field = XmlNode::new("a:fld")
            .attr("id", SLIDE_NUMBER_FIELD_ID)
            .attr("type", "slidenum")
            .child(XmlNode::new("a:rPr").attr("lang", "en-US"))
            .child(XmlNode::new("a:t").text("\u{2039}#\u{203A}"));

        XmlNode::new("p:sp")
            .child(nv_sp_pr)
            .child(XmlNode::new("p:spPr").child(frame.xfrm("a:xfrm", ctx.layout)))
            .child(
                XmlNode::new("p:txBody")
                    .child(XmlNode::new("a:bodyPr"))
                    .child(XmlNode::new("a:lstStyle").child(XmlNode::new("a:lvl1pPr").child(def)))
                    .child(
                        XmlNode::new("a:p")
                            .child(field)
                            .child(XmlNode::new("a:endParaRPr").attr("lang", "en-US")),
                    ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::Layout;

    #[test]
    fn test_placeholder_render() {
        let layout = Layout::default();
        let ctx = RenderContext { layout: &layout, rtl: false };
        let ph = PlaceholderElement::new(
            PlaceholderOptions {
                name: "body".into(),
                text: Some("Click to add text".into()),
                x: Some(Length::Auto(0.5)),
                ..PlaceholderOptions::default()
            },
            1,
        );
        assert_eq!(ph.index(), 101);
        let xml = ph.render(1, &ctx).to_xml().unwrap();
        assert!(xml.contains(r#"<p:ph type="body" idx="101" hasCustomPrompt="1"/>"#));
        assert!(xml.contains(r#"<p:cNvPr id="3" name="body"/>"#));
        assert!(xml.contains("<a:t>Click to add text</a:t>"));
        assert!(xml.contains(r#"<a:off x="457200" y="0"/>"#));
    }

    #[test]
    fn test_slide_number_field() {
        let layout = Layout::default();
        let ctx = RenderContext { layout: &layout, rtl: false };
        let el = SlideNumberElement::new(SlideNumberOptions {
            color: Some("FF0000".into()),
            ..SlideNumberOptions::default()
        });
        let xml = el.render(4, &ctx).to_xml().unwrap();
        assert!(xml.contains(r#"<p:cNvPr id="6" name="Slide Number Placeholder"/>"#));
        assert!(xml.contains(r#"type="slidenum""#));
        assert!(xml.contains(r#"<a:srgbClr val="FF0000"/>"#));
    }
}
