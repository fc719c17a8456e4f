//! Pictures (`p:pic`).

use super::{color_node, validate_links, Frame, LinkRef, PlaceholderElement, RenderContext};
use crate::rels::{rid, ImageRef, Payload, RelationshipRegistry};
use crate::schema::{namespace, SVG_BLIP_EXT_URI};
use crate::xml::XmlNode;
use deckgen_core::classify::{image_extension, require_base64_header};
use deckgen_core::{
    Error, FitBox, FitDirective, ImageOptions, Length, ObjectFit, Result,
};

const DEFAULT_DARK_BLEND: &str = "226622";
const DEFAULT_LIGHT_BLEND: &str = "FFFFFF";

/// A picture with its registered relationships.
#[derive(Debug, Clone)]
pub struct ImageElement {
    options: ImageOptions,
    image: ImageRef,
    link: Option<LinkRef>,
    opacity: Option<f64>,
}

impl ImageElement {
    /// Validate the source and the hyperlink, then register the picture and
    /// its hyperlink.
    pub fn new(options: ImageOptions, registry: &mut RelationshipRegistry) -> Result<Self> {
        validate_links([options.hyperlink.as_ref()])?;
        let payload = match (&options.data, &options.path) {
            (Some(data), _) => {
                require_base64_header(data)?;
                Payload::Inline(data.clone())
            }
            (None, Some(path)) => Payload::File(path.clone()),
            (None, None) => return Err(Error::MissingImageSource),
        };
        let extension = image_extension(options.data.as_deref(), options.path.as_deref());
        let image = registry.register_image(payload, &extension);
        let link = LinkRef::register_opt(options.hyperlink.as_ref(), registry)?;

        let opacity = checked_opacity(options.opacity);

        Ok(Self {
            options,
            image,
            link,
            opacity,
        })
    }

    /// Placeholder this picture fills.
    pub fn placeholder(&self) -> Option<&str> {
        self.options.placeholder.as_deref()
    }

    /// Registered ids.
    pub fn image_ref(&self) -> ImageRef {
        self.image
    }

    fn frame(&self, placeholder: Option<&PlaceholderElement>) -> Frame {
        let o = &self.options;
        Frame {
            x: o.x,
            y: o.y,
            w: o.w,
            h: o.h,
            rotate: o.rotate,
            flip_h: o.flip_h,
            flip_v: o.flip_v,
        }
        .or(placeholder.map(|ph| ph.frame()))
        .or_defaults(
            Length::Auto(0.0),
            Length::Auto(0.0),
            Length::Auto(1.0),
            Length::Auto(1.0),
        )
    }

    /// Render `p:pic`.
    pub fn render(
        &self,
        idx: usize,
        ctx: &RenderContext,
        placeholder: Option<&PlaceholderElement>,
    ) -> XmlNode {
        let o = &self.options;
        let frame = self.frame(placeholder);
        let descr = o
            .alt_text
            .as_deref()
            .or(o.path.as_deref())
            .unwrap_or("preencoded.png");

        let c_nv_pr = XmlNode::new("p:cNvPr")
            .attr("id", idx + 2)
            .attr("name", format!("Object {}", idx + 1))
            .attr("descr", descr)
            .child_opt(self.link.as_ref().map(LinkRef::render));

        let nv_pic_pr = XmlNode::new("p:nvPicPr")
            .child(c_nv_pr)
            .child(
                XmlNode::new("p:cNvPicPr")
                    .child(XmlNode::new("a:picLocks").attr("noChangeAspect", 1)),
            )
            .child(XmlNode::new("p:nvPr").child_opt(placeholder.map(|ph| ph.reference())));

        let opacity = self.opacity.or_else(|| placeholder.and_then(|ph| ph.opacity()));
        let color_blend = o
            .color_blend
            .as_ref()
            .or_else(|| placeholder.and_then(|ph| ph.color_blend()));
        let object_fit = o.object_fit.or_else(|| placeholder.and_then(|ph| ph.object_fit()));

        let mut blip = XmlNode::new("a:blip").attr("r:embed", rid(self.image.blip_id()));
        if let Some(opacity) = opacity {
            blip.push(
                XmlNode::new("a:alphaModFix").attr("amt", (opacity * 100_000.0).round() as i64),
            );
        }
        if let Some(blend) = color_blend {
            blip.push(
                XmlNode::new("a:duotone")
                    .child(color_node(
                        blend.dark_color.as_deref().unwrap_or(DEFAULT_DARK_BLEND),
                    ))
                    .child(color_node(
                        blend.light_color.as_deref().unwrap_or(DEFAULT_LIGHT_BLEND),
                    )),
            );
        }
        if let Some(svg_id) = self.image.svg_id() {
            blip.push(
                XmlNode::new("a:extLst").child(
                    XmlNode::new("a:ext").attr("uri", SVG_BLIP_EXT_URI).child(
                        XmlNode::new("asvg:svgBlip")
                            .attr("xmlns:asvg", namespace::ASVG)
                            .attr("r:embed", rid(svg_id)),
                    ),
                ),
            );
        }

        let mut blip_fill = XmlNode::new("p:blipFill").child(blip);
        let fit = ObjectFit::new(
            object_fit,
            FitBox {
                x: frame.x.unwrap_or(Length::Auto(0.0)),
                y: frame.y.unwrap_or(Length::Auto(0.0)),
                w: frame.w.unwrap_or(Length::Auto(1.0)),
                h: frame.h.unwrap_or(Length::Auto(1.0)),
            },
            o.image_format,
        );
        match fit.render(ctx.layout) {
            FitDirective::Stretch => blip_fill.push(stretch()),
            FitDirective::Nothing => {}
            FitDirective::SourceRect {
                left,
                right,
                top,
                bottom,
            } => {
                blip_fill.push(
                    XmlNode::new("a:srcRect")
                        .attr("l", left)
                        .attr("r", right)
                        .attr("t", top)
                        .attr("b", bottom),
                );
                blip_fill.push(XmlNode::new("a:stretch"));
            }
        }

        let geometry = if o.rounding { "ellipse" } else { "rect" };
        let sp_pr = XmlNode::new("p:spPr")
            .child(frame.xfrm("a:xfrm", ctx.layout))
            .child(
                XmlNode::new("a:prstGeom")
                    .attr("prst", geometry)
                    .child(XmlNode::new("a:avLst")),
            );

        XmlNode::new("p:pic")
            .child(nv_pic_pr)
            .child(blip_fill)
            .child(sp_pr)
    }
}

/// Opacity in `[0, 1)`; anything else is dropped with a warning.
pub(super) fn checked_opacity(opacity: Option<f64>) -> Option<f64> {
    match opacity {
        Some(o) if (0.0..1.0).contains(&o) => Some(o),
        Some(o) => {
            log::warn!("Image opacity {} is outside [0, 1) and was ignored", o);
            None
        }
        None => None,
    }
}

/// `<a:stretch><a:fillRect/></a:stretch>`
pub(crate) fn stretch() -> XmlNode {
    XmlNode::new("a:stretch").child(XmlNode::new("a:fillRect"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::{
        ColorBlend, FitPolicy, HyperlinkOptions, Layout, PlaceholderKind, PlaceholderOptions,
        ResourceCounters, SourceSize,
    };

    fn render(el: &ImageElement) -> String {
        let layout = Layout::default();
        let ctx = RenderContext { layout: &layout, rtl: false };
        el.render(0, &ctx, None).to_xml().unwrap()
    }

    #[test]
    fn test_source_is_required() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        assert!(matches!(
            ImageElement::new(ImageOptions::default(), &mut reg),
            Err(Error::MissingImageSource)
        ));
        let bad = ImageOptions {
            data: Some("image/png,AAAA".into()),
            ..ImageOptions::default()
        };
        assert!(matches!(
            ImageElement::new(bad, &mut reg),
            Err(Error::MissingBase64Header(_))
        ));
    }

    #[test]
    fn test_invalid_hyperlink_registers_nothing() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let result = ImageElement::new(
            ImageOptions {
                data: Some("image/png;base64,iVBORw0KGgo=".into()),
                hyperlink: Some(HyperlinkOptions::default()),
                ..ImageOptions::default()
            },
            &mut reg,
        );
        assert!(matches!(result, Err(Error::InvalidHyperlink)));
        assert!(reg.media_records().is_empty());
        assert!(reg.link_records().is_empty());
    }

    #[test]
    fn test_picture_with_link_and_effects() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = ImageElement::new(
            ImageOptions {
                path: Some("logo.jpg".into()),
                opacity: Some(0.5),
                rounding: true,
                color_blend: Some(ColorBlend::default()),
                hyperlink: Some(HyperlinkOptions::url("https://example.com")),
                ..ImageOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let xml = render(&el);

        assert!(xml.contains(r#"<p:cNvPr id="2" name="Object 1" descr="logo.jpg"><a:hlinkClick r:id="rId2"/></p:cNvPr>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId1"><a:alphaModFix amt="50000"/>"#));
        assert!(xml.contains(r#"<a:srgbClr val="226622"/><a:srgbClr val="FFFFFF"/>"#));
        assert!(xml.contains(r#"<a:prstGeom prst="ellipse">"#));
        assert!(xml.contains("<a:stretch><a:fillRect/></a:stretch>"));
    }

    #[test]
    fn test_out_of_range_opacity_is_ignored() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = ImageElement::new(
            ImageOptions {
                path: Some("a.png".into()),
                opacity: Some(1.0),
                ..ImageOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        assert!(!render(&el).contains("alphaModFix"));
    }

    #[test]
    fn test_svg_uses_fallback_blip() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = ImageElement::new(
            ImageOptions {
                path: Some("icon.svg".into()),
                ..ImageOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let xml = render(&el);
        assert!(xml.contains(r#"<a:blip r:embed="rId1">"#));
        assert!(xml.contains(r#"r:embed="rId2"/></a:ext></a:extLst>"#));
    }

    #[test]
    fn test_fit_none_emits_nothing() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = ImageElement::new(
            ImageOptions {
                path: Some("a.png".into()),
                object_fit: Some(FitPolicy::None),
                image_format: Some(SourceSize::new(100.0, 100.0)),
                ..ImageOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let xml = render(&el);
        assert!(xml.contains(r#"<a:blip r:embed="rId1"/></p:blipFill>"#));
    }

    #[test]
    fn test_unset_effects_come_from_placeholder() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let ph = PlaceholderElement::new(
            PlaceholderOptions {
                name: "photo".into(),
                placeholder_type: PlaceholderKind::Pic,
                x: Some(Length::Auto(2.0)),
                object_fit: Some(FitPolicy::None),
                opacity: Some(0.25),
                color_blend: Some(ColorBlend {
                    dark_color: Some("112233".into()),
                    light_color: None,
                }),
                ..PlaceholderOptions::default()
            },
            0,
        );
        let el = ImageElement::new(
            ImageOptions {
                path: Some("a.png".into()),
                image_format: Some(SourceSize::new(100.0, 100.0)),
                placeholder: Some("photo".into()),
                ..ImageOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let layout = Layout::default();
        let ctx = RenderContext { layout: &layout, rtl: false };
        let xml = el.render(0, &ctx, Some(&ph)).to_xml().unwrap();

        assert!(xml.contains(r#"<a:alphaModFix amt="25000"/>"#));
        assert!(xml.contains(r#"<a:srgbClr val="112233"/><a:srgbClr val="FFFFFF"/>"#));
        assert!(!xml.contains("a:stretch"));
        assert!(xml.contains(r#"<a:off x="1828800" y="0"/>"#));
        assert!(xml.contains(r#"<p:ph type="pic" idx="100"/>"#));

        let own = ImageElement::new(
            ImageOptions {
                path: Some("b.png".into()),
                opacity: Some(0.5),
                placeholder: Some("photo".into()),
                ..ImageOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let xml = own.render(1, &ctx, Some(&ph)).to_xml().unwrap();
        assert!(xml.contains(r#"<a:alphaModFix amt="50000"/>"#));
    }
}
