//! Text boxes and preset shapes (`p:sp`).

use super::{
    line_width, paragraph_align, solid_fill, validate_links, vertical_anchor, Frame, LinkRef,
    PlaceholderElement, RenderContext, RunStyle,
};
use crate::rels::RelationshipRegistry;
use crate::xml::XmlNode;
use deckgen_core::units::{emu_to_int, inches_to_emu};
use deckgen_core::{LineOptions, Length, Result, TextContent, TextOptions};

const DASH_TYPES: [&str; 8] = [
    "dash",
    "dashDot",
    "lgDash",
    "lgDashDot",
    "lgDashDotDot",
    "solid",
    "sysDash",
    "sysDot",
];

const LINE_CAPS: [&str; 3] = ["flat", "rnd", "sq"];

const ARROW_TYPES: [&str; 6] = ["none", "arrow", "diamond", "oval", "stealth", "triangle"];

const DEFAULT_TEXT_COLOR: &str = "000000";
const DEFAULT_LINE_COLOR: &str = "333333";

/// A validated outline.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Width in points.
    pub width: f64,
    pub color: String,
    pub dash: Option<String>,
    pub head: Option<String>,
    pub tail: Option<String>,
    pub cap: Option<String>,
}

impl LineStyle {
    /// Validate line options. Unknown dash, cap and arrow names are dropped
    /// with a warning.
    pub fn new(options: &LineOptions, default_color: &str) -> Self {
        Self {
            width: options.width.unwrap_or(1.0),
            color: options
                .color
                .clone()
                .unwrap_or_else(|| default_color.to_string()),
            dash: checked(options.dash.as_deref(), &DASH_TYPES, "dash"),
            head: checked(options.head.as_deref(), &ARROW_TYPES, "arrowhead"),
            tail: checked(options.tail.as_deref(), &ARROW_TYPES, "arrowhead"),
            cap: checked(options.cap.as_deref(), &LINE_CAPS, "line cap"),
        }
    }

    /// `a:ln`.
    pub fn render(&self) -> XmlNode {
        XmlNode::new("a:ln")
            .attr("w", line_width(self.width))
            .attr_opt("cap", self.cap.as_deref())
            .child(solid_fill(&self.color))
            .child_opt(
                self.dash
                    .as_deref()
                    .map(|d| XmlNode::new("a:prstDash").attr("val", d)),
            )
            .child_opt(
                self.head
                    .as_deref()
                    .map(|t| XmlNode::new("a:headEnd").attr("type", t)),
            )
            .child_opt(
                self.tail
                    .as_deref()
                    .map(|t| XmlNode::new("a:tailEnd").attr("type", t)),
            )
    }
}

fn checked(value: Option<&str>, allowed: &[&str], what: &str) -> Option<String> {
    let value = value?;
    if allowed.contains(&value) {
        Some(value.to_string())
    } else {
        log::warn!("Invalid {} \"{}\" ignored", what, value);
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Run {
    text: String,
    style: RunStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Paragraph {
    runs: Vec<Run>,
}

/// A text box, or a preset shape with optional text.
#[derive(Debug, Clone)]
pub struct TextElement {
    paragraphs: Vec<Paragraph>,
    options: TextOptions,
    geometry: String,
    line: Option<LineStyle>,
    text_box: bool,
}

impl TextElement {
    /// A text box. Hyperlinks are registered in `registry`.
    pub fn text(
        content: TextContent,
        options: TextOptions,
        registry: &mut RelationshipRegistry,
    ) -> Result<Self> {
        let geometry = options.shape.clone().unwrap_or_else(|| "rect".to_string());
        let line = options
            .line
            .as_ref()
            .map(|l| LineStyle::new(l, DEFAULT_LINE_COLOR));
        let paragraphs = build_paragraphs(content, &options, registry)?;
        Ok(Self {
            paragraphs,
            options,
            geometry,
            line,
            text_box: true,
        })
    }

    /// A preset shape. Lines get a default outline.
    pub fn shape(
        shape: &str,
        options: TextOptions,
        registry: &mut RelationshipRegistry,
    ) -> Result<Self> {
        let line = match (&options.line, shape) {
            (Some(line), _) => Some(LineStyle::new(line, DEFAULT_LINE_COLOR)),
            (None, "line") => Some(LineStyle::new(&LineOptions::default(), DEFAULT_LINE_COLOR)),
            (None, _) => None,
        };
        let paragraphs = build_paragraphs(TextContent::default(), &options, registry)?;
        Ok(Self {
            paragraphs,
            options,
            geometry: shape.to_string(),
            line,
            text_box: false,
        })
    }

    /// An empty box filling a layout placeholder.
    pub fn empty_placeholder(name: &str) -> Self {
        Self {
            paragraphs: Vec::new(),
            options: TextOptions {
                placeholder: Some(name.to_string()),
                ..TextOptions::default()
            },
            geometry: "rect".to_string(),
            line: None,
            text_box: true,
        }
    }

    /// Placeholder this element fills.
    pub fn placeholder(&self) -> Option<&str> {
        self.options.placeholder.as_deref()
    }

    fn frame(&self, placeholder: Option<&PlaceholderElement>) -> Frame {
        let o = &self.options;
        let own = Frame {
            x: o.x,
            y: o.y,
            w: o.w,
            h: o.h,
            rotate: o.rotate,
            flip_h: o.flip_h,
            flip_v: o.flip_v,
        };
        match placeholder {
            Some(ph) => own.or(Some(ph.frame())),
            None if self.text_box => own.or_defaults(
                Length::Auto(0.0),
                Length::Auto(0.0),
                Length::Percent(75.0),
                Length::Auto(1.0),
            ),
            None => own.or_defaults(
                Length::Auto(1.0),
                Length::Auto(1.0),
                Length::Auto(1.0),
                Length::Auto(1.0),
            ),
        }
    }

    /// Render `p:sp`.
    pub fn render(
        &self,
        idx: usize,
        ctx: &RenderContext,
        placeholder: Option<&PlaceholderElement>,
    ) -> XmlNode {
        let o = &self.options;
        let name = match placeholder {
            Some(ph) => ph.name().to_string(),
            None => format!("Object {}", idx + 1),
        };

        let mut c_nv_sp_pr = XmlNode::new("p:cNvSpPr");
        if self.text_box && placeholder.is_none() {
            c_nv_sp_pr = c_nv_sp_pr.attr("txBox", 1);
        }

        let nv_sp_pr = XmlNode::new("p:nvSpPr")
            .child(
                XmlNode::new("p:cNvPr")
                    .attr("id", idx + 2)
                    .attr("name", name),
            )
            .child(c_nv_sp_pr)
            .child(XmlNode::new("p:nvPr").child_opt(placeholder.map(|ph| ph.reference())));

        let mut sp_pr = XmlNode::new("p:spPr")
            .child(self.frame(placeholder).xfrm("a:xfrm", ctx.layout))
            .child(
                XmlNode::new("a:prstGeom")
                    .attr("prst", self.geometry.as_str())
                    .child(XmlNode::new("a:avLst")),
            );
        match &o.fill {
            Some(fill) => sp_pr.push(solid_fill(fill)),
            None if placeholder.is_none() => sp_pr.push(XmlNode::new("a:noFill")),
            None => {}
        }
        if let Some(line) = &self.line {
            sp_pr.push(line.render());
        }

        XmlNode::new("p:sp")
            .child(nv_sp_pr)
            .child(sp_pr)
            .child(self.text_body(ctx, placeholder.is_some()))
    }

    fn text_body(&self, ctx: &RenderContext, is_placeholder: bool) -> XmlNode {
        let o = &self.options;
        let mut body_pr = XmlNode::new("a:bodyPr").attr("wrap", "square");
        if let Some(inset) = o.inset {
            let inset = emu_to_int(inches_to_emu(inset));
            body_pr = body_pr
                .attr("lIns", inset)
                .attr("tIns", inset)
                .attr("rIns", inset)
                .attr("bIns", inset);
        }
        body_pr = body_pr.attr("rtlCol", 0);
        let anchor = match o.valign.as_deref().and_then(vertical_anchor) {
            Some(anchor) => Some(anchor),
            None if !is_placeholder => Some("ctr"),
            None => None,
        };
        body_pr = body_pr.attr_opt("anchor", anchor);
        if o.autofit {
            body_pr.push(XmlNode::new("a:spAutoFit"));
        }

        let mut body = XmlNode::new("p:txBody")
            .child(body_pr)
            .child(XmlNode::new("a:lstStyle"));

        let default_style = run_defaults(o, is_placeholder);
        if self.paragraphs.is_empty() {
            body.push(
                XmlNode::new("a:p").child(default_style.render("a:endParaRPr")),
            );
            return body;
        }

        for paragraph in &self.paragraphs {
            let mut p = XmlNode::new("a:p");
            let mut p_pr = XmlNode::new("a:pPr")
                .attr_opt("algn", o.align.as_deref().and_then(paragraph_align));
            if ctx.rtl {
                p_pr = p_pr.attr("rtl", 1);
            }
            if let Some(spacing) = o.line_spacing {
                p_pr.push(
                    XmlNode::new("a:lnSpc").child(
                        XmlNode::new("a:spcPts").attr("val", (spacing * 100.0).round() as i64),
                    ),
                );
            }
            p.push(p_pr);
            for run in &paragraph.runs {
                p.push(
                    XmlNode::new("a:r")
                        .child(run.style.render("a:rPr"))
                        .child(XmlNode::new("a:t").text(run.text.as_str())),
                );
            }
            p.push(default_style.render("a:endParaRPr"));
            body.push(p);
        }
        body
    }
}

fn run_defaults(o: &TextOptions, is_placeholder: bool) -> RunStyle {
    RunStyle {
        bold: o.bold,
        italic: o.italic,
        underline: o.underline,
        font_size: o.font_size,
        font_face: o.font_face.clone(),
        color: match &o.color {
            Some(color) => Some(color.clone()),
            None if !is_placeholder => Some(DEFAULT_TEXT_COLOR.to_string()),
            None => None,
        },
        link: None,
    }
}

fn build_paragraphs(
    content: TextContent,
    options: &TextOptions,
    registry: &mut RelationshipRegistry,
) -> Result<Vec<Paragraph>> {
    match &content {
        TextContent::Plain(_) => validate_links([options.hyperlink.as_ref()])?,
        TextContent::Runs(runs) => {
            validate_links(runs.iter().map(|r| r.options.hyperlink.as_ref()))?
        }
    }
    let defaults = run_defaults(options, options.placeholder.is_some());
    let mut paragraphs = Vec::new();

    match content {
        TextContent::Plain(text) => {
            if text.is_empty() {
                return Ok(paragraphs);
            }
            let link = LinkRef::register_opt(options.hyperlink.as_ref(), registry)?;
            for line in text.split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                paragraphs.push(Paragraph {
                    runs: vec![Run {
                        text: line.to_string(),
                        style: RunStyle {
                            link: link.clone(),
                            ..defaults.clone()
                        },
                    }],
                });
            }
        }
        TextContent::Runs(runs) => {
            let mut current = Paragraph::default();
            for run in runs {
                let ro = &run.options;
                let style = RunStyle {
                    bold: ro.bold || defaults.bold,
                    italic: ro.italic || defaults.italic,
                    underline: ro.underline || defaults.underline,
                    font_size: ro.font_size.or(defaults.font_size),
                    font_face: ro.font_face.clone().or_else(|| defaults.font_face.clone()),
                    color: ro.color.clone().or_else(|| defaults.color.clone()),
                    link: LinkRef::register_opt(ro.hyperlink.as_ref(), registry)?,
                };

                let mut lines = run.text.split('\n').peekable();
                while let Some(line) = lines.next() {
                    current.runs.push(Run {
                        text: line.to_string(),
                        style: style.clone(),
                    });
                    if lines.peek().is_some() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                if ro.break_line {
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            if !current.runs.is_empty() {
                paragraphs.push(current);
            }
        }
    }
    Ok(paragraphs)
}
