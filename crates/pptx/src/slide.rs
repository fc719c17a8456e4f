//! Slides, layouts and the master.
//!
//! A [`Container`] owns its elements and its relationship registry. Every
//! `add_*` call registers the element's relationships immediately, so the
//! ids embedded in the slide markup are fixed at insertion time.

use crate::elements::{
    color_node, ChartElement, Element, ImageElement, MediaElement, PlaceholderElement,
    RenderContext, SlideNumberElement, TableElement, TablePage, TextElement,
};
use crate::rels::{rid, Payload, RelationshipRegistry, StaticRelation};
use crate::schema::{relationship_type, LAYOUT_IDX_SERIES_BASE};
use crate::templates::{group_shape_properties, master_text_styles, presentation_root};
use crate::xml::XmlNode;
use deckgen_core::classify::{image_extension, require_base64_header};
use deckgen_core::{
    Background, ChartOptions, ChartSeries, ChartType, Error, ImageOptions, MediaOptions,
    PlaceholderOptions, Result, SharedCounters, SlideNumberOptions, TableOptions, TextContent,
    TextOptions, DEFAULT_SLIDE_MARGIN_IN,
};

/// What a container renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Slide,
    Layout,
    Master,
}

#[derive(Debug, Clone, PartialEq)]
enum BackgroundFill {
    Color(String),
    Image(u32),
}

/// A slide, slide layout or the slide master.
#[derive(Debug)]
pub struct Container {
    kind: ContainerKind,
    name: String,
    number: usize,
    layout_number: usize,
    registry: RelationshipRegistry,
    elements: Vec<Element>,
    background: Option<BackgroundFill>,
    slide_number: Option<SlideNumberElement>,
    notes: Option<String>,
    hidden: bool,
    margin: [f64; 4],
}

impl Container {
    fn new(kind: ContainerKind, name: String, number: usize, counters: SharedCounters) -> Self {
        Self {
            kind,
            name,
            number,
            layout_number: 1,
            registry: RelationshipRegistry::new(counters),
            elements: Vec::new(),
            background: None,
            slide_number: None,
            notes: None,
            hidden: false,
            margin: DEFAULT_SLIDE_MARGIN_IN,
        }
    }

    /// A slide. `number` is 1-based; `layout_number` picks `slideLayoutN`.
    pub fn slide(number: usize, layout_number: usize, counters: SharedCounters) -> Self {
        Self {
            layout_number,
            ..Self::new(ContainerKind::Slide, String::new(), number, counters)
        }
    }

    /// A slide layout named `title`.
    pub fn layout(title: &str, number: usize, counters: SharedCounters) -> Self {
        Self::new(ContainerKind::Layout, title.to_string(), number, counters)
    }

    /// The slide master.
    pub fn master(counters: SharedCounters) -> Self {
        Self::new(ContainerKind::Master, String::new(), 1, counters)
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Layout title; empty for slides and the master.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based part number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Layout used by a slide.
    pub fn layout_number(&self) -> usize {
        self.layout_number
    }

    pub fn registry(&self) -> &RelationshipRegistry {
        &self.registry
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Slide margins in inches: top, right, bottom, left.
    pub fn margin(&self) -> [f64; 4] {
        self.margin
    }

    pub fn set_margin(&mut self, margin: [f64; 4]) {
        self.margin = margin;
    }

    /// Speaker notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) -> &mut Self {
        self.notes = Some(notes.into());
        self
    }

    /// Hide the slide in slideshow mode.
    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    /// Show a slide number field.
    pub fn set_slide_number(&mut self, options: SlideNumberOptions) -> &mut Self {
        self.slide_number = Some(SlideNumberElement::new(options));
        self
    }

    /// Set a colour or image background. Images register one relationship.
    pub fn set_background(&mut self, background: Background) -> Result<&mut Self> {
        let fill = match background {
            Background::Color(color) => BackgroundFill::Color(color),
            Background::Image(image) => {
                let payload = match (&image.data, &image.path) {
                    (Some(data), _) => {
                        require_base64_header(data)?;
                        Payload::Inline(data.clone())
                    }
                    (None, Some(path)) => Payload::File(path.clone()),
                    (None, None) => return Err(Error::MissingImageSource),
                };
                let mut extension = image_extension(image.data.as_deref(), image.path.as_deref());
                if extension == "jpg" {
                    extension = "jpeg".to_string();
                }
                let image = self.registry.register_image(payload, &extension);
                BackgroundFill::Image(image.blip_id())
            }
        };
        self.background = Some(fill);
        Ok(self)
    }

    /// Add a text box.
    pub fn add_text(
        &mut self,
        text: impl Into<TextContent>,
        options: TextOptions,
    ) -> Result<&mut Self> {
        let element = TextElement::text(text.into(), options, &mut self.registry)?;
        self.elements.push(Element::Text(element));
        Ok(self)
    }

    /// Add a preset shape.
    pub fn add_shape(&mut self, shape: &str, options: TextOptions) -> Result<&mut Self> {
        let element = TextElement::shape(shape, options, &mut self.registry)?;
        self.elements.push(Element::Text(element));
        Ok(self)
    }

    /// Add a picture.
    pub fn add_image(&mut self, options: ImageOptions) -> Result<&mut Self> {
        let element = ImageElement::new(options, &mut self.registry)?;
        self.elements.push(Element::Image(element));
        Ok(self)
    }

    /// Add audio, video or an online video.
    pub fn add_media(&mut self, options: MediaOptions) -> Result<&mut Self> {
        let element = MediaElement::new(options, &mut self.registry)?;
        self.elements.push(Element::Media(element));
        Ok(self)
    }

    /// Add a chart.
    pub fn add_chart(
        &mut self,
        chart_type: ChartType,
        series: Vec<ChartSeries>,
        options: ChartOptions,
    ) -> Result<&mut Self> {
        let element = ChartElement::new(chart_type, series, options, &mut self.registry);
        self.elements.push(Element::Chart(element));
        Ok(self)
    }

    /// Add one page of a table.
    pub fn add_table_page(&mut self, page: TablePage, options: &TableOptions) -> Result<&mut Self> {
        let element = TableElement::new(page, options, &mut self.registry)?;
        self.elements.push(Element::Table(element));
        Ok(self)
    }

    /// Add a placeholder. Its index follows its position among the objects.
    pub fn add_placeholder(&mut self, options: PlaceholderOptions) -> &mut Self {
        let position = self.elements.len();
        self.elements
            .push(Element::Placeholder(PlaceholderElement::new(options, position)));
        self
    }

    /// Look up a placeholder by name.
    pub fn placeholder(&self, name: &str) -> Option<&PlaceholderElement> {
        self.elements.iter().find_map(|e| match e {
            Element::Placeholder(ph) if ph.name() == name => Some(ph),
            _ => None,
        })
    }

    fn placeholders(&self) -> impl Iterator<Item = &PlaceholderElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Placeholder(ph) => Some(ph),
            _ => None,
        })
    }

    /// Render the container's XML part. Slides pass their layout so that
    /// placeholder references resolve; the master needs the layout count.
    pub fn render(
        &self,
        ctx: &RenderContext,
        layout: Option<&Container>,
        layout_count: usize,
    ) -> Result<String> {
        let mut root = match self.kind {
            ContainerKind::Slide => {
                let root = presentation_root("p:sld");
                if self.hidden {
                    root.attr("show", 0)
                } else {
                    root
                }
            }
            ContainerKind::Layout => presentation_root("p:sldLayout").attr("preserve", 1),
            ContainerKind::Master => presentation_root("p:sldMaster"),
        };

        let mut c_sld = XmlNode::new("p:cSld");
        if self.kind == ContainerKind::Layout {
            c_sld = c_sld.attr("name", self.name.as_str());
        }
        c_sld = c_sld.child_opt(self.render_background());
        c_sld.push(self.render_shape_tree(ctx, layout));
        root.push(c_sld);

        match self.kind {
            ContainerKind::Slide | ContainerKind::Layout => root.push(
                XmlNode::new("p:clrMapOvr").child(XmlNode::new("a:masterClrMapping")),
            ),
            ContainerKind::Master => {
                root.push(color_map());
                root.push(XmlNode::new("p:sldLayoutIdLst").children((0..layout_count).map(
                    |idx| {
                        XmlNode::new("p:sldLayoutId")
                            .attr("id", LAYOUT_IDX_SERIES_BASE as usize + idx)
                            .attr("r:id", rid(self.registry.static_id(idx)))
                    },
                )));
                root.push(
                    XmlNode::new("p:hf")
                        .attr("sldNum", 0)
                        .attr("hdr", 0)
                        .attr("ftr", 0)
                        .attr("dt", 0),
                );
                root = root.raw(master_text_styles());
            }
        }

        root.to_document()
    }

    fn render_background(&self) -> Option<XmlNode> {
        match &self.background {
            Some(BackgroundFill::Color(color)) => Some(
                XmlNode::new("p:bg").child(
                    XmlNode::new("p:bgPr")
                        .child(XmlNode::new("a:solidFill").child(color_node(color)))
                        .child(XmlNode::new("a:effectLst")),
                ),
            ),
            Some(BackgroundFill::Image(id)) => Some(
                XmlNode::new("p:bg").child(
                    XmlNode::new("p:bgPr")
                        .child(
                            XmlNode::new("a:blipFill")
                                .attr("dpi", 0)
                                .attr("rotWithShape", 1)
                                .child(
                                    XmlNode::new("a:blip")
                                        .attr("r:embed", rid(*id))
                                        .child(XmlNode::new("a:lum")),
                                )
                                .child(XmlNode::new("a:srcRect"))
                                .child(
                                    XmlNode::new("a:stretch").child(XmlNode::new("a:fillRect")),
                                ),
                        )
                        .child(XmlNode::new("a:effectLst")),
                ),
            ),
            None if self.kind == ContainerKind::Master => Some(
                XmlNode::new("p:bg").child(
                    XmlNode::new("p:bgRef")
                        .attr("idx", 1001)
                        .child(XmlNode::new("a:schemeClr").attr("val", "bg1")),
                ),
            ),
            None => None,
        }
    }

    fn render_shape_tree(&self, ctx: &RenderContext, layout: Option<&Container>) -> XmlNode {
        let mut tree = XmlNode::new("p:spTree")
            .child(
                XmlNode::new("p:nvGrpSpPr")
                    .child(XmlNode::new("p:cNvPr").attr("id", 1).attr("name", ""))
                    .child(XmlNode::new("p:cNvGrpSpPr"))
                    .child(XmlNode::new("p:nvPr")),
            )
            .child(group_shape_properties());

        for (idx, element) in self.elements.iter().enumerate() {
            let placeholder = match element.placeholder_name() {
                Some(name) => {
                    let found = layout.and_then(|l| l.placeholder(name));
                    if found.is_none() {
                        log::warn!("Placeholder \"{}\" not found on the slide layout", name);
                    }
                    found
                }
                None => None,
            };
            tree.push(element.render(idx, ctx, placeholder));
        }

        let mut idx = self.elements.len();
        if let Some(layout) = layout {
            for ph in layout.placeholders() {
                let used = self
                    .elements
                    .iter()
                    .any(|e| e.placeholder_name() == Some(ph.name()));
                if !used {
                    let empty = TextElement::empty_placeholder(ph.name());
                    tree.push(empty.render(idx, ctx, Some(ph)));
                    idx += 1;
                }
            }
        }

        if let Some(slide_number) = &self.slide_number {
            tree.push(slide_number.render(idx, ctx));
        }
        tree
    }

    /// Render the container's `.rels` part.
    pub fn render_rels(&self, layout_count: usize) -> Result<String> {
        let statics = match self.kind {
            ContainerKind::Slide => vec![
                StaticRelation::new(
                    relationship_type::SLIDE_LAYOUT,
                    format!("../slideLayouts/slideLayout{}.xml", self.layout_number),
                ),
                StaticRelation::new(
                    relationship_type::NOTES_SLIDE,
                    format!("../notesSlides/notesSlide{}.xml", self.number),
                ),
            ],
            ContainerKind::Layout => vec![StaticRelation::new(
                relationship_type::SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )],
            ContainerKind::Master => (1..=layout_count)
                .map(|n| {
                    StaticRelation::new(
                        relationship_type::SLIDE_LAYOUT,
                        format!("../slideLayouts/slideLayout{}.xml", n),
                    )
                })
                .chain(std::iter::once(StaticRelation::new(
                    relationship_type::THEME,
                    "../theme/theme1.xml",
                )))
                .collect(),
        };
        self.registry.render(&statics)
    }
}

fn color_map() -> XmlNode {
    let mut node = XmlNode::new("p:clrMap")
        .attr("bg1", "lt1")
        .attr("tx1", "dk1")
        .attr("bg2", "lt2")
        .attr("tx2", "dk2");
    for accent in 1..=6 {
        let name = format!("accent{}", accent);
        node = node.attr(name.clone(), name);
    }
    node.attr("hlink", "hlink").attr("folHlink", "folHlink")
}
