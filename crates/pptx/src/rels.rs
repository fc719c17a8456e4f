//! Per-container relationship registry.
//!
//! Every slide, layout and the master own one [`RelationshipRegistry`]. It
//! hands out `rIdN` numbers in registration order, remembers what each
//! number points at, and finally renders the container's `.rels` part.
//! Static relations (layout, master, theme, notes links) are not registered;
//! they are appended at render time and numbered just above the highest
//! dynamic id.

use crate::chart::ChartPart;
use crate::schema::{namespace, relationship_type, TARGET_MODE_EXTERNAL};
use crate::xml::XmlNode;
use deckgen_core::classify::image_mime;
use deckgen_core::{HyperlinkOptions, MediaKind, Result, SharedCounters};
use std::collections::HashSet;

/// What a relationship record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Picture (including SVG fallbacks and media previews).
    Image,
    /// Embedded audio.
    Audio,
    /// Embedded video.
    Video,
    /// Linked online video.
    OnlineVideo,
    /// Hyperlink to a URL or a slide.
    Hyperlink,
    /// Chart part.
    Chart,
}

/// Where a record's bytes come from at export time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Inline `type/subtype;base64,<data>` text.
    Inline(String),
    /// A file on disk.
    File(String),
    /// The built-in 1x1 picture behind SVG fallbacks.
    Builtin,
    /// The built-in play button shown on media previews.
    PlayButton,
    /// Nothing is written (links, charts).
    External,
}

/// One registered relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    /// Relationship number (`rId{id}`).
    pub id: u32,
    /// Kind of resource.
    pub kind: ResourceKind,
    /// File extension of the target.
    pub extension: String,
    /// MIME type, or a pseudo type (`online`, `hyperlink`, `chart`).
    pub mime: String,
    /// Relationship target.
    pub target: String,
    /// Source of the bytes.
    pub payload: Payload,
    /// PNG fallback registered alongside an SVG.
    pub svg_fallback: bool,
    /// Hyperlink to a slide of this presentation.
    pub slide_link: bool,
}

impl ResourceRecord {
    /// Package path the payload is written to (`../media/x` → `ppt/media/x`).
    pub fn package_path(&self) -> String {
        self.target.replacen("..", "ppt", 1)
    }
}

/// A registered chart.
#[derive(Debug, Clone)]
pub struct ChartRecord {
    /// Relationship record.
    pub record: ResourceRecord,
    /// Presentation-wide chart number (`chartN.xml`).
    pub number: u32,
    /// Chart definition.
    pub part: ChartPart,
}

/// Ids of a registered picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    /// Id embedded in `a:blip/@r:embed`. For SVG this is the SVG record.
    pub id: u32,
    /// PNG fallback id of an SVG (always `id - 1`).
    pub fallback_id: Option<u32>,
}

impl ImageRef {
    /// Id of the raster picture the blip embeds.
    pub fn blip_id(&self) -> u32 {
        self.fallback_id.unwrap_or(self.id)
    }

    /// Id of the SVG record, if any.
    pub fn svg_id(&self) -> Option<u32> {
        self.fallback_id.map(|_| self.id)
    }
}

/// Ids of a registered audio/video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRef {
    /// Primary media relationship (`a:videoFile`/`a:audioFile`).
    pub media_id: u32,
    /// Alternate `media` relationship sharing the Target. Absent for online video.
    pub alt_id: Option<u32>,
    /// Preview picture.
    pub preview_id: u32,
}

/// Ids of a registered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRef {
    /// Relationship id.
    pub id: u32,
    /// Chart number.
    pub number: u32,
}

/// A relation appended after the dynamic ones at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRelation {
    /// Relationship type URI.
    pub rel_type: &'static str,
    /// Target path.
    pub target: String,
}

impl StaticRelation {
    /// Create a static relation.
    pub fn new(rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            rel_type,
            target: target.into(),
        }
    }
}

/// `rId` attribute value for a relationship number.
pub fn rid(id: u32) -> String {
    format!("rId{}", id)
}

/// Relationship registry of one container.
#[derive(Debug)]
pub struct RelationshipRegistry {
    counters: SharedCounters,
    last_id: u32,
    links: Vec<ResourceRecord>,
    charts: Vec<ChartRecord>,
    media: Vec<ResourceRecord>,
}

impl RelationshipRegistry {
    /// Create an empty registry drawing file numbers from `counters`.
    pub fn new(counters: SharedCounters) -> Self {
        Self {
            counters,
            last_id: 0,
            links: Vec::new(),
            charts: Vec::new(),
            media: Vec::new(),
        }
    }

    fn allocate(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    /// Register a picture.
    ///
    /// SVG consumes two ids: a PNG fallback first, then the SVG itself. The
    /// SVG id is the primary reference.
    pub fn register_image(&mut self, payload: Payload, extension: &str) -> ImageRef {
        if extension == "svg" {
            let fallback = self.push_image(Payload::Builtin, "png", true);
            let id = self.push_image(payload, "svg", false);
            ImageRef {
                id,
                fallback_id: Some(fallback),
            }
        } else {
            let id = self.push_image(payload, extension, false);
            ImageRef {
                id,
                fallback_id: None,
            }
        }
    }

    fn push_image(&mut self, payload: Payload, extension: &str, svg_fallback: bool) -> u32 {
        let id = self.allocate();
        let number = self.counters.next_image();
        self.media.push(ResourceRecord {
            id,
            kind: ResourceKind::Image,
            extension: extension.to_string(),
            mime: image_mime(extension),
            target: format!("../media/image{}.{}", number, extension),
            payload,
            svg_fallback,
            slide_link: false,
        });
        id
    }

    /// Register an audio, video or online video element.
    ///
    /// Audio and video consume three ids: two records sharing one Target and
    /// a preview picture. Online video consumes two: the external link and
    /// the preview.
    pub fn register_media(
        &mut self,
        kind: MediaKind,
        payload: Payload,
        extension: &str,
        link: Option<&str>,
    ) -> MediaRef {
        match kind {
            MediaKind::Online => {
                let media_id = self.allocate();
                self.media.push(ResourceRecord {
                    id: media_id,
                    kind: ResourceKind::OnlineVideo,
                    extension: extension.to_string(),
                    mime: kind.as_str().to_string(),
                    target: link.unwrap_or_default().to_string(),
                    payload: Payload::External,
                    svg_fallback: false,
                    slide_link: false,
                });
                let preview_id = self.push_image(Payload::PlayButton, "png", false);
                MediaRef {
                    media_id,
                    alt_id: None,
                    preview_id,
                }
            }
            MediaKind::Audio | MediaKind::Video => {
                let resource_kind = if kind == MediaKind::Audio {
                    ResourceKind::Audio
                } else {
                    ResourceKind::Video
                };
                let number = self.counters.next_media();
                let record = ResourceRecord {
                    id: 0,
                    kind: resource_kind,
                    extension: extension.to_string(),
                    mime: format!("{}/{}", kind.as_str(), extension),
                    target: format!("../media/media{}.{}", number, extension),
                    payload,
                    svg_fallback: false,
                    slide_link: false,
                };

                let media_id = self.allocate();
                self.media.push(ResourceRecord {
                    id: media_id,
                    ..record.clone()
                });
                let alt_id = self.allocate();
                self.media.push(ResourceRecord { id: alt_id, ..record });

                let preview_id = self.push_image(Payload::PlayButton, "png", false);
                MediaRef {
                    media_id,
                    alt_id: Some(alt_id),
                    preview_id,
                }
            }
        }
    }

    /// Register a hyperlink. Options without a URL or slide are rejected.
    pub fn register_hyperlink(&mut self, link: &HyperlinkOptions) -> Result<u32> {
        link.validate()?;

        let id = self.allocate();
        let (target, slide_link) = match link.slide {
            Some(slide) => (format!("slide{}.xml", slide), true),
            None => (link.url.clone().unwrap_or_default(), false),
        };
        self.links.push(ResourceRecord {
            id,
            kind: ResourceKind::Hyperlink,
            extension: String::new(),
            mime: "hyperlink".to_string(),
            target,
            payload: Payload::External,
            svg_fallback: false,
            slide_link,
        });
        Ok(id)
    }

    /// Register a chart part.
    pub fn register_chart(&mut self, part: ChartPart) -> ChartRef {
        let id = self.allocate();
        let number = self.counters.next_chart();
        self.charts.push(ChartRecord {
            record: ResourceRecord {
                id,
                kind: ResourceKind::Chart,
                extension: "xml".to_string(),
                mime: "chart".to_string(),
                target: format!("/ppt/charts/chart{}.xml", number),
                payload: Payload::External,
                svg_fallback: false,
                slide_link: false,
            },
            number,
            part,
        });
        ChartRef { id, number }
    }

    /// Image, audio, video and online video records in registration order.
    pub fn media_records(&self) -> &[ResourceRecord] {
        &self.media
    }

    /// Chart records in registration order.
    pub fn chart_records(&self) -> &[ChartRecord] {
        &self.charts
    }

    /// Hyperlink records in registration order.
    pub fn link_records(&self) -> &[ResourceRecord] {
        &self.links
    }

    /// Look up a record by id.
    pub fn record(&self, id: u32) -> Option<&ResourceRecord> {
        self.links
            .iter()
            .chain(self.charts.iter().map(|c| &c.record))
            .chain(self.media.iter())
            .find(|r| r.id == id)
    }

    /// Highest id used by a registered record, 0 when empty.
    pub fn max_dynamic_id(&self) -> u32 {
        self.links
            .iter()
            .chain(self.charts.iter().map(|c| &c.record))
            .chain(self.media.iter())
            .map(|r| r.id)
            .max()
            .unwrap_or(0)
    }

    /// Id the `index`-th static relation will receive at render time.
    pub fn static_id(&self, index: usize) -> u32 {
        self.max_dynamic_id() + index as u32 + 1
    }

    /// Render the `.rels` part.
    ///
    /// Groups are emitted in order: hyperlinks, charts, media. Within media,
    /// a record whose Target has already been emitted gets the alternate
    /// relationship type. Static relations follow, numbered from the
    /// highest dynamic id plus one.
    pub fn render(&self, statics: &[StaticRelation]) -> Result<String> {
        let mut root = XmlNode::new("Relationships").attr("xmlns", namespace::RELATIONSHIPS);
        let mut emitted: HashSet<&str> = HashSet::new();

        for link in &self.links {
            let node = if link.slide_link {
                relationship(link.id, &link.target, relationship_type::SLIDE)
            } else {
                relationship(link.id, &link.target, relationship_type::HYPERLINK)
                    .attr("TargetMode", TARGET_MODE_EXTERNAL)
            };
            emitted.insert(&link.target);
            root.push(node);
        }

        for chart in &self.charts {
            let record = &chart.record;
            emitted.insert(&record.target);
            root.push(relationship(record.id, &record.target, relationship_type::CHART));
        }

        for record in &self.media {
            let seen = emitted.contains(record.target.as_str());
            let node = match record.kind {
                ResourceKind::Audio if seen => {
                    relationship(record.id, &record.target, relationship_type::MS_MEDIA)
                }
                ResourceKind::Audio => relationship(record.id, &record.target, relationship_type::AUDIO),
                ResourceKind::Video if seen => {
                    relationship(record.id, &record.target, relationship_type::MS_MEDIA)
                }
                ResourceKind::Video => relationship(record.id, &record.target, relationship_type::VIDEO),
                ResourceKind::OnlineVideo if seen => {
                    relationship(record.id, &record.target, relationship_type::MS_IMAGE)
                }
                ResourceKind::OnlineVideo => {
                    relationship(record.id, &record.target, relationship_type::VIDEO)
                        .attr("TargetMode", TARGET_MODE_EXTERNAL)
                }
                _ => relationship(record.id, &record.target, relationship_type::IMAGE),
            };
            emitted.insert(&record.target);
            root.push(node);
        }

        for (idx, rel) in statics.iter().enumerate() {
            root.push(relationship(self.static_id(idx), &rel.target, rel.rel_type));
        }

        root.to_document()
    }
}

fn relationship(id: u32, target: &str, rel_type: &str) -> XmlNode {
    XmlNode::new("Relationship")
        .attr("Id", rid(id))
        .attr("Target", target)
        .attr("Type", rel_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::ResourceCounters;

    fn registry() -> RelationshipRegistry {
        RelationshipRegistry::new(ResourceCounters::shared())
    }

    fn count(xml: &str, needle: &str) -> usize {
        xml.matches(needle).count()
    }

    #[test]
    fn test_ids_are_sequential_without_gaps() {
        let mut rels = registry();
        let a = rels.register_image(Payload::File("a.png".into()), "png");
        let b = rels.register_image(Payload::File("b.svg".into()), "svg");
        let c = rels
            .register_hyperlink(&HyperlinkOptions::url("https://example.com"))
            .unwrap();
        let d = rels.register_media(MediaKind::Video, Payload::File("v.mp4".into()), "mp4", None);

        let mut ids = vec![a.id, b.fallback_id.unwrap(), b.id, c, d.media_id, d.alt_id.unwrap(), d.preview_id];
        let sorted = ids.clone();
        ids.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids, (1..=7).collect::<Vec<_>>());
        assert_eq!(rels.max_dynamic_id(), 7);
    }

    #[test]
    fn test_svg_consumes_two_ids() {
        let mut rels = registry();
        let img = rels.register_image(Payload::Inline("image/svg+xml;base64,AAAA".into()), "svg");
        assert_eq!(img.fallback_id, Some(img.id - 1));
        assert_eq!(rels.media_records().len(), 2);

        let fallback = rels.record(img.blip_id()).unwrap();
        assert!(fallback.svg_fallback);
        assert_eq!(fallback.extension, "png");
        let svg = rels.record(img.svg_id().unwrap()).unwrap();
        assert_eq!(svg.extension, "svg");
        assert_eq!(svg.mime, "image/svg+xml");
    }

    #[test]
    fn test_audio_video_share_one_target() {
        let mut rels = registry();
        let media = rels.register_media(MediaKind::Audio, Payload::File("a.mp3".into()), "mp3", None);
        let records = rels.media_records();
        assert_eq!(records.len(), 3);

        let targets: HashSet<&str> = records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets.len(), 2);
        assert_eq!(records[0].target, records[1].target);
        assert_eq!(records[0].target, "../media/media1.mp3");
        assert_eq!(records[2].target, "../media/image1.png");
        assert_eq!(media.preview_id, 3);
    }

    #[test]
    fn test_online_video_has_no_alternate() {
        let mut rels = registry();
        let media = rels.register_media(
            MediaKind::Online,
            Payload::External,
            "mp4",
            Some("https://www.youtube.com/embed/x"),
        );
        assert_eq!(media.alt_id, None);
        assert_eq!(rels.media_records().len(), 2);

        let xml = rels.render(&[]).unwrap();
        assert!(xml.contains(
            r#"<Relationship Id="rId1" Target="https://www.youtube.com/embed/x" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/video" TargetMode="External"/>"#
        ));
    }

    #[test]
    fn test_second_media_record_uses_alternate_type() {
        let mut rels = registry();
        rels.register_media(MediaKind::Video, Payload::File("v.mov".into()), "mov", None);
        let xml = rels.render(&[]).unwrap();

        assert!(xml.contains(
            r#"<Relationship Id="rId1" Target="../media/media1.mov" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/video"/>"#
        ));
        assert!(xml.contains(
            r#"<Relationship Id="rId2" Target="../media/media1.mov" Type="http://schemas.microsoft.com/office/2007/relationships/media"/>"#
        ));
        assert!(xml.contains(
            r#"<Relationship Id="rId3" Target="../media/image1.png" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"/>"#
        ));
    }

    #[test]
    fn test_render_lists_every_image() {
        let mut rels = registry();
        let ids: Vec<u32> = (0..4)
            .map(|i| rels.register_image(Payload::File(format!("{}.jpg", i)), "jpg").id)
            .collect();
        let xml = rels.render(&[]).unwrap();

        assert_eq!(count(&xml, "relationships/image\""), 4);
        for id in ids {
            assert!(xml.contains(&format!("Id=\"rId{}\"", id)));
        }
    }

    #[test]
    fn test_svg_adds_fallback_entry() {
        let mut rels = registry();
        rels.register_image(Payload::File("a.png".into()), "png");
        rels.register_image(Payload::File("b.svg".into()), "svg");
        let xml = rels.render(&[]).unwrap();
        assert_eq!(count(&xml, "relationships/image\""), 3);
    }

    #[test]
    fn test_static_relations_float_above_dynamic_max() {
        let mut rels = registry();
        rels.register_image(Payload::File("a.png".into()), "png");
        rels.register_image(Payload::File("b.png".into()), "png");
        rels.register_hyperlink(&HyperlinkOptions::slide(2)).unwrap();

        let statics = [
            StaticRelation::new(relationship_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            StaticRelation::new(relationship_type::NOTES_SLIDE, "../notesSlides/notesSlide1.xml"),
        ];
        let xml = rels.render(&statics).unwrap();

        assert!(xml.contains(r#"Id="rId4" Target="../slideLayouts/slideLayout1.xml""#));
        assert!(xml.contains(r#"Id="rId5" Target="../notesSlides/notesSlide1.xml""#));
        assert_eq!(rels.static_id(0), 4);
    }

    #[test]
    fn test_static_relations_in_empty_registry_start_at_one() {
        let rels = registry();
        let xml = rels
            .render(&[StaticRelation::new(relationship_type::SLIDE_MASTER, "../slideMasters/slideMaster1.xml")])
            .unwrap();
        assert!(xml.contains(r#"Id="rId1" Target="../slideMasters/slideMaster1.xml""#));
    }

    #[test]
    fn test_groups_render_links_then_charts_then_media() {
        let mut rels = registry();
        rels.register_image(Payload::File("a.png".into()), "png");
        rels.register_chart(ChartPart::default());
        rels.register_hyperlink(&HyperlinkOptions::url("https://example.com")).unwrap();

        let xml = rels.render(&[]).unwrap();
        let link = xml.find("rId3").unwrap();
        let chart = xml.find("rId2").unwrap();
        let image = xml.find("rId1").unwrap();
        assert!(link < chart && chart < image);
        assert!(xml.contains(r#"TargetMode="External""#));
    }

    #[test]
    fn test_slide_hyperlink_is_internal() {
        let mut rels = registry();
        rels.register_hyperlink(&HyperlinkOptions::slide(3)).unwrap();
        let xml = rels.render(&[]).unwrap();
        assert!(xml.contains(
            r#"<Relationship Id="rId1" Target="slide3.xml" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide"/>"#
        ));
    }

    #[test]
    fn test_invalid_hyperlink_consumes_no_id() {
        let mut rels = registry();
        assert!(rels.register_hyperlink(&HyperlinkOptions::default()).is_err());
        let id = rels.register_image(Payload::File("a.png".into()), "png").id;
        assert_eq!(id, 1);
    }

    #[test]
    fn test_file_numbers_are_shared_across_registries() {
        let counters = ResourceCounters::shared();
        let mut first = RelationshipRegistry::new(counters.clone());
        let mut second = RelationshipRegistry::new(counters);

        first.register_image(Payload::File("a.png".into()), "png");
        second.register_image(Payload::File("b.png".into()), "png");

        assert_eq!(first.media_records()[0].target, "../media/image1.png");
        assert_eq!(second.media_records()[0].target, "../media/image2.png");
        assert_eq!(second.media_records()[0].id, 1);
    }

    #[test]
    fn test_package_path() {
        let mut rels = registry();
        rels.register_image(Payload::File("a.gif".into()), "gif");
        assert_eq!(rels.media_records()[0].package_path(), "ppt/media/image1.gif");
    }
}
