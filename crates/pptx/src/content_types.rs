//! `[Content_Types].xml`: package-wide defaults by extension plus one
//! override per generated part.

use crate::rels::RelationshipRegistry;
use crate::schema::{content_type, namespace};
use crate::xml::XmlNode;
use deckgen_core::Result;
use std::collections::HashSet;

/// MIME (or pseudo) types never turned into a `Default` entry: they are
/// either declared up front or are not files.
pub const EXCLUDED_TYPES: [&str; 8] = [
    "image",
    "online",
    "chart",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "video/mp4",
];

/// Extension skipped entirely; it is declared up front as `video/mp4`.
pub const SKIPPED_EXTENSION: &str = "m4v";

/// Collect `(mime, extension)` pairs for `Default` entries.
///
/// Registries must be given in scan order (slides, layouts, master). The
/// first extension seen for a MIME type wins.
pub fn aggregate_extensions(registries: &[&RelationshipRegistry]) -> Vec<(String, String)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut extensions = Vec::new();

    for registry in registries {
        for record in registry.media_records() {
            let mime = record.mime.as_str();
            if EXCLUDED_TYPES.contains(&mime)
                || seen.contains(mime)
                || record.extension == SKIPPED_EXTENSION
            {
                continue;
            }
            seen.insert(mime);
            extensions.push((record.mime.clone(), record.extension.clone()));
        }
    }

    extensions
}

/// Collect chart part names, in scan order.
pub fn aggregate_chart_targets(registries: &[&RelationshipRegistry]) -> Vec<String> {
    registries
        .iter()
        .flat_map(|r| r.chart_records().iter().map(|c| c.record.target.clone()))
        .collect()
}

/// Inputs of the manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestParts {
    /// Number of slides (each with a notes slide).
    pub slides: usize,
    /// Number of layouts.
    pub layouts: usize,
    /// Extra `Default` entries from [`aggregate_extensions`].
    pub extensions: Vec<(String, String)>,
    /// Chart part names from [`aggregate_chart_targets`].
    pub charts: Vec<String>,
}

/// Render `[Content_Types].xml`.
pub fn render_manifest(parts: &ManifestParts) -> Result<String> {
    let mut types = XmlNode::new("Types").attr("xmlns", namespace::CONTENT_TYPES);

    let fixed_defaults = [
        ("xml", content_type::XML),
        ("rels", content_type::RELATIONSHIPS),
        ("jpeg", content_type::JPEG),
        ("jpg", content_type::JPG),
        ("png", content_type::PNG),
        ("gif", content_type::GIF),
        ("m4v", content_type::MP4),
        ("mp4", content_type::MP4),
    ];
    for (extension, mime) in fixed_defaults {
        types.push(default_entry(extension, mime));
    }
    for (mime, extension) in &parts.extensions {
        types.push(default_entry(extension, mime));
    }
    types.push(default_entry("vml", content_type::VML));
    types.push(default_entry("xlsx", content_type::XLSX));

    let fixed_overrides = [
        ("/ppt/presentation.xml", content_type::PRESENTATION),
        ("/ppt/notesMasters/notesMaster1.xml", content_type::NOTES_MASTER),
        ("/ppt/presProps.xml", content_type::PRES_PROPS),
        ("/ppt/viewProps.xml", content_type::VIEW_PROPS),
        ("/ppt/theme/theme1.xml", content_type::THEME),
        ("/ppt/tableStyles.xml", content_type::TABLE_STYLES),
        ("/ppt/slideMasters/slideMaster1.xml", content_type::SLIDE_MASTER),
    ];
    for (part, mime) in fixed_overrides {
        types.push(override_entry(part, mime));
    }

    for idx in 1..=parts.slides {
        types.push(override_entry(
            &format!("/ppt/slides/slide{}.xml", idx),
            content_type::SLIDE,
        ));
        types.push(override_entry(
            &format!("/ppt/notesSlides/notesSlide{}.xml", idx),
            content_type::NOTES_SLIDE,
        ));
    }
    for idx in 1..=parts.layouts {
        types.push(override_entry(
            &format!("/ppt/slideLayouts/slideLayout{}.xml", idx),
            content_type::SLIDE_LAYOUT,
        ));
    }
    for chart in &parts.charts {
        types.push(override_entry(chart, content_type::CHART));
    }

    types.push(override_entry("/docProps/core.xml", content_type::CORE_PROPERTIES));
    types.push(override_entry("/docProps/app.xml", content_type::EXTENDED_PROPERTIES));

    types.to_document()
}

fn default_entry(extension: &str, mime: &str) -> XmlNode {
    XmlNode::new("Default")
        .attr("Extension", extension)
        .attr("ContentType", mime)
}

fn override_entry(part: &str, mime: &str) -> XmlNode {
    XmlNode::new("Override")
        .attr("PartName", part)
        .attr("ContentType", mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartPart;
    use crate::rels::Payload;
    use deckgen_core::{MediaKind, ResourceCounters, SharedCounters};

    fn registry(counters: &SharedCounters) -> RelationshipRegistry {
        RelationshipRegistry::new(counters.clone())
    }

    #[test]
    fn test_excluded_types_and_m4v_are_skipped() {
        let counters = ResourceCounters::shared();
        let mut slides: Vec<RelationshipRegistry> = (0..5).map(|_| registry(&counters)).collect();
        for rels in slides.iter_mut() {
            rels.register_image(Payload::File("a.png".into()), "png");
            rels.register_image(Payload::File("a.jpeg".into()), "jpeg");
            rels.register_media(MediaKind::Video, Payload::File("v.mp4".into()), "mp4", None);
            rels.register_media(MediaKind::Video, Payload::File("v.m4v".into()), "m4v", None);
            rels.register_media(MediaKind::Online, Payload::External, "mp4", Some("https://x"));
        }

        let refs: Vec<&RelationshipRegistry> = slides.iter().collect();
        assert!(aggregate_extensions(&refs).is_empty());
    }

    #[test]
    fn test_first_extension_wins_per_mime() {
        let counters = ResourceCounters::shared();
        let mut slide = registry(&counters);
        let mut layout = registry(&counters);
        let mut master = registry(&counters);

        slide.register_media(MediaKind::Audio, Payload::File("a.mp3".into()), "mp3", None);
        layout.register_image(Payload::File("b.svg".into()), "svg");
        layout.register_media(MediaKind::Audio, Payload::File("c.mp3".into()), "mp3", None);
        master.register_image(Payload::File("d.bmp".into()), "bmp");

        let extensions = aggregate_extensions(&[&slide, &layout, &master]);
        assert_eq!(
            extensions,
            vec![
                ("audio/mp3".to_string(), "mp3".to_string()),
                ("image/svg+xml".to_string(), "svg".to_string()),
                ("image/bmp".to_string(), "bmp".to_string()),
            ]
        );
    }

    #[test]
    fn test_chart_targets_follow_scan_order() {
        let counters = ResourceCounters::shared();
        let mut slide = registry(&counters);
        let mut master = registry(&counters);
        master.register_chart(ChartPart::default());
        slide.register_chart(ChartPart::default());

        let targets = aggregate_chart_targets(&[&slide, &master]);
        assert_eq!(targets, vec!["/ppt/charts/chart2.xml", "/ppt/charts/chart1.xml"]);
    }

    #[test]
    fn test_manifest_overrides() {
        let xml = render_manifest(&ManifestParts {
            slides: 2,
            layouts: 1,
            extensions: vec![("audio/mp3".into(), "mp3".into())],
            charts: vec!["/ppt/charts/chart1.xml".into()],
        })
        .unwrap();

        assert!(xml.contains(r#"<Default Extension="mp3" ContentType="audio/mp3"/>"#));
        assert!(xml.contains(r#"PartName="/ppt/slides/slide2.xml""#));
        assert!(xml.contains(r#"PartName="/ppt/notesSlides/notesSlide2.xml""#));
        assert!(xml.contains(r#"PartName="/ppt/slideLayouts/slideLayout1.xml""#));
        assert!(xml.contains(r#"PartName="/ppt/charts/chart1.xml""#));
        assert_eq!(xml.matches("slideMaster1.xml").count(), 1);

        let mp3 = xml.find("mp3").unwrap();
        let vml = xml.find("vml").unwrap();
        assert!(mp3 < vml);
    }
}
