//! Boilerplate parts: document properties, presentation, theme, notes and
//! the small property parts every package carries.

use crate::schema::{namespace, relationship_type, MASTER_ID, SLIDE_ID_BASE, SLIDE_NUMBER_FIELD_ID};
use crate::xml::XmlNode;
use chrono::{DateTime, Utc};
use deckgen_core::{DocumentInfo, Layout, Result, ThemeOptions};
use quick_xml::escape::escape;

const THEME_XML: &str = include_str!("../resources/theme1.xml");
const NOTES_MASTER_XML: &str = include_str!("../resources/notesMaster1.xml");
const MASTER_TEXT_STYLES_XML: &str = include_str!("../resources/masterTextStyles.xml");

const TABLE_STYLE_DEFAULT: &str = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";

/// Root element of a presentationml part with the three usual namespaces.
pub fn presentation_root(name: &str) -> XmlNode {
    XmlNode::new(name)
        .attr("xmlns:a", namespace::A)
        .attr("xmlns:r", namespace::R)
        .attr("xmlns:p", namespace::P)
}

/// `ppt/theme/theme1.xml` with the configured fonts.
pub fn theme(options: &ThemeOptions) -> String {
    THEME_XML
        .replace("{HEAD_FONT}", &escape(options.head_font_face.as_str()))
        .replace("{BODY_FONT}", &escape(options.body_font_face.as_str()))
}

/// `ppt/notesMasters/notesMaster1.xml`.
pub fn notes_master() -> &'static str {
    NOTES_MASTER_XML
}

/// `p:txStyles` of the slide master.
pub fn master_text_styles() -> &'static str {
    MASTER_TEXT_STYLES_XML.trim()
}

/// `ppt/notesMasters/_rels/notesMaster1.xml.rels`.
pub fn notes_master_rels() -> Result<String> {
    relationships(&[(relationship_type::THEME, "../theme/theme1.xml")])
}

/// `ppt/presProps.xml`.
pub fn pres_props() -> Result<String> {
    presentation_root("p:presentationPr").to_document()
}

/// `ppt/tableStyles.xml`.
pub fn table_styles() -> Result<String> {
    XmlNode::new("a:tblStyleLst")
        .attr("xmlns:a", namespace::A)
        .attr("def", TABLE_STYLE_DEFAULT)
        .to_document()
}

/// `ppt/viewProps.xml`.
pub fn view_props() -> Result<String> {
    let scale = |n: u32, d: u32| {
        XmlNode::new("p:scale")
            .child(XmlNode::new("a:sx").attr("n", n).attr("d", d))
            .child(XmlNode::new("a:sy").attr("n", n).attr("d", d))
    };

    presentation_root("p:viewPr")
        .child(
            XmlNode::new("p:normalViewPr")
                .attr("horzBarState", "maximized")
                .child(XmlNode::new("p:restoredLeft").attr("sz", 15611))
                .child(XmlNode::new("p:restoredTop").attr("sz", 94610)),
        )
        .child(
            XmlNode::new("p:slideViewPr").child(
                XmlNode::new("p:cSldViewPr")
                    .attr("snapToGrid", 0)
                    .attr("snapToObjects", 1)
                    .child(
                        XmlNode::new("p:cViewPr")
                            .attr("varScale", 1)
                            .child(scale(136, 100))
                            .child(XmlNode::new("p:origin").attr("x", 216).attr("y", 312)),
                    )
                    .child(XmlNode::new("p:guideLst")),
            ),
        )
        .child(
            XmlNode::new("p:notesTextViewPr").child(
                XmlNode::new("p:cViewPr")
                    .child(scale(1, 1))
                    .child(XmlNode::new("p:origin").attr("x", 0).attr("y", 0)),
            ),
        )
        .child(XmlNode::new("p:gridSpacing").attr("cx", 76200).attr("cy", 76200))
        .to_document()
}

/// `_rels/.rels`.
pub fn root_rels() -> Result<String> {
    relationships(&[
        (relationship_type::EXTENDED_PROPERTIES, "docProps/app.xml"),
        (relationship_type::CORE_PROPERTIES, "docProps/core.xml"),
        (relationship_type::OFFICE_DOCUMENT, "ppt/presentation.xml"),
    ])
}

/// `docProps/app.xml`.
pub fn app(slide_count: usize, company: &str) -> Result<String> {
    let variant = |child: XmlNode| XmlNode::new("vt:variant").child(child);
    let lpstr = |text: String| XmlNode::new("vt:lpstr").text(text);
    let i4 = |n: usize| XmlNode::new("vt:i4").text(n.to_string());

    let heading_pairs = XmlNode::new("vt:vector")
        .attr("size", 6)
        .attr("baseType", "variant")
        .child(variant(lpstr("Fonts Used".into())))
        .child(variant(i4(2)))
        .child(variant(lpstr("Theme".into())))
        .child(variant(i4(1)))
        .child(variant(lpstr("Slide Titles".into())))
        .child(variant(i4(slide_count)));

    let titles = XmlNode::new("vt:vector")
        .attr("size", slide_count + 3)
        .attr("baseType", "lpstr")
        .child(lpstr("Arial".into()))
        .child(lpstr("Calibri".into()))
        .child(lpstr("Office Theme".into()))
        .children((1..=slide_count).map(|n| lpstr(format!("Slide {}", n))));

    let element = |name: &str, text: String| XmlNode::new(name).text(text);

    XmlNode::new("Properties")
        .attr("xmlns", namespace::EXTENDED_PROPERTIES)
        .attr("xmlns:vt", namespace::DOC_PROPS_VTYPES)
        .child(element("TotalTime", "0".into()))
        .child(element("Words", "0".into()))
        .child(element("Application", "Microsoft Office PowerPoint".into()))
        .child(element("PresentationFormat", "On-screen Show (16:9)".into()))
        .child(element("Paragraphs", "0".into()))
        .child(element("Slides", slide_count.to_string()))
        .child(element("Notes", slide_count.to_string()))
        .child(element("HiddenSlides", "0".into()))
        .child(element("MMClips", "0".into()))
        .child(element("ScaleCrop", "false".into()))
        .child(XmlNode::new("HeadingPairs").child(heading_pairs))
        .child(XmlNode::new("TitlesOfParts").child(titles))
        .child(element("Company", company.to_string()))
        .child(element("LinksUpToDate", "false".into()))
        .child(element("SharedDoc", "false".into()))
        .child(element("HyperlinksChanged", "false".into()))
        .child(element("AppVersion", "16.0000".into()))
        .to_document()
}

/// `docProps/core.xml`; created and modified are both `timestamp`.
pub fn core(info: &DocumentInfo, timestamp: DateTime<Utc>) -> Result<String> {
    let stamp = timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let dated = |name: &str| {
        XmlNode::new(name)
            .attr("xsi:type", "dcterms:W3CDTF")
            .text(stamp.clone())
    };

    XmlNode::new("cp:coreProperties")
        .attr("xmlns:cp", namespace::CORE_PROPERTIES)
        .attr("xmlns:dc", "http://purl.org/dc/elements/1.1/")
        .attr("xmlns:dcterms", "http://purl.org/dc/terms/")
        .attr("xmlns:dcmitype", "http://purl.org/dc/dcmitype/")
        .attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .child(XmlNode::new("dc:title").text(info.title.as_str()))
        .child(XmlNode::new("dc:subject").text(info.subject.as_str()))
        .child(XmlNode::new("dc:creator").text(info.author.as_str()))
        .child(XmlNode::new("cp:lastModifiedBy").text(info.author.as_str()))
        .child(XmlNode::new("cp:revision").text(info.revision.as_str()))
        .child(dated("dcterms:created"))
        .child(dated("dcterms:modified"))
        .to_document()
}

/// `ppt/presentation.xml`.
///
/// The master is `rId1`, slides follow from `rId2`, and the notes master
/// takes the id after the last slide. Must match [`presentation_rels`].
pub fn presentation(slide_count: usize, layout: &Layout, rtl: bool) -> Result<String> {
    let mut root = presentation_root("p:presentation");
    if rtl {
        root = root.attr("rtl", 1);
    }

    let slides = (0..slide_count).map(|idx| {
        XmlNode::new("p:sldId")
            .attr("id", SLIDE_ID_BASE as usize + idx)
            .attr("r:id", format!("rId{}", idx + 2))
    });

    let mut size = XmlNode::new("p:sldSz")
        .attr("cx", layout.width)
        .attr("cy", layout.height);
    if layout.name != "custom" {
        size = size.attr("type", layout.name.as_str());
    }

    let levels = (0..9).map(|idx| {
        XmlNode::new(format!("a:lvl{}pPr", idx + 1))
            .attr("marL", idx * 457200)
            .attr("algn", "l")
            .attr("defTabSz", 914400)
            .attr("rtl", 0)
            .attr("eaLnBrk", 1)
            .attr("latinLnBrk", 0)
            .attr("hangingPunct", 1)
            .child(
                XmlNode::new("a:defRPr")
                    .attr("sz", 1800)
                    .attr("kern", 1200)
                    .child(
                        XmlNode::new("a:solidFill")
                            .child(XmlNode::new("a:schemeClr").attr("val", "tx1")),
                    )
                    .child(XmlNode::new("a:latin").attr("typeface", "+mn-lt"))
                    .child(XmlNode::new("a:ea").attr("typeface", "+mn-ea"))
                    .child(XmlNode::new("a:cs").attr("typeface", "+mn-cs")),
            )
    });

    root.attr("saveSubsetFonts", 1)
        .attr("autoCompressPictures", 0)
        .child(
            XmlNode::new("p:sldMasterIdLst").child(
                XmlNode::new("p:sldMasterId")
                    .attr("id", MASTER_ID)
                    .attr("r:id", "rId1"),
            ),
        )
        .child(XmlNode::new("p:sldIdLst").children(slides))
        .child(
            XmlNode::new("p:notesMasterIdLst").child(
                XmlNode::new("p:notesMasterId").attr("r:id", format!("rId{}", slide_count + 2)),
            ),
        )
        .child(size)
        .child(
            XmlNode::new("p:notesSz")
                .attr("cx", layout.height)
                .attr("cy", layout.width),
        )
        .child(XmlNode::new("p:defaultTextStyle").children(levels))
        .to_document()
}

/// `ppt/_rels/presentation.xml.rels`.
pub fn presentation_rels(slide_count: usize) -> Result<String> {
    let slide_targets: Vec<String> = (1..=slide_count)
        .map(|n| format!("slides/slide{}.xml", n))
        .collect();

    let mut entries: Vec<(&str, &str)> = vec![(relationship_type::SLIDE_MASTER, "slideMasters/slideMaster1.xml")];
    entries.extend(slide_targets.iter().map(|t| (relationship_type::SLIDE, t.as_str())));
    entries.extend([
        (relationship_type::NOTES_MASTER, "notesMasters/notesMaster1.xml"),
        (relationship_type::PRES_PROPS, "presProps.xml"),
        (relationship_type::VIEW_PROPS, "viewProps.xml"),
        (relationship_type::THEME, "theme/theme1.xml"),
        (relationship_type::TABLE_STYLES, "tableStyles.xml"),
    ]);

    relationships(&entries)
}

/// `ppt/notesSlides/notesSlideN.xml`.
pub fn notes_slide(notes: &str, slide_number: usize) -> Result<String> {
    let text = notes.replace("\r\n", "\n").replace('\n', "\r\n");

    let group = XmlNode::new("p:nvGrpSpPr")
        .child(XmlNode::new("p:cNvPr").attr("id", 1).attr("name", ""))
        .child(XmlNode::new("p:cNvGrpSpPr"))
        .child(XmlNode::new("p:nvPr"));

    let image = XmlNode::new("p:sp")
        .child(notes_nv_sp_pr(
            2,
            "Slide Image Placeholder 1",
            XmlNode::new("a:spLocks")
                .attr("noGrp", 1)
                .attr("noRot", 1)
                .attr("noChangeAspect", 1),
            XmlNode::new("p:ph").attr("type", "sldImg"),
        ))
        .child(XmlNode::new("p:spPr"));

    let body = XmlNode::new("p:sp")
        .child(notes_nv_sp_pr(
            3,
            "Notes Placeholder 2",
            XmlNode::new("a:spLocks").attr("noGrp", 1),
            XmlNode::new("p:ph").attr("type", "body").attr("idx", 1),
        ))
        .child(XmlNode::new("p:spPr"))
        .child(
            XmlNode::new("p:txBody")
                .child(XmlNode::new("a:bodyPr"))
                .child(XmlNode::new("a:lstStyle"))
                .child(
                    XmlNode::new("a:p")
                        .child(
                            XmlNode::new("a:r")
                                .child(XmlNode::new("a:rPr").attr("lang", "en-US").attr("dirty", 0))
                                .child(XmlNode::new("a:t").text(text)),
                        )
                        .child(XmlNode::new("a:endParaRPr").attr("lang", "en-US").attr("dirty", 0)),
                ),
        );

    let number = XmlNode::new("p:sp")
        .child(notes_nv_sp_pr(
            4,
            "Slide Number Placeholder 3",
            XmlNode::new("a:spLocks").attr("noGrp", 1),
            XmlNode::new("p:ph")
                .attr("type", "sldNum")
                .attr("sz", "quarter")
                .attr("idx", 10),
        ))
        .child(XmlNode::new("p:spPr"))
        .child(
            XmlNode::new("p:txBody")
                .child(XmlNode::new("a:bodyPr"))
                .child(XmlNode::new("a:lstStyle"))
                .child(
                    XmlNode::new("a:p")
                        .child(
                            XmlNode::new("a:fld")
                                .attr("id", SLIDE_NUMBER_FIELD_ID)
                                .attr("type", "slidenum")
                                .child(XmlNode::new("a:rPr").attr("lang", "en-US"))
                                .child(XmlNode::new("a:t").text(slide_number.to_string())),
                        )
                        .child(XmlNode::new("a:endParaRPr").attr("lang", "en-US")),
                ),
        );

    presentation_root("p:notes")
        .child(
            XmlNode::new("p:cSld").child(
                XmlNode::new("p:spTree")
                    .child(group)
                    .child(group_shape_properties())
                    .child(image)
                    .child(body)
                    .child(number),
            ),
        )
        .child(XmlNode::new("p:clrMapOvr").child(XmlNode::new("a:masterClrMapping")))
        .to_document()
}

/// `ppt/notesSlides/_rels/notesSlideN.xml.rels`.
pub fn notes_slide_rels(slide_number: usize) -> Result<String> {
    let slide = format!("../slides/slide{}.xml", slide_number);
    relationships(&[
        (relationship_type::NOTES_MASTER, "../notesMasters/notesMaster1.xml"),
        (relationship_type::SLIDE, slide.as_str()),
    ])
}

/// `p:grpSpPr` with a zero transform, shared by every shape tree.
pub fn group_shape_properties() -> XmlNode {
    XmlNode::new("p:grpSpPr").child(
        XmlNode::new("a:xfrm")
            .child(XmlNode::new("a:off").attr("x", 0).attr("y", 0))
            .child(XmlNode::new("a:ext").attr("cx", 0).attr("cy", 0))
            .child(XmlNode::new("a:chOff").attr("x", 0).attr("y", 0))
            .child(XmlNode::new("a:chExt").attr("cx", 0).attr("cy", 0)),
    )
}

fn notes_nv_sp_pr(id: u32, name: &str, locks: XmlNode, placeholder: XmlNode) -> XmlNode {
    XmlNode::new("p:nvSpPr")
        .child(XmlNode::new("p:cNvPr").attr("id", id).attr("name", name))
        .child(XmlNode::new("p:cNvSpPr").child(locks))
        .child(XmlNode::new("p:nvPr").child(placeholder))
}

/// A fixed relationships part, numbered from `rId1`.
fn relationships(entries: &[(&str, &str)]) -> Result<String> {
    XmlNode::new("Relationships")
        .attr("xmlns", namespace::RELATIONSHIPS)
        .children(entries.iter().enumerate().map(|(idx, (rel_type, target))| {
            XmlNode::new("Relationship")
                .attr("Id", format!("rId{}", idx + 1))
                .attr("Type", *rel_type)
                .attr("Target", *target)
        }))
        .to_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_presentation_ids_match_rels() {
        let layout = Layout::default();
        let xml = presentation(3, &layout, false).unwrap();
        assert!(xml.contains(r#"<p:sldMasterId id="2147483648" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(xml.contains(r#"<p:sldId id="258" r:id="rId4"/>"#));
        assert!(xml.contains(r#"<p:notesMasterId r:id="rId5"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="9144000" cy="5143500" type="screen16x9"/>"#));
        assert!(!xml.contains("rtl=\"1\""));

        let rels = presentation_rels(3).unwrap();
        assert!(rels.contains(r#"Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide3.xml""#));
        assert!(rels.contains(r#"Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster""#));
        assert!(rels.contains(r#"Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles""#));
    }

    #[test]
    fn test_rtl_presentation() {
        let xml = presentation(1, &Layout::default(), true).unwrap();
        assert!(xml.contains("rtl=\"1\""));
    }

    #[test]
    fn test_core_properties() {
        let info = DocumentInfo {
            title: "Q3 <Review>".into(),
            ..DocumentInfo::default()
        };
        let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let xml = core(&info, stamp).unwrap();
        assert!(xml.contains("<dc:title>Q3 &lt;Review&gt;</dc:title>"));
        assert!(xml.contains(r#"<dcterms:created xsi:type="dcterms:W3CDTF">2024-05-01T12:30:00Z</dcterms:created>"#));
    }

    #[test]
    fn test_app_properties_count_slides() {
        let xml = app(2, "Acme").unwrap();
        assert!(xml.contains("<Slides>2</Slides>"));
        assert!(xml.contains(r#"<vt:vector size="5" baseType="lpstr">"#));
        assert!(xml.contains("<vt:lpstr>Slide 2</vt:lpstr>"));
        assert!(xml.contains("<Company>Acme</Company>"));
    }

    #[test]
    fn test_theme_fonts() {
        let xml = theme(&ThemeOptions {
            head_font_face: "Georgia".into(),
            body_font_face: "Verdana".into(),
        });
        assert!(xml.contains(r#"<a:majorFont><a:latin typeface="Georgia"/>"#));
        assert!(xml.contains(r#"<a:minorFont><a:latin typeface="Verdana"/>"#));
    }

    #[test]
    fn test_notes_slide() {
        let xml = notes_slide("first\nsecond", 4).unwrap();
        assert!(xml.contains("<a:t>first\r\nsecond</a:t>"));
        assert!(xml.contains(r#"<a:fld id="{F7021451-1387-4CA6-816F-3879F97B5CBC}" type="slidenum">"#));
        assert!(xml.contains("<a:t>4</a:t>"));

        let rels = notes_slide_rels(4).unwrap();
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains("../slides/slide4.xml"));
    }
}
