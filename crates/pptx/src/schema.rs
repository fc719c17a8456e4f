//! Namespace URIs, relationship types and content types used by the
//! generated package.

/// XML namespaces.
pub mod namespace {
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    pub const C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
    pub const TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
    pub const P14: &str = "http://schemas.microsoft.com/office/powerpoint/2010/main";
    pub const ASVG: &str = "http://schemas.microsoft.com/office/drawing/2016/SVG/main";
    pub const RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
    pub const DOC_PROPS_VTYPES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
    pub const SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
}

/// Relationship type URIs.
pub mod relationship_type {
    pub const AUDIO: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/audio";
    pub const CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const PACKAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const VIDEO: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/video";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

    /// Second relationship of an embedded audio/video pair.
    pub const MS_MEDIA: &str = "http://schemas.microsoft.com/office/2007/relationships/media";
    /// Second relationship of an online video sharing a Target.
    pub const MS_IMAGE: &str = "http://schemas.microsoft.com/office/2007/relationships/image";
}

/// Content types used in `[Content_Types].xml`.
pub mod content_type {
    pub const XML: &str = "application/xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const JPEG: &str = "image/jpeg";
    pub const JPG: &str = "image/jpg";
    pub const PNG: &str = "image/png";
    pub const GIF: &str = "image/gif";
    pub const MP4: &str = "video/mp4";
    pub const VML: &str = "application/vnd.openxmlformats-officedocument.vmlDrawing";
    pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";

    pub const SHEET_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const SHEET_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
}

/// Target mode of an external relationship.
pub const TARGET_MODE_EXTERNAL: &str = "External";

/// `p:sldMasterId` of the single slide master.
pub const MASTER_ID: u32 = 2_147_483_648;

/// First `p:sldLayoutId`; each layout adds its index.
pub const LAYOUT_IDX_SERIES_BASE: u32 = 2_147_483_649;

/// First `p:sldId`.
pub const SLIDE_ID_BASE: u32 = 256;

/// Field id of the slide-number text field.
pub const SLIDE_NUMBER_FIELD_ID: &str = "{F7021451-1387-4CA6-816F-3879F97B5CBC}";

/// Extension URI of the SVG blip.
pub const SVG_BLIP_EXT_URI: &str = "{96DAC541-7B7A-43D3-8B79-37D633B846F1}";

/// Extension URI of the `p14:media` element.
pub const MEDIA_EXT_URI: &str = "{DAA4B4D4-6D71-4841-9C94-3DE7FCFB9230}";
