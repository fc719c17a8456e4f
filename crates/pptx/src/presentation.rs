//! The presentation assembler.
//!
//! [`Presentation`] owns the master, the layouts and the slides, together
//! with the counters that number media and chart files across all of them.
//! Export follows a fixed pipeline: resolve every payload concurrently,
//! write the XML parts, build the chart workbooks concurrently, then close
//! the archive. Any failure aborts the export and no bytes are returned.

use crate::chart::{build_workbook, render_chart_rels, workbook_path};
use crate::content_types::{
    aggregate_chart_targets, aggregate_extensions, render_manifest, ManifestParts,
};
use crate::elements::{RenderContext, TablePage};
use crate::media;
use crate::package::{PackageSink, ZipSink};
use crate::rels::RelationshipRegistry;
use crate::slide::Container;
use crate::templates;
use chrono::Utc;
use deckgen_core::{
    DocumentInfo, ElementSpec, Error, Layout, MasterOptions, ResourceCounters, Result,
    SharedCounters, SlideSpec, TableCell, TableOptions, ThemeOptions,
};
use futures::future;

/// Name of the layout every presentation starts with.
pub const DEFAULT_LAYOUT_NAME: &str = "[ default ]";

/// A presentation under construction.
#[derive(Debug)]
pub struct Presentation {
    layout: Layout,
    info: DocumentInfo,
    theme: ThemeOptions,
    rtl: bool,
    counters: SharedCounters,
    master: Container,
    layouts: Vec<Container>,
    slides: Vec<Container>,
}

impl Presentation {
    /// An empty 16:9 presentation.
    pub fn new() -> Self {
        Self::with_layout(Layout::default())
    }

    /// An empty presentation with the given page size.
    pub fn with_layout(layout: Layout) -> Self {
        let counters = ResourceCounters::shared();
        Self {
            layout,
            info: DocumentInfo::default(),
            theme: ThemeOptions::default(),
            rtl: false,
            master: Container::master(counters.clone()),
            layouts: vec![Container::layout(DEFAULT_LAYOUT_NAME, 1, counters.clone())],
            slides: Vec::new(),
            counters,
        }
    }

    /// Page size.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Change the page size. Affects every percentage resolved at export.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn set_info(&mut self, info: DocumentInfo) {
        self.info = info;
    }

    pub fn set_theme(&mut self, theme: ThemeOptions) {
        self.theme = theme;
    }

    /// Right-to-left text.
    pub fn set_rtl(&mut self, rtl: bool) {
        self.rtl = rtl;
    }

    pub fn slides(&self) -> &[Container] {
        &self.slides
    }

    /// Layouts, the default one first.
    pub fn layouts(&self) -> &[Container] {
        &self.layouts
    }

    pub fn master(&self) -> &Container {
        &self.master
    }

    /// Mutable access to a slide by 0-based index.
    pub fn slide_mut(&mut self, index: usize) -> Result<&mut Container> {
        self.slides.get_mut(index).ok_or(Error::UnknownSlide(index))
    }

    /// Define a slide layout that slides can name.
    pub fn define_master(&mut self, options: MasterOptions) -> Result<()> {
        let number = self.layouts.len() + 1;
        let mut layout = Container::layout(&options.title, number, self.counters.clone());
        if let Some(margin) = options.margin {
            layout.set_margin(margin);
        }
        if let Some(background) = options.background {
            layout.set_background(background)?;
        }
        for object in options.objects {
            add_element(&mut layout, object, &self.layout)?;
        }
        if let Some(slide_number) = options.slide_number {
            layout.set_slide_number(slide_number);
        }
        log::debug!("Defined layout {} \"{}\"", number, options.title);
        self.layouts.push(layout);
        Ok(())
    }

    /// Append a slide using the named layout, or the default one.
    pub fn add_slide(&mut self, master: Option<&str>) -> &mut Container {
        let layout_idx = match master {
            Some(name) => match self.layouts.iter().position(|l| l.name() == name) {
                Some(idx) => idx,
                None => {
                    log::warn!("Unknown slide layout \"{}\"; using the default layout", name);
                    0
                }
            },
            None => 0,
        };
        self.push_slide(layout_idx)
    }

    fn push_slide(&mut self, layout_idx: usize) -> &mut Container {
        let number = self.slides.len() + 1;
        let layout = &self.layouts[layout_idx];
        let mut slide = Container::slide(number, layout.number(), self.counters.clone());
        slide.set_margin(layout.margin());
        self.slides.push(slide);
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    /// Add a table to a slide. Rows that overflow the page continue on new
    /// slides sharing the slide's layout unless auto-paging is off.
    ///
    /// Returns the number of slides the table spans.
    pub fn add_table(
        &mut self,
        slide_index: usize,
        rows: Vec<Vec<TableCell>>,
        options: TableOptions,
    ) -> Result<usize> {
        let slide = self
            .slides
            .get(slide_index)
            .ok_or(Error::UnknownSlide(slide_index))?;
        let layout_idx = slide.layout_number() - 1;
        let pages = TablePage::paginate(&rows, &options, &self.layout, slide.margin())?;
        let count = pages.len();

        for (idx, page) in pages.into_iter().enumerate() {
            let target = if idx == 0 {
                self.slide_mut(slide_index)?
            } else {
                self.push_slide(layout_idx)
            };
            target.add_table_page(page, &options)?;
        }
        Ok(count)
    }

    /// Append a slide described by a [`SlideSpec`]. Returns its index.
    pub fn add_slide_from_spec(&mut self, spec: SlideSpec) -> Result<usize> {
        let index = self.slides.len();
        let slide = self.add_slide(spec.master.as_deref());
        slide.set_hidden(spec.hidden);
        if let Some(notes) = spec.notes {
            slide.set_notes(notes);
        }
        if let Some(background) = spec.background {
            slide.set_background(background)?;
        }
        if let Some(slide_number) = spec.slide_number {
            slide.set_slide_number(slide_number);
        }

        for element in spec.elements {
            match element {
                ElementSpec::Table { rows, options } => {
                    self.add_table(index, rows, options)?;
                }
                ElementSpec::Placeholder { options } => {
                    log::warn!(
                        "Placeholder \"{}\" ignored: placeholders belong on layouts",
                        options.name
                    );
                }
                other => {
                    let page = self.layout.clone();
                    add_element(self.slide_mut(index)?, other, &page)?;
                }
            }
        }
        Ok(index)
    }

    fn registries(&self) -> Vec<&RelationshipRegistry> {
        self.slides
            .iter()
            .chain(self.layouts.iter())
            .chain(std::iter::once(&self.master))
            .map(Container::registry)
            .collect()
    }

    /// Export the presentation as PPTX bytes.
    pub async fn write(&self) -> Result<Vec<u8>> {
        let registries = self.registries();

        let jobs = media::collect_jobs(&registries);
        let payloads = media::resolve_all(jobs).await?;

        let mut sink = ZipSink::new();
        self.write_parts(&mut sink, &registries)?;
        for payload in &payloads {
            sink.write_part(&payload.path, &payload.bytes)?;
        }

        let charts: Vec<_> = registries
            .iter()
            .flat_map(|r| r.chart_records().iter())
            .collect();
        for chart in &charts {
            sink.write_text(
                &format!("ppt/charts/chart{}.xml", chart.number),
                &chart.part.render()?,
            )?;
            sink.write_text(
                &format!("ppt/charts/_rels/chart{}.xml.rels", chart.number),
                &render_chart_rels(chart.number)?,
            )?;
        }

        log::debug!("Building {} chart workbooks", charts.len());
        let workbooks = future::try_join_all(charts.iter().map(|chart| {
            let part = chart.part.clone();
            let number = chart.number;
            async move {
                let bytes = tokio::task::spawn_blocking(move || build_workbook(&part))
                    .await
                    .map_err(|e| Error::ChartError(format!("Workbook task failed: {}", e)))??;
                Ok::<_, Error>((number, bytes))
            }
        }))
        .await?;
        for (number, bytes) in workbooks {
            sink.write_part(&workbook_path(number), &bytes)?;
        }

        log::debug!("Writing archive with {} parts", sink.len());
        sink.finish()
    }

    fn write_parts(&self, sink: &mut impl PackageSink, registries: &[&RelationshipRegistry]) -> Result<()> {
        let ctx = RenderContext {
            layout: &self.layout,
            rtl: self.rtl,
        };
        let slide_count = self.slides.len();
        let layout_count = self.layouts.len();

        let manifest = ManifestParts {
            slides: slide_count,
            layouts: layout_count,
            extensions: aggregate_extensions(registries),
            charts: aggregate_chart_targets(registries),
        };
        sink.write_text("[Content_Types].xml", &render_manifest(&manifest)?)?;
        sink.write_text("_rels/.rels", &templates::root_rels()?)?;
        sink.write_text("docProps/app.xml", &templates::app(slide_count, &self.info.company)?)?;
        sink.write_text("docProps/core.xml", &templates::core(&self.info, Utc::now())?)?;
        sink.write_text(
            "ppt/_rels/presentation.xml.rels",
            &templates::presentation_rels(slide_count)?,
        )?;
        sink.write_text("ppt/theme/theme1.xml", &templates::theme(&self.theme))?;
        sink.write_text(
            "ppt/presentation.xml",
            &templates::presentation(slide_count, &self.layout, self.rtl)?,
        )?;
        sink.write_text("ppt/presProps.xml", &templates::pres_props()?)?;
        sink.write_text("ppt/tableStyles.xml", &templates::table_styles()?)?;
        sink.write_text("ppt/viewProps.xml", &templates::view_props()?)?;

        for layout in &self.layouts {
            let n = layout.number();
            sink.write_text(
                &format!("ppt/slideLayouts/slideLayout{}.xml", n),
                &layout.render(&ctx, None, layout_count)?,
            )?;
            sink.write_text(
                &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
                &layout.render_rels(layout_count)?,
            )?;
        }

        for slide in &self.slides {
            let n = slide.number();
            let layout = self.layouts.get(slide.layout_number() - 1);
            sink.write_text(
                &format!("ppt/slides/slide{}.xml", n),
                &slide.render(&ctx, layout, layout_count)?,
            )?;
            sink.write_text(
                &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                &slide.render_rels(layout_count)?,
            )?;
            sink.write_text(
                &format!("ppt/notesSlides/notesSlide{}.xml", n),
                &templates::notes_slide(slide.notes().unwrap_or_default(), n)?,
            )?;
            sink.write_text(
                &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", n),
                &templates::notes_slide_rels(n)?,
            )?;
        }

        sink.write_text(
            "ppt/slideMasters/slideMaster1.xml",
            &self.master.render(&ctx, None, layout_count)?,
        )?;
        sink.write_text(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &self.master.render_rels(layout_count)?,
        )?;
        sink.write_text("ppt/notesMasters/notesMaster1.xml", templates::notes_master())?;
        sink.write_text(
            "ppt/notesMasters/_rels/notesMaster1.xml.rels",
            &templates::notes_master_rels()?,
        )?;
        Ok(())
    }

    /// Export to a file, appending `.pptx` when missing. Returns the name
    /// written.
    pub async fn write_file(&self, name: &str) -> Result<String> {
        let file_name = if name.to_lowercase().ends_with(".pptx") {
            name.to_string()
        } else {
            format!("{}.pptx", name)
        };
        let bytes = self.write().await?;
        tokio::fs::write(&file_name, bytes).await?;
        log::debug!("Wrote {}", file_name);
        Ok(file_name)
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

/// Add a described element to a container. Tables land as a single page.
fn add_element(container: &mut Container, spec: ElementSpec, page: &Layout) -> Result<()> {
    match spec {
        ElementSpec::Text { text, options } => {
            container.add_text(text, options)?;
        }
        ElementSpec::Shape { shape, options } => {
            container.add_shape(&shape, options)?;
        }
        ElementSpec::Image { options } => {
            container.add_image(options)?;
        }
        ElementSpec::Media { options } => {
            container.add_media(options)?;
        }
        ElementSpec::Chart {
            chart_type,
            data,
            options,
        } => {
            container.add_chart(chart_type, data, options)?;
        }
        ElementSpec::Table { rows, options } => {
            let single = TableOptions {
                auto_page: Some(false),
                ..options
            };
            let margin = container.margin();
            for table_page in TablePage::paginate(&rows, &single, page, margin)? {
                container.add_table_page(table_page, &single)?;
            }
        }
        ElementSpec::Placeholder { options } => {
            container.add_placeholder(options);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::{CellOptions, HyperlinkOptions, PlaceholderOptions, TextOptions};

    #[test]
    fn test_unknown_layout_uses_default() {
        let mut pres = Presentation::new();
        let slide = pres.add_slide(Some("missing"));
        assert_eq!(slide.layout_number(), 1);
    }

    #[test]
    fn test_define_master_numbers_layouts() {
        let mut pres = Presentation::new();
        pres.define_master(MasterOptions {
            title: "TITLE".into(),
            objects: vec![ElementSpec::Placeholder {
                options: PlaceholderOptions {
                    name: "title".into(),
                    ..PlaceholderOptions::default()
                },
            }],
            ..MasterOptions::default()
        })
        .unwrap();

        assert_eq!(pres.layouts().len(), 2);
        let slide = pres.add_slide(Some("TITLE"));
        assert_eq!(slide.layout_number(), 2);
        assert!(pres.layouts()[1].placeholder("title").is_some());
    }

    #[test]
    fn test_add_table_to_unknown_slide() {
        let mut pres = Presentation::new();
        let result = pres.add_table(3, vec![vec!["a".into()]], TableOptions::default());
        assert!(matches!(result, Err(Error::UnknownSlide(3))));
    }

    #[test]
    fn test_table_overflow_creates_slides() {
        let mut pres = Presentation::new();
        pres.add_slide(None);
        let rows: Vec<Vec<TableCell>> = (0..12).map(|i| vec![TableCell::Plain(i.to_string())]).collect();
        let spanned = pres
            .add_table(
                0,
                rows,
                TableOptions {
                    row_h: Some(vec![1.0; 12]),
                    ..TableOptions::default()
                },
            )
            .unwrap();
        assert_eq!(spanned, 3);
        assert_eq!(pres.slides().len(), 3);
        assert_eq!(pres.slides()[2].number(), 3);
    }

    #[test]
    fn test_failed_table_leaves_deck_unchanged() {
        let mut pres = Presentation::new();
        pres.add_slide(None);
        let mut rows: Vec<Vec<TableCell>> =
            (0..12).map(|i| vec![TableCell::Plain(i.to_string())]).collect();
        rows[11] = vec![TableCell::Styled {
            text: "broken".into(),
            options: CellOptions {
                hyperlink: Some(HyperlinkOptions::default()),
                ..CellOptions::default()
            },
        }];

        let result = pres.add_table(
            0,
            rows,
            TableOptions {
                row_h: Some(vec![1.0; 12]),
                ..TableOptions::default()
            },
        );
        assert!(matches!(result, Err(Error::InvalidHyperlink)));
        assert_eq!(pres.slides().len(), 1);
        assert!(pres.slides()[0].elements().is_empty());
        assert!(pres.slides()[0].registry().link_records().is_empty());
    }

    #[test]
    fn test_spec_slide_elements() {
        let mut pres = Presentation::new();
        let spec: SlideSpec = serde_json::from_str(
            r#"{"notes":"Hi","elements":[{"type":"text","text":"Hello"},{"type":"shape","shape":"ellipse"}]}"#,
        )
        .unwrap();
        let idx = pres.add_slide_from_spec(spec).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(pres.slides()[0].elements().len(), 2);
        assert_eq!(pres.slides()[0].notes(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_write_produces_zip() {
        let mut pres = Presentation::new();
        pres.add_slide(None)
            .add_text("Hello", TextOptions::default())
            .unwrap();
        let bytes = pres.write().await.unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
