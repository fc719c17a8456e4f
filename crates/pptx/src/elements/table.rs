//! Tables (`p:graphicFrame` holding an `a:tbl`) and their pagination.
//!
//! Geometry is computed once for the whole logical table. Rows are then
//! split into pages by their estimated heights; every page becomes one
//! [`TableElement`] on its own slide, registering its cell hyperlinks in
//! that slide's registry.

use super::{
    line_width, paragraph_align, solid_fill, validate_links, vertical_anchor, LinkRef,
    RenderContext, RunStyle,
};
use crate::rels::RelationshipRegistry;
use crate::schema::namespace;
use crate::xml::XmlNode;
use deckgen_core::units::{emu_to_int, inches_to_emu, points_to_emu, EMU_PER_INCH};
use deckgen_core::{
    BorderOptions, ColumnWidths, Error, Layout, Length, Result, TableCell, TableOptions,
};
use std::ops::Range;

const DEFAULT_X_IN: f64 = 0.5;
const DEFAULT_Y_IN: f64 = 1.0;
const DEFAULT_FONT_SIZE: f64 = 12.0;
const DEFAULT_COLOR: &str = "000000";

/// Average glyph width is the font size divided by this.
const CHAR_WIDTH_DIVISOR: f64 = 2.2;
const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// PowerPoint's default cell insets, in points.
const DEFAULT_MARGIN_LR_PT: f64 = 7.2;
const DEFAULT_MARGIN_TB_PT: f64 = 3.6;

/// Position and column layout of a table, in EMU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGeometry {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub columns: Vec<i64>,
}

impl TableGeometry {
    /// Compute the geometry of a table on a page with the given slide
    /// margins (inches: top, right, bottom, left).
    pub fn compute(
        rows: &[Vec<TableCell>],
        options: &TableOptions,
        layout: &Layout,
        margin: [f64; 4],
    ) -> Self {
        let cols = column_count(rows).max(1);
        let page_w_in = layout.width as f64 / EMU_PER_INCH;
        let available_in = page_w_in - margin[1] - margin[3];

        let x = emu_to_int(
            options
                .x
                .unwrap_or(Length::Inches(DEFAULT_X_IN))
                .to_emu_x(layout),
        );
        let y = emu_to_int(
            options
                .y
                .unwrap_or(Length::Inches(DEFAULT_Y_IN))
                .to_emu_y(layout),
        );

        let columns_in: Option<Vec<f64>> = match &options.col_w {
            Some(ColumnWidths::Uniform(w)) => Some(vec![*w; cols]),
            Some(ColumnWidths::PerColumn(widths)) if widths.len() == cols => Some(widths.clone()),
            Some(ColumnWidths::PerColumn(widths)) => {
                log::warn!(
                    "Table colW has {} entries for {} columns; using even widths",
                    widths.len(),
                    cols
                );
                Some(vec![(available_in / cols as f64).floor(); cols])
            }
            None => None,
        };

        let (width, columns) = match (columns_in, options.w) {
            (Some(columns_in), _) => {
                let columns: Vec<i64> = columns_in
                    .iter()
                    .map(|w| emu_to_int(inches_to_emu(*w)))
                    .collect();
                let width = match options.w {
                    Some(w) => emu_to_int(w.to_emu_x(layout)),
                    None => columns.iter().sum(),
                };
                (width, columns)
            }
            (None, w) => {
                let width = match w {
                    Some(w) => emu_to_int(w.to_emu_x(layout)),
                    None => emu_to_int(inches_to_emu(available_in.floor())),
                };
                (width, vec![width / cols as i64; cols])
            }
        };

        Self {
            x,
            y,
            width,
            columns,
        }
    }
}

/// Number of grid columns: the widest row, counting colspans.
pub fn column_count(rows: &[Vec<TableCell>]) -> usize {
    rows.iter()
        .map(|row| row.iter().map(colspan).sum::<usize>())
        .max()
        .unwrap_or(0)
}

fn check_cell_links(rows: &[Vec<TableCell>]) -> Result<()> {
    validate_links(
        rows.iter()
            .flatten()
            .map(|cell| cell.options().and_then(|o| o.hyperlink.as_ref())),
    )
}

fn colspan(cell: &TableCell) -> usize {
    cell.options()
        .and_then(|o| o.colspan)
        .map(|c| c.max(1) as usize)
        .unwrap_or(1)
}

/// Rows of one page with their heights.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub rows: Vec<Vec<TableCell>>,
    /// Row heights in EMU.
    pub heights: Vec<i64>,
    pub geometry: TableGeometry,
}

impl TablePage {
    /// Split a table into pages. With auto-paging off the result is a
    /// single page. Cell hyperlinks are checked up front so that no page is
    /// produced for a table that cannot be placed.
    pub fn paginate(
        rows: &[Vec<TableCell>],
        options: &TableOptions,
        layout: &Layout,
        margin: [f64; 4],
    ) -> Result<Vec<TablePage>> {
        if rows.is_empty() {
            return Err(Error::EmptyTable);
        }
        check_cell_links(rows)?;
        let geometry = TableGeometry::compute(rows, options, layout, margin);
        let heights = estimate_row_heights(rows, options, &geometry);

        if !options.auto_page.unwrap_or(true) {
            return Ok(vec![TablePage {
                rows: rows.to_vec(),
                heights,
                geometry,
            }]);
        }

        let continuation_y = emu_to_int(inches_to_emu(
            options.new_page_start_y.unwrap_or(margin[0]),
        ));
        let bottom = layout.height - emu_to_int(inches_to_emu(margin[2]));
        let explicit_h = options.h.map(|h| emu_to_int(h.to_emu_y(layout)));

        let mut ranges: Vec<(Range<usize>, i64)> = Vec::new();
        let mut start = 0;
        let mut page_y = geometry.y;
        let mut used = 0;
        for (idx, height) in heights.iter().enumerate() {
            let available = explicit_h.unwrap_or(bottom - page_y);
            if idx > start && used + height > available {
                ranges.push((start..idx, page_y));
                start = idx;
                page_y = continuation_y;
                used = 0;
            }
            used += height;
        }
        ranges.push((start..rows.len(), page_y));

        if ranges.len() > 1 {
            log::debug!("Table split into {} pages", ranges.len());
        }

        Ok(ranges
            .into_iter()
            .map(|(range, y)| TablePage {
                rows: rows[range.clone()].to_vec(),
                heights: heights[range].to_vec(),
                geometry: TableGeometry {
                    y,
                    ..geometry.clone()
                },
            })
            .collect())
    }
}

fn estimate_row_heights(
    rows: &[Vec<TableCell>],
    options: &TableOptions,
    geometry: &TableGeometry,
) -> Vec<i64> {
    let (margin_lr, margin_tb) = match options.margin {
        Some(m) => (m, m),
        None => (DEFAULT_MARGIN_LR_PT, DEFAULT_MARGIN_TB_PT),
    };

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            if let Some(h) = options.row_h.as_ref().and_then(|r| r.get(idx)) {
                return emu_to_int(inches_to_emu(*h));
            }

            let mut col = 0;
            let mut lines = 1usize;
            let mut line_pt: f64 = 0.0;
            for cell in row {
                let span = colspan(cell);
                let cell_w: i64 = geometry.columns.iter().skip(col).take(span).sum();
                col += span;

                let font_size = cell
                    .options()
                    .and_then(|o| o.font_size)
                    .or(options.font_size)
                    .unwrap_or(DEFAULT_FONT_SIZE);
                let text_w_pt = cell_w as f64 / 12_700.0 - 2.0 * margin_lr;
                let per_line = ((text_w_pt / (font_size / CHAR_WIDTH_DIVISOR)).floor() as usize).max(1);
                let cell_lines: usize = cell
                    .text()
                    .split('\n')
                    .map(|l| l.chars().count().div_ceil(per_line).max(1))
                    .sum();
                lines = lines.max(cell_lines);
                line_pt = line_pt.max(font_size * LINE_HEIGHT_FACTOR);
            }
            let height_pt = lines as f64 * line_pt + 2.0 * margin_tb;
            emu_to_int(points_to_emu(height_pt))
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    style: RunStyle,
    align: Option<String>,
    valign: Option<String>,
    fill: Option<String>,
    span: usize,
}

/// One page of a table.
#[derive(Debug, Clone)]
pub struct TableElement {
    rows: Vec<Vec<Cell>>,
    heights: Vec<i64>,
    geometry: TableGeometry,
    height: Option<Length>,
    border: Option<BorderOptions>,
    margin: Option<f64>,
}

impl TableElement {
    /// Build one page, registering cell hyperlinks in `registry`.
    pub fn new(
        page: TablePage,
        options: &TableOptions,
        registry: &mut RelationshipRegistry,
    ) -> Result<Self> {
        check_cell_links(&page.rows)?;
        let mut rows = Vec::with_capacity(page.rows.len());
        for row in &page.rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                let co = cell.options().cloned().unwrap_or_default();
                let style = RunStyle {
                    bold: co.bold || options.bold,
                    italic: co.italic,
                    underline: false,
                    font_size: co.font_size.or(options.font_size).or(Some(DEFAULT_FONT_SIZE)),
                    font_face: co.font_face.clone().or_else(|| options.font_face.clone()),
                    color: co
                        .color
                        .clone()
                        .or_else(|| options.color.clone())
                        .or_else(|| Some(DEFAULT_COLOR.to_string())),
                    link: LinkRef::register_opt(co.hyperlink.as_ref(), registry)?,
                };
                cells.push(Cell {
                    text: cell.text().to_string(),
                    style,
                    align: co.align.clone().or_else(|| options.align.clone()),
                    valign: co.valign.clone().or_else(|| options.valign.clone()),
                    fill: co.fill.clone().or_else(|| options.fill.clone()),
                    span: colspan(cell),
                });
            }
            rows.push(cells);
        }

        Ok(Self {
            rows,
            heights: page.heights,
            geometry: page.geometry,
            height: options.h,
            border: options.border.clone(),
            margin: options.margin,
        })
    }

    /// Number of rows on this page.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render `p:graphicFrame`.
    pub fn render(&self, idx: usize, ctx: &RenderContext) -> XmlNode {
        let g = &self.geometry;
        let cy = match self.height {
            Some(h) => emu_to_int(h.to_emu_y(ctx.layout)),
            None => self.heights.iter().sum(),
        };

        let grid = XmlNode::new("a:tblGrid").children(
            g.columns
                .iter()
                .map(|w| XmlNode::new("a:gridCol").attr("w", *w)),
        );

        let mut table = XmlNode::new("a:tbl")
            .child(XmlNode::new("a:tblPr"))
            .child(grid);
        for (row, height) in self.rows.iter().zip(&self.heights) {
            let mut tr = XmlNode::new("a:tr").attr("h", *height);
            for cell in row {
                tr.push(self.render_cell(cell, ctx));
                for _ in 1..cell.span {
                    tr.push(
                        XmlNode::new("a:tc")
                            .attr("hMerge", 1)
                            .child(empty_body())
                            .child(XmlNode::new("a:tcPr")),
                    );
                }
            }
            table.push(tr);
        }

        XmlNode::new("p:graphicFrame")
            .child(
                XmlNode::new("p:nvGraphicFramePr")
                    .child(
                        XmlNode::new("p:cNvPr")
                            .attr("id", idx + 2)
                            .attr("name", format!("Table {}", idx + 1)),
                    )
                    .child(
                        XmlNode::new("p:cNvGraphicFramePr")
                            .child(XmlNode::new("a:graphicFrameLocks").attr("noGrp", 1)),
                    )
                    .child(XmlNode::new("p:nvPr")),
            )
            .child(
                XmlNode::new("p:xfrm")
                    .child(XmlNode::new("a:off").attr("x", g.x).attr("y", g.y))
                    .child(XmlNode::new("a:ext").attr("cx", g.width).attr("cy", cy)),
            )
            .child(
                XmlNode::new("a:graphic").child(
                    XmlNode::new("a:graphicData")
                        .attr("uri", namespace::TABLE)
                        .child(table),
                ),
            )
    }

    fn render_cell(&self, cell: &Cell, ctx: &RenderContext) -> XmlNode {
        let mut tc = XmlNode::new("a:tc");
        if cell.span > 1 {
            tc = tc.attr("gridSpan", cell.span);
        }

        let mut body = XmlNode::new("a:txBody")
            .child(XmlNode::new("a:bodyPr"))
            .child(XmlNode::new("a:lstStyle"));
        for line in cell.text.split('\n') {
            let mut p_pr = XmlNode::new("a:pPr")
                .attr_opt("algn", cell.align.as_deref().and_then(paragraph_align));
            if ctx.rtl {
                p_pr = p_pr.attr("rtl", 1);
            }
            body.push(
                XmlNode::new("a:p")
                    .child(p_pr)
                    .child(
                        XmlNode::new("a:r")
                            .child(cell.style.render("a:rPr"))
                            .child(XmlNode::new("a:t").text(line)),
                    ),
            );
        }

        let mut tc_pr = XmlNode::new("a:tcPr");
        if let Some(margin) = self.margin {
            let m = emu_to_int(points_to_emu(margin));
            tc_pr = tc_pr
                .attr("marL", m)
                .attr("marR", m)
                .attr("marT", m)
                .attr("marB", m);
        }
        tc_pr = tc_pr.attr_opt("anchor", cell.valign.as_deref().and_then(vertical_anchor));
        if let Some(border) = &self.border {
            for side in ["a:lnL", "a:lnR", "a:lnT", "a:lnB"] {
                tc_pr.push(
                    XmlNode::new(side)
                        .attr("w", line_width(border.pt))
                        .child(solid_fill(&border.color)),
                );
            }
        }
        if let Some(fill) = &cell.fill {
            tc_pr.push(solid_fill(fill));
        }

        tc.child(body).child(tc_pr)
    }
}

fn empty_body() -> XmlNode {
    XmlNode::new("a:txBody")
        .child(XmlNode::new("a:bodyPr"))
        .child(XmlNode::new("a:lstStyle"))
        .child(XmlNode::new("a:p"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::{CellOptions, HyperlinkOptions, ResourceCounters, DEFAULT_SLIDE_MARGIN_IN};

    fn rows(n: usize) -> Vec<Vec<TableCell>> {
        (0..n)
            .map(|i| vec![TableCell::from("a"), TableCell::Plain(format!("row {}", i))])
            .collect()
    }

    #[test]
    fn test_default_geometry() {
        let g = TableGeometry::compute(
            &rows(1),
            &TableOptions::default(),
            &Layout::default(),
            DEFAULT_SLIDE_MARGIN_IN,
        );
        assert_eq!(g.x, 457_200);
        assert_eq!(g.y, 914_400);
        assert_eq!(g.width, 9 * 914_400);
        assert_eq!(g.columns, vec![4_114_800, 4_114_800]);
    }

    #[test]
    fn test_mismatched_column_widths_are_evened() {
        let options = TableOptions {
            col_w: Some(ColumnWidths::PerColumn(vec![1.0, 2.0, 3.0])),
            ..TableOptions::default()
        };
        let g = TableGeometry::compute(&rows(1), &options, &Layout::default(), DEFAULT_SLIDE_MARGIN_IN);
        assert_eq!(g.columns, vec![4 * 914_400, 4 * 914_400]);

        let uniform = TableOptions {
            col_w: Some(ColumnWidths::Uniform(1.5)),
            ..TableOptions::default()
        };
        let g = TableGeometry::compute(&rows(1), &uniform, &Layout::default(), DEFAULT_SLIDE_MARGIN_IN);
        assert_eq!(g.width, 3 * 914_400);
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let result = TablePage::paginate(&[], &TableOptions::default(), &Layout::default(), DEFAULT_SLIDE_MARGIN_IN);
        assert!(matches!(result, Err(Error::EmptyTable)));
    }

    #[test]
    fn test_pagination_moves_overflow_to_new_pages() {
        let options = TableOptions {
            row_h: Some(vec![1.0; 12]),
            new_page_start_y: Some(0.25),
            ..TableOptions::default()
        };
        let pages =
            TablePage::paginate(&rows(12), &options, &Layout::default(), DEFAULT_SLIDE_MARGIN_IN).unwrap();

        // 5.625in page: 4 rows fit below y=1in, 4 below y=0.25in.
        let counts: Vec<usize> = pages.iter().map(|p| p.rows.len()).collect();
        assert_eq!(counts, vec![4, 4, 4]);
        assert_eq!(pages[0].geometry.y, 914_400);
        assert_eq!(pages[1].geometry.y, 228_600);
        assert_eq!(pages[2].rows[0][1].text(), "row 8");
    }

    #[test]
    fn test_bad_cell_link_fails_before_paging() {
        let mut cells = rows(3);
        cells[2][0] = TableCell::Styled {
            text: "x".into(),
            options: CellOptions {
                hyperlink: Some(HyperlinkOptions::default()),
                ..CellOptions::default()
            },
        };
        let result = TablePage::paginate(&cells, &TableOptions::default(), &Layout::default(), DEFAULT_SLIDE_MARGIN_IN);
        assert!(matches!(result, Err(Error::InvalidHyperlink)));
    }

    #[test]
    fn test_auto_page_off_keeps_one_page() {
        let options = TableOptions {
            row_h: Some(vec![1.0; 12]),
            auto_page: Some(false),
            ..TableOptions::default()
        };
        let pages =
            TablePage::paginate(&rows(12), &options, &Layout::default(), DEFAULT_SLIDE_MARGIN_IN).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_render_cells() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let cells = vec![vec![
            TableCell::Styled {
                text: "Merged".into(),
                options: CellOptions {
                    colspan: Some(2),
                    fill: Some("EEEEEE".into()),
                    hyperlink: Some(HyperlinkOptions::url("https://example.com")),
                    ..CellOptions::default()
                },
            },
        ], rows(1).remove(0)];
        let options = TableOptions {
            border: Some(BorderOptions::default()),
            ..TableOptions::default()
        };
        let layout = Layout::default();
        let mut pages = TablePage::paginate(&cells, &options, &layout, DEFAULT_SLIDE_MARGIN_IN).unwrap();
        let table = TableElement::new(pages.remove(0), &options, &mut reg).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(reg.link_records().len(), 1);

        let ctx = RenderContext { layout: &layout, rtl: false };
        let xml = table.render(0, &ctx).to_xml().unwrap();
        assert!(xml.contains(r#"<a:tc gridSpan="2">"#));
        assert!(xml.contains(r#"<a:tc hMerge="1">"#));
        assert!(xml.contains(r#"<a:hlinkClick r:id="rId1"/>"#));
        assert!(xml.contains(r#"<a:lnL w="12700"><a:solidFill><a:srgbClr val="666666"/></a:solidFill></a:lnL>"#));
        assert!(xml.contains(r#"<a:srgbClr val="EEEEEE"/></a:solidFill></a:tcPr>"#));
        assert_eq!(xml.matches("<a:gridCol ").count(), 2);
    }
}
