//! Chart parts: `ppt/charts/chartN.xml`, its relationship part and the
//! embedded workbook holding the chart data.
//!
//! Workbook layout:
//!
//! ```text
//!     |    A     |    B     |    C     |
//! ----+----------+----------+----------+
//!   1 |          | Series 1 | Series 2 |
//!   2 | Cat 1    |   10.0   |   15.0   |
//!   3 | Cat 2    |   20.0   |   25.0   |
//! ```

use crate::package::{PackageSink, ZipSink};
use crate::schema::{content_type, namespace, relationship_type};
use crate::xml::XmlNode;
use deckgen_core::{ChartOptions, ChartSeries, ChartType, Error, Result};

const CATEGORY_AXIS_ID: &str = "2094734552";
const VALUE_AXIS_ID: &str = "2094734553";

const DEFAULT_COLORS: [&str; 6] = ["4472C4", "ED7D31", "A5A5A5", "FFC000", "5B9BD5", "70AD47"];
const LEGEND_POSITIONS: [&str; 5] = ["b", "l", "r", "t", "tr"];
const BAR_DIRECTIONS: [&str; 2] = ["bar", "col"];
const BAR_GROUPINGS: [&str; 4] = ["clustered", "standard", "stacked", "percentStacked"];

/// A chart definition as registered with a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPart {
    /// Chart family.
    pub chart_type: ChartType,
    /// Data series.
    pub series: Vec<ChartSeries>,
    /// Options, already corrected.
    pub options: ChartOptions,
}

impl Default for ChartPart {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Bar,
            series: Vec::new(),
            options: ChartOptions::default(),
        }
    }
}

impl ChartPart {
    /// Build a chart part, replacing invalid option values with defaults.
    pub fn new(chart_type: ChartType, series: Vec<ChartSeries>, options: ChartOptions) -> Self {
        let mut options = options;
        options.legend_pos = checked(options.legend_pos, &LEGEND_POSITIONS, "legend_pos");
        options.bar_dir = checked(options.bar_dir, &BAR_DIRECTIONS, "bar_dir");
        options.bar_grouping = checked(options.bar_grouping, &BAR_GROUPINGS, "bar_grouping");

        for s in &series {
            if s.labels.len() != s.values.len() {
                log::warn!(
                    "Chart series \"{}\" has {} labels but {} values",
                    s.name,
                    s.labels.len(),
                    s.values.len()
                );
            }
        }

        Self {
            chart_type,
            series,
            options,
        }
    }

    fn color(&self, idx: usize) -> String {
        let palette: Vec<String> = match &self.options.chart_colors {
            Some(colors) if !colors.is_empty() => colors.clone(),
            _ => DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
        };
        palette[idx % palette.len()].trim_start_matches('#').to_uppercase()
    }

    fn categories(&self) -> &[String] {
        self.series.first().map(|s| s.labels.as_slice()).unwrap_or_default()
    }

    /// Render `ppt/charts/chartN.xml`.
    pub fn render(&self) -> Result<String> {
        let mut chart = XmlNode::new("c:chart");
        if let Some(title) = &self.options.title {
            chart.push(title_node(title));
            chart.push(XmlNode::new("c:autoTitleDeleted").attr("val", 0));
        } else {
            chart.push(XmlNode::new("c:autoTitleDeleted").attr("val", 1));
        }

        let mut plot_area = XmlNode::new("c:plotArea")
            .child(XmlNode::new("c:layout"))
            .child(self.plot_node());
        if !self.is_round() {
            plot_area = plot_area.children(self.axis_nodes());
        }
        chart.push(plot_area);

        if self.options.show_legend {
            chart.push(
                XmlNode::new("c:legend")
                    .child(
                        XmlNode::new("c:legendPos")
                            .attr("val", self.options.legend_pos.as_deref().unwrap_or("r")),
                    )
                    .child(XmlNode::new("c:overlay").attr("val", 0)),
            );
        }
        chart.push(XmlNode::new("c:plotVisOnly").attr("val", 1));
        chart.push(XmlNode::new("c:dispBlanksAs").attr("val", "gap"));

        XmlNode::new("c:chartSpace")
            .attr("xmlns:c", namespace::C)
            .attr("xmlns:a", namespace::A)
            .attr("xmlns:r", namespace::R)
            .child(XmlNode::new("c:date1904").attr("val", 0))
            .child(XmlNode::new("c:roundedCorners").attr("val", 0))
            .child(chart)
            .child(
                XmlNode::new("c:externalData")
                    .attr("r:id", "rId1")
                    .child(XmlNode::new("c:autoUpdate").attr("val", 0)),
            )
            .to_document()
    }

    fn is_round(&self) -> bool {
        matches!(self.chart_type, ChartType::Pie | ChartType::Doughnut)
    }

    fn plot_node(&self) -> XmlNode {
        let bar_dir = self.options.bar_dir.as_deref().unwrap_or("col");
        let grouping = self.options.bar_grouping.as_deref().unwrap_or("standard");

        let mut node = match self.chart_type {
            ChartType::Bar => XmlNode::new("c:barChart")
                .child(XmlNode::new("c:barDir").attr("val", bar_dir))
                .child(XmlNode::new("c:grouping").attr("val", grouping))
                .child(XmlNode::new("c:varyColors").attr("val", 0)),
            ChartType::Line => XmlNode::new("c:lineChart")
                .child(XmlNode::new("c:grouping").attr("val", "standard"))
                .child(XmlNode::new("c:varyColors").attr("val", 0)),
            ChartType::Area => XmlNode::new("c:areaChart")
                .child(XmlNode::new("c:grouping").attr("val", "standard"))
                .child(XmlNode::new("c:varyColors").attr("val", 0)),
            ChartType::Pie => XmlNode::new("c:pieChart").child(XmlNode::new("c:varyColors").attr("val", 1)),
            ChartType::Doughnut => {
                XmlNode::new("c:doughnutChart").child(XmlNode::new("c:varyColors").attr("val", 1))
            }
        };

        for (idx, series) in self.series.iter().enumerate() {
            node.push(self.series_node(idx, series));
        }
        if self.options.show_value {
            node.push(self.data_labels_node());
        }

        match self.chart_type {
            ChartType::Bar => {
                node.push(XmlNode::new("c:gapWidth").attr("val", 150));
                if grouping.ends_with("tacked") {
                    node.push(XmlNode::new("c:overlap").attr("val", 100));
                }
                node.children(axis_ids())
            }
            ChartType::Line => node
                .child(XmlNode::new("c:marker").attr("val", 1))
                .children(axis_ids()),
            ChartType::Area => node.children(axis_ids()),
            ChartType::Pie => node.child(XmlNode::new("c:firstSliceAng").attr("val", 0)),
            ChartType::Doughnut => node
                .child(XmlNode::new("c:firstSliceAng").attr("val", 0))
                .child(XmlNode::new("c:holeSize").attr("val", 50)),
        }
    }

    fn series_node(&self, idx: usize, series: &ChartSeries) -> XmlNode {
        let column = column_name(idx + 1);
        let rows = self.categories().len().max(series.values.len());

        let mut node = XmlNode::new("c:ser")
            .child(XmlNode::new("c:idx").attr("val", idx))
            .child(XmlNode::new("c:order").attr("val", idx))
            .child(
                XmlNode::new("c:tx").child(
                    XmlNode::new("c:strRef")
                        .child(XmlNode::new("c:f").text(format!("Sheet1!${}$1", column)))
                        .child(string_cache(std::slice::from_ref(&series.name))),
                ),
            );

        if self.is_round() {
            for point in 0..series.values.len() {
                node.push(
                    XmlNode::new("c:dPt")
                        .child(XmlNode::new("c:idx").attr("val", point))
                        .child(XmlNode::new("c:bubble3D").attr("val", 0))
                        .child(solid_fill_sp_pr(&self.color(point))),
                );
            }
        } else {
            node.push(solid_fill_sp_pr(&self.color(idx)));
            if self.chart_type == ChartType::Bar {
                node.push(XmlNode::new("c:invertIfNegative").attr("val", 0));
            }
        }

        node = node
            .child(
                XmlNode::new("c:cat").child(
                    XmlNode::new("c:strRef")
                        .child(XmlNode::new("c:f").text(format!("Sheet1!$A$2:$A${}", rows + 1)))
                        .child(string_cache(self.categories())),
                ),
            )
            .child(
                XmlNode::new("c:val").child(
                    XmlNode::new("c:numRef")
                        .child(
                            XmlNode::new("c:f")
                                .text(format!("Sheet1!${}$2:${}${}", column, column, rows + 1)),
                        )
                        .child(number_cache(&series.values)),
                ),
            );

        if self.chart_type == ChartType::Line {
            node.push(XmlNode::new("c:smooth").attr("val", 0));
        }
        node
    }

    fn data_labels_node(&self) -> XmlNode {
        let default_format = if self.is_round() { "0%" } else { "#,##0" };
        let format = self
            .options
            .data_label_format_code
            .as_deref()
            .unwrap_or(default_format);
        XmlNode::new("c:dLbls")
            .child(
                XmlNode::new("c:numFmt")
                    .attr("formatCode", format)
                    .attr("sourceLinked", 0),
            )
            .child(XmlNode::new("c:showLegendKey").attr("val", 0))
            .child(XmlNode::new("c:showVal").attr("val", 1))
            .child(XmlNode::new("c:showCatName").attr("val", 0))
            .child(XmlNode::new("c:showSerName").attr("val", 0))
            .child(XmlNode::new("c:showPercent").attr("val", 0))
            .child(XmlNode::new("c:showBubbleSize").attr("val", 0))
    }

    fn axis_nodes(&self) -> Vec<XmlNode> {
        let horizontal_bars = self.chart_type == ChartType::Bar
            && self.options.bar_dir.as_deref() == Some("bar");
        let (cat_pos, val_pos) = if horizontal_bars { ("l", "b") } else { ("b", "l") };

        let category = XmlNode::new("c:catAx")
            .child(XmlNode::new("c:axId").attr("val", CATEGORY_AXIS_ID))
            .child(scaling())
            .child(XmlNode::new("c:delete").attr("val", 0))
            .child(XmlNode::new("c:axPos").attr("val", cat_pos))
            .child(XmlNode::new("c:majorTickMark").attr("val", "out"))
            .child(XmlNode::new("c:minorTickMark").attr("val", "none"))
            .child(XmlNode::new("c:tickLblPos").attr("val", "nextTo"))
            .child(XmlNode::new("c:crossAx").attr("val", VALUE_AXIS_ID))
            .child(XmlNode::new("c:crosses").attr("val", "autoZero"))
            .child(XmlNode::new("c:auto").attr("val", 1))
            .child(XmlNode::new("c:lblAlgn").attr("val", "ctr"))
            .child(XmlNode::new("c:lblOffset").attr("val", 100));

        let value = XmlNode::new("c:valAx")
            .child(XmlNode::new("c:axId").attr("val", VALUE_AXIS_ID))
            .child(scaling())
            .child(XmlNode::new("c:delete").attr("val", 0))
            .child(XmlNode::new("c:axPos").attr("val", val_pos))
            .child(XmlNode::new("c:majorGridlines"))
            .child(
                XmlNode::new("c:numFmt")
                    .attr("formatCode", "General")
                    .attr("sourceLinked", 0),
            )
            .child(XmlNode::new("c:majorTickMark").attr("val", "out"))
            .child(XmlNode::new("c:minorTickMark").attr("val", "none"))
            .child(XmlNode::new("c:tickLblPos").attr("val", "nextTo"))
            .child(XmlNode::new("c:crossAx").attr("val", CATEGORY_AXIS_ID))
            .child(XmlNode::new("c:crosses").attr("val", "autoZero"))
            .child(XmlNode::new("c:crossBetween").attr("val", "between"));

        vec![category, value]
    }
}

fn checked(value: Option<String>, allowed: &[&str], option: &str) -> Option<String> {
    match value {
        Some(v) if !allowed.contains(&v.as_str()) => {
            log::warn!(
                "Invalid chart option {} = \"{}\"; expected one of {:?}, using default",
                option,
                v,
                allowed
            );
            None
        }
        other => other,
    }
}

fn title_node(title: &str) -> XmlNode {
    XmlNode::new("c:title")
        .child(
            XmlNode::new("c:tx").child(
                XmlNode::new("c:rich")
                    .child(XmlNode::new("a:bodyPr"))
                    .child(XmlNode::new("a:lstStyle"))
                    .child(
                        XmlNode::new("a:p").child(
                            XmlNode::new("a:r").child(XmlNode::new("a:t").text(title)),
                        ),
                    ),
            ),
        )
        .child(XmlNode::new("c:overlay").attr("val", 0))
}

fn axis_ids() -> Vec<XmlNode> {
    vec![
        XmlNode::new("c:axId").attr("val", CATEGORY_AXIS_ID),
        XmlNode::new("c:axId").attr("val", VALUE_AXIS_ID),
    ]
}

fn scaling() -> XmlNode {
    XmlNode::new("c:scaling").child(XmlNode::new("c:orientation").attr("val", "minMax"))
}

fn solid_fill_sp_pr(color: &str) -> XmlNode {
    XmlNode::new("c:spPr").child(
        XmlNode::new("a:solidFill").child(XmlNode::new("a:srgbClr").attr("val", color)),
    )
}

fn string_cache(values: &[String]) -> XmlNode {
    let mut cache = XmlNode::new("c:strCache").child(XmlNode::new("c:ptCount").attr("val", values.len()));
    for (idx, value) in values.iter().enumerate() {
        cache.push(
            XmlNode::new("c:pt")
                .attr("idx", idx)
                .child(XmlNode::new("c:v").text(value.as_str())),
        );
    }
    cache
}

fn number_cache(values: &[f64]) -> XmlNode {
    let mut cache = XmlNode::new("c:numCache")
        .child(XmlNode::new("c:formatCode").text("General"))
        .child(XmlNode::new("c:ptCount").attr("val", values.len()));
    for (idx, value) in values.iter().enumerate() {
        cache.push(
            XmlNode::new("c:pt")
                .attr("idx", idx)
                .child(XmlNode::new("c:v").text(value.to_string())),
        );
    }
    cache
}

/// Spreadsheet column name for a zero-based index (0 → A, 26 → AA).
pub fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Package path of the workbook embedded for chart `number`.
pub fn workbook_path(number: u32) -> String {
    format!("ppt/embeddings/Microsoft_Excel_Worksheet{}.xlsx", number)
}

/// Render `ppt/charts/_rels/chartN.xml.rels`.
pub fn render_chart_rels(number: u32) -> Result<String> {
    XmlNode::new("Relationships")
        .attr("xmlns", namespace::RELATIONSHIPS)
        .child(
            XmlNode::new("Relationship")
                .attr("Id", "rId1")
                .attr(
                    "Target",
                    format!("../embeddings/Microsoft_Excel_Worksheet{}.xlsx", number),
                )
                .attr("Type", relationship_type::PACKAGE),
        )
        .to_document()
}

/// Build the embedded workbook for a chart.
pub fn build_workbook(part: &ChartPart) -> Result<Vec<u8>> {
    let mut sink = ZipSink::new();

    let content_types = XmlNode::new("Types")
        .attr("xmlns", namespace::CONTENT_TYPES)
        .child(
            XmlNode::new("Default")
                .attr("Extension", "rels")
                .attr("ContentType", content_type::RELATIONSHIPS),
        )
        .child(
            XmlNode::new("Default")
                .attr("Extension", "xml")
                .attr("ContentType", content_type::XML),
        )
        .child(
            XmlNode::new("Override")
                .attr("PartName", "/xl/workbook.xml")
                .attr("ContentType", content_type::SHEET_MAIN),
        )
        .child(
            XmlNode::new("Override")
                .attr("PartName", "/xl/worksheets/sheet1.xml")
                .attr("ContentType", content_type::WORKSHEET),
        )
        .child(
            XmlNode::new("Override")
                .attr("PartName", "/xl/styles.xml")
                .attr("ContentType", content_type::SHEET_STYLES),
        );
    sink.write_text("[Content_Types].xml", &content_types.to_document()?)?;

    let root_rels = XmlNode::new("Relationships")
        .attr("xmlns", namespace::RELATIONSHIPS)
        .child(
            XmlNode::new("Relationship")
                .attr("Id", "rId1")
                .attr("Type", relationship_type::OFFICE_DOCUMENT)
                .attr("Target", "xl/workbook.xml"),
        );
    sink.write_text("_rels/.rels", &root_rels.to_document()?)?;

    let workbook = XmlNode::new("workbook")
        .attr("xmlns", namespace::SPREADSHEET)
        .attr("xmlns:r", namespace::R)
        .child(
            XmlNode::new("sheets").child(
                XmlNode::new("sheet")
                    .attr("name", "Sheet1")
                    .attr("sheetId", 1)
                    .attr("r:id", "rId1"),
            ),
        );
    sink.write_text("xl/workbook.xml", &workbook.to_document()?)?;

    let workbook_rels = XmlNode::new("Relationships")
        .attr("xmlns", namespace::RELATIONSHIPS)
        .child(
            XmlNode::new("Relationship")
                .attr("Id", "rId1")
                .attr("Type", relationship_type::WORKSHEET)
                .attr("Target", "worksheets/sheet1.xml"),
        )
        .child(
            XmlNode::new("Relationship")
                .attr("Id", "rId2")
                .attr("Type", relationship_type::STYLES)
                .attr("Target", "styles.xml"),
        );
    sink.write_text("xl/_rels/workbook.xml.rels", &workbook_rels.to_document()?)?;

    sink.write_text("xl/worksheets/sheet1.xml", &worksheet(part).to_document()?)?;

    let styles = XmlNode::new("styleSheet")
        .attr("xmlns", namespace::SPREADSHEET)
        .child(
            XmlNode::new("fonts").attr("count", 1).child(
                XmlNode::new("font")
                    .child(XmlNode::new("sz").attr("val", 11))
                    .child(XmlNode::new("name").attr("val", "Calibri")),
            ),
        )
        .child(
            XmlNode::new("fills")
                .attr("count", 1)
                .child(XmlNode::new("fill").child(XmlNode::new("patternFill").attr("patternType", "none"))),
        )
        .child(XmlNode::new("borders").attr("count", 1).child(XmlNode::new("border")))
        .child(
            XmlNode::new("cellStyleXfs")
                .attr("count", 1)
                .child(XmlNode::new("xf").attr("numFmtId", 0)),
        )
        .child(
            XmlNode::new("cellXfs")
                .attr("count", 1)
                .child(XmlNode::new("xf").attr("numFmtId", 0).attr("xfId", 0)),
        );
    sink.write_text("xl/styles.xml", &styles.to_document()?)?;

    sink.finish()
        .map_err(|e| Error::ChartError(format!("Failed to build chart workbook: {}", e)))
}

fn worksheet(part: &ChartPart) -> XmlNode {
    let mut header = XmlNode::new("row").attr("r", 1);
    for (idx, series) in part.series.iter().enumerate() {
        header.push(string_cell(&format!("{}1", column_name(idx + 1)), &series.name));
    }

    let mut data = XmlNode::new("sheetData").child(header);
    let rows = part
        .series
        .iter()
        .map(|s| s.values.len())
        .max()
        .unwrap_or(0)
        .max(part.categories().len());

    for row in 0..rows {
        let r = row + 2;
        let mut node = XmlNode::new("row").attr("r", r);
        if let Some(label) = part.categories().get(row) {
            node.push(string_cell(&format!("A{}", r), label));
        }
        for (idx, series) in part.series.iter().enumerate() {
            if let Some(value) = series.values.get(row) {
                node.push(
                    XmlNode::new("c")
                        .attr("r", format!("{}{}", column_name(idx + 1), r))
                        .child(XmlNode::new("v").text(value.to_string())),
                );
            }
        }
        data.push(node);
    }

    XmlNode::new("worksheet")
        .attr("xmlns", namespace::SPREADSHEET)
        .child(data)
}

fn string_cell(reference: &str, text: &str) -> XmlNode {
    XmlNode::new("c")
        .attr("r", reference)
        .attr("t", "inlineStr")
        .child(XmlNode::new("is").child(XmlNode::new("t").text(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn sales() -> Vec<ChartSeries> {
        vec![
            ChartSeries {
                name: "Region 1".into(),
                labels: vec!["May".into(), "June".into()],
                values: vec![26.0, 53.5],
            },
            ChartSeries {
                name: "Region 2".into(),
                labels: vec!["May".into(), "June".into()],
                values: vec![10.0, 12.0],
            },
        ]
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(1), "B");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn test_invalid_options_fall_back() {
        let options = ChartOptions {
            legend_pos: Some("middle".into()),
            bar_dir: Some("bar".into()),
            bar_grouping: Some("sideways".into()),
            ..ChartOptions::default()
        };
        let part = ChartPart::new(ChartType::Bar, sales(), options);
        assert_eq!(part.options.legend_pos, None);
        assert_eq!(part.options.bar_dir.as_deref(), Some("bar"));
        assert_eq!(part.options.bar_grouping, None);
    }

    #[test]
    fn test_bar_chart_xml() {
        let options = ChartOptions {
            title: Some("Sales".into()),
            show_legend: true,
            ..ChartOptions::default()
        };
        let xml = ChartPart::new(ChartType::Bar, sales(), options).render().unwrap();

        assert!(xml.contains("<c:barChart><c:barDir val=\"col\"/>"));
        assert_eq!(xml.matches("<c:ser>").count(), 2);
        assert!(xml.contains("<c:f>Sheet1!$C$1</c:f>"));
        assert!(xml.contains("<c:f>Sheet1!$B$2:$B$3</c:f>"));
        assert!(xml.contains("<a:t>Sales</a:t>"));
        assert!(xml.contains("<c:legendPos val=\"r\"/>"));
        assert!(xml.contains("<c:catAx>"));
        assert!(xml.contains(r#"<c:externalData r:id="rId1">"#));
    }

    #[test]
    fn test_pie_chart_has_no_axes() {
        let xml = ChartPart::new(ChartType::Pie, sales()[..1].to_vec(), ChartOptions::default())
            .render()
            .unwrap();
        assert!(xml.contains("<c:pieChart>"));
        assert!(!xml.contains("<c:catAx>"));
        assert_eq!(xml.matches("<c:dPt>").count(), 2);
    }

    #[test]
    fn test_workbook_contains_data() {
        let part = ChartPart::new(ChartType::Line, sales(), ChartOptions::default());
        let bytes = build_workbook(&part).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains("<t>Region 2</t>"));
        assert!(sheet.contains(r#"<c r="A3" t="inlineStr"><is><t>June</t></is></c>"#));
        assert!(sheet.contains(r#"<c r="B3"><v>53.5</v></c>"#));
        assert!(archive.by_name("xl/workbook.xml").is_ok());
    }

    #[test]
    fn test_chart_rels_point_at_workbook() {
        let xml = render_chart_rels(3).unwrap();
        assert!(xml.contains("../embeddings/Microsoft_Excel_Worksheet3.xlsx"));
        assert_eq!(workbook_path(3), "ppt/embeddings/Microsoft_Excel_Worksheet3.xlsx");
    }
}
