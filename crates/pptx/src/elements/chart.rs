//! Chart frames (`p:graphicFrame` referencing a chart part).

use super::{Frame, RenderContext};
use crate::chart::ChartPart;
use crate::rels::{rid, ChartRef, RelationshipRegistry};
use crate::schema::namespace;
use crate::xml::XmlNode;
use deckgen_core::{ChartOptions, ChartSeries, ChartType, Length};

/// A chart placed on a slide.
#[derive(Debug, Clone)]
pub struct ChartElement {
    frame: Frame,
    chart: ChartRef,
}

impl ChartElement {
    /// Register the chart part and keep its ids.
    pub fn new(
        chart_type: ChartType,
        series: Vec<ChartSeries>,
        options: ChartOptions,
        registry: &mut RelationshipRegistry,
    ) -> Self {
        let frame = Frame::new(options.x, options.y, options.w, options.h).or_defaults(
            Length::Auto(1.0),
            Length::Auto(1.0),
            Length::Percent(50.0),
            Length::Percent(50.0),
        );
        let chart = registry.register_chart(ChartPart::new(chart_type, series, options));
        Self { frame, chart }
    }

    pub fn chart_ref(&self) -> ChartRef {
        self.chart
    }

    /// Render `p:graphicFrame`.
    pub fn render(&self, idx: usize, ctx: &RenderContext) -> XmlNode {
        XmlNode::new("p:graphicFrame")
            .child(
                XmlNode::new("p:nvGraphicFramePr")
                    .child(
                        XmlNode::new("p:cNvPr")
                            .attr("id", idx + 2)
                            .attr("name", format!("Chart {}", idx + 1)),
                    )
                    .child(XmlNode::new("p:cNvGraphicFramePr"))
                    .child(XmlNode::new("p:nvPr")),
            )
            .child(self.frame.xfrm("p:xfrm", ctx.layout))
            .child(
                XmlNode::new("a:graphic").child(
                    XmlNode::new("a:graphicData").attr("uri", namespace::C).child(
                        XmlNode::new("c:chart")
                            .attr("xmlns:c", namespace::C)
                            .attr("r:id", rid(self.chart.id)),
                    ),
                ),
            )
    }
}
