//! Rendering surfaces for a [`Graph`].
//!
//! [`SvgSurface`] draws group frames, dependency arrows, colored service
//! nodes, the color legend and a detail panel for the selected service.
//! [`JsonSurface`] hands the node/edge lists to any other renderer.

use std::collections::HashMap;

use serde::Serialize;

use crate::classify::{classify, legend};
use crate::compose::ServiceDescriptor;
use crate::details::panel_sections;
use crate::error::Result;
use crate::fonts::{TextMeasure, fit_label};
use crate::graph::{Edge, Graph, Node};
use crate::layout::{BBox, GroupFrame, LayoutParams};
use crate::selection::{NodeSelector, SelectionSender};
use crate::theme::Theme;
use crate::xml::{escape_xml, xml_id};

const DARK_LABEL: &str = "#1b1f23";
const LIGHT_LABEL: &str = "#ffffff";
const PANEL_GAP: f32 = 40.0;
const PANEL_WIDTH: f32 = 240.0;
const PANEL_INSET: f32 = 12.0;
const LEGEND_ROW: f32 = 22.0;
const LABEL_INSET: f32 = 10.0;
const SELF_LOOP_REACH: f32 = 40.0;

/// A sink for node/edge lists.
pub trait RenderAdapter {
    type Output;

    /// `selected` is the service the host resolved from the last selection
    /// event, if any.
    fn render(&mut self, graph: &Graph, selected: Option<&ServiceDescriptor>)
    -> Result<Self::Output>;

    /// Report a pick of node `id` from the last rendered graph.
    fn select(&self, id: &str) -> Result<()>;
}

/// Style configuration for diagram rendering
#[derive(Debug, Clone)]
pub struct DiagramStyle {
    pub background: String,
    pub text: String,
    pub edge_stroke: String,
    pub group_fill: String,
    pub group_stroke: String,
    pub highlight: String,
    pub panel_fill: String,
    pub font_family: String,
    pub font_size: f32,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}

impl DiagramStyle {
    pub fn from_theme(theme: &Theme) -> Self {
        let edge_stroke = pick_higher_contrast(
            &theme.background_color,
            &theme.edge_color,
            &theme.group_stroke,
        );

        // escaped once here; drawing code interpolates these directly
        Self {
            background: escape_xml(&theme.background_color),
            text: escape_xml(&theme.text_color),
            edge_stroke: escape_xml(&edge_stroke),
            group_fill: escape_xml(&theme.group_fill),
            group_stroke: escape_xml(&theme.group_stroke),
            highlight: escape_xml(&theme.highlight_color),
            panel_fill: escape_xml(&theme.panel_fill),
            font_family: theme.font_family.clone(),
            font_size: theme.font_size,
        }
    }
}

fn parse_hex_rgb(value: &str) -> Option<(f32, f32, f32)> {
    let hex = value.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
    Some((r, g, b))
}

fn relative_luminance(color: (f32, f32, f32)) -> f32 {
    let linear = |v: f32| {
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };

    let (r, g, b) = color;
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

fn contrast_ratio(a: &str, b: &str) -> Option<f32> {
    let l1 = relative_luminance(parse_hex_rgb(a)?);
    let l2 = relative_luminance(parse_hex_rgb(b)?);
    let (hi, lo) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    Some((hi + 0.05) / (lo + 0.05))
}

fn pick_higher_contrast(base: &str, primary: &str, secondary: &str) -> String {
    let p = contrast_ratio(base, primary).unwrap_or(0.0);
    let s = contrast_ratio(base, secondary).unwrap_or(0.0);

    if s > p {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}

fn label_color(fill: &str) -> String {
    pick_higher_contrast(fill, DARK_LABEL, LIGHT_LABEL)
}

#[derive(Debug, Clone, Copy)]
pub struct SvgOptions {
    pub node_width: f32,
    pub node_height: f32,
    /// Blank margin around the whole drawing
    pub padding: f32,
    pub show_legend: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self::from_params(&LayoutParams::default())
    }
}

impl SvgOptions {
    pub fn from_params(params: &LayoutParams) -> Self {
        Self {
            node_width: params.node_width,
            node_height: params.node_height,
            padding: 20.0,
            show_legend: true,
        }
    }
}

/// Static SVG rendering of a graph.
pub struct SvgSurface<M: TextMeasure> {
    measure: M,
    pub style: DiagramStyle,
    pub options: SvgOptions,
    selector: NodeSelector,
}

impl<M: TextMeasure> SvgSurface<M> {
    pub fn new(measure: M, style: DiagramStyle, options: SvgOptions) -> Self {
        Self {
            measure,
            style,
            options,
            selector: NodeSelector::default(),
        }
    }

    /// Report selections to the host through `events`.
    pub fn with_events(mut self, events: SelectionSender) -> Self {
        self.selector.attach(events);
        self
    }

    pub fn clear_selection(&self) {
        self.selector.clear();
    }

    fn node_box(&self, node: &Node) -> BBox {
        let (w, h) = (self.options.node_width, self.options.node_height);
        BBox::new(node.position.x - w / 2.0, node.position.y - h / 2.0, w, h)
    }

    fn render_node(&mut self, node: &Node, rect: &BBox, highlighted: bool) -> String {
        let style = &self.style;
        let (stroke, stroke_width) = if highlighted {
            (style.highlight.as_str(), 3.0)
        } else {
            (style.group_stroke.as_str(), 1.0)
        };
        let font_size = style.font_size;
        let label = fit_label(
            &mut self.measure,
            &node.label,
            font_size,
            highlighted,
            rect.width - LABEL_INSET * 2.0,
        );
        let weight = if highlighted { r#" font-weight="bold""# } else { "" };

        format!(
            r#"<g id="{id}" class="node" data-service="{name}"><title>{name}</title><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="6" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width:.1}" /><text x="{:.2}" y="{:.2}" font-family="{family}" font-size="{font_size:.1}" fill="{text}" text-anchor="middle"{weight}>{label}</text></g>"#,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            node.position.x,
            node.position.y + font_size * 0.35,
            id = xml_id("node", &node.id),
            name = escape_xml(&node.id),
            fill = node.color,
            family = escape_xml(&style.font_family),
            text = label_color(&node.color),
            label = escape_xml(&label),
        )
    }

    fn render_legend(&mut self, x: f32, y: f32, graph: &Graph) -> (String, BBox) {
        let style = &self.style;
        let font_size = style.font_size * 0.9;
        let mut body = String::new();
        let mut cursor = y + PANEL_INSET;

        cursor += style.font_size;
        body.push_str(&heading(x + PANEL_INSET, cursor, "Color Legend", style));
        cursor += PANEL_INSET / 2.0;

        for rule in legend() {
            body.push_str(&format!(
                r#"<rect x="{:.2}" y="{:.2}" width="14" height="14" rx="2" fill="{}" />"#,
                x + PANEL_INSET,
                cursor + 4.0,
                rule.color
            ));
            body.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}">{}</text>"#,
                x + PANEL_INSET + 22.0,
                cursor + 15.0,
                escape_xml(&style.font_family),
                font_size,
                style.text,
                escape_xml(rule.label)
            ));
            cursor += LEGEND_ROW;
        }

        if !graph.nodes.is_empty() {
            cursor += PANEL_INSET + style.font_size;
            body.push_str(&heading(x + PANEL_INSET, cursor, "Services", style));
            cursor += PANEL_INSET / 2.0;

            let chip_width = PANEL_WIDTH - PANEL_INSET * 2.0;
            let family = escape_xml(&style.font_family);
            for node in &graph.nodes {
                let color = classify(&node.id);
                let label = fit_label(
                    &mut self.measure,
                    &node.label,
                    font_size,
                    false,
                    chip_width - LABEL_INSET,
                );
                body.push_str(&format!(
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="18" rx="9" fill="{}" /><text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}">{}</text>"#,
                    x + PANEL_INSET,
                    cursor + 2.0,
                    chip_width,
                    color,
                    x + PANEL_INSET + LABEL_INSET / 2.0,
                    cursor + 15.0,
                    family,
                    font_size,
                    label_color(color),
                    escape_xml(&label)
                ));
                cursor += LEGEND_ROW;
            }
        }

        let bbox = BBox::new(x, y, PANEL_WIDTH, cursor + PANEL_INSET - y);
        (panel(&bbox, "legend", body, &self.style), bbox)
    }

    fn render_details(&mut self, x: f32, y: f32, service: &ServiceDescriptor) -> (String, BBox) {
        let style = &self.style;
        let font_size = style.font_size * 0.9;
        let line_height = font_size * 1.4;
        let text_width = PANEL_WIDTH - PANEL_INSET * 2.0;
        let mut body = String::new();
        let mut cursor = y + PANEL_INSET + style.font_size;

        let title = fit_label(&mut self.measure, &service.name, style.font_size, true, text_width);
        body.push_str(&heading(x + PANEL_INSET, cursor, &title, style));
        cursor += PANEL_INSET / 2.0;

        let family = escape_xml(&style.font_family);
        for section in panel_sections(service) {
            cursor += line_height;
            body.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}" font-weight="bold">{}:</text>"#,
                x + PANEL_INSET,
                cursor,
                family,
                font_size,
                style.text,
                section.heading
            ));
            for item in &section.items {
                cursor += line_height;
                let line = fit_label(
                    &mut self.measure,
                    &format!("• {item}"),
                    font_size,
                    false,
                    text_width,
                );
                body.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}">{}</text>"#,
                    x + PANEL_INSET,
                    cursor,
                    family,
                    font_size,
                    style.text,
                    escape_xml(&line)
                ));
            }
        }

        let bbox = BBox::new(x, y, PANEL_WIDTH, cursor + PANEL_INSET - y);
        (panel(&bbox, "details", body, &self.style), bbox)
    }
}

impl<M: TextMeasure> RenderAdapter for SvgSurface<M> {
    type Output = String;

    fn render(&mut self, graph: &Graph, selected: Option<&ServiceDescriptor>) -> Result<String> {
        let mut svg = String::new();

        // Frames first, then edges, then nodes on top
        for frame in &graph.groups {
            svg.push_str(&render_group_frame(frame, &self.style));
        }

        let boxes: HashMap<&str, BBox> = graph
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), self.node_box(node)))
            .collect();

        for edge in &graph.edges {
            let (Some(from), Some(to)) = (
                boxes.get(edge.source.as_str()),
                boxes.get(edge.target.as_str()),
            ) else {
                continue;
            };
            svg.push_str(&render_edge(edge, from, to, &self.style));
        }

        let selected_id = selected.map(|s| s.name.as_str());
        for node in &graph.nodes {
            let rect = boxes[node.id.as_str()];
            svg.push_str(&self.render_node(node, &rect, selected_id == Some(node.id.as_str())));
        }

        let mut extent = if graph.is_empty() {
            BBox::default()
        } else {
            graph.bbox
        };
        let panel_x = if graph.is_empty() {
            0.0
        } else {
            extent.right() + PANEL_GAP
        };
        let mut panel_y = 0.0;

        if self.options.show_legend {
            let (legend_svg, bbox) = self.render_legend(panel_x, panel_y, graph);
            svg.push_str(&legend_svg);
            extent = extent.union(&bbox);
            panel_y = bbox.bottom() + PANEL_GAP / 2.0;
        }

        if let Some(service) = selected {
            let (details_svg, bbox) = self.render_details(panel_x, panel_y, service);
            svg.push_str(&details_svg);
            extent = extent.union(&bbox);
        }

        self.selector.track(graph);

        let pad = self.options.padding;
        let total_w = (extent.right() + pad * 2.0).max(100.0);
        let total_h = (extent.bottom() + pad * 2.0).max(50.0);

        Ok(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{total_w}" height="{total_h}" viewBox="0 0 {total_w} {total_h}">
<rect width="{total_w}" height="{total_h}" fill="{canvas_bg}"/>
<g transform="translate({pad},{pad})">
{inner}
</g>
</svg>"#,
            canvas_bg = self.style.background,
            inner = svg,
        ))
    }

    fn select(&self, id: &str) -> Result<()> {
        self.selector.select(id)
    }
}

fn heading(x: f32, y: f32, text: &str, style: &DiagramStyle) -> String {
    format!(
        r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}" font-weight="bold">{}</text>"#,
        x,
        y,
        escape_xml(&style.font_family),
        style.font_size,
        style.text,
        escape_xml(text)
    )
}

fn panel(bbox: &BBox, id: &str, body: String, style: &DiagramStyle) -> String {
    format!(
        r#"<g id="{id}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="8" fill="{}" stroke="{}" stroke-width="1" />{body}</g>"#,
        bbox.x, bbox.y, bbox.width, bbox.height, style.panel_fill, style.group_stroke
    )
}

fn render_group_frame(frame: &GroupFrame, style: &DiagramStyle) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(r#"<g id="{}" class="group">"#, xml_id("group", &frame.key)));
    svg.push_str(&format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="8" fill="{}" fill-opacity="0.3" stroke="{}" stroke-width="1" stroke-dasharray="4,2" />"#,
        frame.x, frame.y, frame.width, frame.height, style.group_fill, style.group_stroke
    ));

    // The title sits in the top inset, above the first row of nodes
    if !frame.key.is_empty() {
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}" font-weight="bold">{}</text>"#,
            frame.x + 8.0,
            frame.y + 14.0,
            escape_xml(&style.font_family),
            style.font_size * 0.75,
            style.text,
            escape_xml(&frame.key)
        ));
    }

    svg.push_str("</g>");
    svg
}

fn render_edge(edge: &Edge, from: &BBox, to: &BBox, style: &DiagramStyle) -> String {
    let mut svg = String::new();
    let data = format!(
        r#"class="edge" data-source="{}" data-target="{}""#,
        escape_xml(&edge.source),
        escape_xml(&edge.target)
    );

    if edge.source == edge.target {
        // Loop off the right side of the node
        let x = from.right();
        let y1 = from.y + from.height / 4.0;
        let y2 = from.bottom() - from.height / 4.0;
        let reach = x + SELF_LOOP_REACH;
        svg.push_str(&format!(
            r#"<path {data} d="M {:.2} {:.2} C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}" fill="none" stroke="{}" stroke-width="1.5" />"#,
            x,
            y1,
            reach,
            y1 - 20.0,
            reach,
            y2 + 20.0,
            x,
            y2,
            style.edge_stroke
        ));
        let angle = (-20.0f32).atan2(-SELF_LOOP_REACH);
        svg.push_str(&render_arrow_head(x, y2, angle, style));
        return svg;
    }

    let dx = (to.x + to.width / 2.0) - (from.x + from.width / 2.0);
    let dy = (to.y + to.height / 2.0) - (from.y + from.height / 2.0);
    let is_vertical = dy.abs() > dx.abs();

    // Calculate connection points
    let (x1, y1, x2, y2) = if is_vertical {
        let from_cx = from.x + from.width / 2.0;
        let to_cx = to.x + to.width / 2.0;

        if dy > 0.0 {
            // Downward
            (from_cx, from.bottom(), to_cx, to.y)
        } else {
            // Upward
            (from_cx, from.y, to_cx, to.bottom())
        }
    } else {
        let from_cy = from.y + from.height / 2.0;
        let to_cy = to.y + to.height / 2.0;

        if dx >= 0.0 {
            // Rightward
            (from.right(), from_cy, to.x, to_cy)
        } else {
            // Leftward
            (from.x, from_cy, to.right(), to_cy)
        }
    };

    if (x1 - x2).abs() < 1.0 || (y1 - y2).abs() < 1.0 {
        svg.push_str(&format!(
            r#"<path {data} d="M {:.2} {:.2} L {:.2} {:.2}" fill="none" stroke="{}" stroke-width="1.5" />"#,
            x1, y1, x2, y2, style.edge_stroke
        ));
    } else {
        let mx = (x1 + x2) / 2.0;
        let my = (y1 + y2) / 2.0;

        let (cx1, cy1, cx2, cy2) = if is_vertical {
            (x1, my, x2, my)
        } else {
            (mx, y1, mx, y2)
        };

        svg.push_str(&format!(
            r#"<path {data} d="M {:.2} {:.2} C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}" fill="none" stroke="{}" stroke-width="1.5" />"#,
            x1, y1, cx1, cy1, cx2, cy2, x2, y2, style.edge_stroke
        ));
    }

    // The curve arrives along its last control segment
    let angle = if is_vertical {
        (y2 - y1).signum().atan2(0.0)
    } else {
        0.0f32.atan2((x2 - x1).signum())
    };
    svg.push_str(&render_arrow_head(x2, y2, angle, style));

    svg
}

fn render_arrow_head(x: f32, y: f32, angle: f32, style: &DiagramStyle) -> String {
    let cos = angle.cos();
    let sin = angle.sin();
    let p1 = (x - cos * 12.0 + sin * 6.0, y - sin * 12.0 - cos * 6.0);
    let p2 = (x - cos * 12.0 - sin * 6.0, y - sin * 12.0 + cos * 6.0);
    format!(
        r#"<polygon class="arrow" points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{}" />"#,
        x, y, p1.0, p1.1, p2.0, p2.1, style.edge_stroke
    )
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    graph: &'a Graph,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<&'a ServiceDescriptor>,
}

/// Serializes nodes, edges and group frames for an external renderer.
#[derive(Debug, Default)]
pub struct JsonSurface {
    pub compact: bool,
    selector: NodeSelector,
}

impl JsonSurface {
    pub fn new(compact: bool) -> Self {
        Self {
            compact,
            selector: NodeSelector::default(),
        }
    }

    pub fn with_events(mut self, events: SelectionSender) -> Self {
        self.selector.attach(events);
        self
    }
}

impl RenderAdapter for JsonSurface {
    type Output = String;

    fn render(&mut self, graph: &Graph, selected: Option<&ServiceDescriptor>) -> Result<String> {
        let document = JsonDocument { graph, selected };
        let json = if self.compact {
            serde_json::to_string(&document)?
        } else {
            serde_json::to_string_pretty(&document)?
        };
        self.selector.track(graph);
        Ok(json)
    }

    fn select(&self, id: &str) -> Result<()> {
        self.selector.select(id)
    }
}
