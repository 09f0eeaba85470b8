//! Off-screen SVG rendering of a pattern, used for image export.
//!
//! Consumes exactly the persisted node/edge JSON, so anything that loads in
//! the editor renders here the same way.

use crate::document::Document;
use crate::json::decode_pattern;
use crate::model::{GraphNode, NodeKind, PatternData};
use crate::routing;
use std::fmt::Write as _;

const MARGIN: f64 = 40.0;

/// Path data of every drawable edge, in document order.
pub fn edge_paths(doc: &Document) -> Vec<String> {
    doc.edges
        .iter()
        .filter_map(|e| routing::resolve_edge(doc, e).map(|(p, _)| p.to_svg()))
        .collect()
}

pub fn render_pattern(nodes_data: &str, edges_data: &str) -> String {
    let data = PatternData { nodes_data: nodes_data.to_string(), edges_data: edges_data.to_string() };
    let mut doc = decode_pattern(&data).restore();
    doc.drop_dangling_edges();
    render_document(&doc)
}

pub fn render_document(doc: &Document) -> String {
    let (min_x, min_y, w, h) = view_box(doc);
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
        min_x, min_y, w, h, w, h
    );

    let mut colors: Vec<&str> = Vec::new();
    for e in doc.edges.iter().filter(|e| e.arrow) {
        if !colors.contains(&e.color.as_str()) {
            colors.push(&e.color);
        }
    }
    if !colors.is_empty() {
        out.push_str("<defs>");
        for (i, c) in colors.iter().enumerate() {
            let _ = write!(
                out,
                r#"<marker id="arrow-{}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="{}"/></marker>"#,
                i,
                escape(c)
            );
        }
        out.push_str("</defs>");
    }

    let mut nodes: Vec<&GraphNode> = doc.nodes.iter().collect();
    nodes.sort_by_key(|n| n.z_index);
    for n in nodes.iter().filter(|n| n.z_index < 0) {
        render_node(&mut out, n);
    }
    for e in &doc.edges {
        let Some((path, label_at)) = routing::resolve_edge(doc, e) else { continue };
        let _ = write!(
            out,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}""#,
            path.to_svg(),
            escape(&e.color),
            e.stroke_width
        );
        if e.arrow {
            if let Some(i) = colors.iter().position(|c| *c == e.color) {
                let _ = write!(out, r#" marker-end="url(#arrow-{})""#, i);
            }
        }
        out.push_str("/>");
        if let Some(label) = e.label.as_deref().filter(|l| !l.is_empty()) {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-size="12" fill="{}">{}</text>"#,
                label_at.x,
                label_at.y,
                escape(&e.color),
                escape(label)
            );
        }
    }
    for n in nodes.iter().filter(|n| n.z_index >= 0) {
        render_node(&mut out, n);
    }
    out.push_str("</svg>");
    out
}

fn view_box(doc: &Document) -> (f64, f64, f64, f64) {
    let mut it = doc.nodes.iter().map(|n| n.bounds());
    let Some(first) = it.next() else { return (0.0, 0.0, 0.0, 0.0) };
    let (mut x0, mut y0) = (first.x, first.y);
    let (mut x1, mut y1) = (first.x + first.width, first.y + first.height);
    for b in it {
        x0 = x0.min(b.x);
        y0 = y0.min(b.y);
        x1 = x1.max(b.x + b.width);
        y1 = y1.max(b.y + b.height);
    }
    (x0 - MARGIN, y0 - MARGIN, x1 - x0 + 2.0 * MARGIN, y1 - y0 + 2.0 * MARGIN)
}

fn render_node(out: &mut String, n: &GraphNode) {
    let b = n.bounds();
    let c = b.center();
    let label = n.label.as_deref().unwrap_or("");
    match n.kind {
        NodeKind::Entity => {
            let border = n.style.border_color.as_deref().unwrap_or("#64748b");
            let _ = write!(
                out,
                r##"<rect x="{}" y="{}" width="{}" height="{}" rx="10" fill="#ffffff" stroke="{}" stroke-width="2"/>"##,
                b.x,
                b.y,
                b.width,
                b.height,
                escape(border)
            );
            centered_text(out, c.x, c.y, 14.0, None, "#0f172a", label);
        }
        NodeKind::Rect => {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
                b.x,
                b.y,
                b.width,
                b.height,
                n.style.border_radius.unwrap_or(4.0),
                escape(n.style.background.as_deref().unwrap_or("none")),
                escape(n.style.border_color.as_deref().unwrap_or("#94a3b8")),
                n.style.border_width.unwrap_or(1.0)
            );
            centered_text(out, c.x, c.y, 13.0, None, "#334155", label);
        }
        NodeKind::Text => {
            let size = n.style.font_size.unwrap_or(14.0);
            let color = n.style.color.as_deref().unwrap_or("#0f172a");
            centered_text(out, c.x, c.y, size, n.style.font_weight, color, label);
        }
        NodeKind::Anchor => {
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                c.x,
                c.y,
                b.width * 0.5,
                escape(n.style.color.as_deref().unwrap_or("#94a3b8"))
            );
        }
    }
}

fn centered_text(out: &mut String, x: f64, y: f64, size: f64, weight: Option<u16>, fill: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    let lines: Vec<&str> = text.lines().collect();
    let top = y - (lines.len() as f64 - 1.0) * size * 0.6;
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-size="{}" fill="{}""#,
        x,
        top,
        size,
        escape(fill)
    );
    if let Some(w) = weight {
        let _ = write!(out, r#" font-weight="{}""#, w);
    }
    out.push('>');
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            out.push_str(&escape(line));
        } else {
            let _ = write!(out, r#"<tspan x="{}" dy="{}">{}</tspan>"#, x, size * 1.2, escape(line));
        }
    }
    out.push_str("</text>");
}

fn escape(s: &str) -> String {
    let mut o = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => o.push_str("&amp;"),
            '<' => o.push_str("&lt;"),
            '>' => o.push_str("&gt;"),
            '"' => o.push_str("&quot;"),
            '\'' => o.push_str("&#39;"),
            _ => o.push(ch),
        }
    }
    o
}
