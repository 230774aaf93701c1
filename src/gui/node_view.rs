use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Stroke, StrokeKind};

use crate::mindmap::model::{Node, NodeKind};

/// The three flags a node card's look depends on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeState {
    pub selected: bool,
    pub expanded: bool,
    pub generating: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeVisual {
    pub fill: Color32,
    pub stroke: Stroke,
    pub text: Color32,
    pub badge: Option<&'static str>,
}

const ACCENT: Color32 = Color32::from_rgb(0x7b, 0xa3, 0xff);
const CARD: Color32 = Color32::from_rgb(0x2a, 0x2d, 0x35);
const CARD_SELECTED: Color32 = Color32::from_rgb(0x32, 0x45, 0x6e);
const TEXT: Color32 = Color32::from_rgb(0xe8, 0xea, 0xef);
const MUTED: Color32 = Color32::from_rgb(0x9a, 0xa0, 0xab);

// Declarative style table keyed by (selected, expanded, generating)
pub fn visual_for(kind: NodeKind, state: NodeState) -> NodeVisual {
    if kind == NodeKind::Original {
        return NodeVisual {
            fill: Color32::from_rgb(0x3d, 0x2f, 0x5c),
            stroke: Stroke::new(2.0, Color32::from_rgb(0xa3, 0x7b, 0xff)),
            text: TEXT,
            badge: None,
        };
    }
    match (state.selected, state.expanded, state.generating) {
        (_, _, true) => NodeVisual {
            fill: CARD,
            stroke: Stroke::new(1.5, Color32::from_rgb(0xff, 0xe0, 0x7b)),
            text: MUTED,
            badge: Some("…"),
        },
        (true, true, false) => NodeVisual { fill: CARD_SELECTED, stroke: Stroke::new(2.0, ACCENT), text: TEXT, badge: Some("▾") },
        (true, false, false) => NodeVisual { fill: CARD_SELECTED, stroke: Stroke::new(2.0, ACCENT), text: TEXT, badge: None },
        (false, true, false) => NodeVisual { fill: CARD, stroke: Stroke::new(1.0, MUTED), text: TEXT, badge: Some("▾") },
        (false, false, false) => NodeVisual { fill: CARD, stroke: Stroke::new(1.0, Color32::from_gray(70)), text: TEXT, badge: None },
    }
}

pub fn node_state(node: &Node, highlighted: bool) -> NodeState {
    NodeState {
        selected: highlighted,
        expanded: node.is_expanded && node.has_children,
        generating: node.is_generating,
    }
}

pub fn paint_node(painter: &Painter, rect: Rect, node: &Node, visual: &NodeVisual, zoom: f32) {
    let rounding = 8.0 * zoom;
    painter.rect_filled(rect, rounding, visual.fill);
    painter.rect_stroke(rect, rounding, visual.stroke, StrokeKind::Inside);

    let font = FontId::proportional((14.0 * zoom).clamp(8.0, 22.0));
    let max_chars = ((rect.width() / (7.5 * zoom)).floor() as usize).max(4);
    let label = elide(&node.content, max_chars);
    painter.text(rect.center(), Align2::CENTER_CENTER, label, font, visual.text);

    if let Some(badge) = visual.badge {
        let pos = egui::pos2(rect.right() - 10.0 * zoom, rect.center().y);
        painter.text(pos, Align2::CENTER_CENTER, badge, FontId::proportional((12.0 * zoom).clamp(8.0, 18.0)), MUTED);
    }
}

fn elide(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    s.push('…');
    s
}
