use std::collections::HashMap;

use egui::{Pos2, Rect, Vec2};

use crate::mindmap::graph::MindMap;
use crate::mindmap::model::{Node, NodeId};

use super::transform::{LEVEL_BAND_ORIGIN_X, level_band};

pub const NODE_SIZE: Vec2 = Vec2::new(180.0, 44.0);
pub const ROW_GAP: f32 = 64.0;
pub const TOP_MARGIN: f32 = 120.0;

// A node is drawn only while every ancestor is expanded
pub fn is_visible(map: &MindMap, node: &Node) -> bool {
    map.ancestors_of(node.id).iter().all(|a| a.is_expanded)
}

/// Column layout: one column per level band, rows ordered by the parent's
/// row and then insertion order. Returns canvas-space node centres for the
/// visible nodes.
pub fn column_layout(map: &MindMap) -> HashMap<NodeId, Pos2> {
    let mut out: HashMap<NodeId, Pos2> = HashMap::new();
    let mut rows: HashMap<NodeId, f32> = HashMap::new();

    if let Some(orig) = map.original() {
        let pos = Pos2::new(LEVEL_BAND_ORIGIN_X * 0.5, TOP_MARGIN);
        out.insert(orig.id, pos);
        rows.insert(orig.id, 0.0);
    }

    let max_level = map.nodes.iter().map(|n| n.level).max().unwrap_or(0);
    for level in 1..=max_level {
        let mut column: Vec<(usize, f32, &Node)> = map
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.level == level && !n.is_original() && is_visible(map, n))
            .map(|(idx, n)| {
                // Root-like nodes sort after everything with a placed parent
                let parent_row = n
                    .parent_id
                    .and_then(|p| rows.get(&p).copied())
                    .unwrap_or(f32::MAX);
                (idx, parent_row, n)
            })
            .collect();
        column.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let x = level_band(level).center();
        for (row, (_, _, node)) in column.into_iter().enumerate() {
            out.insert(node.id, Pos2::new(x, TOP_MARGIN + row as f32 * ROW_GAP));
            rows.insert(node.id, row as f32);
        }
    }
    out
}

pub fn node_rect(center: Pos2) -> Rect {
    Rect::from_center_size(center, NODE_SIZE)
}
