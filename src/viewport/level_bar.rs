//! Placement of the level-selector strip drawn above the canvas.
//!
//! Buttons follow their level band through the viewport transform. A button
//! that is fully outside the container is dropped; one that is partly outside
//! is pulled fully into view instead of being clipped.

use crate::mindmap::model::{LevelNo, Viewport};
use crate::store::levels::MAX_LEVELS;

use super::transform::level_band;

pub const LEVEL_BUTTON_WIDTH: f32 = 120.0;
pub const CONTAINER_INSET: f32 = 16.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelBarGeometry {
    pub container_width: f32,
    pub inset: f32,
    pub button_width: f32,
}

impl LevelBarGeometry {
    pub fn new(container_width: f32) -> Self {
        Self { container_width, inset: CONTAINER_INSET, button_width: LEVEL_BUTTON_WIDTH }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelButton {
    pub level: LevelNo,
    // Container-relative
    pub left: f32,
    pub width: f32,
    pub clamped: bool,
}

impl LevelButton {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn center(&self) -> f32 {
        self.left + self.width * 0.5
    }
}

// Unclamped container-relative placement of one button
fn raw_button(level: LevelNo, viewport: &Viewport, geom: &LevelBarGeometry) -> (f32, f32) {
    let band = level_band(level);
    let start = band.screen_start(viewport);
    let band_width = band.width() * viewport.zoom;
    let width = band_width.min(geom.button_width);
    let left = start + (band_width - width) * 0.5 - geom.inset;
    (left, width)
}

pub fn layout_level_buttons(level_count: u32, viewport: &Viewport, geom: &LevelBarGeometry) -> Vec<LevelButton> {
    let mut out = Vec::with_capacity(level_count as usize);
    let cw = geom.container_width;
    for level in 1..=level_count {
        let (left, width) = raw_button(level, viewport, geom);
        let right = left + width;
        if right <= 0.0 || left >= cw {
            continue;
        }
        let mut button = LevelButton { level, left, width, clamped: false };
        if width >= cw {
            button.left = 0.0;
            button.width = cw;
            button.clamped = true;
        } else if left < 0.0 {
            button.left = 0.0;
            button.clamped = true;
        } else if right > cw {
            button.left = cw - width;
            button.clamped = true;
        }
        out.push(button);
    }
    out
}

/// Add/insert controls are hidden with no nodes, no levels, or a full table.
pub fn show_add_level_controls(level_count: usize, node_count: usize) -> bool {
    node_count > 0 && level_count > 0 && level_count < MAX_LEVELS
}

// Container-relative x of the "insert after `after`" control at a band boundary
pub fn insert_slot_x(after: LevelNo, viewport: &Viewport, geom: &LevelBarGeometry) -> f32 {
    level_band(after).screen_end(viewport) - geom.inset
}
