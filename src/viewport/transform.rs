use egui::{Pos2, Vec2};

use crate::mindmap::model::{LevelNo, Viewport};

// Canvas-space geometry of the level bands
pub const LEVEL_BAND_ORIGIN_X: f32 = 400.0;
pub const LEVEL_BAND_WIDTH: f32 = 300.0;

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 2.0;

impl Viewport {
    // screen = canvas * zoom + offset
    pub fn to_screen(&self, p: Pos2) -> Pos2 {
        Pos2::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
    }

    pub fn to_canvas(&self, p: Pos2) -> Pos2 {
        Pos2::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
    }

    pub fn screen_x(&self, canvas_x: f32) -> f32 {
        canvas_x * self.zoom + self.x
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Zoom by `factor` while keeping the canvas point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let fixed = self.to_canvas(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.x = anchor.x - fixed.x * self.zoom;
        self.y = anchor.y - fixed.y * self.zoom;
    }
}

/// Horizontal canvas-space slot `[start, end)` owned by one level.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelBand {
    pub level: LevelNo,
    pub start: f32,
    pub end: f32,
}

impl LevelBand {
    pub fn center(&self) -> f32 {
        (self.start + self.end) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    pub fn screen_start(&self, viewport: &Viewport) -> f32 {
        viewport.screen_x(self.start)
    }

    pub fn screen_end(&self, viewport: &Viewport) -> f32 {
        viewport.screen_x(self.end)
    }
}

pub fn level_band(level: LevelNo) -> LevelBand {
    let start = LEVEL_BAND_ORIGIN_X + (level.max(1) - 1) as f32 * LEVEL_BAND_WIDTH;
    LevelBand { level, start, end: start + LEVEL_BAND_WIDTH }
}
