use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::mindmap::model::{LevelNo, Viewport};

use super::transform::level_band;

// Canonical x-offset with the topic region flush left
pub const INITIAL_OFFSET_X: f32 = 0.0;
pub const DEFAULT_SLIDE_SECS: f64 = 0.5;
const EPS: f32 = 1.0;

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlideGeometry {
    pub container_width: f32,
    pub level_count: u32,
}

// Offset that puts `level`'s band centre at the container mid-point
pub fn centered_offset(level: LevelNo, zoom: f32, container_width: f32) -> f32 {
    let target = container_width * 0.5 - level_band(level).center() * zoom;
    target.min(INITIAL_OFFSET_X)
}

pub fn show_left_slide(viewport: &Viewport, _geom: &SlideGeometry) -> bool {
    viewport.x < INITIAL_OFFSET_X - EPS
}

pub fn show_right_slide(viewport: &Viewport, geom: &SlideGeometry) -> bool {
    if geom.level_count == 0 {
        return false;
    }
    level_band(geom.level_count).screen_end(viewport) > geom.container_width + EPS
}

/// Target offset for "slide right", or None once the last level is fully visible.
pub fn slide_right_target(viewport: &Viewport, geom: &SlideGeometry) -> Option<f32> {
    if !show_right_slide(viewport, geom) {
        return None;
    }
    let first_cut = (1..=geom.level_count)
        .find(|l| level_band(*l).screen_end(viewport) > geom.container_width + EPS)?;
    (first_cut..=geom.level_count)
        .map(|l| centered_offset(l, viewport.zoom, geom.container_width))
        .find(|target| *target < viewport.x - EPS)
}

/// Target offset for "slide left": centre the nearest level cut off on the
/// left, or go back to the initial offset once level 1 is fully in view.
pub fn slide_left_target(viewport: &Viewport, geom: &SlideGeometry) -> Option<f32> {
    let last_cut = (1..=geom.level_count)
        .rev()
        .find(|l| level_band(*l).screen_start(viewport) < -EPS);
    if let Some(cut) = last_cut {
        let found = (1..=cut)
            .rev()
            .map(|l| centered_offset(l, viewport.zoom, geom.container_width))
            .find(|target| *target > viewport.x + EPS);
        if found.is_some() {
            return found;
        }
    }
    (viewport.x < INITIAL_OFFSET_X - EPS).then_some(INITIAL_OFFSET_X)
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What to do when a slide is requested while another is still running.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapPolicy {
    #[default]
    CancelAndRestart,
    IgnoreWhileRunning,
}

#[derive(Clone, Debug)]
pub struct SlideAnimation {
    pub from: f32,
    pub to: f32,
    pub started_at: f64,
    pub duration: f64,
    pub token: CancelToken,
}

impl SlideAnimation {
    // (offset, finished)
    pub fn sample(&self, now: f64) -> (f32, bool) {
        let t = if self.duration <= 0.0 { 1.0 } else { ((now - self.started_at) / self.duration).clamp(0.0, 1.0) };
        let x = self.from + (self.to - self.from) * ease_in_out_cubic(t as f32);
        (x, t >= 1.0)
    }
}

/// Drives the viewport x-offset towards a slide target, one sample per frame.
#[derive(Clone, Debug)]
pub struct SlideAnimator {
    pub policy: OverlapPolicy,
    pub duration: f64,
    active: Option<SlideAnimation>,
}

impl Default for SlideAnimator {
    fn default() -> Self {
        Self::new(OverlapPolicy::default(), DEFAULT_SLIDE_SECS)
    }
}

impl SlideAnimator {
    pub fn new(policy: OverlapPolicy, duration: f64) -> Self {
        Self { policy, duration, active: None }
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.token.is_cancelled())
    }

    pub fn target(&self) -> Option<f32> {
        self.active.as_ref().filter(|a| !a.token.is_cancelled()).map(|a| a.to)
    }

    /// Start animating from `current_x` (the live offset) to `target`.
    /// Returns the new animation's token, or None if the policy refused it.
    pub fn start(&mut self, current_x: f32, target: f32, now: f64) -> Option<CancelToken> {
        if let Some(running) = self.active.as_ref().filter(|a| !a.token.is_cancelled()) {
            match self.policy {
                OverlapPolicy::IgnoreWhileRunning => {
                    log::debug!("slide ignored; animation to {} still running", running.to);
                    return None;
                }
                OverlapPolicy::CancelAndRestart => running.token.cancel(),
            }
        }
        let token = CancelToken::new();
        self.active = Some(SlideAnimation {
            from: current_x,
            to: target,
            started_at: now,
            duration: self.duration,
            token: token.clone(),
        });
        Some(token)
    }

    pub fn cancel(&mut self) {
        if let Some(a) = self.active.take() {
            a.token.cancel();
        }
    }

    /// Offset to apply this frame, if an animation is live.
    pub fn tick(&mut self, now: f64) -> Option<f32> {
        let anim = self.active.as_ref()?;
        if anim.token.is_cancelled() {
            self.active = None;
            return None;
        }
        let (x, done) = anim.sample(now);
        if done {
            self.active = None;
        }
        Some(x)
    }
}
