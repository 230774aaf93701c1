use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};
use eframe::egui::epaint::CubicBezierShape;

use crate::mindmap::model::{NodeId, Viewport};
use crate::store::CanvasStore;
use crate::viewport::layout::{NODE_SIZE, column_layout, node_rect};
use crate::viewport::transform::level_band;

use super::UiAction;
use super::node_view::{node_state, paint_node, visual_for};

// Per-view state that does not belong in the store
#[derive(Clone, Debug, Default)]
pub struct CanvasUiState {
    pub editing: Option<(NodeId, String)>,
    pub adding_child: Option<(NodeId, String)>,
    pub hover: Option<NodeId>,
}

fn abs(origin: Pos2, vp: &Viewport, canvas: Pos2) -> Pos2 {
    origin + vp.to_screen(canvas).to_vec2()
}

pub fn show(ui: &mut egui::Ui, store: &mut CanvasStore, state: &mut CanvasUiState, actions: &mut Vec<UiAction>) -> Rect {
    let available = ui.available_rect_before_wrap();
    let bg_resp = ui.allocate_rect(available, Sense::click_and_drag());
    let painter = ui.painter_at(available);
    painter.rect_filled(available, 0.0, Color32::from_gray(20));

    // Panning and zooming hand the viewport back to the user
    let mut vp = store.viewport();
    if bg_resp.dragged() {
        let delta = bg_resp.drag_delta();
        if delta != Vec2::ZERO {
            vp.pan_by(delta);
            store.set_viewport(vp);
            actions.push(UiAction::StopSlide);
        }
    }
    if bg_resp.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            if let Some(pointer) = ui.ctx().pointer_hover_pos() {
                let factor = (1.0 + scroll * 0.001).clamp(0.9, 1.1);
                vp.zoom_at(pointer - available.min.to_vec2(), factor);
                store.set_viewport(vp);
                actions.push(UiAction::StopSlide);
            }
        }
    }
    if bg_resp.clicked() {
        state.editing = None;
    }

    let vp = store.viewport();
    let origin = available.min;

    // Level bands
    for level in store.levels() {
        let band = level_band(level.level);
        let x0 = origin.x + band.screen_start(&vp);
        let x1 = origin.x + band.screen_end(&vp);
        if x1 < available.left() || x0 > available.right() {
            continue;
        }
        let tint = if level.level % 2 == 0 { Color32::from_gray(24) } else { Color32::from_gray(22) };
        painter.rect_filled(Rect::from_x_y_ranges(x0..=x1, available.y_range()), 0.0, tint);
        if level.is_active {
            painter.line_segment(
                [Pos2::new(x0, available.top()), Pos2::new(x1, available.top())],
                Stroke::new(2.0, Color32::from_rgb(0x7b, 0xa3, 0xff)),
            );
        }
    }

    let map = store.map();
    let positions = column_layout(map);

    // Edges: horizontal S-curves from parent right edge to child left edge
    let half = NODE_SIZE.x * 0.5;
    for edge in store.edges() {
        let (Some(a), Some(b)) = (positions.get(&edge.source), positions.get(&edge.target)) else { continue };
        let p0 = abs(origin, &vp, Pos2::new(a.x + half, a.y));
        let p3 = abs(origin, &vp, Pos2::new(b.x - half, b.y));
        let bend = (p3.x - p0.x) * 0.5;
        let p1 = Pos2::new(p0.x + bend, p0.y);
        let p2 = Pos2::new(p3.x - bend, p3.y);
        let highlighted = store.is_highlighted(edge.source) && store.is_highlighted(edge.target);
        let stroke = if highlighted {
            Stroke::new(2.0, Color32::from_rgb(0x7b, 0xa3, 0xff))
        } else {
            Stroke::new(1.2, Color32::from_gray(90))
        };
        painter.add(CubicBezierShape::from_points_stroke([p0, p1, p2, p3], false, Color32::TRANSPARENT, stroke));
    }

    // Nodes
    let mut hover = None;
    let mut clicked: Option<NodeId> = None;
    let mut double_clicked: Option<NodeId> = None;
    let mut menu: Vec<(NodeId, NodeMenu)> = Vec::new();
    let level_count = store.level_count() as u32;
    for node in store.nodes() {
        let Some(center) = positions.get(&node.id) else { continue };
        let min = abs(origin, &vp, node_rect(*center).min);
        let rect = Rect::from_min_size(min, NODE_SIZE * vp.zoom);
        if !rect.intersects(available) {
            continue;
        }
        let visual = visual_for(node.kind, node_state(node, node.is_selected));
        paint_node(&painter, rect, node, &visual, vp.zoom);

        let resp = ui.interact(rect, ui.id().with(("node", node.id)), Sense::click());
        if resp.hovered() {
            hover = Some(node.id);
        }
        if resp.double_clicked() {
            double_clicked = Some(node.id);
        } else if resp.clicked() && !node.is_original() {
            clicked = Some(node.id);
        }
        let can_generate = !node.is_generating && node.level < level_count;
        let id = node.id;
        let has_children = node.has_children;
        let expanded = node.is_expanded;
        resp.context_menu(|ui| {
            if ui.add_enabled(can_generate, egui::Button::new("Generate next level")).clicked() {
                menu.push((id, NodeMenu::Generate));
                ui.close();
            }
            if ui.add_enabled(can_generate && has_children, egui::Button::new("Regenerate children")).clicked() {
                menu.push((id, NodeMenu::Renew));
                ui.close();
            }
            if ui.add_enabled(node.level < level_count, egui::Button::new("Add child…")).clicked() {
                menu.push((id, NodeMenu::AddChild));
                ui.close();
            }
            if has_children {
                let label = if expanded { "Collapse" } else { "Expand" };
                if ui.button(label).clicked() {
                    menu.push((id, NodeMenu::ToggleExpand));
                    ui.close();
                }
            }
            if ui.button("Edit").clicked() {
                menu.push((id, NodeMenu::Edit));
                ui.close();
            }
            if !node.is_original() && ui.button("Delete").clicked() {
                menu.push((id, NodeMenu::Delete));
                ui.close();
            }
        });

        // Generate control to the right of a selected node with room below it
        if node.is_selected && node.level < level_count && !node.has_children {
            let c = Pos2::new(rect.right() + 18.0 * vp.zoom, rect.center().y);
            let r = Rect::from_center_size(c, Vec2::splat(22.0 * vp.zoom.max(0.6)));
            painter.line_segment([Pos2::new(rect.right(), c.y), Pos2::new(r.left(), c.y)], Stroke::new(1.0, Color32::from_gray(110)));
            let glyph = if node.is_generating { "…" } else { "+" };
            painter.circle_filled(c, r.width() * 0.5, Color32::from_rgb(0x32, 0x45, 0x6e));
            painter.text(c, Align2::CENTER_CENTER, glyph, FontId::proportional(14.0 * vp.zoom.max(0.6)), Color32::WHITE);
            let gen_resp = ui.interact(r, ui.id().with(("gen", node.id)), Sense::click());
            if gen_resp.clicked() && !node.is_generating {
                actions.push(UiAction::GenerateChildren(node.id));
            }
        }
    }
    state.hover = hover;

    if store.is_loading() {
        painter.text(
            Pos2::new(available.right() - 12.0, available.bottom() - 12.0),
            Align2::RIGHT_BOTTOM,
            "Generating…",
            FontId::proportional(13.0),
            Color32::from_gray(160),
        );
        ui.ctx().request_repaint_after(std::time::Duration::from_millis(100));
    }

    if let Some(id) = clicked {
        store.select_node(id);
    }
    if let Some(id) = double_clicked {
        if let Some(node) = store.node(id) {
            state.editing = Some((id, node.content.clone()));
        }
    }
    for (id, item) in menu {
        match item {
            NodeMenu::Generate => actions.push(UiAction::GenerateChildren(id)),
            NodeMenu::Renew => actions.push(UiAction::Renew(id)),
            NodeMenu::AddChild => state.adding_child = Some((id, String::new())),
            NodeMenu::ToggleExpand => {
                store.toggle_expanded(id);
            }
            NodeMenu::Edit => {
                if let Some(node) = store.node(id) {
                    state.editing = Some((id, node.content.clone()));
                }
            }
            NodeMenu::Delete => {
                let removed = store.delete_node(id);
                log::info!("deleted {} node(s)", removed.len());
            }
        }
    }

    show_inline_editor(ui, store, state, &positions, origin);
    show_add_child(ui.ctx(), store, state);
    available
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NodeMenu {
    Generate,
    Renew,
    AddChild,
    ToggleExpand,
    Edit,
    Delete,
}

fn show_inline_editor(
    ui: &mut egui::Ui,
    store: &mut CanvasStore,
    state: &mut CanvasUiState,
    positions: &std::collections::HashMap<NodeId, Pos2>,
    origin: Pos2,
) {
    let Some((id, text)) = state.editing.as_mut() else { return };
    let id = *id;
    let Some(center) = positions.get(&id) else {
        state.editing = None;
        return;
    };
    let vp = store.viewport();
    let min = abs(origin, &vp, node_rect(*center).min);
    let rect = Rect::from_min_size(min, NODE_SIZE * vp.zoom).shrink(4.0);
    let resp = ui.put(rect, egui::TextEdit::singleline(text));
    resp.request_focus();
    let (enter, escape) = ui.input(|i| (i.key_pressed(egui::Key::Enter), i.key_pressed(egui::Key::Escape)));
    if escape {
        state.editing = None;
    } else if enter || resp.lost_focus() {
        if !store.edit_node_content(id, text) {
            log::debug!("empty edit for {} ignored", id);
        }
        state.editing = None;
    }
}

fn show_add_child(ctx: &egui::Context, store: &mut CanvasStore, state: &mut CanvasUiState) {
    let Some((parent, text)) = state.adding_child.as_mut() else { return };
    let parent = *parent;
    let mut open = true;
    let mut done = false;
    egui::Window::new("Add child")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.text_edit_singleline(text);
            ui.horizontal(|ui| {
                if ui.button("Add").clicked() {
                    match store.add_child_node(parent, text) {
                        Ok(_) => done = true,
                        Err(e) => store.set_error(e),
                    }
                }
                if ui.button("Cancel").clicked() {
                    done = true;
                }
            });
        });
    if !open || done {
        state.adding_child = None;
    }
}
