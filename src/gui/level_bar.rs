use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, StrokeKind, Vec2};

use crate::mindmap::model::LevelNo;
use crate::store::CanvasStore;
use crate::viewport::level_bar::{LevelBarGeometry, insert_slot_x, layout_level_buttons, show_add_level_controls};
use crate::viewport::slide::{SlideGeometry, show_left_slide, show_right_slide};

use super::UiAction;

pub const BAR_HEIGHT: f32 = 34.0;
const SLIDE_BUTTON: Vec2 = Vec2::new(26.0, 26.0);

/// Inline editor for one level's label/description.
#[derive(Clone, Debug, Default)]
pub struct LevelEditState {
    pub level: Option<LevelNo>,
    pub label: String,
    pub description: String,
}

pub fn show(
    ui: &mut egui::Ui,
    store: &mut CanvasStore,
    canvas_width: f32,
    edit: &mut LevelEditState,
    actions: &mut Vec<UiAction>,
) {
    let (strip, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), BAR_HEIGHT), Sense::hover());
    let painter = ui.painter_at(strip);
    painter.rect_filled(strip, 0.0, Color32::from_gray(28));

    let viewport = store.viewport();
    let geom = LevelBarGeometry::new(canvas_width);
    let level_count = store.level_count() as u32;
    let active = store.active_level();

    for button in layout_level_buttons(level_count, &viewport, &geom) {
        let rect = Rect::from_min_size(
            egui::pos2(strip.left() + button.left, strip.top() + 4.0),
            Vec2::new(button.width, BAR_HEIGHT - 8.0),
        );
        let Some(level) = store.levels().iter().find(|l| l.level == button.level).cloned() else {
            continue;
        };
        let text = format!("{} · {}", level.label, level.node_count);
        let resp = ui
            .put(rect, egui::Button::new(egui::RichText::new(text).small()).selected(active == Some(level.level)))
            .on_hover_text(if level.description.is_empty() { level.label.clone() } else { level.description.clone() });
        if resp.clicked() {
            store.set_active_level(level.level);
            actions.push(UiAction::FocusLevel(level.level));
        }
        let can_delete = store.level_count() > 1;
        let can_add = show_add_level_controls(store.level_count(), store.nodes().len());
        resp.context_menu(|ui| {
            if ui.button("Rename…").clicked() {
                edit.level = Some(level.level);
                edit.label = level.label.clone();
                edit.description = level.description.clone();
                ui.close();
            }
            if ui.add_enabled(can_add, egui::Button::new("Insert level after")).clicked() {
                if let Err(e) = store.insert_level_after(level.level, format!("Level {}", level.level + 1), String::new()) {
                    log::warn!("insert level failed: {}", e);
                }
                ui.close();
            }
            if ui.add_enabled(can_delete, egui::Button::new("Delete level")).clicked() {
                if let Err(e) = store.delete_level(level.level) {
                    log::warn!("delete level failed: {}", e);
                }
                ui.close();
            }
        });
    }

    // "+" after the last level while there is room for another one
    if show_add_level_controls(store.level_count(), store.nodes().len()) {
        let x = strip.left() + insert_slot_x(level_count, &viewport, &geom) + geom.inset;
        if x > strip.left() && x + 24.0 < strip.right() {
            let rect = Rect::from_center_size(egui::pos2(x + 14.0, strip.center().y), Vec2::splat(22.0));
            if ui.put(rect, egui::Button::new("+")).on_hover_text("Add level").clicked() {
                let next = level_count + 1;
                if let Err(e) = store.insert_level_after(level_count, format!("Level {}", next), String::new()) {
                    log::warn!("add level failed: {}", e);
                }
            }
        }
    }

    let slide = SlideGeometry { container_width: canvas_width, level_count };
    if show_left_slide(&viewport, &slide) {
        let rect = Rect::from_center_size(egui::pos2(strip.left() + 16.0, strip.center().y), SLIDE_BUTTON);
        if slide_button(ui, rect, "◀").clicked() {
            actions.push(UiAction::SlideLeft);
        }
    }
    if show_right_slide(&viewport, &slide) {
        let rect = Rect::from_center_size(egui::pos2(strip.right() - 16.0, strip.center().y), SLIDE_BUTTON);
        if slide_button(ui, rect, "▶").clicked() {
            actions.push(UiAction::SlideRight);
        }
    }

    show_level_editor(ui.ctx(), store, edit);
}

fn slide_button(ui: &mut egui::Ui, rect: Rect, glyph: &str) -> egui::Response {
    let resp = ui.interact(rect, ui.id().with(("slide", glyph)), Sense::click());
    let fill = if resp.hovered() { Color32::from_gray(70) } else { Color32::from_gray(48) };
    let painter = ui.painter();
    painter.rect_filled(rect, 13.0, fill);
    painter.rect_stroke(rect, 13.0, Stroke::new(1.0, Color32::from_gray(90)), StrokeKind::Inside);
    painter.text(rect.center(), Align2::CENTER_CENTER, glyph, FontId::proportional(13.0), Color32::WHITE);
    resp
}

fn show_level_editor(ctx: &egui::Context, store: &mut CanvasStore, edit: &mut LevelEditState) {
    let Some(level) = edit.level else { return };
    let mut open = true;
    let mut done = false;
    egui::Window::new(format!("Level {}", level))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Label:");
            ui.text_edit_singleline(&mut edit.label);
            ui.label("Description:");
            ui.text_edit_multiline(&mut edit.description);
            ui.horizontal(|ui| {
                let valid = !edit.label.trim().is_empty();
                if ui.add_enabled(valid, egui::Button::new("Save")).clicked() {
                    store.edit_level(level, edit.label.trim().to_string(), edit.description.trim().to_string());
                    done = true;
                }
                if ui.button("Cancel").clicked() {
                    done = true;
                }
            });
        });
    if !open || done {
        *edit = LevelEditState::default();
    }
}
