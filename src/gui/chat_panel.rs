use eframe::egui::{self, Color32, RichText};

use crate::ai::ChatRole;
use crate::store::CanvasStore;

use super::UiAction;

pub fn show(ui: &mut egui::Ui, store: &CanvasStore, input: &mut String, actions: &mut Vec<UiAction>) {
    ui.heading("Plan");
    let chain = store.selected_chain();
    if chain.is_empty() {
        ui.small("Select a node on level 1 to start a path.");
    } else {
        for node in &chain {
            let label = store
                .levels()
                .iter()
                .find(|l| l.level == node.level)
                .map(|l| l.label.as_str())
                .unwrap_or("");
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(label).small().color(Color32::from_gray(150)));
                ui.label(&node.content);
            });
        }
    }
    let can_report = !chain.is_empty() && !store.is_loading();
    if ui.add_enabled(can_report, egui::Button::new("Write report")).clicked() {
        actions.push(UiAction::Report);
    }
    if let Some(report) = store.report() {
        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("report_scroll")
            .max_height(200.0)
            .show(ui, |ui| {
                ui.label(report);
            });
    }

    ui.separator();
    ui.heading("Chat");
    egui::ScrollArea::vertical()
        .id_salt("chat_scroll")
        .stick_to_bottom(true)
        .max_height((ui.available_height() - 60.0).max(80.0))
        .show(ui, |ui| {
            for msg in store.chat() {
                let (who, color) = match msg.role {
                    ChatRole::User => ("You", Color32::from_rgb(0x7b, 0xa3, 0xff)),
                    ChatRole::Model => ("AI", Color32::from_rgb(0xa3, 0xdb, 0x8b)),
                };
                ui.label(RichText::new(who).strong().color(color));
                ui.label(&msg.text);
                ui.add_space(4.0);
            }
        });

    ui.separator();
    ui.horizontal(|ui| {
        let resp = ui.add(egui::TextEdit::singleline(input).hint_text("Ask about your plan…").desired_width(ui.available_width() - 56.0));
        let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let send = ui.add_enabled(!store.is_loading(), egui::Button::new("Send")).clicked();
        if (enter || send) && !input.trim().is_empty() {
            actions.push(UiAction::SendChat(std::mem::take(input)));
        }
    });
}
