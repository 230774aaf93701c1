use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32};

use crate::ai::client::GeminiClient;
use crate::ai::error::AiError;
use crate::persistence::export;
use crate::persistence::persist;
use crate::persistence::settings::AppSettings;
use crate::persistence::snapshot::{self, SnapshotFile};
use crate::store::actions::{self, GenerationOutcome, SharedStore, lock};
use crate::store::error::AppError;
use crate::store::{CanvasStore, DuplicatePolicy};
use crate::viewport::slide::{
    OverlapPolicy, SlideAnimator, SlideGeometry, centered_offset, slide_left_target, slide_right_target,
};

use super::UiAction;
use super::canvas_view::{self, CanvasUiState};
use super::chat_panel;
use super::level_bar::{self, LevelEditState};

const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);
const NOTICE_SECS: u64 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NoticeStyle {
    Prominent,
    Subtle,
}

pub struct AnyplanApp {
    store: SharedStore,
    runtime: tokio::runtime::Runtime,
    client: Option<Arc<GeminiClient>>,
    app_settings: AppSettings,
    // --no-autosave on the command line wins over the preference
    autosave_allowed: bool,
    animator: SlideAnimator,
    canvas: CanvasUiState,
    level_edit: LevelEditState,
    canvas_width: f32,
    topic_input: String,
    chat_input: String,
    // Autosave bookkeeping
    seen_revision: u64,
    saved_revision: u64,
    last_change: Instant,
    save_error: Option<String>,
    last_info: Option<String>,
    last_info_time: Option<Instant>,
    last_info_style: NoticeStyle,
    // Import / export window
    show_io_window: bool,
    io_title: String,
    io_path: String,
    io_status: Option<String>,
    // History window
    show_history: bool,
    versions: Vec<PathBuf>,
    // Preferences
    show_prefs_window: bool,
    prefs_edit: AppSettings,
    prefs_status: Option<String>,
    prefs_api_key: String,
    prefs_autosave_override_str: String,
    prefs_export_override_str: String,
}

fn build_client(settings: &AppSettings) -> Option<Arc<GeminiClient>> {
    let Some(config) = settings.ai.client_config() else {
        log::warn!("no API key configured; AI actions are disabled until one is set");
        return None;
    };
    match GeminiClient::new(config) {
        Ok(c) => Some(Arc::new(c)),
        Err(e) => {
            log::error!("could not create AI client: {}", e);
            None
        }
    }
}

impl AnyplanApp {
    pub fn new(
        runtime: tokio::runtime::Runtime,
        app_settings: AppSettings,
        initial: Option<SnapshotFile>,
        autosave_allowed: bool,
    ) -> Self {
        let mut store = CanvasStore::new()
            .with_policy(app_settings.duplicate_policy)
            .with_max_history(app_settings.max_history);
        if let Some(snap) = initial {
            store.import_snapshot(snap);
        }
        let revision = store.revision();
        let client = build_client(&app_settings);
        let animator = SlideAnimator::new(app_settings.slide_policy, app_settings.slide_secs);
        Self {
            store: actions::shared(store),
            runtime,
            client,
            app_settings,
            autosave_allowed,
            animator,
            canvas: CanvasUiState::default(),
            level_edit: LevelEditState::default(),
            canvas_width: 1000.0,
            topic_input: String::new(),
            chat_input: String::new(),
            seen_revision: revision,
            saved_revision: revision,
            last_change: Instant::now(),
            save_error: None,
            last_info: None,
            last_info_time: None,
            last_info_style: NoticeStyle::Prominent,
            show_io_window: false,
            io_title: String::new(),
            io_path: String::new(),
            io_status: None,
            show_history: false,
            versions: Vec::new(),
            show_prefs_window: false,
            prefs_edit: AppSettings::default(),
            prefs_status: None,
            prefs_api_key: String::new(),
            prefs_autosave_override_str: String::new(),
            prefs_export_override_str: String::new(),
        }
    }

    fn autosave_enabled(&self) -> bool {
        self.autosave_allowed && self.app_settings.autosave_enabled
    }

    fn notice(&mut self, msg: impl Into<String>, style: NoticeStyle) {
        self.last_info = Some(msg.into());
        self.last_info_time = Some(Instant::now());
        self.last_info_style = style;
    }

    fn save_now_with(&mut self, style: NoticeStyle) {
        let (state, revision) = {
            let s = lock(&self.store);
            (s.capture_snapshot(""), s.revision())
        };
        match persist::save_active(&self.app_settings.autosave_dir(), &state) {
            Ok(path) => {
                self.saved_revision = revision;
                self.save_error = None;
                self.notice(format!("Saved to {}", path.display()), style);
            }
            Err(e) => {
                log::error!("autosave failed: {:#}", e);
                self.save_error = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn save_versioned_now(&mut self) {
        let state = lock(&self.store).capture_snapshot("");
        match persist::save_versioned(&self.app_settings.autosave_dir(), &state) {
            Ok(path) => {
                self.save_error = None;
                self.notice(format!("Saved version {}", path.display()), NoticeStyle::Prominent);
            }
            Err(e) => self.save_error = Some(format!("Save version failed: {}", e)),
        }
    }

    fn autosave_tick(&mut self, ctx: &egui::Context) {
        let revision = lock(&self.store).revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.last_change = Instant::now();
        }
        if !self.autosave_enabled() || revision == self.saved_revision {
            return;
        }
        if self.last_change.elapsed() >= AUTOSAVE_DELAY {
            self.save_now_with(NoticeStyle::Subtle);
        } else {
            ctx.request_repaint_after(AUTOSAVE_DELAY);
        }
    }

    pub fn menu_new_map(&mut self) {
        let had_content = !lock(&self.store).nodes().is_empty();
        if had_content {
            self.save_versioned_now();
        }
        {
            let mut s = lock(&self.store);
            *s = CanvasStore::new()
                .with_policy(self.app_settings.duplicate_policy)
                .with_max_history(self.app_settings.max_history);
        }
        self.animator.cancel();
        self.canvas = CanvasUiState::default();
        self.topic_input.clear();
        self.notice(
            if had_content { "Started a new map (backup saved)" } else { "Started a new map" },
            NoticeStyle::Prominent,
        );
    }

    pub fn menu_reset_view(&mut self) {
        self.animator.cancel();
        lock(&self.store).set_viewport(Default::default());
    }

    fn menu_open_io(&mut self) {
        if self.io_title.is_empty() {
            self.io_title = lock(&self.store).topic().to_string();
        }
        self.io_status = None;
        self.show_io_window = true;
    }

    fn menu_open_history(&mut self) {
        self.versions = persist::list_versions(&self.app_settings.autosave_dir()).unwrap_or_default();
        self.show_history = true;
    }

    pub fn menu_open_prefs(&mut self) {
        self.prefs_edit = self.app_settings.clone();
        self.prefs_api_key = self.prefs_edit.ai.api_key.clone().unwrap_or_default();
        self.prefs_autosave_override_str = match &self.prefs_edit.autosave_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_export_override_str = match &self.prefs_edit.export_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_status = None;
        self.show_prefs_window = true;
    }

    fn export_json(&mut self) {
        let snap = lock(&self.store).export_snapshot(&self.io_title);
        let dir = if self.io_path.trim().is_empty() {
            self.app_settings.export_dir()
        } else {
            PathBuf::from(self.io_path.trim())
        };
        self.io_status = Some(match snapshot::write_snapshot(&dir, &snap) {
            Ok(path) => format!("Exported to {}", path.display()),
            Err(e) => {
                lock(&self.store).set_error(AppError::storage(format!("Export failed: {}", e)));
                format!("Export failed: {}", e)
            }
        });
    }

    fn export_csv(&mut self) {
        let name = snapshot::export_file_name(&self.io_title, time::OffsetDateTime::now_utc());
        let path = self.app_settings.export_dir().join(name).with_extension("csv");
        let result = export::export_outline_csv(&lock(&self.store), &path);
        self.io_status = Some(match result {
            Ok(path) => format!("Outline written to {}", path.display()),
            Err(e) => format!("Outline export failed: {}", e),
        });
    }

    fn import_json(&mut self) {
        let path = PathBuf::from(self.io_path.trim());
        match snapshot::read_snapshot(&path) {
            Ok((snap, warnings)) => {
                self.animator.cancel();
                lock(&self.store).import_snapshot(snap);
                let mut msg = format!("Imported {}", path.display());
                for w in warnings {
                    log::warn!("{}", w);
                    msg.push_str(&format!(" ({})", w));
                }
                self.io_status = Some(msg);
            }
            Err(e) => {
                let err = AppError::from(&e);
                self.io_status = Some(err.message.clone());
                lock(&self.store).set_error(err);
            }
        }
    }

    // Runs `job` on the runtime; without a client the store gets the key error
    fn spawn_ai<F, Fut>(&self, ctx: &egui::Context, job: F)
    where
        F: FnOnce(SharedStore, Arc<GeminiClient>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(client) = self.client.clone() else {
            lock(&self.store).set_error(AppError::from_ai(&AiError::MissingApiKey, None));
            return;
        };
        let fut = job(self.store.clone(), client);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            fut.await;
            ctx.request_repaint();
        });
    }

    fn start_slide(&mut self, ctx: &egui::Context, target: Option<f32>) {
        let Some(target) = target else { return };
        let now = ctx.input(|i| i.time);
        let current = lock(&self.store).viewport().x;
        if self.animator.start(current, target, now).is_some() {
            ctx.request_repaint();
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::GenerateInitial(topic) => {
                self.animator.cancel();
                self.spawn_ai(ctx, move |store, client| async move {
                    if let Ok(ids) = actions::generate_initial(&store, &*client, &topic).await {
                        log::info!("map started with {} node(s)", ids.len());
                    }
                });
            }
            UiAction::GenerateChildren(id) => {
                self.spawn_ai(ctx, move |store, client| async move {
                    match actions::generate_children(&store, &*client, id).await {
                        Ok(GenerationOutcome::Added(ids)) => log::info!("added {} child node(s)", ids.len()),
                        Ok(GenerationOutcome::Coalesced) => log::debug!("duplicate generation request skipped"),
                        Err(_) => {}
                    }
                });
            }
            UiAction::Renew(id) => {
                self.spawn_ai(ctx, move |store, client| async move {
                    let _ = actions::renew_node(&store, &*client, id).await;
                });
            }
            UiAction::SendChat(text) => {
                self.spawn_ai(ctx, move |store, client| async move {
                    let _ = actions::send_chat(&store, &*client, &text).await;
                });
            }
            UiAction::Report => {
                self.spawn_ai(ctx, move |store, client| async move {
                    let _ = actions::generate_report(&store, &*client).await;
                });
            }
            UiAction::SlideLeft | UiAction::SlideRight => {
                let (vp, level_count) = {
                    let s = lock(&self.store);
                    (s.viewport(), s.level_count() as u32)
                };
                let geom = SlideGeometry { container_width: self.canvas_width, level_count };
                let target = if action == UiAction::SlideRight {
                    slide_right_target(&vp, &geom)
                } else {
                    slide_left_target(&vp, &geom)
                };
                self.start_slide(ctx, target);
            }
            UiAction::FocusLevel(level) => {
                let zoom = lock(&self.store).viewport().zoom;
                self.start_slide(ctx, Some(centered_offset(level, zoom, self.canvas_width)));
            }
            UiAction::StopSlide => self.animator.cancel(),
        }
    }

    fn show_prefs(&mut self, ctx: &egui::Context) {
        if !self.show_prefs_window {
            return;
        }
        let mut open = true;
        let mut apply = false;
        egui::Window::new("Preferences")
            .open(&mut open)
            .resizable(true)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.heading("AI");
                ui.label("API key (leave empty to use ANYPLAN_API_KEY / GEMINI_API_KEY):");
                ui.add(egui::TextEdit::singleline(&mut self.prefs_api_key).password(true));
                ui.label("Model:");
                ui.text_edit_singleline(&mut self.prefs_edit.ai.model);
                ui.label("Endpoint base URL:");
                ui.text_edit_singleline(&mut self.prefs_edit.ai.base_url);
                ui.add(egui::Slider::new(&mut self.prefs_edit.ai.temperature, 0.0..=2.0).text("Temperature"));
                ui.add(egui::Slider::new(&mut self.prefs_edit.ai.max_output_tokens, 256..=8192).text("Max output tokens"));
                ui.add(egui::Slider::new(&mut self.prefs_edit.ai.timeout_secs, 5..=120).text("Timeout (s)"));
                ui.horizontal(|ui| {
                    ui.label("Repeated generate:");
                    ui.radio_value(&mut self.prefs_edit.duplicate_policy, DuplicatePolicy::Allow, "Run again");
                    ui.radio_value(&mut self.prefs_edit.duplicate_policy, DuplicatePolicy::Coalesce, "Ignore while running");
                });

                ui.separator();
                ui.heading("Canvas");
                ui.add(egui::Slider::new(&mut self.prefs_edit.slide_secs, 0.0..=2.0).text("Slide duration (s)"));
                ui.horizontal(|ui| {
                    ui.label("Slide while sliding:");
                    ui.radio_value(&mut self.prefs_edit.slide_policy, OverlapPolicy::CancelAndRestart, "Restart");
                    ui.radio_value(&mut self.prefs_edit.slide_policy, OverlapPolicy::IgnoreWhileRunning, "Ignore");
                });
                ui.add(egui::Slider::new(&mut self.prefs_edit.max_history, 1..=100).text("Snapshot history"));

                ui.separator();
                ui.heading("Files");
                ui.checkbox(&mut self.prefs_edit.autosave_enabled, "Autosave");
                ui.label("Autosave directory (leave empty for OS default):");
                ui.text_edit_singleline(&mut self.prefs_autosave_override_str);
                ui.label("Export directory (leave empty for OS temp):");
                ui.text_edit_singleline(&mut self.prefs_export_override_str);
                ui.label("Settings save directory:");
                ui.monospace(AppSettings::settings_dir().display().to_string());

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        apply = true;
                    }
                    if let Some(msg) = &self.prefs_status {
                        ui.small(msg.clone());
                    }
                });
            });
        if apply {
            self.apply_prefs();
        }
        if !open {
            self.show_prefs_window = false;
        }
    }

    fn apply_prefs(&mut self) {
        let key = self.prefs_api_key.trim();
        self.prefs_edit.ai.api_key = (!key.is_empty()).then(|| key.to_string());
        let parse_dir = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| PathBuf::from(s))
        };
        self.prefs_edit.autosave_override = parse_dir(&self.prefs_autosave_override_str);
        self.prefs_edit.export_override = parse_dir(&self.prefs_export_override_str);
        match self.prefs_edit.save() {
            Ok(()) => {
                self.app_settings = self.prefs_edit.clone();
                self.client = build_client(&self.app_settings);
                self.animator.policy = self.app_settings.slide_policy;
                self.animator.duration = self.app_settings.slide_secs;
                {
                    let mut s = lock(&self.store);
                    s.set_duplicate_policy(self.app_settings.duplicate_policy);
                    s.set_max_history(self.app_settings.max_history);
                }
                self.prefs_status = Some(if self.client.is_some() { "Saved".into() } else { "Saved (no API key)".into() });
            }
            Err(e) => self.prefs_status = Some(format!("Save failed: {}", e)),
        }
    }

    fn show_io(&mut self, ctx: &egui::Context) {
        if !self.show_io_window {
            return;
        }
        let mut open = true;
        let mut do_export = false;
        let mut do_csv = false;
        let mut do_import = false;
        egui::Window::new("Import / Export")
            .open(&mut open)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label("Title:");
                ui.text_edit_singleline(&mut self.io_title);
                ui.label("Path (export: directory, import: .json file):");
                ui.text_edit_singleline(&mut self.io_path);
                ui.small(format!("Default export directory: {}", self.app_settings.export_dir().display()));
                ui.horizontal(|ui| {
                    do_export = ui.button("Export JSON").clicked();
                    do_csv = ui.button("Export outline CSV").clicked();
                    do_import = ui.add_enabled(!self.io_path.trim().is_empty(), egui::Button::new("Import")).clicked();
                });
                if let Some(msg) = &self.io_status {
                    ui.separator();
                    ui.small(msg.clone());
                }
            });
        if do_export {
            self.export_json();
        }
        if do_csv {
            self.export_csv();
        }
        if do_import {
            self.import_json();
        }
        if !open {
            self.show_io_window = false;
        }
    }

    fn show_history_window(&mut self, ctx: &egui::Context) {
        if !self.show_history {
            return;
        }
        let mut open = true;
        let mut restore: Option<usize> = None;
        let mut load: Option<PathBuf> = None;
        let entries: Vec<(String, String)> = lock(&self.store)
            .history()
            .iter()
            .map(|h| {
                let at = h
                    .exported_at
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_default();
                (h.title.clone(), at)
            })
            .collect();
        egui::Window::new("History")
            .open(&mut open)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.heading("This session");
                if entries.is_empty() {
                    ui.small("Nothing yet. Exports and imports are recorded here.");
                }
                for (idx, (title, at)) in entries.iter().enumerate().rev() {
                    ui.horizontal(|ui| {
                        ui.label(if title.is_empty() { "(untitled)" } else { title.as_str() });
                        ui.small(at);
                        if ui.button("Restore").clicked() {
                            restore = Some(idx);
                        }
                    });
                }
                ui.separator();
                ui.heading("Saved versions");
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    for path in &self.versions {
                        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                        if ui.button(name).clicked() {
                            load = Some(path.clone());
                        }
                    }
                });
            });
        if let Some(idx) = restore {
            let mut s = lock(&self.store);
            if let Err(e) = s.restore_history(idx) {
                s.set_error(e);
            }
        }
        if let Some(path) = load {
            match persist::load_from_path(&path) {
                Ok(snap) => {
                    lock(&self.store).import_snapshot(snap);
                    self.notice(format!("Loaded {}", path.display()), NoticeStyle::Prominent);
                }
                Err(e) => self.save_error = Some(format!("Load failed: {}", e)),
            }
        }
        if !open {
            self.show_history = false;
        }
    }

    fn shortcut(ctx: &egui::Context, modifiers: egui::Modifiers, key: egui::Key) -> bool {
        ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(modifiers, key)))
    }
}

impl eframe::App for AnyplanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut pending: Vec<UiAction> = Vec::new();

        let now = ctx.input(|i| i.time);
        if let Some(x) = self.animator.tick(now) {
            lock(&self.store).set_viewport_x(x);
            ctx.request_repaint();
        }

        self.show_prefs(ctx);
        self.show_io(ctx);
        self.show_history_window(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            if Self::shortcut(ctx, egui::Modifiers::COMMAND, egui::Key::S) {
                self.save_now_with(NoticeStyle::Prominent);
            }
            if Self::shortcut(ctx, egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S) {
                self.save_versioned_now();
            }
            if Self::shortcut(ctx, egui::Modifiers::COMMAND, egui::Key::N) {
                self.menu_new_map();
            }
            if Self::shortcut(ctx, egui::Modifiers::COMMAND, egui::Key::E) {
                self.menu_open_io();
            }

            ui.horizontal(|ui| {
                ui.label("Anyplan");
                ui.menu_button("File", |ui| {
                    if ui.button("New Map").clicked() {
                        self.menu_new_map();
                        ui.close();
                    }
                    if ui.button("Save").clicked() {
                        self.save_now_with(NoticeStyle::Prominent);
                        ui.close();
                    }
                    if ui.button("Save Version").clicked() {
                        self.save_versioned_now();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Import / Export…").clicked() {
                        self.menu_open_io();
                        ui.close();
                    }
                    if ui.button("History…").clicked() {
                        self.menu_open_history();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Reset View").clicked() {
                        self.menu_reset_view();
                        ui.close();
                    }
                    if ui.button("Clear Selection").clicked() {
                        lock(&self.store).clear_selection();
                        ui.close();
                    }
                });
                ui.menu_button("Settings", |ui| {
                    if ui.button("Preferences…").clicked() {
                        self.menu_open_prefs();
                        ui.close();
                    }
                });

                {
                    let s = lock(&self.store);
                    ui.small(format!("N:{} L:{}", s.nodes().len(), s.level_count()));
                    if s.is_loading() {
                        ui.spinner();
                    }
                }
                if let Some(err) = &self.save_error {
                    ui.separator();
                    ui.colored_label(Color32::RED, err);
                }
                if let (Some(msg), Some(at)) = (&self.last_info, self.last_info_time) {
                    if at.elapsed() < Duration::from_secs(NOTICE_SECS) {
                        ui.separator();
                        match self.last_info_style {
                            NoticeStyle::Prominent => ui.label(msg),
                            NoticeStyle::Subtle => ui.small(msg),
                        };
                        ctx.request_repaint_after(Duration::from_millis(500));
                    }
                }
            });
        });

        // Current error with a dismiss button
        let error = lock(&self.store).error().cloned();
        if let Some(err) = error {
            egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(Color32::from_rgb(0xff, 0x8a, 0x80), &err.message);
                    if ui.small_button("Dismiss").clicked() {
                        lock(&self.store).clear_error();
                    }
                });
            });
        }

        egui::SidePanel::right("chat_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                let s = lock(&self.store);
                chat_panel::show(ui, &s, &mut self.chat_input, &mut pending);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let empty = lock(&self.store).nodes().is_empty();
                if empty {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.3);
                        ui.heading("What do you want to plan?");
                        ui.add_space(8.0);
                        let resp = ui.add(
                            egui::TextEdit::singleline(&mut self.topic_input)
                                .hint_text("e.g. Open a small coffee shop")
                                .desired_width(420.0),
                        );
                        let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        let loading = lock(&self.store).is_loading();
                        let go = ui.add_enabled(!loading, egui::Button::new("Explore")).clicked();
                        if loading {
                            ui.spinner();
                        }
                        if (enter || go) && !loading {
                            pending.push(UiAction::GenerateInitial(self.topic_input.trim().to_string()));
                        }
                    });
                    return;
                }
                let mut s = lock(&self.store);
                level_bar::show(ui, &mut s, self.canvas_width, &mut self.level_edit, &mut pending);
                let rect = canvas_view::show(ui, &mut s, &mut self.canvas, &mut pending);
                self.canvas_width = rect.width();
            });

        for action in pending {
            self.dispatch(ctx, action);
        }
        self.autosave_tick(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.autosave_enabled() && self.saved_revision != lock(&self.store).revision() {
            self.save_now_with(NoticeStyle::Subtle);
        }
    }
}
