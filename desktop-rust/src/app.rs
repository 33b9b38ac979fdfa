use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, RichText, Sense, Stroke, Vec2};
use thermal_inspect::commands::now;
use thermal_inspect::compare::latest_baseline;
use thermal_inspect::config::Config;
use thermal_inspect::{LoadOutcome, RegionSync, TrainingTask};
use thermal_inspect_common::edit::{
    BoxEditSession, CursorIcon, DRAW_STATUSES, DrawSession, DrawState, HANDLE_SIZE, Handle, PropertyEdit,
};
use thermal_inspect_common::layout::{Point, Rect, Size};
use thermal_inspect_common::overlay::{ShapeKind, Tint, list_rows};
use thermal_inspect_common::region::{ErrorRegion, RegionStatus};
use thermal_inspect_common::types::TrainRequest;
use thermal_inspect_common::viewer::Viewer;

use crate::io::{self, DecodedImage, DesktopBackend, LocalStore};
use crate::model::{AppState, Source};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

enum UiMessage {
    ImageDecoded { key: String, image: DecodedImage },
    RegionsLoaded { key: String, result: Result<LoadOutcome, String> },
    Saved { request: u64, result: Result<String, String> },
    TrainPair(Option<TrainRequest>),
    Failed(String),
}

/// An edit dialog whose save is in flight.
#[derive(Debug)]
enum Dialog {
    Draw(DrawSession),
    Box(usize, BoxEditSession),
    Props(usize, PropertyEdit),
}

/// Dialogs held until the backend answers, so a failed save can reopen them.
#[derive(Debug, Default)]
struct PendingSaves {
    next: u64,
    dialogs: HashMap<u64, Dialog>,
}

impl PendingSaves {
    fn hold(&mut self, dialog: Option<Dialog>) -> u64 {
        self.next += 1;
        if let Some(dialog) = dialog {
            self.dialogs.insert(self.next, dialog);
        }
        self.next
    }

    /// Returns the dialog to reopen when the save failed.
    fn settle(&mut self, request: u64, ok: bool) -> Option<Dialog> {
        let dialog = self.dialogs.remove(&request);
        if ok { None } else { dialog }
    }

    fn clear(&mut self) {
        self.dialogs.clear();
    }
}

pub struct ViewerApp {
    state: AppState,
    runtime: tokio::runtime::Runtime,
    sync: Option<RegionSync<DesktopBackend>>,
    viewer: Viewer,
    texture: Option<egui::TextureHandle>,
    draw: Option<DrawSession>,
    box_edit: Option<(usize, BoxEditSession)>,
    props: Option<(usize, PropertyEdit)>,
    pending: PendingSaves,
    training: Option<TrainingTask>,
    image_id_input: String,
    transformer_input: String,
    status: String,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
}

impl ViewerApp {
    pub fn new(runtime: tokio::runtime::Runtime) -> Self {
        let config = Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config not readable, using defaults");
            Config::default()
        });
        let (tx, rx) = mpsc::channel();
        Self {
            state: AppState {
                acting_user: io::acting_user(&config),
                auto_train: config.auto_train,
                ..Default::default()
            },
            runtime,
            sync: None,
            viewer: Viewer::default(),
            texture: None,
            draw: None,
            box_edit: None,
            props: None,
            pending: PendingSaves::default(),
            training: None,
            image_id_input: String::new(),
            transformer_input: String::new(),
            status: String::new(),
            tx,
            rx,
        }
    }

    fn regions(&self) -> Vec<ErrorRegion> {
        match (&self.sync, self.state.image_key()) {
            (Some(sync), Some(key)) => sync.regions(&key),
            _ => Vec::new(),
        }
    }

    fn open_local(&mut self) {
        let Some(image) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        let regions_path = image.with_extension("regions.json");
        let store = match LocalStore::open(&regions_path) {
            Ok(store) => store,
            Err(err) => {
                self.status = format!("Load failed: {err:#}");
                return;
            }
        };
        let source = Source::Local {
            image: image.clone(),
            regions: store.path().map(PathBuf::from),
        };
        let key = source.image_key();
        self.start(source, DesktopBackend::Local(store));

        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let msg = match io::read_image(&image) {
                Ok(image) => UiMessage::ImageDecoded { key, image },
                Err(err) => UiMessage::Failed(format!("Load failed: {err:#}")),
            };
            let _ = tx.send(msg);
        });
    }

    fn open_remote(&mut self) {
        let image_id = self.image_id_input.trim().to_string();
        if image_id.is_empty() {
            self.status = "Enter an image id".to_string();
            return;
        }
        let api = match io::connect() {
            Ok(api) => api,
            Err(err) => {
                self.status = format!("Connect failed: {err:#}");
                return;
            }
        };
        let transformer_id = Some(self.transformer_input.trim().to_string()).filter(|t| !t.is_empty());
        let source = Source::Remote {
            image_id: image_id.clone(),
            transformer_id: transformer_id.clone(),
        };
        self.start(source, DesktopBackend::Remote(api.clone()));

        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let msg = match api.image_raw(&image_id).await {
                Ok(bytes) => match io::decode_image(&bytes) {
                    Ok(image) => UiMessage::ImageDecoded {
                        key: image_id.clone(),
                        image,
                    },
                    Err(err) => UiMessage::Failed(format!("Decode failed: {err:#}")),
                },
                Err(err) => UiMessage::Failed(format!("Image download failed: {err}")),
            };
            let _ = tx.send(msg);

            let Some(transformer_id) = transformer_id else {
                return;
            };
            let pair = match api.list_images(&transformer_id).await {
                Ok(images) => latest_baseline(&images).map(|baseline| TrainRequest {
                    transformer_id: transformer_id.clone(),
                    baseline_image_id: baseline.id.clone(),
                    maintenance_image_id: image_id.clone(),
                }),
                Err(err) => {
                    tracing::warn!(error = %err, "could not list transformer images");
                    None
                }
            };
            let _ = tx.send(UiMessage::TrainPair(pair));
        });
    }

    /// Ends the current session and opens a new one for `source`.
    fn start(&mut self, source: Source, backend: DesktopBackend) {
        self.finish_session();
        self.viewer.on_image_changed();
        self.texture = None;
        self.draw = None;
        self.box_edit = None;
        self.props = None;
        self.pending.clear();
        self.state.natural = None;
        self.state.selected = None;
        self.state.train_request = None;

        let sync = RegionSync::new(Arc::new(backend));
        let key = source.image_key();
        let tx = self.tx.clone();
        let loader = sync.clone();
        self.runtime.spawn(async move {
            let result = loader.load(&key).await.map_err(|e| e.to_string());
            let _ = tx.send(UiMessage::RegionsLoaded { key, result });
        });
        self.sync = Some(sync);
        self.status = format!("Opened {}", source.title());
        self.state.source = Some(source);
    }

    /// Closes the session; queues training when regions were edited.
    fn finish_session(&mut self) {
        let Some(sync) = self.sync.take() else {
            return;
        };
        let _guard = self.runtime.enter();
        if let Some(task) = sync.finish(self.state.auto_train, self.state.train_request.take()) {
            self.status = "Model training queued".to_string();
            self.training = Some(task);
        }
    }

    /// Runs a save on the runtime. `dialog` comes back if it fails.
    fn spawn_save<F, Fut>(&mut self, done: &'static str, dialog: Option<Dialog>, f: F)
    where
        F: FnOnce(RegionSync<DesktopBackend>, String) -> Fut,
        Fut: Future<Output = thermal_inspect::Result<()>> + Send + 'static,
    {
        let (Some(sync), Some(key)) = (self.sync.clone(), self.state.image_key()) else {
            return;
        };
        let request = self.pending.hold(dialog);
        let tx = self.tx.clone();
        let fut = f(sync, key);
        self.status = "Saving...".to_string();
        self.runtime.spawn(async move {
            let result = fut.await.map(|()| done.to_string()).map_err(|e| e.to_string());
            let _ = tx.send(UiMessage::Saved { request, result });
        });
    }

    fn reopen(&mut self, dialog: Dialog) {
        match dialog {
            Dialog::Draw(session) if self.draw.is_none() => self.draw = Some(session),
            Dialog::Box(pos, session) if self.box_edit.is_none() => self.box_edit = Some((pos, session)),
            Dialog::Props(pos, edit) if self.props.is_none() => self.props = Some((pos, edit)),
            other => tracing::debug!(dialog = ?other, "dialog already open, dropping failed edit"),
        }
    }

    fn train_now(&mut self) {
        let (Some(sync), Some(request)) = (&self.sync, self.state.train_request.clone()) else {
            return;
        };
        let _guard = self.runtime.enter();
        self.training = Some(sync.train(request));
        self.status = "Model training started".to_string();
    }

    fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::ImageDecoded { key, image } => {
                    if self.state.image_key().as_deref() != Some(key.as_str()) {
                        continue;
                    }
                    let color = egui::ColorImage::from_rgba_unmultiplied(image.size, &image.pixels);
                    self.texture = Some(ctx.load_texture(key, color, egui::TextureOptions::LINEAR));
                    self.state.natural = Some(image.natural);
                    self.viewer.on_image_decoded(image.natural);
                }
                UiMessage::RegionsLoaded { key, result } => match result {
                    Ok(LoadOutcome::Loaded(n)) => self.status = format!("{n} regions loaded"),
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(image = %key, error = %err, "region load failed");
                        self.status = format!("Failed to load regions: {err}");
                    }
                },
                UiMessage::Saved { request, result } => {
                    if let Some(dialog) = self.pending.settle(request, result.is_ok()) {
                        self.reopen(dialog);
                    }
                    self.status = match result {
                        Ok(message) => message,
                        Err(err) => format!("Save failed: {err}"),
                    }
                }
                UiMessage::TrainPair(pair) => {
                    if pair.is_none() {
                        self.status = "No baseline image found; training is unavailable".to_string();
                    }
                    self.state.train_request = pair;
                }
                UiMessage::Failed(message) => self.status = message,
            }
        }
    }

    fn show_viewer(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.viewer
            .on_resize(Size::new(rect.width() as f64, rect.height() as f64));
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(20));
        let origin = rect.min;
        let local = |p: Pos2| Point::new((p.x - origin.x) as f64, (p.y - origin.y) as f64);

        let (Some(texture), Some(image_rect)) = (&self.texture, self.viewer.image_rect()) else {
            let text = if self.state.source.is_some() {
                "Loading image..."
            } else {
                "Open an image or load one from the backend"
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(14.0),
                Color32::GRAY,
            );
            return;
        };
        painter.image(texture.id(), to_screen(origin, image_rect), full_uv(), Color32::WHITE);

        let regions = self.regions();
        for shape in self.viewer.viewport_shapes(&regions) {
            let [r, g, b] = shape.rgb;
            let color = Color32::from_rgb(r, g, b);
            let screen = to_screen(origin, shape.rect);
            let width = if self.state.selected == Some(shape.source) { 3.5 } else { 2.0 };
            match shape.kind {
                ShapeKind::Box => {
                    painter.rect_stroke(screen, 0.0, Stroke::new(width, color));
                }
                ShapeKind::Point => {
                    painter.circle_filled(screen.center(), screen.width() / 2.0, color);
                }
            }
            let badge = origin + Vec2::new(shape.badge.x as f32, shape.badge.y as f32);
            painter.circle_filled(badge, 9.0, color);
            painter.text(
                badge,
                Align2::CENTER_CENTER,
                shape.number.to_string(),
                FontId::proportional(11.0),
                Color32::BLACK,
            );
        }

        if let Some(pos) = response.hover_pos() {
            let dy = ui.input(|i| i.raw_scroll_delta.y);
            if dy != 0.0 {
                // egui scrolls positive upwards
                self.viewer.wheel(local(pos), -(dy as f64));
            }
        }
        if let Some(p) = response.interact_pointer_pos() {
            if response.drag_started() {
                self.viewer.begin_pan(local(p));
            } else if response.dragged() {
                self.viewer.pan_to(local(p));
            }
        }
        if response.drag_stopped() {
            self.viewer.end_pan();
        }
        if response.double_clicked() {
            self.viewer.reset_view();
        } else if response.clicked() {
            if let Some(p) = response.interact_pointer_pos() {
                self.state.selected = self.viewer.region_at(&regions, local(p));
            }
        }
        if self.viewer.zoom().is_panning() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }
    }

    fn show_regions(&mut self, ui: &mut egui::Ui) {
        ui.heading("Regions");
        let (Some(sync), Some(key)) = (self.sync.clone(), self.state.image_key()) else {
            ui.label("No image open.");
            return;
        };
        let anomaly = sync.with_store(|s| s.anomaly(&key));
        ui.label(format!("Load: {:?}  Anomaly: {}", sync.load_state(&key), anomaly.as_str()));
        if sync.has_unsaved_edits() {
            ui.label(RichText::new("Edited this session").color(Color32::from_rgb(246, 196, 69)));
        }
        ui.separator();

        let regions = sync.regions(&key);
        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - 140.0).max(80.0))
            .show(ui, |ui| {
                for row in list_rows(&regions) {
                    let number = row
                        .number
                        .map(|n| format!("#{n}"))
                        .unwrap_or_else(|| "-".to_string());
                    let mut text = format!("{number} {} {}", row.tag, row.coords);
                    if let Some(pct) = row.confidence_pct {
                        text.push_str(&format!(" {pct}%"));
                    }
                    if row.is_manual {
                        text.push_str(" manual");
                    }
                    let mut rich = RichText::new(text);
                    rich = if row.is_deleted {
                        rich.color(Color32::GRAY).strikethrough()
                    } else {
                        rich.color(tint_color(row.tint))
                    };
                    let selected = self.state.selected == Some(row.source);
                    if ui.selectable_label(selected, rich).clicked() && !row.is_deleted {
                        self.state.selected = Some(row.source);
                    }
                    if row.is_deleted {
                        ui.label(
                            RichText::new(format!("DELETED {}", row.deleted_at.as_deref().unwrap_or("")))
                                .small()
                                .color(Color32::GRAY),
                        );
                    }
                    if let Some(label) = &row.label {
                        ui.label(RichText::new(label).small());
                    }
                    if let Some(comment) = &row.comment {
                        ui.label(RichText::new(comment).small().italics());
                    }
                }
            });
        ui.separator();

        let natural = self.state.natural;
        let selected = self
            .state
            .selected
            .and_then(|pos| regions.get(pos).map(|r| (pos, r.clone())))
            .filter(|(_, r)| !r.is_deleted);

        ui.horizontal_wrapped(|ui| {
            if ui.add_enabled(natural.is_some(), egui::Button::new("Add Region")).clicked() {
                self.draw = natural.map(DrawSession::new);
            }
            let has_selection = selected.is_some();
            if ui.add_enabled(has_selection && natural.is_some(), egui::Button::new("Edit Box")).clicked() {
                if let (Some((pos, region)), Some(natural)) = (&selected, natural) {
                    match BoxEditSession::open(region, natural, Some(&self.state.acting_user)) {
                        Some(session) => self.box_edit = Some((*pos, session)),
                        None => self.status = "Region has no usable geometry".to_string(),
                    }
                }
            }
            if ui.add_enabled(has_selection, egui::Button::new("Edit Details")).clicked() {
                if let Some((pos, region)) = &selected {
                    self.props = Some((*pos, PropertyEdit::open(region, Some(&self.state.acting_user))));
                }
            }
            if ui.add_enabled(has_selection, egui::Button::new("Delete")).clicked() {
                if let Some((pos, _)) = selected.clone() {
                    self.state.selected = None;
                    self.spawn_save("Region deleted", None, move |sync, key| async move {
                        sync.delete(&key, pos, &now()).await
                    });
                }
            }
        });

        let training_busy = self
            .training
            .as_ref()
            .is_some_and(|t| !t.status().is_finished());
        let can_train = sync.has_unsaved_edits() && self.state.train_request.is_some() && !training_busy;
        if ui.add_enabled(can_train, egui::Button::new("Train Model")).clicked() {
            self.train_now();
        }
        if let Some(task) = &self.training {
            ui.label(format!("Training: {}", task.status().label()));
        }
    }

    fn show_draw_dialog(&mut self, ctx: &egui::Context) {
        let Some(mut session) = self.draw.take() else {
            return;
        };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        egui::Window::new("Add Region")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let layout = *session.layout();
                let (rect, response) = ui.allocate_exact_size(
                    Vec2::new(layout.render_w as f32, layout.render_h as f32),
                    Sense::drag(),
                );
                let painter = ui.painter_at(rect);
                if let Some(texture) = &self.texture {
                    painter.image(texture.id(), rect, full_uv(), Color32::WHITE);
                }
                let local = |p: Pos2| Point::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
                if response.drag_started() {
                    if let Some(p) = ui.input(|i| i.pointer.press_origin()) {
                        session.pointer_down(local(p));
                    }
                } else if response.dragged() {
                    if let Some(p) = response.interact_pointer_pos() {
                        session.pointer_move(local(p));
                    }
                }
                if response.drag_stopped() {
                    if let Some(p) = ui.input(|i| i.pointer.latest_pos()) {
                        session.pointer_up(local(p));
                    }
                }
                if response.hovered() {
                    ctx.set_cursor_icon(cursor_icon(session.cursor()));
                }
                if let Some(preview) = session.preview() {
                    let [r, g, b] = session.status.color_rgb();
                    painter.rect_stroke(
                        to_screen(rect.min, preview),
                        0.0,
                        Stroke::new(2.0, Color32::from_rgb(r, g, b)),
                    );
                }

                egui::ComboBox::from_label("Status")
                    .selected_text(session.status.label())
                    .show_ui(ui, |ui| {
                        for status in DRAW_STATUSES {
                            ui.selectable_value(&mut session.status, status, status.label());
                        }
                    });
                ui.horizontal(|ui| {
                    ui.label("Label");
                    ui.text_edit_singleline(&mut session.label);
                });
                ui.label("Comment");
                ui.text_edit_multiline(&mut session.comment);
                ui.horizontal(|ui| {
                    let drawn = matches!(session.state(), DrawState::Drawn { .. });
                    if ui.add_enabled(drawn, egui::Button::new("Save")).clicked() {
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if cancel || !open {
            session.discard();
            return;
        }
        if save {
            let retry = session.clone();
            match session.commit(&self.state.acting_user, &now()) {
                Ok(region) => {
                    let retry = Some(Dialog::Draw(retry));
                    self.spawn_save("Region added", retry, move |sync, key| async move {
                        sync.add(&key, region).await.map(|_| ())
                    });
                    return;
                }
                Err(err) => self.status = err.to_string(),
            }
        }
        self.draw = Some(session);
    }

    fn show_box_dialog(&mut self, ctx: &egui::Context) {
        let Some((pos, mut session)) = self.box_edit.take() else {
            return;
        };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        egui::Window::new("Edit Region")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let layout = *session.layout();
                let (rect, response) = ui.allocate_exact_size(
                    Vec2::new(layout.render_w as f32, layout.render_h as f32),
                    Sense::drag(),
                );
                let painter = ui.painter_at(rect);
                if let Some(texture) = &self.texture {
                    painter.image(texture.id(), rect, full_uv(), Color32::WHITE);
                }
                let local = |p: Pos2| Point::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
                if response.drag_started() {
                    if let Some(p) = ui.input(|i| i.pointer.press_origin()) {
                        session.pointer_down(local(p));
                    }
                } else if response.dragged() {
                    if let Some(p) = response.interact_pointer_pos() {
                        let icon = session.pointer_move(local(p));
                        ctx.set_cursor_icon(cursor_icon(icon));
                    }
                }
                if response.drag_stopped() {
                    session.pointer_up();
                }
                if let Some(p) = response.hover_pos() {
                    ctx.set_cursor_icon(cursor_icon(session.cursor_at(local(p))));
                }

                let [r, g, b] = session.status.color_rgb();
                let color = Color32::from_rgb(r, g, b);
                let canvas = session.canvas_rect();
                painter.rect_stroke(to_screen(rect.min, canvas), 0.0, Stroke::new(2.0, color));
                for handle in Handle::ALL {
                    let a = handle.anchor(&canvas);
                    let half = HANDLE_SIZE / 2.0;
                    let square = Rect::new(a.x - half, a.y - half, HANDLE_SIZE, HANDLE_SIZE);
                    painter.rect_filled(to_screen(rect.min, square), 0.0, Color32::WHITE);
                }

                let g = session.geometry();
                ui.label(format!(
                    "x {:.0}, y {:.0}, {:.0} × {:.0} px",
                    g.left(),
                    g.top(),
                    g.w,
                    g.h
                ));
                status_picker(ui, &mut session.status);
                ui.label("Comment");
                ui.text_edit_multiline(&mut session.comment);
                ui.horizontal(|ui| {
                    ui.label("User ID");
                    ui.text_edit_singleline(&mut session.user_id);
                });
                ui.horizontal(|ui| {
                    if ui.add_enabled(session.can_save(), egui::Button::new("Save")).clicked() {
                        save = true;
                    }
                    if ui.button("Reset").clicked() {
                        session.reset();
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if cancel || !open {
            return;
        }
        if save {
            match session.save(&now()) {
                Ok(region) => {
                    let retry = Some(Dialog::Box(pos, session));
                    self.spawn_save("Region updated", retry, move |sync, key| async move {
                        sync.update(&key, pos, region).await
                    });
                    return;
                }
                Err(err) => self.status = err.to_string(),
            }
        }
        self.box_edit = Some((pos, session));
    }

    fn show_property_dialog(&mut self, ctx: &egui::Context) {
        let Some((pos, mut edit)) = self.props.take() else {
            return;
        };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        egui::Window::new("Region Details")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                status_picker(ui, &mut edit.status);
                ui.horizontal(|ui| {
                    ui.label("Label");
                    ui.text_edit_singleline(&mut edit.label);
                });
                ui.label("Comment");
                ui.text_edit_multiline(&mut edit.comment);
                ui.horizontal(|ui| {
                    ui.label("User ID");
                    ui.text_edit_singleline(&mut edit.user_id);
                });
                ui.horizontal(|ui| {
                    if ui.add_enabled(edit.can_save(), egui::Button::new("Save")).clicked() {
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if cancel || !open {
            return;
        }
        if save {
            match edit.save(&now()) {
                Ok(region) => {
                    let retry = Some(Dialog::Props(pos, edit));
                    self.spawn_save("Region updated", retry, move |sync, key| async move {
                        sync.update(&key, pos, region).await
                    });
                    return;
                }
                Err(err) => self.status = err.to_string(),
            }
        }
        self.props = Some((pos, edit));
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages(ctx);
        if self.sync.is_some() || self.training.is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image").clicked() {
                        self.open_local();
                        ui.close_menu();
                    }
                    if ui.add_enabled(self.sync.is_some(), egui::Button::new("Close")).clicked() {
                        self.finish_session();
                        self.state.source = None;
                        self.texture = None;
                        self.viewer.on_image_changed();
                        ui.close_menu();
                    }
                });
                ui.separator();
                ui.label("Image ID");
                ui.add(egui::TextEdit::singleline(&mut self.image_id_input).desired_width(70.0));
                ui.label("Transformer");
                ui.add(egui::TextEdit::singleline(&mut self.transformer_input).desired_width(70.0));
                if ui.button("Load").clicked() {
                    self.open_remote();
                }
                ui.separator();
                if ui.add_enabled(self.viewer.can_zoom_out(), egui::Button::new("−")).clicked() {
                    self.viewer.zoom_out();
                }
                ui.label(format!("{}%", self.viewer.zoom().percent()));
                if ui.add_enabled(self.viewer.can_zoom_in(), egui::Button::new("+")).clicked() {
                    self.viewer.zoom_in();
                }
                if ui.add_enabled(self.viewer.is_ready(), egui::Button::new("Reset")).clicked() {
                    self.viewer.reset_view();
                }
                ui.separator();
                if let Some(source) = &self.state.source {
                    ui.label(RichText::new(source.title()).strong());
                }
                if !self.status.is_empty() {
                    ui.label(RichText::new(&self.status).color(Color32::from_gray(170)));
                }
            });
        });

        egui::SidePanel::right("regions")
            .resizable(true)
            .min_width(260.0)
            .show(ctx, |ui| self.show_regions(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.show_viewer(ui));

        self.show_draw_dialog(ctx);
        self.show_box_dialog(ctx);
        self.show_property_dialog(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.finish_session();
        if let Some(task) = self.training.take() {
            let status = self.runtime.block_on(task.wait());
            tracing::info!(status = %status.label(), "training finished");
        }
    }
}

fn status_picker(ui: &mut egui::Ui, status: &mut RegionStatus) {
    egui::ComboBox::from_label("Status")
        .selected_text(status.label())
        .show_ui(ui, |ui| {
            for s in RegionStatus::ALL {
                ui.selectable_value(status, s, s.label());
            }
        });
}

fn to_screen(origin: Pos2, r: Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + Vec2::new(r.x as f32, r.y as f32),
        Vec2::new(r.w as f32, r.h as f32),
    )
}

fn full_uv() -> egui::Rect {
    egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0))
}

fn tint_color(tint: Tint) -> Color32 {
    match tint {
        Tint::Red => Color32::from_rgb(255, 80, 80),
        Tint::Yellow => Color32::from_rgb(255, 220, 0),
    }
}

fn cursor_icon(icon: CursorIcon) -> egui::CursorIcon {
    match icon {
        CursorIcon::Default => egui::CursorIcon::Default,
        CursorIcon::Crosshair => egui::CursorIcon::Crosshair,
        CursorIcon::Move => egui::CursorIcon::Move,
        CursorIcon::Resize(Handle::Nw | Handle::Se) => egui::CursorIcon::ResizeNwSe,
        CursorIcon::Resize(Handle::Ne | Handle::Sw) => egui::CursorIcon::ResizeNeSw,
        CursorIcon::Resize(Handle::N | Handle::S) => egui::CursorIcon::ResizeVertical,
        CursorIcon::Resize(Handle::W | Handle::E) => egui::CursorIcon::ResizeHorizontal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_mapping() {
        assert_eq!(cursor_icon(CursorIcon::Resize(Handle::Se)), egui::CursorIcon::ResizeNwSe);
        assert_eq!(cursor_icon(CursorIcon::Resize(Handle::E)), egui::CursorIcon::ResizeHorizontal);
        assert_eq!(cursor_icon(CursorIcon::Crosshair), egui::CursorIcon::Crosshair);
    }

    fn box_session() -> BoxEditSession {
        let region = ErrorRegion::with_geometry(
            thermal_inspect_common::region::BoxGeometry::from_corner(100.0, 100.0, 50.0, 40.0),
            RegionStatus::Potential,
        );
        BoxEditSession::open(&region, Size::new(640.0, 480.0), Some("eng-01")).unwrap()
    }

    #[test]
    fn test_failed_save_returns_dialog() {
        let mut pending = PendingSaves::default();
        let mut session = box_session();
        session.nudge(12.0, 0.0);
        let moved = session.geometry();

        let request = pending.hold(Some(Dialog::Box(3, session)));
        match pending.settle(request, false) {
            Some(Dialog::Box(pos, session)) => {
                assert_eq!(pos, 3);
                assert_eq!(session.geometry(), moved);
            }
            other => panic!("expected box dialog back, got {other:?}"),
        }
        assert!(pending.settle(request, false).is_none());
    }

    #[test]
    fn test_successful_save_drops_dialog() {
        let mut pending = PendingSaves::default();
        let first = pending.hold(Some(Dialog::Box(0, box_session())));
        let second = pending.hold(None);
        assert_ne!(first, second);
        assert!(pending.settle(first, true).is_none());
        assert!(pending.settle(second, false).is_none());
        assert!(pending.dialogs.is_empty());
    }

    #[test]
    fn test_to_screen_offsets_origin() {
        let r = to_screen(Pos2::new(10.0, 20.0), Rect::new(5.0, 5.0, 30.0, 40.0));
        assert_eq!(r.min, Pos2::new(15.0, 25.0));
        assert_eq!(r.size(), Vec2::new(30.0, 40.0));
    }
}
