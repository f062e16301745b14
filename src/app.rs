use std::path::{Path, PathBuf};

use crate::data::session::{ImageSession, SaveReport, SidecarStatus, Tool};
use crate::gui::image_view::{self, ImageViewState, ViewEvent};
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction};
use crate::gui::windowing_dialog::{self, WindowingAction, WindowingDialogState};
use crate::view::viewport::ViewOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), severity: Severity::Info }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { text: text.into(), severity: Severity::Success }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { text: text.into(), severity: Severity::Warning }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), severity: Severity::Error }
    }
}

/// Status line describing how the current frame's annotations were loaded
pub fn sidecar_message(status: &SidecarStatus, sidecar: &Path) -> StatusMessage {
    match status {
        SidecarStatus::Loaded(n) => StatusMessage::success(format!(
            "Loaded {} annotation(s) from {}",
            n,
            sidecar.display()
        )),
        SidecarStatus::Missing => StatusMessage::info("No saved annotations for this frame"),
        SidecarStatus::Failed(reason) => {
            StatusMessage::warning(format!("Annotations not loaded: {}", reason))
        }
    }
}

/// Status line after a save; warns when an unreadable sidecar was moved
/// aside to make room.
pub fn save_message(report: &SaveReport, summary: &str) -> StatusMessage {
    match &report.backup {
        Some(backup) => StatusMessage::warning(format!(
            "Saved {} to {}; unreadable previous file kept as {}",
            summary,
            report.path.display(),
            backup.display()
        )),
        None => StatusMessage::success(format!("Saved {} to {}", summary, report.path.display())),
    }
}

/// Main application state
pub struct ViewerApp {
    session: Option<ImageSession>,
    /// Tool chosen in the toolbar; carried over to newly opened images
    tool: Tool,
    view_options: ViewOptions,

    image_view_state: ImageViewState,
    windowing_dialog_state: WindowingDialogState,

    status: StatusMessage,
    show_about: bool,

    current_theme: AppTheme,
    theme_colors: ThemeColors,

    dropped_files: Vec<PathBuf>,
    window_title: String,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> Self {
        let default_theme = AppTheme::ReadingRoom;
        theme::apply_theme(&cc.egui_ctx, default_theme);

        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(8.0, 5.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        cc.egui_ctx.set_style(style);

        let mut app = Self {
            session: None,
            tool: Tool::Line,
            view_options: ViewOptions::default(),
            image_view_state: ImageViewState::default(),
            windowing_dialog_state: WindowingDialogState::default(),
            status: StatusMessage::info("Ready, open a DICOM or image file to begin"),
            show_about: false,
            current_theme: default_theme,
            theme_colors: ThemeColors::from_theme(default_theme),
            dropped_files: Vec::new(),
            window_title: String::new(),
        };
        if let Some(path) = initial {
            app.load_path(&path);
        }
        app
    }

    /// Open an image, replacing the current one. On failure the previous
    /// image stays open.
    fn load_path(&mut self, path: &Path) {
        log::info!("Opening {}", path.display());
        match ImageSession::open(path, self.view_options) {
            Ok(mut session) => {
                session.select_tool(self.tool);
                let (w, h) = session.dimensions();
                log::info!(
                    "{}: {}x{}, {} frame(s), window {:?}",
                    session.file_name(),
                    w,
                    h,
                    session.frame_count(),
                    session.window()
                );
                self.status = sidecar_message(session.sidecar_status(), &session.sidecar_path());
                self.session = Some(session);
                self.image_view_state.clear();
            }
            Err(e) => {
                log::error!("Failed to open {}: {}", path.display(), e);
                self.status = StatusMessage::error(format!("Error loading {}: {}", path.display(), e));
            }
        }
    }

    fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
        if let Some(session) = self.session.as_mut() {
            if session.select_tool(tool) {
                self.status = StatusMessage::info("Drawing cancelled");
                return;
            }
        }
        self.status = StatusMessage::info(format!("Tool: {}", tool.label()));
    }

    fn save(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.status = StatusMessage::warning("No image loaded to save annotations for");
            return;
        };
        match session.save() {
            Ok(report) => {
                self.status = save_message(&report, &session.store().summary());
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.status = StatusMessage::error(format!("Save failed: {}", e));
            }
        }
    }

    fn save_as(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.status = StatusMessage::warning("No image loaded to save annotations for");
            return;
        };
        let default_name = format!("{}_frame{}.json", session.file_name(), session.frame());
        let Some(path) = toolbar::save_annotations_dialog(&default_name) else {
            return;
        };
        match session.save_as(&path) {
            Ok(()) => {
                self.status = StatusMessage::success(format!("Annotations saved as {}", path.display()));
            }
            Err(e) => {
                log::error!("Save As failed: {}", e);
                self.status = StatusMessage::error(format!("Save As failed: {}", e));
            }
        }
    }

    fn step_frame(&mut self, forward: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let current = session.frame();
        let target = if forward {
            current + 1
        } else if current == 0 {
            self.status = StatusMessage::info("Already at the first frame");
            return;
        } else {
            current - 1
        };
        match session.set_frame(target) {
            Ok(()) => {
                log::info!("Frame {} of {}", target + 1, session.frame_count());
                self.status = sidecar_message(session.sidecar_status(), &session.sidecar_path());
                self.image_view_state.invalidate();
            }
            Err(e) => {
                self.status = StatusMessage::info(e.to_string());
            }
        }
    }

    fn handle_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::OpenFile => {
                if let Some(path) = toolbar::open_file_dialog() {
                    self.load_path(&path);
                }
            }
            ToolbarAction::Save => self.save(),
            ToolbarAction::SaveAs => self.save_as(),
            ToolbarAction::Windowing => {
                if let Some(session) = &self.session {
                    if session.supports_windowing() {
                        self.windowing_dialog_state.open_with(session.window());
                    } else {
                        self.status = StatusMessage::warning(
                            "Windowing needs modality data; this image has none",
                        );
                    }
                }
            }
            ToolbarAction::SelectTool(tool) => self.select_tool(tool),
            ToolbarAction::Curve => {
                log::info!("Curve tool requested; not available");
                self.status = StatusMessage::warning("Curve tool is not available");
            }
            ToolbarAction::ZoomIn => {
                if let Some(session) = self.session.as_mut() {
                    session.view_mut().zoom_in();
                    self.status = StatusMessage::info(format!(
                        "Zoom {:.0}%",
                        session.view().zoom_level() * 100.0
                    ));
                }
            }
            ToolbarAction::ZoomOut => {
                if let Some(session) = self.session.as_mut() {
                    session.view_mut().zoom_out();
                    self.status = StatusMessage::info(format!(
                        "Zoom {:.0}%",
                        session.view().zoom_level() * 100.0
                    ));
                }
            }
            ToolbarAction::ZoomReset => {
                if let Some(session) = self.session.as_mut() {
                    session.view_mut().reset();
                    self.status = StatusMessage::info("Zoom reset");
                }
            }
            ToolbarAction::PrevFrame => self.step_frame(false),
            ToolbarAction::NextFrame => self.step_frame(true),
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
            }
            ToolbarAction::ShowAbout => {
                self.show_about = true;
            }
            ToolbarAction::None => {}
        }
    }

    fn handle_windowing_action(&mut self, action: WindowingAction) {
        match action {
            WindowingAction::Apply(window) => {
                if let Some(session) = self.session.as_mut() {
                    if session.apply_windowing(window) {
                        self.image_view_state.invalidate();
                        self.status = StatusMessage::info(format!("Windowing applied, {}", window));
                    } else {
                        self.status = StatusMessage::warning(
                            "Windowing needs modality data; this image has none",
                        );
                    }
                }
            }
            WindowingAction::Cancel | WindowingAction::None => {}
        }
    }

    fn handle_view_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Committed(kind) => {
                self.status = StatusMessage::info(format!("Added {}", kind));
            }
            ViewEvent::Dropped(kind) => {
                self.status = StatusMessage::warning(format!("{} too small, not added", kind));
            }
            ViewEvent::RenderFailed(reason) => {
                self.status = StatusMessage::error(format!("Cannot display frame: {}", reason));
            }
            ViewEvent::None => {}
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        let tc = &self.theme_colors;
        let message_color = match self.status.severity {
            Severity::Info => tc.status_text,
            Severity::Success => tc.success,
            Severity::Warning => tc.warning,
            Severity::Error => tc.error,
        };

        egui::TopBottomPanel::bottom("status_bar")
            .frame(egui::Frame::new()
                .fill(tc.status_bar_bg)
                .inner_margin(egui::Margin::symmetric(12, 4)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(format!("✏ {}", self.tool.label()))
                            .size(11.5)
                            .strong()
                            .color(tc.accent),
                    );
                    ui.separator();
                    ui.label(
                        egui::RichText::new(&self.status.text)
                            .size(11.5)
                            .color(message_color),
                    );

                    let Some(session) = &self.session else {
                        return;
                    };
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if session.is_dirty() {
                            ui.label(egui::RichText::new("● unsaved").size(11.0).color(tc.warning));
                            ui.separator();
                        }
                        if let Some(window) = session.window() {
                            ui.label(egui::RichText::new(window.to_string()).size(11.0).color(tc.status_text));
                            ui.separator();
                        }
                        ui.label(
                            egui::RichText::new(format!(
                                "Zoom {:.0}%",
                                session.view().zoom_level() * 100.0
                            ))
                            .size(11.0)
                            .color(tc.status_text),
                        );
                        ui.separator();
                        ui.label(
                            egui::RichText::new(format!(
                                "Frame {}/{}",
                                session.frame() + 1,
                                session.frame_count()
                            ))
                            .size(11.0)
                            .color(tc.status_text),
                        );
                        ui.separator();
                        ui.label(
                            egui::RichText::new(session.describe())
                                .size(10.0)
                                .italics()
                                .color(tc.text_muted),
                        );
                    });
                });
            });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_theme(ctx, self.current_theme);

        // Handle drag-and-drop
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    self.dropped_files.push(path.clone());
                }
            }
        });
        if let Some(path) = self.dropped_files.pop() {
            self.dropped_files.clear();
            self.load_path(&path);
        }

        let title = match &self.session {
            Some(s) if s.is_dirty() => format!("DICOM Annotator: {} *", s.file_name()),
            Some(s) => format!("DICOM Annotator: {}", s.file_name()),
            None => "DICOM Annotator".to_string(),
        };
        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }

        // ── Toolbar ──
        let can_window = self.session.as_ref().is_some_and(|s| s.supports_windowing());
        let action = toolbar::show_toolbar(
            ctx,
            self.tool,
            self.session.is_some(),
            can_window,
            self.current_theme.label(),
        );
        self.handle_toolbar_action(action);

        // ── Windowing Dialog ──
        let windowing_action =
            windowing_dialog::show_windowing_dialog(ctx, &mut self.windowing_dialog_state);
        self.handle_windowing_action(windowing_action);

        // ── Status Bar ──
        self.show_status_bar(ctx);

        // ── Canvas ──
        let event = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(self.theme_colors.canvas_bg))
            .show(ctx, |ui| {
                image_view::show_image_view(
                    ui,
                    self.session.as_mut(),
                    &mut self.image_view_state,
                    &self.theme_colors,
                )
            })
            .inner;
        self.handle_view_event(event);

        // ── About Dialog ──
        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("🩻 DICOM Annotator");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("• Line, rectangle, circle and free-hand markup");
                    ui.label("• Per-frame annotation files next to the image");
                    ui.label("• Window width / level adjustment");
                    ui.label("• Zoom and pan");
                });
        }

        // Handle keyboard shortcuts
        let (open, save, cancel, prev, next) = ctx.input(|i| {
            let cmd = i.modifiers.ctrl || i.modifiers.command;
            (
                cmd && i.key_pressed(egui::Key::O),
                cmd && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::PageUp),
                i.key_pressed(egui::Key::PageDown),
            )
        });
        if open {
            self.handle_toolbar_action(ToolbarAction::OpenFile);
        }
        if save {
            self.save();
        }
        if cancel {
            if let Some(session) = self.session.as_mut() {
                if session.cancel_gesture() {
                    self.status = StatusMessage::info("Drawing cancelled");
                }
            }
        }
        if prev {
            self.step_frame(false);
        }
        if next {
            self.step_frame(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_message_severity() {
        let path = Path::new("/data/scan/0.txt");
        let loaded = sidecar_message(&SidecarStatus::Loaded(3), path);
        assert_eq!(loaded.severity, Severity::Success);
        assert!(loaded.text.contains("3 annotation"));
        assert!(loaded.text.contains("0.txt"));

        assert_eq!(sidecar_message(&SidecarStatus::Missing, path).severity, Severity::Info);

        let failed = sidecar_message(&SidecarStatus::Failed("bad json".to_string()), path);
        assert_eq!(failed.severity, Severity::Warning);
        assert!(failed.text.contains("bad json"));
    }

    #[test]
    fn test_save_message_mentions_backup() {
        let plain = SaveReport {
            path: PathBuf::from("/data/scan/0.txt"),
            backup: None,
        };
        assert_eq!(save_message(&plain, "1 line").severity, Severity::Success);

        let backed_up = SaveReport {
            path: PathBuf::from("/data/scan/0.txt"),
            backup: Some(PathBuf::from("/data/scan/0.txt.corrupt")),
        };
        let msg = save_message(&backed_up, "1 line");
        assert_eq!(msg.severity, Severity::Warning);
        assert!(msg.text.contains("0.txt.corrupt"));
    }
}
