/// Toolbar: menu bar plus a quick strip of annotation tools

use std::path::PathBuf;

use crate::data::session::Tool;

/// Actions that can be triggered from the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    OpenFile,
    Save,
    SaveAs,
    Windowing,
    SelectTool(Tool),
    Curve,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    PrevFrame,
    NextFrame,
    ThemeToggle,
    ShowAbout,
}

const TOOL_STRIP: [(Tool, &str); 5] = [
    (Tool::Line, "╱ Line"),
    (Tool::Circle, "◯ Circle"),
    (Tool::Rectangle, "▭ Rectangle"),
    (Tool::Freehand, "✏ Free Hand"),
    (Tool::Pan, "✋ Pan"),
];

/// Render the toolbar and return any triggered action
pub fn show_toolbar(
    ctx: &egui::Context,
    active_tool: Tool,
    has_image: bool,
    can_window: bool,
    theme_label: &str,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File menu
            ui.menu_button("📁 File", |ui| {
                if ui.button("📂 Open File…").clicked() {
                    action = ToolbarAction::OpenFile;
                    ui.close_menu();
                }
                ui.separator();
                if ui.add_enabled(has_image, egui::Button::new("💾 Save")).clicked() {
                    action = ToolbarAction::Save;
                    ui.close_menu();
                }
                if ui.add_enabled(has_image, egui::Button::new("💾 Save As…")).clicked() {
                    action = ToolbarAction::SaveAs;
                    ui.close_menu();
                }
            });

            // Image menu
            ui.menu_button("🖼 Image", |ui| {
                if ui.add_enabled(can_window, egui::Button::new("◐ Windowing…")).clicked() {
                    action = ToolbarAction::Windowing;
                    ui.close_menu();
                }
                ui.separator();
                if ui.add_enabled(has_image, egui::Button::new("⏮ Previous Frame")).clicked() {
                    action = ToolbarAction::PrevFrame;
                    ui.close_menu();
                }
                if ui.add_enabled(has_image, egui::Button::new("⏭ Next Frame")).clicked() {
                    action = ToolbarAction::NextFrame;
                    ui.close_menu();
                }
            });

            // Annotate menu
            ui.menu_button("✏️ Annotate", |ui| {
                for (tool, label) in TOOL_STRIP.iter().filter(|(t, _)| *t != Tool::Pan) {
                    if ui.button(*label).clicked() {
                        action = ToolbarAction::SelectTool(*tool);
                        ui.close_menu();
                    }
                }
                if ui.button("〰 Curve").clicked() {
                    action = ToolbarAction::Curve;
                    ui.close_menu();
                }
            });

            // View menu
            ui.menu_button("🔍 View", |ui| {
                if ui.button("🔍+ Zoom In").clicked() {
                    action = ToolbarAction::ZoomIn;
                    ui.close_menu();
                }
                if ui.button("🔍− Zoom Out").clicked() {
                    action = ToolbarAction::ZoomOut;
                    ui.close_menu();
                }
                if ui.button("🔄 Reset Zoom").clicked() {
                    action = ToolbarAction::ZoomReset;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(format!("🎨 Theme: {}", theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            // Help menu
            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });
        });

        // Quick tool strip
        ui.horizontal(|ui| {
            for (tool, label) in TOOL_STRIP {
                if ui.selectable_label(active_tool == tool, label).clicked() {
                    action = ToolbarAction::SelectTool(tool);
                }
            }
            ui.separator();
            if ui.button("🔍+").on_hover_text("Zoom In").clicked() {
                action = ToolbarAction::ZoomIn;
            }
            if ui.button("🔍−").on_hover_text("Zoom Out").clicked() {
                action = ToolbarAction::ZoomOut;
            }
            ui.separator();
            if ui
                .add_enabled(can_window, egui::Button::new("◐ Windowing"))
                .clicked()
            {
                action = ToolbarAction::Windowing;
            }
        });
    });

    action
}

/// Show file-open dialog for images
pub fn open_file_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Image")
        .add_filter("DICOM", &["dcm", "dicom"])
        .add_filter("Images", &["png", "jpg", "jpeg", "tif", "tiff", "bmp"])
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Show save dialog for exporting annotations to a chosen file
pub fn save_annotations_dialog(default_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save Annotations As")
        .set_file_name(default_name)
        .add_filter("JSON", &["json"])
        .add_filter("Text File", &["txt"])
        .save_file()
}
