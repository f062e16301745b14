/// Windowing dialog: enter a new window width / level pair
///
/// Width is asked first, then level, matching the order radiologists quote
/// them in ("WW 400 / WL 40").

use thiserror::Error;

use crate::data::source::Window;

#[derive(Error, Debug, PartialEq)]
pub enum WindowingError {
    #[error("{field} must be a number, got '{input}'")]
    InvalidNumber { field: &'static str, input: String },
    #[error("window width must be positive, got {0}")]
    NonPositiveWidth(f64),
}

/// Parse the two text fields into a window.
pub fn parse_window(width: &str, level: &str) -> Result<Window, WindowingError> {
    let parse = |field: &'static str, input: &str| -> Result<f64, WindowingError> {
        input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| WindowingError::InvalidNumber {
                field,
                input: input.to_string(),
            })
    };
    let width = parse("WW", width)?;
    let center = parse("WL", level)?;
    if width <= 0.0 {
        return Err(WindowingError::NonPositiveWidth(width));
    }
    Ok(Window { center, width })
}

#[derive(Debug, Clone, Default)]
pub struct WindowingDialogState {
    pub open: bool,
    pub width_text: String,
    pub level_text: String,
    pub error: Option<String>,
}

impl WindowingDialogState {
    /// Open pre-filled with the current window, if any
    pub fn open_with(&mut self, current: Option<Window>) {
        self.open = true;
        self.error = None;
        match current {
            Some(w) => {
                self.width_text = format!("{}", w.width);
                self.level_text = format!("{}", w.center);
            }
            None => {
                self.width_text.clear();
                self.level_text.clear();
            }
        }
    }
}

/// Actions from the windowing dialog
#[derive(Debug, Clone, PartialEq)]
pub enum WindowingAction {
    None,
    Apply(Window),
    Cancel,
}

pub fn show_windowing_dialog(ctx: &egui::Context, state: &mut WindowingDialogState) -> WindowingAction {
    let mut action = WindowingAction::None;

    if !state.open {
        return action;
    }

    let mut open = state.open;
    egui::Window::new("◐ Change Windowing Value")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("windowing_grid").num_columns(2).show(ui, |ui| {
                ui.label("Enter the WW:");
                ui.text_edit_singleline(&mut state.width_text);
                ui.end_row();
                ui.label("Enter the WL:");
                ui.text_edit_singleline(&mut state.level_text);
                ui.end_row();
            });

            if let Some(err) = &state.error {
                ui.colored_label(egui::Color32::from_rgb(0xD0, 0x30, 0x30), err);
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("✅ Apply").clicked() {
                    match parse_window(&state.width_text, &state.level_text) {
                        Ok(window) => action = WindowingAction::Apply(window),
                        Err(e) => state.error = Some(e.to_string()),
                    }
                }
                if ui.button("✖ Cancel").clicked() {
                    action = WindowingAction::Cancel;
                }
            });
        });

    state.open = open;
    if !open {
        action = WindowingAction::Cancel;
    }
    if action != WindowingAction::None {
        state.open = false;
    }

    action
}
