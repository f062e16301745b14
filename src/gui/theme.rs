/// Theme system: switchable color themes for the viewer
///
/// Provides a Light and a Dark ("Reading Room") theme. Annotation strokes
/// stay red in both so they read the same on any image.

use crate::annotation::render::AnnotationStyle;

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    Light,
    ReadingRoom,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::ReadingRoom => "🌙 Reading Room",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::ReadingRoom,
            AppTheme::ReadingRoom => AppTheme::Light,
        }
    }
}

/// All colors a theme needs to provide
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Panels & backgrounds
    pub panel_fill: egui::Color32,
    pub window_fill: egui::Color32,
    pub canvas_bg: egui::Color32,

    // Widgets
    pub widget_inactive_bg: egui::Color32,
    pub widget_hovered_stroke: egui::Color32,
    pub widget_active_bg: egui::Color32,

    // Text
    pub text_primary: egui::Color32,
    pub text_muted: egui::Color32,

    // Status severities
    pub accent: egui::Color32,
    pub success: egui::Color32,
    pub warning: egui::Color32,
    pub error: egui::Color32,

    // Annotation overlay
    pub annotation: egui::Color32,
    pub annotation_draft: egui::Color32,

    // Status bar
    pub status_bar_bg: egui::Color32,
    pub status_text: egui::Color32,

    pub is_dark: bool,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::ReadingRoom => Self::reading_room(),
        }
    }

    fn light() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0xF7, 0xF7, 0xF8),
            window_fill: egui::Color32::from_rgb(0xFF, 0xFF, 0xFF),
            canvas_bg: egui::Color32::from_gray(40),

            widget_inactive_bg: egui::Color32::from_rgb(0xE3, 0xE5, 0xE8),
            widget_hovered_stroke: egui::Color32::from_rgb(0x5B, 0x9B, 0xD5),
            widget_active_bg: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),

            text_primary: egui::Color32::from_rgb(0x2A, 0x2E, 0x36),
            text_muted: egui::Color32::from_rgb(0x88, 0x8C, 0x94),

            accent: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),
            success: egui::Color32::from_rgb(0x27, 0x8B, 0x4A),
            warning: egui::Color32::from_rgb(0xB8, 0x8B, 0x00),
            error: egui::Color32::from_rgb(0xD0, 0x30, 0x30),

            annotation: egui::Color32::from_rgb(0xFF, 0x00, 0x00),
            annotation_draft: egui::Color32::from_rgb(0xFF, 0x60, 0x60),

            status_bar_bg: egui::Color32::from_rgb(0xF0, 0xF1, 0xF3),
            status_text: egui::Color32::from_rgb(0x44, 0x48, 0x52),

            is_dark: false,
        }
    }

    fn reading_room() -> Self {
        Self {
            // Near-black, low glare
            panel_fill: egui::Color32::from_rgb(0x14, 0x15, 0x18),
            window_fill: egui::Color32::from_rgb(0x1B, 0x1C, 0x20),
            canvas_bg: egui::Color32::BLACK,

            widget_inactive_bg: egui::Color32::from_rgb(0x26, 0x28, 0x2E),
            widget_hovered_stroke: egui::Color32::from_rgb(0x6A, 0xA8, 0xE0),
            widget_active_bg: egui::Color32::from_rgb(0x2F, 0x5F, 0x96),

            text_primary: egui::Color32::from_rgb(0xD8, 0xDA, 0xE0),
            text_muted: egui::Color32::from_rgb(0x78, 0x7C, 0x86),

            accent: egui::Color32::from_rgb(0x6A, 0xA8, 0xE0),
            success: egui::Color32::from_rgb(0x4C, 0xC0, 0x74),
            warning: egui::Color32::from_rgb(0xE0, 0xB8, 0x40),
            error: egui::Color32::from_rgb(0xFF, 0x55, 0x55),

            annotation: egui::Color32::from_rgb(0xFF, 0x00, 0x00),
            annotation_draft: egui::Color32::from_rgb(0xFF, 0x70, 0x70),

            status_bar_bg: egui::Color32::from_rgb(0x0E, 0x0F, 0x11),
            status_text: egui::Color32::from_rgb(0xA8, 0xAA, 0xB2),

            is_dark: true,
        }
    }

    /// Stroke settings for the annotation overlay
    pub fn annotation_style(&self) -> AnnotationStyle {
        AnnotationStyle {
            highlight: self.annotation,
            draft: self.annotation_draft,
            ..AnnotationStyle::default()
        }
    }
}

/// Apply a theme to the egui context
pub fn apply_theme(ctx: &egui::Context, theme: AppTheme) {
    let c = ThemeColors::from_theme(theme);

    let mut visuals = if c.is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel_fill;
    visuals.window_fill = c.window_fill;

    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, c.text_primary);
    visuals.widgets.inactive.bg_fill = c.widget_inactive_bg;
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, c.widget_hovered_stroke);
    visuals.widgets.active.bg_fill = c.widget_active_bg;

    visuals.selection.bg_fill = c.widget_active_bg;

    ctx.set_visuals(visuals);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_cycles() {
        assert_eq!(AppTheme::Light.next(), AppTheme::ReadingRoom);
        assert_eq!(AppTheme::ReadingRoom.next(), AppTheme::Light);
    }

    #[test]
    fn test_annotation_style_uses_theme_highlight() {
        let colors = ThemeColors::from_theme(AppTheme::ReadingRoom);
        let style = colors.annotation_style();
        assert_eq!(style.highlight, egui::Color32::from_rgb(0xFF, 0x00, 0x00));
        assert!(colors.is_dark);
    }
}
