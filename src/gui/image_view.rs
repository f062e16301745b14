/// Image canvas: draws the current frame plus the annotation overlay and
/// routes pointer input to the active tool

use egui::{Color32, Pos2, Rect, Stroke};

use crate::annotation::gesture::{GestureOutcome, PointerButton, PointerEvent};
use crate::annotation::render::{self, DrawCall};
use crate::annotation::shape::{Point, ShapeKind};
use crate::data::session::{ImageSession, Tool};
use crate::gui::theme::ThemeColors;
use crate::view::viewport::{ScreenRect, ViewTransform};

/// Texture cache for the canvas
#[derive(Default)]
pub struct ImageViewState {
    texture: Option<egui::TextureHandle>,
    stale: bool,
    /// Last render failed; not retried until invalidated or cleared
    failed: bool,
}

impl ImageViewState {
    /// Force a re-render of the frame texture (new image, frame, or window).
    pub fn invalidate(&mut self) {
        self.stale = true;
        self.failed = false;
    }

    pub fn clear(&mut self) {
        self.texture = None;
        self.stale = false;
        self.failed = false;
    }

    fn needs_render(&self) -> bool {
        self.stale || (self.texture.is_none() && !self.failed)
    }

    fn record_failure(&mut self) {
        self.texture = None;
        self.stale = false;
        self.failed = true;
    }
}

/// Notable things that happened on the canvas this frame
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    None,
    Committed(ShapeKind),
    Dropped(ShapeKind),
    RenderFailed(String),
}

fn screen_rect(rect: Rect) -> ScreenRect {
    ScreenRect {
        left: rect.left() as f64,
        top: rect.top() as f64,
        width: rect.width() as f64,
        height: rect.height() as f64,
    }
}

fn pos((x, y): (f64, f64)) -> Pos2 {
    egui::pos2(x as f32, y as f32)
}

pub fn show_image_view(
    ui: &mut egui::Ui,
    session: Option<&mut ImageSession>,
    state: &mut ImageViewState,
    colors: &ThemeColors,
) -> ViewEvent {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
    let canvas = response.rect;
    painter.rect_filled(canvas, 0.0, colors.canvas_bg);

    let Some(session) = session else {
        painter.text(
            canvas.center(),
            egui::Align2::CENTER_CENTER,
            "Open a DICOM or image file to begin",
            egui::FontId::proportional(16.0),
            colors.text_muted,
        );
        return ViewEvent::None;
    };

    let tool = session.tool();
    let mut event = ViewEvent::None;

    if state.needs_render() {
        state.stale = false;
        match session.render() {
            Ok(gray) => {
                let size = [gray.width() as usize, gray.height() as usize];
                let image = egui::ColorImage::from_gray(size, gray.as_raw());
                state.texture = Some(ui.ctx().load_texture("frame", image, egui::TextureOptions::LINEAR));
            }
            Err(e) => {
                log::error!("Render error: {}", e);
                state.record_failure();
                event = ViewEvent::RenderFailed(e.to_string());
            }
        }
    }

    // Input first so the overlay below reflects this frame's events
    let transform = ViewTransform::new(session.view().viewport(), screen_rect(canvas));
    if let Some(outcome) = dispatch_pointer(ui, &response, session, tool, &transform) {
        match outcome {
            GestureOutcome::Committed(shape) => event = ViewEvent::Committed(shape.kind()),
            GestureOutcome::Dropped(kind) => event = ViewEvent::Dropped(kind),
            _ => {}
        }
    }

    let transform = ViewTransform::new(session.view().viewport(), screen_rect(canvas));

    if let Some(tex) = &state.texture {
        let (w, h) = session.dimensions();
        let min = pos(transform.to_screen(Point::new(0.0, 0.0)));
        let max = pos(transform.to_screen(Point::new(w as f64, h as f64)));
        painter.image(
            tex.id(),
            Rect::from_min_max(min, max),
            Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }

    let calls = render::render(
        session.store(),
        session.draft(),
        &transform,
        &colors.annotation_style(),
    );
    for call in calls {
        paint(&painter, call);
    }

    if response.hovered() {
        let icon = match tool {
            Tool::Pan => egui::CursorIcon::Grab,
            _ => egui::CursorIcon::Crosshair,
        };
        ui.ctx().set_cursor_icon(icon);
    }

    event
}

/// Single dispatch of this frame's pointer input, keyed by the active tool.
/// Middle-button drags pan regardless of tool.
fn dispatch_pointer(
    ui: &egui::Ui,
    response: &egui::Response,
    session: &mut ImageSession,
    tool: Tool,
    transform: &ViewTransform,
) -> Option<GestureOutcome> {
    let (pressed, released, middle_down, latest, origin, delta) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.middle_down(),
            i.pointer.latest_pos(),
            i.pointer.press_origin(),
            i.pointer.delta(),
        )
    });
    let to_image = |p: Pos2| transform.to_image(p.x as f64, p.y as f64);

    if middle_down && response.hovered() && delta != egui::Vec2::ZERO {
        let (dx, dy) = transform.delta_to_image(delta.x as f64, delta.y as f64);
        session.view_mut().pan(dx, dy);
    }

    let Some(draw_tool) = tool.draw_tool() else {
        if response.dragged_by(egui::PointerButton::Primary) {
            let d = response.drag_delta();
            let (dx, dy) = transform.delta_to_image(d.x as f64, d.y as f64);
            session.view_mut().pan(dx, dy);
        }
        return None;
    };

    let mut last = None;
    if pressed && response.hovered() {
        if let Some(p) = origin.or(latest) {
            last = Some(session.pointer(
                draw_tool,
                PointerEvent::Pressed {
                    pos: to_image(p),
                    button: PointerButton::Primary,
                },
            ));
        }
    }
    if session.is_drawing() {
        if let Some(p) = latest {
            if delta != egui::Vec2::ZERO {
                last = Some(session.pointer(draw_tool, PointerEvent::Moved { pos: to_image(p) }));
            }
            if released {
                last = Some(session.pointer(
                    draw_tool,
                    PointerEvent::Released {
                        pos: to_image(p),
                        button: PointerButton::Primary,
                    },
                ));
            }
        }
    }
    last
}

fn paint(painter: &egui::Painter, call: DrawCall) {
    match call {
        DrawCall::Polyline { points, color, width } => {
            let points: Vec<Pos2> = points.into_iter().map(pos).collect();
            painter.add(egui::Shape::line(points, Stroke::new(width, color)));
        }
        DrawCall::Rectangle { min, max, color, width } => {
            painter.rect_stroke(
                Rect::from_two_pos(pos(min), pos(max)),
                0.0,
                Stroke::new(width, color),
                egui::StrokeKind::Middle,
            );
        }
        DrawCall::Circle {
            center,
            radius,
            color,
            width,
        } => {
            painter.circle_stroke(pos(center), radius as f32, Stroke::new(width, color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_render_not_retried_until_invalidated() {
        let mut state = ImageViewState::default();
        assert!(state.needs_render());

        state.record_failure();
        assert!(!state.needs_render());
        assert!(!state.needs_render());

        state.invalidate();
        assert!(state.needs_render());

        state.record_failure();
        state.clear();
        assert!(state.needs_render());
    }
}
