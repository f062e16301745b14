/// Annotation renderer: committed + in-progress shapes to draw calls
///
/// Stateless: the whole overlay is rebuilt from the store on every frame.
/// Output is in screen points; the GUI layer only forwards the calls to
/// the painter.

use egui::Color32;

use super::gesture::Draft;
use super::shape::{Point, Shape};
use super::store::GeometryStore;
use crate::view::viewport::ViewTransform;

/// Stroke appearance for the annotation overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    /// Committed shapes
    pub highlight: Color32,
    /// Shape being drawn
    pub draft: Color32,
    /// Stroke width in screen points, independent of zoom
    pub stroke_width: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            highlight: Color32::from_rgb(0xFF, 0x00, 0x00),
            draft: Color32::from_rgb(0xFF, 0x00, 0x00),
            stroke_width: 1.5,
        }
    }
}

/// One unfilled primitive in screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Polyline {
        points: Vec<(f64, f64)>,
        color: Color32,
        width: f32,
    },
    Rectangle {
        min: (f64, f64),
        max: (f64, f64),
        color: Color32,
        width: f32,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        color: Color32,
        width: f32,
    },
}

fn shape_to_call(shape: &Shape, transform: &ViewTransform, color: Color32, width: f32) -> Option<DrawCall> {
    let project = |p: Point| transform.to_screen(p);
    match shape {
        Shape::Line(l) => Some(DrawCall::Polyline {
            points: vec![project(l.start), project(l.end)],
            color,
            width,
        }),
        Shape::Rectangle(r) => Some(DrawCall::Rectangle {
            min: project(r.min()),
            max: project(r.max()),
            color,
            width,
        }),
        Shape::Circle(c) => Some(DrawCall::Circle {
            center: project(c.center),
            radius: c.radius * transform.scale(),
            color,
            width,
        }),
        Shape::Freehand(f) if f.is_valid() => Some(DrawCall::Polyline {
            points: f.points.iter().map(|p| project(*p)).collect(),
            color,
            width,
        }),
        Shape::Freehand(_) => None,
    }
}

/// Build the full overlay: committed shapes grouped by kind, then the
/// in-progress shape on top.
pub fn render(
    store: &GeometryStore,
    draft: Option<&Draft>,
    transform: &ViewTransform,
    style: &AnnotationStyle,
) -> Vec<DrawCall> {
    let mut calls: Vec<DrawCall> = store
        .iter()
        .filter_map(|shape| shape_to_call(&shape, transform, style.highlight, style.stroke_width))
        .collect();

    if let Some(draft) = draft {
        if let Some(call) = shape_to_call(&draft.preview(), transform, style.draft, style.stroke_width) {
            calls.push(call);
        }
    }
    calls
}
