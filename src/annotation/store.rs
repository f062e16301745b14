/// Geometry store: committed annotations for one (image, frame) pair
///
/// Append-only during a session; replaced wholesale when a sidecar is
/// loaded or another image/frame is opened.

use serde::{Deserialize, Serialize};

use super::shape::{Circle, Freehand, Line, Rectangle, Shape, ShapeKind};

/// Per-kind ordered shape collections. The field names double as the
/// sidecar record keys, and all four are required when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryStore {
    pub line: Vec<Line>,
    pub rectangle: Vec<Rectangle>,
    pub circle: Vec<Circle>,
    pub freehand: Vec<Freehand>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed shape under its kind.
    ///
    /// Invalid shapes (see [`Shape::is_valid`]) are rejected and `false`
    /// is returned.
    pub fn push(&mut self, shape: Shape) -> bool {
        if !shape.is_valid() {
            return false;
        }
        match shape {
            Shape::Line(l) => self.line.push(l),
            Shape::Rectangle(r) => self.rectangle.push(r),
            Shape::Circle(c) => self.circle.push(c),
            Shape::Freehand(f) => self.freehand.push(f),
        }
        true
    }

    /// Check every stored shape, e.g. after deserializing. Names the first
    /// offending shape by kind and index.
    pub fn validate(&self) -> Result<(), String> {
        for kind in ShapeKind::ALL {
            let bad = match kind {
                ShapeKind::Line => None,
                ShapeKind::Rectangle => self.rectangle.iter().position(|r| !r.is_valid()),
                ShapeKind::Circle => self.circle.iter().position(|c| !c.is_valid()),
                ShapeKind::Freehand => self.freehand.iter().position(|f| !f.is_valid()),
            };
            if let Some(index) = bad {
                return Err(format!("invalid {} at index {}", kind, index));
            }
        }
        Ok(())
    }

    pub fn count(&self, kind: ShapeKind) -> usize {
        match kind {
            ShapeKind::Line => self.line.len(),
            ShapeKind::Rectangle => self.rectangle.len(),
            ShapeKind::Circle => self.circle.len(),
            ShapeKind::Freehand => self.freehand.len(),
        }
    }

    pub fn len(&self) -> usize {
        ShapeKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All shapes in render order: grouped by kind (line, rectangle,
    /// circle, freehand), insertion order within each group.
    pub fn iter(&self) -> impl Iterator<Item = Shape> + '_ {
        self.line
            .iter()
            .copied()
            .map(Shape::Line)
            .chain(self.rectangle.iter().copied().map(Shape::Rectangle))
            .chain(self.circle.iter().copied().map(Shape::Circle))
            .chain(self.freehand.iter().cloned().map(Shape::Freehand))
    }

    /// Short human-readable summary, e.g. "2 line, 1 circle"
    pub fn summary(&self) -> String {
        let parts: Vec<String> = ShapeKind::ALL
            .iter()
            .filter(|k| self.count(**k) > 0)
            .map(|k| format!("{} {}", self.count(*k), k))
            .collect();
        if parts.is_empty() {
            "no annotations".to_string()
        } else {
            parts.join(", ")
        }
    }
}
