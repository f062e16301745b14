/// Annotation geometry: the four committed shape kinds
///
/// All coordinates are floating point in image-pixel space (x to the right,
/// y downwards). Each shape serializes to the compact array form used by the
/// sidecar files, e.g. a line is `[x1, y1, x2, y2]`.

use serde::{Deserialize, Serialize};

/// A point in image coordinates. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Straight segment between two endpoints. Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl From<[f64; 4]> for Line {
    fn from(v: [f64; 4]) -> Self {
        Self {
            start: Point::new(v[0], v[1]),
            end: Point::new(v[2], v[3]),
        }
    }
}

impl From<Line> for [f64; 4] {
    fn from(l: Line) -> Self {
        [l.start.x, l.start.y, l.end.x, l.end.y]
    }
}

/// Axis-aligned rectangle: top-left origin plus non-negative size.
/// Serialized as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    /// Build from two opposite corners in any drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }
}

impl From<[f64; 4]> for Rectangle {
    fn from(v: [f64; 4]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            width: v[2],
            height: v[3],
        }
    }
}

impl From<Rectangle> for [f64; 4] {
    fn from(r: Rectangle) -> Self {
        [r.x, r.y, r.width, r.height]
    }
}

/// Circle by center and radius. Serialized as `[[cx, cy], r]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Point, f64)", into = "(Point, f64)")]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn is_valid(&self) -> bool {
        self.radius >= 0.0
    }
}

impl From<(Point, f64)> for Circle {
    fn from((center, radius): (Point, f64)) -> Self {
        Self { center, radius }
    }
}

impl From<Circle> for (Point, f64) {
    fn from(c: Circle) -> Self {
        (c.center, c.radius)
    }
}

/// Open polyline traced by the pointer. Serialized as `[[x, y], ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Freehand {
    pub points: Vec<Point>,
}

impl Freehand {
    /// A freehand path needs at least two points to be drawable.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }
}

/// Shape kinds, in the order they are stored and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
    Freehand,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Line,
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Freehand,
    ];

    /// Key used for this kind in the sidecar record
    pub fn key(&self) -> &'static str {
        match self {
            ShapeKind::Line => "line",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Freehand => "freehand",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A committed annotation of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line(Line),
    Rectangle(Rectangle),
    Circle(Circle),
    Freehand(Freehand),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Line(_) => ShapeKind::Line,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Freehand(_) => ShapeKind::Freehand,
        }
    }

    /// Non-negative rectangle extents and radius, at least two freehand
    /// points. NaN extents are invalid.
    pub fn is_valid(&self) -> bool {
        match self {
            Shape::Line(_) => true,
            Shape::Rectangle(r) => r.is_valid(),
            Shape::Circle(c) => c.is_valid(),
            Shape::Freehand(f) => f.is_valid(),
        }
    }
}
