/// Gesture tracker: turns pointer events into candidate shapes
///
/// One state machine shared by all drawing tools: `Idle → Drawing → Idle`.
/// The transition function [`advance`] is pure; [`GestureTracker`] only
/// holds the current state between events.

use super::shape::{Circle, Freehand, Line, Point, Rectangle, Shape, ShapeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input, already mapped into image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed { pos: Point, button: PointerButton },
    Moved { pos: Point },
    Released { pos: Point, button: PointerButton },
}

/// Tools that produce a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTool {
    Line,
    Rectangle,
    Circle,
    Freehand,
}

impl DrawTool {
    pub fn kind(&self) -> ShapeKind {
        match self {
            DrawTool::Line => ShapeKind::Line,
            DrawTool::Rectangle => ShapeKind::Rectangle,
            DrawTool::Circle => ShapeKind::Circle,
            DrawTool::Freehand => ShapeKind::Freehand,
        }
    }
}

/// The shape being drawn while the primary button is held
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Line { start: Point, end: Point },
    Rectangle { start: Point, end: Point },
    Circle { center: Point, radius: f64 },
    Freehand { points: Vec<Point> },
}

impl Draft {
    fn begin(tool: DrawTool, pos: Point) -> Self {
        match tool {
            DrawTool::Line => Draft::Line { start: pos, end: pos },
            DrawTool::Rectangle => Draft::Rectangle { start: pos, end: pos },
            DrawTool::Circle => Draft::Circle {
                center: pos,
                radius: 0.0,
            },
            DrawTool::Freehand => Draft::Freehand { points: vec![pos] },
        }
    }

    /// Apply one pointer position (move or release).
    fn update(&mut self, pos: Point) {
        match self {
            Draft::Line { end, .. } | Draft::Rectangle { end, .. } => *end = pos,
            Draft::Circle { center, radius } => *radius = center.distance_to(pos),
            Draft::Freehand { points } => points.push(pos),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Draft::Line { .. } => ShapeKind::Line,
            Draft::Rectangle { .. } => ShapeKind::Rectangle,
            Draft::Circle { .. } => ShapeKind::Circle,
            Draft::Freehand { .. } => ShapeKind::Freehand,
        }
    }

    /// Shape as it would look if committed now
    pub fn preview(&self) -> Shape {
        match self {
            Draft::Line { start, end } => Shape::Line(Line {
                start: *start,
                end: *end,
            }),
            Draft::Rectangle { start, end } => Shape::Rectangle(Rectangle::from_corners(*start, *end)),
            Draft::Circle { center, radius } => Shape::Circle(Circle {
                center: *center,
                radius: *radius,
            }),
            Draft::Freehand { points } => Shape::Freehand(Freehand {
                points: points.clone(),
            }),
        }
    }

    /// Final shape on release, or `None` when the gesture is degenerate
    /// (zero-radius circle, freehand with fewer than two points).
    fn finish(mut self, pos: Point) -> Option<Shape> {
        match &mut self {
            Draft::Freehand { points } => {
                if points.last() != Some(&pos) {
                    points.push(pos);
                }
            }
            other => other.update(pos),
        }
        match self.preview() {
            Shape::Circle(c) if c.radius <= 0.0 => None,
            Shape::Freehand(f) if !f.is_valid() => None,
            shape => Some(shape),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing(Draft),
}

impl GestureState {
    pub fn is_drawing(&self) -> bool {
        matches!(self, GestureState::Drawing(_))
    }
}

/// What a single event did to the gesture
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Ignored,
    Started,
    /// In-progress shape changed; redraw the overlay.
    Updated,
    Committed(Shape),
    /// Gesture ended without producing a valid shape.
    Dropped(ShapeKind),
}

/// Pure transition: current state + active tool + event → next state.
pub fn advance(state: GestureState, tool: DrawTool, event: PointerEvent) -> (GestureState, GestureOutcome) {
    match (state, event) {
        (
            GestureState::Idle,
            PointerEvent::Pressed {
                pos,
                button: PointerButton::Primary,
            },
        ) => (GestureState::Drawing(Draft::begin(tool, pos)), GestureOutcome::Started),
        (GestureState::Drawing(mut draft), PointerEvent::Moved { pos }) => {
            draft.update(pos);
            (GestureState::Drawing(draft), GestureOutcome::Updated)
        }
        (
            GestureState::Drawing(draft),
            PointerEvent::Released {
                pos,
                button: PointerButton::Primary,
            },
        ) => {
            let kind = draft.kind();
            let outcome = match draft.finish(pos) {
                Some(shape) => GestureOutcome::Committed(shape),
                None => GestureOutcome::Dropped(kind),
            };
            (GestureState::Idle, outcome)
        }
        (state, _) => (state, GestureOutcome::Ignored),
    }
}

/// Holds the gesture state between pointer events
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    state: GestureState,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, tool: DrawTool, event: PointerEvent) -> GestureOutcome {
        let state = std::mem::take(&mut self.state);
        let (next, outcome) = advance(state, tool, event);
        self.state = next;
        outcome
    }

    /// Abandon any gesture in progress. Returns true if one was discarded.
    pub fn cancel(&mut self) -> bool {
        let was_drawing = self.state.is_drawing();
        self.state = GestureState::Idle;
        was_drawing
    }

    pub fn is_drawing(&self) -> bool {
        self.state.is_drawing()
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            GestureState::Drawing(d) => Some(d),
            GestureState::Idle => None,
        }
    }
}
