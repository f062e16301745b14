/// Image session: everything tied to the currently open image
///
/// Owns the decoded source, the frame index, the geometry store for that
/// frame, the gesture tracker and the view. Opening another image or
/// switching frame replaces the store; nothing is ever merged.

use std::path::{Path, PathBuf};

use image::GrayImage;

use super::source::{self, DecodeError, ImageSource, Window};
use crate::annotation::gesture::{Draft, DrawTool, GestureOutcome, GestureTracker, PointerEvent};
use crate::annotation::sidecar::{self, SidecarError};
use crate::annotation::store::GeometryStore;
use crate::view::viewport::{ViewController, ViewOptions};

/// Active interaction mode of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Line,
    Rectangle,
    Circle,
    Freehand,
    Pan,
}

impl Tool {
    pub fn draw_tool(&self) -> Option<DrawTool> {
        match self {
            Tool::Line => Some(DrawTool::Line),
            Tool::Rectangle => Some(DrawTool::Rectangle),
            Tool::Circle => Some(DrawTool::Circle),
            Tool::Freehand => Some(DrawTool::Freehand),
            Tool::Pan => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Freehand => "Free Hand",
            Tool::Pan => "Pan",
        }
    }
}

/// What happened when the current frame's sidecar was read
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarStatus {
    Loaded(usize),
    Missing,
    /// Unreadable or malformed; the store was left empty.
    Failed(String),
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub path: PathBuf,
    /// Where an unreadable previous sidecar was moved to, if any
    pub backup: Option<PathBuf>,
}

pub struct ImageSession {
    path: PathBuf,
    source: Box<dyn ImageSource>,
    frame: u32,
    store: GeometryStore,
    tracker: GestureTracker,
    view: ViewController,
    window: Option<Window>,
    tool: Tool,
    dirty: bool,
    sidecar_status: SidecarStatus,
}

impl ImageSession {
    /// Decode `path` and load the annotations of frame 0.
    pub fn open(path: &Path, options: ViewOptions) -> Result<Self, DecodeError> {
        let source = source::open_source(path)?;
        Ok(Self::with_source(path, source, options))
    }

    pub fn with_source(path: &Path, source: Box<dyn ImageSource>, options: ViewOptions) -> Self {
        let (w, h) = source.dimensions();
        let window = source.default_window();
        let mut session = Self {
            path: path.to_path_buf(),
            source,
            frame: 0,
            store: GeometryStore::new(),
            tracker: GestureTracker::new(),
            view: ViewController::new(w as f64, h as f64, options),
            window,
            tool: Tool::Line,
            dirty: false,
            sidecar_status: SidecarStatus::Missing,
        };
        session.reload_annotations();
        session
    }

    /// Replace the store with the current frame's sidecar contents.
    fn reload_annotations(&mut self) {
        self.tracker.cancel();
        self.dirty = false;
        let path = self.sidecar_path();
        match sidecar::load(&path) {
            Ok(store) => {
                log::info!("Loaded {} from {}", store.summary(), path.display());
                self.sidecar_status = SidecarStatus::Loaded(store.len());
                self.store = store;
            }
            Err(e) if e.is_not_found() => {
                log::info!("No annotations yet for frame {} ({})", self.frame, path.display());
                self.sidecar_status = SidecarStatus::Missing;
                self.store = GeometryStore::new();
            }
            Err(e) => {
                log::warn!("Ignoring annotations: {}", e);
                self.sidecar_status = SidecarStatus::Failed(e.to_string());
                self.store = GeometryStore::new();
            }
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn frame_count(&self) -> u32 {
        self.source.frame_count()
    }

    pub fn sidecar_path(&self) -> PathBuf {
        sidecar::sidecar_path(&self.path, self.frame)
    }

    pub fn sidecar_status(&self) -> &SidecarStatus {
        &self.sidecar_status
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.tracker.draft()
    }

    pub fn is_drawing(&self) -> bool {
        self.tracker.is_drawing()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewController {
        &mut self.view
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    /// Feed one pointer event to the gesture tracker; commits land in the
    /// store.
    pub fn pointer(&mut self, tool: DrawTool, event: PointerEvent) -> GestureOutcome {
        let outcome = self.tracker.handle(tool, event);
        match &outcome {
            GestureOutcome::Committed(shape) => {
                log::debug!("Committed {:?}", shape);
                if self.store.push(shape.clone()) {
                    self.dirty = true;
                }
            }
            GestureOutcome::Dropped(kind) => {
                log::debug!("Dropped degenerate {} gesture", kind);
            }
            _ => {}
        }
        outcome
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Change the active tool. A gesture in progress is cancelled, never
    /// committed. Returns whether one was.
    pub fn select_tool(&mut self, tool: Tool) -> bool {
        if tool == self.tool {
            return false;
        }
        log::debug!("Tool: {} -> {}", self.tool.label(), tool.label());
        self.tool = tool;
        self.cancel_gesture()
    }

    /// Abandon the gesture in progress
    pub fn cancel_gesture(&mut self) -> bool {
        let cancelled = self.tracker.cancel();
        if cancelled {
            log::debug!("Gesture cancelled");
        }
        cancelled
    }

    /// Write the store to this frame's sidecar. A sidecar that failed to
    /// load is moved aside first instead of being overwritten.
    pub fn save(&mut self) -> Result<SaveReport, SidecarError> {
        let path = self.sidecar_path();
        let backup = match self.sidecar_status {
            SidecarStatus::Failed(_) if path.is_file() => Some(sidecar::backup(&path)?),
            _ => None,
        };
        sidecar::save(&self.store, &path)?;
        self.dirty = false;
        self.sidecar_status = SidecarStatus::Loaded(self.store.len());
        Ok(SaveReport { path, backup })
    }

    /// Write the store to an arbitrary file. The frame's sidecar is not
    /// touched and the unsaved marker is kept.
    pub fn save_as(&self, path: &Path) -> Result<(), SidecarError> {
        sidecar::save(&self.store, path)
    }

    /// Switch frame. The store is replaced by that frame's sidecar; unsaved
    /// changes of the old frame are discarded.
    pub fn set_frame(&mut self, frame: u32) -> Result<(), DecodeError> {
        let frames = self.frame_count();
        if frame >= frames {
            return Err(DecodeError::FrameOutOfRange { frame, frames });
        }
        if frame == self.frame {
            return Ok(());
        }
        if self.dirty {
            log::warn!("Discarding unsaved annotations of frame {}", self.frame);
        }
        self.frame = frame;
        self.reload_annotations();
        Ok(())
    }

    pub fn supports_windowing(&self) -> bool {
        self.source.supports_windowing()
    }

    /// Returns false, leaving the window unchanged, when the image has no
    /// modality data to window.
    pub fn apply_windowing(&mut self, window: Window) -> bool {
        if !self.supports_windowing() {
            log::warn!("{} does not support windowing", self.file_name());
            return false;
        }
        log::info!("Windowing set to {}", window);
        self.window = Some(window);
        true
    }

    /// Current frame rendered with the current window
    pub fn render(&self) -> Result<GrayImage, DecodeError> {
        self.source.render_frame(self.frame, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::gesture::PointerButton;
    use crate::annotation::shape::{Line, Point, ShapeKind};
    use crate::data::source::RasterSource;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Blank multi-frame source that records the last window it rendered with
    struct BlankSource {
        width: u32,
        height: u32,
        frames: u32,
        last_window: Rc<Cell<Option<(f64, f64)>>>,
    }

    impl BlankSource {
        fn boxed(width: u32, height: u32, frames: u32) -> Box<dyn ImageSource> {
            Box::new(Self {
                width,
                height,
                frames,
                last_window: Rc::new(Cell::new(None)),
            })
        }
    }

    impl ImageSource for BlankSource {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn frame_count(&self) -> u32 {
            self.frames
        }

        fn default_window(&self) -> Option<Window> {
            Some(Window {
                center: 40.0,
                width: 400.0,
            })
        }

        fn render_frame(&self, frame: u32, window: Option<Window>) -> Result<GrayImage, DecodeError> {
            if frame >= self.frames {
                return Err(DecodeError::FrameOutOfRange {
                    frame,
                    frames: self.frames,
                });
            }
            self.last_window.set(window.map(|w| (w.center, w.width)));
            Ok(GrayImage::new(self.width, self.height))
        }

        fn describe(&self) -> String {
            "Blank".to_string()
        }
    }

    fn draw_line(session: &mut ImageSession, from: (f64, f64), to: (f64, f64)) -> GestureOutcome {
        session.pointer(
            DrawTool::Line,
            PointerEvent::Pressed {
                pos: Point::new(from.0, from.1),
                button: PointerButton::Primary,
            },
        );
        session.pointer(DrawTool::Line, PointerEvent::Moved { pos: Point::new(to.0, to.1) });
        session.pointer(
            DrawTool::Line,
            PointerEvent::Released {
                pos: Point::new(to.0, to.1),
                button: PointerButton::Primary,
            },
        )
    }

    #[test]
    fn test_open_draw_save_reload_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("phantom.dcm");

        let mut session =
            ImageSession::with_source(&image_path, BlankSource::boxed(512, 512, 1), ViewOptions::default());
        assert_eq!(session.sidecar_status(), &SidecarStatus::Missing);
        for kind in ShapeKind::ALL {
            assert_eq!(session.store().count(kind), 0);
        }

        let outcome = draw_line(&mut session, (10.0, 10.0), (100.0, 100.0));
        assert!(matches!(outcome, GestureOutcome::Committed(_)));
        assert_eq!(session.store().line, vec![Line::from([10.0, 10.0, 100.0, 100.0])]);
        assert!(session.is_dirty());

        let saved = session.save().unwrap();
        assert_eq!(saved.path, dir.path().join("phantom").join("0.txt"));
        assert_eq!(saved.backup, None);
        let saved = saved.path;
        assert!(!session.is_dirty());

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "line": [[10.0, 10.0, 100.0, 100.0]],
                "rectangle": [],
                "circle": [],
                "freehand": []
            })
        );

        let reopened =
            ImageSession::with_source(&image_path, BlankSource::boxed(512, 512, 1), ViewOptions::default());
        assert_eq!(reopened.sidecar_status(), &SidecarStatus::Loaded(1));
        assert_eq!(reopened.store(), session.store());
    }

    #[test]
    fn test_frames_have_independent_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("cine.dcm");
        let mut session =
            ImageSession::with_source(&image_path, BlankSource::boxed(64, 64, 3), ViewOptions::default());

        draw_line(&mut session, (1.0, 1.0), (5.0, 5.0));
        session.save().unwrap();

        session.set_frame(2).unwrap();
        assert_eq!(session.frame(), 2);
        assert!(session.store().is_empty());
        draw_line(&mut session, (2.0, 2.0), (8.0, 8.0));
        draw_line(&mut session, (3.0, 3.0), (9.0, 9.0));
        session.save().unwrap();

        session.set_frame(0).unwrap();
        assert_eq!(session.store().line.len(), 1);
        session.set_frame(2).unwrap();
        assert_eq!(session.store().line.len(), 2);

        assert!(matches!(
            session.set_frame(3),
            Err(DecodeError::FrameOutOfRange { frame: 3, frames: 3 })
        ));
        assert_eq!(session.frame(), 2);
    }

    #[test]
    fn test_frame_switch_discards_unsaved_and_gesture() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("cine.dcm");
        let mut session =
            ImageSession::with_source(&image_path, BlankSource::boxed(64, 64, 2), ViewOptions::default());
        draw_line(&mut session, (1.0, 1.0), (5.0, 5.0));
        session.pointer(
            DrawTool::Circle,
            PointerEvent::Pressed {
                pos: Point::new(10.0, 10.0),
                button: PointerButton::Primary,
            },
        );
        assert!(session.is_drawing());

        session.set_frame(1).unwrap();
        session.set_frame(0).unwrap();
        assert!(session.store().is_empty());
        assert!(!session.is_drawing());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_corrupt_sidecar_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("scan.dcm");
        let sidecar = sidecar::sidecar_path(&image_path, 0);
        std::fs::create_dir_all(sidecar.parent().unwrap()).unwrap();
        std::fs::write(&sidecar, r#"{"line": []}"#).unwrap();

        let session =
            ImageSession::with_source(&image_path, BlankSource::boxed(16, 16, 1), ViewOptions::default());
        assert!(matches!(session.sidecar_status(), SidecarStatus::Failed(_)));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_save_over_corrupt_sidecar_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("scan.dcm");
        let sidecar = sidecar::sidecar_path(&image_path, 0);
        std::fs::create_dir_all(sidecar.parent().unwrap()).unwrap();
        std::fs::write(&sidecar, r#"{"line": []}"#).unwrap();

        let mut session =
            ImageSession::with_source(&image_path, BlankSource::boxed(16, 16, 1), ViewOptions::default());
        draw_line(&mut session, (1.0, 1.0), (5.0, 5.0));
        let report = session.save().unwrap();

        let backup = report.backup.unwrap();
        assert_eq!(backup, sidecar.with_file_name("0.txt.corrupt"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), r#"{"line": []}"#);
        assert_eq!(sidecar::load(&sidecar).unwrap().line.len(), 1);
        assert_eq!(session.sidecar_status(), &SidecarStatus::Loaded(1));

        // Second save writes in place and leaves the backup alone
        draw_line(&mut session, (2.0, 2.0), (6.0, 6.0));
        assert_eq!(session.save().unwrap().backup, None);
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), r#"{"line": []}"#);
    }

    #[test]
    fn test_cancel_gesture_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ImageSession::with_source(
            &dir.path().join("a.dcm"),
            BlankSource::boxed(16, 16, 1),
            ViewOptions::default(),
        );
        session.pointer(
            DrawTool::Rectangle,
            PointerEvent::Pressed {
                pos: Point::new(1.0, 1.0),
                button: PointerButton::Primary,
            },
        );
        session.pointer(DrawTool::Rectangle, PointerEvent::Moved { pos: Point::new(6.0, 6.0) });
        assert!(session.cancel_gesture());
        let outcome = session.pointer(
            DrawTool::Rectangle,
            PointerEvent::Released {
                pos: Point::new(6.0, 6.0),
                button: PointerButton::Primary,
            },
        );
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_tool_switch_cancels_gesture() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ImageSession::with_source(
            &dir.path().join("t.dcm"),
            BlankSource::boxed(16, 16, 1),
            ViewOptions::default(),
        );
        assert_eq!(session.tool(), Tool::Line);
        assert!(!session.select_tool(Tool::Line));

        session.pointer(
            DrawTool::Line,
            PointerEvent::Pressed {
                pos: Point::new(1.0, 1.0),
                button: PointerButton::Primary,
            },
        );
        session.pointer(DrawTool::Line, PointerEvent::Moved { pos: Point::new(9.0, 9.0) });
        assert!(session.select_tool(Tool::Circle));
        assert_eq!(session.tool(), Tool::Circle);
        assert!(!session.is_drawing());

        let outcome = session.pointer(
            DrawTool::Circle,
            PointerEvent::Released {
                pos: Point::new(9.0, 9.0),
                button: PointerButton::Primary,
            },
        );
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(session.store().is_empty());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_save_as_writes_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ImageSession::with_source(
            &dir.path().join("b.dcm"),
            BlankSource::boxed(16, 16, 1),
            ViewOptions::default(),
        );
        draw_line(&mut session, (0.0, 0.0), (3.0, 4.0));
        let target = dir.path().join("export").join("b-annotations.json");
        session.save_as(&target).unwrap();

        assert_eq!(sidecar::load(&target).unwrap(), *session.store());
        assert!(!session.sidecar_path().exists());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_windowing_passed_to_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let last = Rc::new(Cell::new(None));
        let source = Box::new(BlankSource {
            width: 8,
            height: 8,
            frames: 1,
            last_window: Rc::clone(&last),
        });
        let mut session = ImageSession::with_source(&dir.path().join("c.dcm"), source, ViewOptions::default());
        assert_eq!(session.window(), Some(Window { center: 40.0, width: 400.0 }));

        session.render().unwrap();
        assert_eq!(last.get(), Some((40.0, 400.0)));

        assert!(session.apply_windowing(Window {
            center: -600.0,
            width: 1500.0,
        }));
        session.render().unwrap();
        assert_eq!(last.get(), Some((-600.0, 1500.0)));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_windowing_refused_for_raster_images() {
        let dir = tempfile::tempdir().unwrap();
        let source = Box::new(RasterSource::from_image(GrayImage::new(8, 8)));
        let mut session = ImageSession::with_source(&dir.path().join("photo.png"), source, ViewOptions::default());
        assert!(!session.supports_windowing());

        let applied = session.apply_windowing(Window {
            center: 40.0,
            width: 400.0,
        });
        assert!(!applied);
        assert_eq!(session.window(), None);
    }
}
