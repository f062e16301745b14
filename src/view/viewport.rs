/// View controller: visible image sub-rectangle, zoom and pan
///
/// The viewport is kept in image coordinates. Zooming scales it about its
/// center; panning translates it and is only accepted per axis while the
/// axis stays inside the image.

use crate::annotation::shape::Point;

/// Visible rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Viewport {
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            x_min: 0.0,
            x_max: width,
            y_min: 0.0,
            y_max: height,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) * 0.5,
            (self.y_min + self.y_max) * 0.5,
        )
    }

    /// Scale both extents by `factor` about the center.
    pub fn scaled(&self, factor: f64) -> Self {
        let c = self.center();
        let hw = self.width() * 0.5 * factor;
        let hh = self.height() * 0.5 * factor;
        Self {
            x_min: c.x - hw,
            x_max: c.x + hw,
            y_min: c.y - hh,
            y_max: c.y + hh,
        }
    }
}

/// User-tunable view behaviour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    /// Fraction the viewport shrinks/grows per zoom step
    pub zoom_step: f64,
    /// Keep zoomed viewports inside the image. Off by default: only panning
    /// is bounded.
    pub clamp_zoom: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            zoom_step: 0.1,
            clamp_zoom: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewController {
    viewport: Viewport,
    image_width: f64,
    image_height: f64,
    options: ViewOptions,
}

impl ViewController {
    pub fn new(image_width: f64, image_height: f64, options: ViewOptions) -> Self {
        Self {
            viewport: Viewport::full(image_width, image_height),
            image_width,
            image_height,
            options,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Ratio of the full image width to the visible width (1.0 = fit).
    pub fn zoom_level(&self) -> f64 {
        let w = self.viewport.width();
        if w <= 0.0 {
            return 1.0;
        }
        self.image_width / w
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(1.0 - self.options.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 + self.options.zoom_step);
    }

    pub fn reset(&mut self) {
        self.viewport = Viewport::full(self.image_width, self.image_height);
    }

    fn zoom_by(&mut self, factor: f64) {
        let mut next = self.viewport.scaled(factor);
        if self.options.clamp_zoom {
            next = self.clamp(next);
        }
        log::debug!(
            "Zoom x{:.2}: x [{:.1}, {:.1}] y [{:.1}, {:.1}]",
            factor,
            next.x_min,
            next.x_max,
            next.y_min,
            next.y_max
        );
        self.viewport = next;
    }

    /// Fit `vp` inside the image: shift it back in bounds, and shrink it to
    /// the image extent on axes where it is larger than the image.
    fn clamp(&self, vp: Viewport) -> Viewport {
        fn clamp_axis(min: f64, max: f64, limit: f64) -> (f64, f64) {
            let span = (max - min).min(limit);
            let lo = min.max(0.0).min(limit - span);
            (lo, lo + span)
        }
        let (x_min, x_max) = clamp_axis(vp.x_min, vp.x_max, self.image_width);
        let (y_min, y_max) = clamp_axis(vp.y_min, vp.y_max, self.image_height);
        Viewport {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Move the view with the pointer by `(dx, dy)` image units. Each axis is
    /// applied only if it stays within the image; returns which axes moved.
    pub fn pan(&mut self, dx: f64, dy: f64) -> (bool, bool) {
        let vp = self.viewport;
        let (nx_min, nx_max) = (vp.x_min - dx, vp.x_max - dx);
        let (ny_min, ny_max) = (vp.y_min - dy, vp.y_max - dy);

        let x_ok = nx_min >= 0.0 && nx_max <= self.image_width;
        let y_ok = ny_min >= 0.0 && ny_max <= self.image_height;

        if x_ok {
            self.viewport.x_min = nx_min;
            self.viewport.x_max = nx_max;
        }
        if y_ok {
            self.viewport.y_min = ny_min;
            self.viewport.y_max = ny_max;
        }
        (x_ok, y_ok)
    }
}

/// Axis-aligned rectangle in screen points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Maps between image coordinates and screen points for one frame.
///
/// Uses one uniform scale so circles stay round; the viewport is fitted
/// into the screen rectangle and centered on the leftover axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    viewport: Viewport,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl ViewTransform {
    pub fn new(viewport: Viewport, screen: ScreenRect) -> Self {
        let sx = if viewport.width() > 0.0 {
            screen.width / viewport.width()
        } else {
            1.0
        };
        let sy = if viewport.height() > 0.0 {
            screen.height / viewport.height()
        } else {
            1.0
        };
        let scale = sx.min(sy).max(f64::EPSILON);
        let offset_x = screen.left + (screen.width - viewport.width() * scale) * 0.5;
        let offset_y = screen.top + (screen.height - viewport.height() * scale) * 0.5;
        Self {
            viewport,
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Screen points per image pixel
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_screen(&self, p: Point) -> (f64, f64) {
        (
            self.offset_x + (p.x - self.viewport.x_min) * self.scale,
            self.offset_y + (p.y - self.viewport.y_min) * self.scale,
        )
    }

    pub fn to_image(&self, sx: f64, sy: f64) -> Point {
        Point::new(
            self.viewport.x_min + (sx - self.offset_x) / self.scale,
            self.viewport.y_min + (sy - self.offset_y) / self.scale,
        )
    }

    /// Convert a screen-space drag delta to image units
    pub fn delta_to_image(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.scale, dy / self.scale)
    }
}
