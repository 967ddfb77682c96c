//! Viewport geometry: where a zoomed, panned image sits inside its container.
//!
//! The same placement is used for on-screen preview, for [`fill_container`] and for
//! sampling, so what the user sees is exactly what gets exported.

use log::warn;
use serde::{Deserialize, Serialize};

/// Smallest zoom reachable through the zoom controls.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest zoom reachable through the zoom controls.
pub const MAX_ZOOM: f64 = 10.0;
pub const ZOOM_STEP: f64 = 0.1;
/// Extra zoom added by [`fill_container`] so rounding never leaves a gap at an edge.
pub const FILL_MARGIN: f64 = 0.07;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How an image is currently viewed inside a fixed-size container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub pan: Point,
    pub container: Size,
}

fn default_zoom() -> f64 {
    1.0
}

impl ViewportState {
    /// Unzoomed, centered view in `container`.
    pub fn new(container: Size) -> Self {
        Self { zoom: 1.0, pan: Point::default(), container }
    }

    /// A container the size of the image itself: the whole image, nothing else.
    pub fn for_bitmap(image: Size) -> Self {
        Self::new(image)
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_pan(mut self, x: f64, y: f64) -> Self {
        self.pan = Point::new(x, y);
        self
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Back to zoom 1, centered. Also what loading a new image does.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Point::default();
    }

    /// Zoom usable for drawing: anything non-finite or below [`MIN_ZOOM`] falls back
    /// to it. No upper clamp: [`fill_container`] zooms can exceed [`MAX_ZOOM`].
    pub fn effective_zoom(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom >= MIN_ZOOM {
            self.zoom
        } else {
            warn!("zoom {} out of range, using {}", self.zoom, MIN_ZOOM);
            MIN_ZOOM
        }
    }
}

/// Where the image lands, in container coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl VisibleRegion {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// True when the region leaves no gap anywhere inside `container`.
    pub fn covers(&self, container: Size, epsilon: f64) -> bool {
        self.left <= epsilon
            && self.top <= epsilon
            && self.right() >= container.width - epsilon
            && self.bottom() >= container.height - epsilon
    }
}

/// Contain-fit of `image` in `container`, before zoom.
fn contain(image: Size, container: Size) -> Size {
    let image_aspect = image.aspect();
    if image_aspect > container.aspect() {
        Size::new(container.width, container.width / image_aspect)
    } else {
        Size::new(container.height * image_aspect, container.height)
    }
}

/// Places `image` in the viewport's container: contain-fit, scale by zoom, center, pan.
pub fn compute_visible_region(image: Size, viewport: &ViewportState) -> VisibleRegion {
    let container = viewport.container;
    let fitted = contain(image, container);
    let zoom = viewport.effective_zoom();
    let width = fitted.width * zoom;
    let height = fitted.height * zoom;

    VisibleRegion {
        left: container.width / 2.0 - width / 2.0 + viewport.pan.x,
        top: container.height / 2.0 - height / 2.0 + viewport.pan.y,
        width,
        height,
    }
}

/// Zoom that makes the contain-fitted image cover `container` on both axes, plus
/// [`FILL_MARGIN`], with the pan reset.
pub fn fill_container(image: Size, container: Size) -> ViewportState {
    let image_aspect = image.aspect();
    let fill = if image_aspect > container.aspect() {
        // wider: fitted to width, grow until the height fills
        container.height / (container.width / image_aspect)
    } else {
        container.width / (container.height * image_aspect)
    };

    ViewportState::new(container).with_zoom(fill + FILL_MARGIN)
}

/// Pointer drag in progress. Tracks the offset between the pointer and the pan at
/// grab time so the image follows the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    origin: Point,
}

impl Drag {
    pub fn start(pointer: Point, pan: Point) -> Self {
        Self { origin: Point::new(pointer.x - pan.x, pointer.y - pan.y) }
    }

    /// Pan for the pointer's current position.
    pub fn pan_at(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.origin.x, pointer.y - self.origin.y)
    }
}
