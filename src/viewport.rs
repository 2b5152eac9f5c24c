//! Pan and zoom state of a trace view.
//!
//! [`Viewport`] is a plain value describing the visible window. A
//! [`ViewController`] pairs it with a ready [`TraceIndex`] and the host's
//! viewport dimensions, and every mutation hands back a [`PositionChanged`]
//! notification for the host to display.

use crate::trace::TraceIndex;
use std::fmt;

/// Drags shorter than this on either axis are treated as clicks
pub const MISCLICK_THRESHOLD: i32 = 10;

/// Fraction of the viewport moved by one arrow-key pan
const KEY_PAN_SPEED: f64 = 0.05;

/// Host-space coordinate, relative to the top-left corner of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        ScreenPoint { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub top_left: ScreenPoint,
    pub bottom_right: ScreenPoint,
}

impl ScreenRect {
    /// Rectangle spanned by two drag corners, in any order
    pub const fn new(a: ScreenPoint, b: ScreenPoint) -> Self {
        ScreenRect {
            top_left: a,
            bottom_right: b,
        }
    }

    pub fn normalized(self) -> Self {
        let (a, b) = (self.top_left, self.bottom_right);
        ScreenRect {
            top_left: ScreenPoint::new(a.x.min(b.x), a.y.min(b.y)),
            bottom_right: ScreenPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }
}

/// Visible window over display address and time, plus mark exaggeration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Display address at the left edge
    pub view_address: u64,
    /// Time at the top edge
    pub view_time: u64,
    /// Screen units per display byte
    pub address_zoom_factor: f64,
    /// Screen units per time tick
    pub time_zoom_factor: f64,
    pub size_factor: f64,
    /// Minimum on-screen size of an event mark
    pub size_px: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            view_address: 0,
            view_time: 0,
            address_zoom_factor: 1.0,
            time_zoom_factor: 1.0,
            size_factor: 1.0,
            size_px: 1,
        }
    }
}

impl Viewport {
    /// Display address under a screen x coordinate
    pub fn display_address_at(&self, x: i32) -> u64 {
        (self.view_address as f64 + x as f64 / self.address_zoom_factor) as u64
    }

    /// Time under a screen y coordinate
    pub fn time_at(&self, y: i32) -> u64 {
        (self.view_time as f64 + y as f64 / self.time_zoom_factor) as u64
    }

    /// Screen x of a display address, may be off screen
    pub fn screen_x(&self, display_address: u64) -> f64 {
        (display_address as f64 - self.view_address as f64) * self.address_zoom_factor
    }

    /// Screen y of a time, may be off screen
    pub fn screen_y(&self, time: u64) -> f64 {
        (time as f64 - self.view_time as f64) * self.time_zoom_factor
    }

    /// Pan along the address axis, clamping at both ends of the u64 range
    pub fn address_move(&mut self, delta: i64) {
        self.view_address = self.view_address.saturating_add_signed(delta);
    }

    /// Pan along the time axis, clamping at both ends of the u64 range
    pub fn time_move(&mut self, delta: i64) {
        self.view_time = self.view_time.saturating_add_signed(delta);
    }

    /// Fit the whole trace into `width` x `height` screen units
    pub fn fit(&mut self, width: f64, height: f64, total_bytes: u64, total_time: u64) {
        self.address_zoom_factor = if total_bytes != 0 {
            width / total_bytes as f64
        } else {
            1.0
        };
        self.time_zoom_factor = if total_time != 0 {
            height / total_time as f64
        } else {
            1.0
        };
    }

    pub fn is_at_origin(&self) -> bool {
        self.view_address == 0 && self.view_time == 0
    }
}

/// Raised after every viewport mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChanged {
    /// Real address at the view origin, or `INVALID_ADDRESS` past the trace
    pub address: u64,
    pub time: u64,
}

impl fmt::Display for PositionChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address: 0x{:x}  Time: {}", self.address, self.time)
    }
}

/// Which axes a wheel gesture zooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomAxes {
    #[default]
    Both,
    Address,
    Time,
    /// Scale event marks instead of the view
    Size,
}

impl ZoomAxes {
    fn address(self) -> bool {
        matches!(self, ZoomAxes::Both | ZoomAxes::Address)
    }

    fn time(self) -> bool {
        matches!(self, ZoomAxes::Both | ZoomAxes::Time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Whether a drag from `start` to `end` is short enough to count as a click
pub fn is_misclick(start: ScreenPoint, end: ScreenPoint) -> bool {
    (start.x - end.x).abs() < MISCLICK_THRESHOLD || (start.y - end.y).abs() < MISCLICK_THRESHOLD
}

/// Zoom amount for a raw wheel delta (120 per notch on most mice)
pub fn wheel_delta(dx: i32, dy: i32) -> f64 {
    (dx + dy) as f64 / 2000.0
}

/// Viewing session over a ready trace index
pub struct ViewController<'a> {
    index: &'a TraceIndex,
    viewport: Viewport,
    width: f64,
    height: f64,
}

impl<'a> ViewController<'a> {
    pub fn new(index: &'a TraceIndex, width: f64, height: f64) -> Self {
        debug_assert!(index.is_ready(), "viewing a trace that is still ingesting");
        ViewController {
            index,
            viewport: Viewport::default(),
            width,
            height,
        }
    }

    pub fn with_viewport(index: &'a TraceIndex, viewport: Viewport, width: f64, height: f64) -> Self {
        ViewController {
            viewport,
            ..Self::new(index, width, height)
        }
    }

    pub fn index(&self) -> &'a TraceIndex {
        self.index
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Current origin as a notification
    pub fn position(&self) -> PositionChanged {
        PositionChanged {
            address: self.index.display_to_real(self.viewport.view_address),
            time: self.viewport.view_time,
        }
    }

    fn notify(&self) -> PositionChanged {
        self.log_position();
        self.position()
    }

    fn log_position(&self) {
        tracing::trace!(
            view_address = self.viewport.view_address,
            view_time = self.viewport.view_time,
            address_zoom = self.viewport.address_zoom_factor,
            time_zoom = self.viewport.time_zoom_factor,
            "position changed"
        );
    }

    pub fn address_move(&mut self, delta: i64) -> PositionChanged {
        self.viewport.address_move(delta);
        self.notify()
    }

    pub fn time_move(&mut self, delta: i64) -> PositionChanged {
        self.viewport.time_move(delta);
        self.notify()
    }

    fn fit(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.viewport.fit(
            width,
            height,
            self.index.total_bytes(),
            self.index.total_time(),
        );
    }

    /// Refit the zoom factors to new viewport dimensions without moving
    pub fn update_zoom_factors(&mut self, width: f64, height: f64) -> PositionChanged {
        self.fit(width, height);
        self.notify()
    }

    /// Show the whole trace
    pub fn zoom_to_overview(&mut self) -> PositionChanged {
        self.viewport.view_address = 0;
        self.viewport.view_time = 0;
        self.fit(self.width, self.height);
        self.notify()
    }

    /// Host window resized. The overview keeps fitting the window, any other
    /// view keeps its zoom and shows more or less of the trace.
    pub fn resize(&mut self, width: f64, height: f64) -> PositionChanged {
        self.width = width;
        self.height = height;
        if self.viewport.is_at_origin() {
            self.fit(width, height);
        }
        self.notify()
    }

    /// Jump the view origin to a real address
    pub fn set_address(&mut self, address: u64) -> PositionChanged {
        self.viewport.view_address = self.index.real_to_display(address);
        self.log_position();
        PositionChanged {
            address,
            time: self.viewport.view_time,
        }
    }

    pub fn set_time(&mut self, time: u64) -> PositionChanged {
        self.viewport.view_time = time;
        self.notify()
    }

    /// Wheel zoom centered on `cursor`.
    ///
    /// `f` must lie in `(-1, 1)`; positive zooms in. Returns `None` and leaves
    /// the view untouched otherwise.
    pub fn wheel_zoom(&mut self, cursor: ScreenPoint, f: f64, axes: ZoomAxes) -> Option<PositionChanged> {
        if !(f > -1.0 && f < 1.0) {
            return None;
        }
        let ratio = (1.0 + f) / (1.0 - f);
        if axes.address() {
            let zoom = self.viewport.address_zoom_factor;
            self.viewport
                .address_move((cursor.x as f64 / zoom * (2.0 * f) / (1.0 + f)) as i64);
            self.viewport.address_zoom_factor *= ratio;
        }
        if axes.time() {
            let zoom = self.viewport.time_zoom_factor;
            self.viewport
                .time_move((cursor.y as f64 / zoom * (2.0 * f) / (1.0 + f)) as i64);
            self.viewport.time_zoom_factor *= ratio;
        } else if axes == ZoomAxes::Size {
            self.viewport.size_factor = (self.viewport.size_factor * ratio).max(1.0);
        }
        Some(self.notify())
    }

    /// Zoom to (forward) or out from (backward) a dragged rectangle.
    ///
    /// Drags under [`MISCLICK_THRESHOLD`] on either axis are ignored.
    pub fn rect_zoom(
        &mut self,
        start: ScreenPoint,
        end: ScreenPoint,
        direction: ZoomDirection,
    ) -> Option<PositionChanged> {
        if is_misclick(start, end) {
            return None;
        }
        let dx = (start.x - end.x).abs();
        let dy = (start.y - end.y).abs();
        let left = start.x.min(end.x) as f64;
        let top = start.y.min(end.y) as f64;
        let vp = &mut self.viewport;

        match direction {
            ZoomDirection::Forward => {
                vp.address_move((left / vp.address_zoom_factor) as i64);
                vp.time_move((top / vp.time_zoom_factor) as i64);
                vp.address_zoom_factor *= self.width / dx as f64;
                vp.time_zoom_factor *= self.height / dy as f64;
            }
            ZoomDirection::Backward => {
                vp.address_zoom_factor *= dx as f64 / self.width;
                vp.time_zoom_factor *= dy as f64 / self.height;
                vp.address_move(-((left / vp.address_zoom_factor) as i64));
                vp.time_move(-((top / vp.time_zoom_factor) as i64));
            }
        }
        Some(self.notify())
    }

    /// Follow a mouse drag from `last` to `current`
    pub fn drag_pan(&mut self, last: ScreenPoint, current: ScreenPoint) -> PositionChanged {
        let vp = &mut self.viewport;
        vp.address_move(((last.x - current.x) as f64 / vp.address_zoom_factor) as i64);
        vp.time_move(((last.y - current.y) as f64 / vp.time_zoom_factor) as i64);
        self.notify()
    }

    /// Arrow-key pan by a fixed fraction of the view
    pub fn key_pan(&mut self, direction: PanDirection) -> PositionChanged {
        let vp = &mut self.viewport;
        let address_step = (self.width * KEY_PAN_SPEED / vp.address_zoom_factor) as i64;
        let time_step = (self.height * KEY_PAN_SPEED / vp.time_zoom_factor) as i64;
        match direction {
            PanDirection::Up => vp.time_move(-time_step),
            PanDirection::Down => vp.time_move(time_step),
            PanDirection::Left => vp.address_move(-address_step),
            PanDirection::Right => vp.address_move(address_step),
        }
        self.notify()
    }

    pub fn grow_marks(&mut self) -> PositionChanged {
        self.viewport.size_px += 1;
        self.notify()
    }

    pub fn shrink_marks(&mut self) -> PositionChanged {
        self.viewport.size_px = self.viewport.size_px.saturating_sub(1).max(1);
        self.notify()
    }

    /// Real address and time under the cursor
    pub fn cursor_position(&self, pos: ScreenPoint) -> PositionChanged {
        PositionChanged {
            address: self.index.address_at(&self.viewport, pos.x),
            time: self.viewport.time_at(pos.y),
        }
    }
}
