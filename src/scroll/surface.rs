//! Host seams for the scroll driver
//!
//! The driver never touches a real page. It reads and writes scroll position
//! through a [`ScrollSurface`] and asks a [`FrameRequester`] for the next
//! display frame; the host calls back `ScrollDriver::on_frame` with the
//! token it handed out.

/// Identifies one requested display frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Scrollable document plus the "scrolling" indicator.
pub trait ScrollSurface {
    fn scroll_top(&self) -> f64;
    /// Absolute jump; implementations may clamp to the scrollable range.
    fn scroll_to(&mut self, top: f64);
    fn viewport_height(&self) -> f64;
    fn document_height(&self) -> f64;
    fn smooth_scroll_enabled(&self) -> bool;
    fn set_smooth_scroll(&mut self, enabled: bool);
    fn set_indicator_visible(&mut self, visible: bool);
}

/// Source of display-refresh callbacks.
pub trait FrameRequester {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// In-memory document used by tests and the CLI simulation.
#[derive(Debug, Clone)]
pub struct VirtualSurface {
    scroll_top: f64,
    viewport_height: f64,
    document_height: f64,
    smooth_scroll: bool,
    indicator_visible: bool,
    jumps: u64,
}

impl VirtualSurface {
    pub fn new(viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            viewport_height,
            document_height,
            smooth_scroll: true,
            indicator_visible: false,
            jumps: 0,
        }
    }

    pub fn max_scroll_top(&self) -> f64 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    /// Number of `scroll_to` calls received.
    pub fn jumps(&self) -> u64 {
        self.jumps
    }
}

impl ScrollSurface for VirtualSurface {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_to(&mut self, top: f64) {
        self.jumps += 1;
        self.scroll_top = top.clamp(0.0, self.max_scroll_top());
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn document_height(&self) -> f64 {
        self.document_height
    }

    fn smooth_scroll_enabled(&self) -> bool {
        self.smooth_scroll
    }

    fn set_smooth_scroll(&mut self, enabled: bool) {
        self.smooth_scroll = enabled;
    }

    fn set_indicator_visible(&mut self, visible: bool) {
        self.indicator_visible = visible;
    }
}

/// Single-slot frame request queue.
///
/// Holds at most one outstanding request, like a page's animation-frame
/// callback; the host loop polls [`FrameQueue::take_pending`].
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Option<FrameToken>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl FrameRequester for FrameQueue {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}
