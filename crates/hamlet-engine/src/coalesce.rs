//! Render coalescing.
//!
//! Any number of state changes between two display frames produce exactly
//! one repaint. Changes bump a generation counter; a frame repaints only
//! when the generation moved past the last painted one, and at most one
//! frame request is outstanding at a time.

/// Result of [`RenderCoalescer::mark_dirty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameRequest {
    /// No frame was pending; the caller should schedule one.
    Schedule,
    /// A frame is already scheduled and will pick this change up.
    AlreadyPending,
}

/// Dirty-flag coalescer keyed by generation.
#[derive(Clone, Debug, Default)]
pub struct RenderCoalescer {
    dirty_gen: u64,
    painted_gen: u64,
    frame_requested: bool,
}

impl RenderCoalescer {
    /// A coalescer with nothing to paint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visible change.
    pub fn mark_dirty(&mut self) -> FrameRequest {
        self.dirty_gen += 1;
        if self.frame_requested {
            FrameRequest::AlreadyPending
        } else {
            self.frame_requested = true;
            FrameRequest::Schedule
        }
    }

    /// Called when a display frame arrives. Returns whether to repaint.
    ///
    /// Clears the pending request either way, so the next change
    /// schedules a fresh frame.
    pub fn on_frame(&mut self) -> bool {
        self.frame_requested = false;
        if self.dirty_gen == self.painted_gen {
            return false;
        }
        self.painted_gen = self.dirty_gen;
        true
    }

    /// Whether a frame is outstanding.
    pub fn is_pending(&self) -> bool {
        self.frame_requested
    }

    /// Generation of the latest change.
    pub fn generation(&self) -> u64 {
        self.dirty_gen
    }
}
