use bazaar_shared::constants::DEFAULT_SCROLL_THRESHOLD_PX;

/// What the view should do after the message list changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirective {
    None,
    ScrollToBottom,
    /// The reader is looking at history; show a "new messages" pill instead.
    ShowNewMessages { unseen: usize },
}

/// Tracks whether the viewport is following the newest message.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold_px: f32,
    following: bool,
    unseen: usize,
}

impl ScrollTracker {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            threshold_px,
            following: true,
            unseen: 0,
        }
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn unseen(&self) -> usize {
        self.unseen
    }

    /// Called by the view whenever the user scrolls.
    pub fn record_viewport(&mut self, distance_from_bottom_px: f32) {
        self.following = distance_from_bottom_px <= self.threshold_px;
        if self.following {
            self.unseen = 0;
        }
    }

    /// The user clicked the "new messages" affordance.
    pub fn jump_to_latest(&mut self) -> ScrollDirective {
        self.following = true;
        self.unseen = 0;
        ScrollDirective::ScrollToBottom
    }

    /// Own sends always bring the tail into view.
    pub fn on_local_append(&mut self) -> ScrollDirective {
        self.jump_to_latest()
    }

    /// Decides the directive after a merge that brought `new_messages` in.
    pub fn on_merge(&mut self, new_messages: usize) -> ScrollDirective {
        if new_messages == 0 {
            return ScrollDirective::None;
        }
        if self.following {
            ScrollDirective::ScrollToBottom
        } else {
            self.unseen += new_messages;
            ScrollDirective::ShowNewMessages {
                unseen: self.unseen,
            }
        }
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THRESHOLD_PX)
    }
}
