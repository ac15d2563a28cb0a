//! Animated jumps between page sections. A jump fades the page out, scrolls
//! once the fade has started, then fades back in.

use crate::{
    document::{Document, ScrollBehavior},
    signal::MediaQuery,
    timer::{TimerHandle, TimerQueue},
};
use log::{trace, warn};
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning,
}

/// What to do when a timer fires
#[derive(Debug)]
enum Step {
    Scroll { target: String },
    Settle,
}

/// Runs the fade-out/scroll/fade-in sequence. At most one sequence is ever in
/// flight; starting a new one cancels whatever is left of the old one.
#[derive(Debug, Default)]
pub struct TransitionSequencer {
    state: TransitionState,
    timers: TimerQueue<Step>,
    scroll_timer: Option<TimerHandle>,
    settle_timer: Option<TimerHandle>,
}

impl TransitionSequencer {
    /// Time between starting the fade-out and scrolling
    pub const SCROLL_DELAY: Duration = Duration::from_millis(80);
    /// Time between starting the fade-out and the fade-in finishing
    pub const SETTLE_DELAY: Duration = Duration::from_millis(280);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Number of steps still waiting to run
    pub fn pending_steps(&self) -> usize {
        self.timers.len()
    }

    /// Jump to a section. With reduced motion this scrolls immediately and
    /// touches nothing else. The signal is read once, here; changing it
    /// mid-sequence doesn't affect a sequence that's already running.
    pub fn jump(
        &mut self,
        target: &str,
        now: Instant,
        reduced_motion: &MediaQuery,
        document: &mut Document,
    ) {
        if !document.has_section(target) {
            warn!("Ignoring jump to unknown section `{target}`");
            return;
        }

        if reduced_motion.matches() {
            document.scroll_into_view(target, ScrollBehavior::Auto);
            return;
        }

        self.cancel_pending();
        self.state = TransitionState::Transitioning;
        self.scroll_timer = Some(self.timers.schedule(
            now,
            Self::SCROLL_DELAY,
            Step::Scroll {
                target: target.to_owned(),
            },
        ));
        self.settle_timer = Some(self.timers.schedule(
            now,
            Self::SETTLE_DELAY,
            Step::Settle,
        ));
    }

    /// Run any steps that are due
    pub fn tick(&mut self, now: Instant, document: &mut Document) {
        for (_, step) in self.timers.fire_due(now) {
            trace!("Running transition step {step:?}");
            match step {
                Step::Scroll { target } => {
                    self.scroll_timer = None;
                    document.scroll_into_view(&target, ScrollBehavior::Smooth);
                }
                Step::Settle => {
                    self.settle_timer = None;
                    self.state = TransitionState::Idle;
                }
            }
        }
    }

    /// Cancel everything, for when the owning view goes away
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.timers.clear();
        self.state = TransitionState::Idle;
    }

    /// Cancel the pending steps of the current sequence, if there is one
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.scroll_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.settle_timer.take() {
            self.timers.cancel(handle);
        }
    }
}
