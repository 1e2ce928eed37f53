//! Gesture state machine for the visible card.
//!
//! ```text
//! Idle --pointer_down--> Dragging --release(|offset| > commit)--> Committing(dir)
//!   ^                       |                                        |
//!   +----release(small)-----+                                     settle
//!   |                                                                v
//!   +-------------------------------reset------------------------ Settled
//! Idle --press(decision)--> Committing(dir)
//! ```
//!
//! Gestures arriving while a card is committing or settled are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Horizontal swipe direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// Pass.
    Left,
    /// Like.
    Right,
}

impl SwipeDirection {
    /// The decision a commit in this direction records.
    #[must_use]
    pub const fn decision(self) -> Decision {
        match self {
            Self::Left => Decision::Pass,
            Self::Right => Decision::Like,
        }
    }
}

/// What the user decided about a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Match the lead.
    Like,
    /// Archive the lead.
    Pass,
}

impl Decision {
    /// The direction the card leaves in.
    #[must_use]
    pub const fn direction(self) -> SwipeDirection {
        match self {
            Self::Like => SwipeDirection::Right,
            Self::Pass => SwipeDirection::Left,
        }
    }
}

/// Drag distances and commit delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SwipeThresholds {
    /// Offset beyond which a direction hint is shown.
    pub hint_px: f64,
    /// Offset beyond which a release commits.
    pub commit_px: f64,
    /// Time between commit and settle.
    #[serde(with = "millis")]
    #[schema(value_type = u64)]
    pub commit_delay: Duration,
}

impl Default for SwipeThresholds {
    fn default() -> Self {
        Self {
            hint_px: 50.0,
            commit_px: 100.0,
            commit_delay: Duration::from_millis(300),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// State of the visible card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SwipeState {
    /// Resting.
    #[default]
    Idle,
    /// Pointer is down.
    Dragging {
        /// Pointer x at `pointer_down`.
        start_x: f64,
        /// Current `x - start_x`.
        offset: f64,
    },
    /// Leaving the screen; the decision is being recorded.
    Committing {
        /// Exit direction.
        direction: SwipeDirection,
    },
    /// Fully off-screen; the next card replaces it after `reset`.
    Settled {
        /// The recorded decision.
        decision: Decision,
    },
}

/// Result of feeding one gesture into the card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    /// A drag began.
    Started,
    /// The drag moved.
    Dragged {
        /// Current offset.
        offset: f64,
        /// Visual hint, if past the hint threshold.
        hint: Option<SwipeDirection>,
    },
    /// The card started committing.
    Committed {
        /// Exit direction.
        direction: SwipeDirection,
    },
    /// A release short of the commit threshold.
    SnappedBack,
    /// The gesture was not valid in the current state.
    Ignored,
}

/// Gesture state machine for one card.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwipeCard {
    state: SwipeState,
    thresholds: SwipeThresholds,
}

impl SwipeCard {
    /// Creates an idle card.
    #[must_use]
    pub fn new(thresholds: SwipeThresholds) -> Self {
        Self {
            state: SwipeState::Idle,
            thresholds,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SwipeState {
        self.state
    }

    /// Configured thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> SwipeThresholds {
        self.thresholds
    }

    /// Current drag offset, `0` outside of a drag.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        match self.state {
            SwipeState::Dragging { offset, .. } => offset,
            _ => 0.0,
        }
    }

    /// Direction hint for the current offset.
    #[must_use]
    pub fn hint(&self) -> Option<SwipeDirection> {
        let offset = self.offset();
        if offset > self.thresholds.hint_px {
            Some(SwipeDirection::Right)
        } else if offset < -self.thresholds.hint_px {
            Some(SwipeDirection::Left)
        } else {
            None
        }
    }

    /// `true` while a commit is in flight or the card has settled.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(
            self.state,
            SwipeState::Committing { .. } | SwipeState::Settled { .. }
        )
    }

    /// Pointer pressed at `x`.
    pub fn pointer_down(&mut self, x: f64) -> Gesture {
        match self.state {
            SwipeState::Idle => {
                self.state = SwipeState::Dragging {
                    start_x: x,
                    offset: 0.0,
                };
                Gesture::Started
            }
            _ => Gesture::Ignored,
        }
    }

    /// Pointer moved to `x`.
    pub fn pointer_move(&mut self, x: f64) -> Gesture {
        match self.state {
            SwipeState::Dragging { start_x, .. } => {
                self.state = SwipeState::Dragging {
                    start_x,
                    offset: x - start_x,
                };
                Gesture::Dragged {
                    offset: self.offset(),
                    hint: self.hint(),
                }
            }
            _ => Gesture::Ignored,
        }
    }

    /// Pointer released.
    pub fn release(&mut self) -> Gesture {
        let SwipeState::Dragging { offset, .. } = self.state else {
            return Gesture::Ignored;
        };
        let direction = if offset > self.thresholds.commit_px {
            SwipeDirection::Right
        } else if offset < -self.thresholds.commit_px {
            SwipeDirection::Left
        } else {
            self.state = SwipeState::Idle;
            return Gesture::SnappedBack;
        };
        self.state = SwipeState::Committing { direction };
        Gesture::Committed { direction }
    }

    /// Like/pass button pressed.
    pub fn press(&mut self, decision: Decision) -> Gesture {
        match self.state {
            SwipeState::Idle => {
                let direction = decision.direction();
                self.state = SwipeState::Committing { direction };
                Gesture::Committed { direction }
            }
            _ => Gesture::Ignored,
        }
    }

    /// Finishes a commit. Returns the decision, or `None` if the card was
    /// not committing.
    pub fn settle(&mut self) -> Option<Decision> {
        let SwipeState::Committing { direction } = self.state else {
            return None;
        };
        let decision = direction.decision();
        self.state = SwipeState::Settled { decision };
        Some(decision)
    }

    /// Returns the card to `Idle` for the next lead.
    pub fn reset(&mut self) {
        self.state = SwipeState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> SwipeCard {
        SwipeCard::new(SwipeThresholds::default())
    }

    #[test]
    fn drag_past_commit_threshold_commits_right() {
        let mut c = card();
        assert_eq!(c.pointer_down(200.0), Gesture::Started);
        assert_eq!(
            c.pointer_move(260.0),
            Gesture::Dragged {
                offset: 60.0,
                hint: Some(SwipeDirection::Right)
            }
        );
        c.pointer_move(320.0);
        assert_eq!(
            c.release(),
            Gesture::Committed {
                direction: SwipeDirection::Right
            }
        );
        assert_eq!(c.settle(), Some(Decision::Like));
    }

    #[test]
    fn small_drag_snaps_back() {
        let mut c = card();
        c.pointer_down(100.0);
        assert_eq!(
            c.pointer_move(20.0),
            Gesture::Dragged {
                offset: -80.0,
                hint: Some(SwipeDirection::Left)
            }
        );
        assert_eq!(c.release(), Gesture::SnappedBack);
        assert_eq!(c.state(), SwipeState::Idle);
        assert!(c.offset().abs() < f64::EPSILON);
    }

    #[test]
    fn hint_only_past_hint_threshold() {
        let mut c = card();
        c.pointer_down(0.0);
        assert_eq!(
            c.pointer_move(50.0),
            Gesture::Dragged {
                offset: 50.0,
                hint: None
            }
        );
    }

    #[test]
    fn exact_commit_threshold_does_not_commit() {
        let mut c = card();
        c.pointer_down(0.0);
        c.pointer_move(-100.0);
        assert_eq!(c.release(), Gesture::SnappedBack);
    }

    #[test]
    fn gestures_during_commit_are_ignored() {
        let mut c = card();
        c.press(Decision::Pass);
        assert!(c.is_locked());
        assert_eq!(c.pointer_down(0.0), Gesture::Ignored);
        assert_eq!(c.press(Decision::Like), Gesture::Ignored);
        assert_eq!(c.release(), Gesture::Ignored);

        assert_eq!(c.settle(), Some(Decision::Pass));
        assert_eq!(c.pointer_down(0.0), Gesture::Ignored);
        assert_eq!(c.settle(), None);

        c.reset();
        assert_eq!(c.pointer_down(0.0), Gesture::Started);
    }

    #[test]
    fn move_without_down_is_ignored() {
        let mut c = card();
        assert_eq!(c.pointer_move(300.0), Gesture::Ignored);
        assert_eq!(c.release(), Gesture::Ignored);
    }
}
