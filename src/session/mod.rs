//! Per-user swipe sessions.
//!
//! A [`LeadSession`] wires the [`SwipeCard`] gesture machine to the
//! [`crate::service::MembershipManager`] and the [`FeedController`]. The
//! [`SessionRegistry`] keeps one session per sign-in.

pub mod feed;
pub mod lead_session;
pub mod registry;
pub mod swipe;

pub use feed::{Candidate, Consumed, FeedController, FeedTab, TabStatus, exclude_ids};
pub use lead_session::{
    CandidateStatus, FeedView, GestureResult, LeadAction, LeadSession, SwipeOutcome,
};
pub use registry::{SessionContext, SessionRegistry};
pub use swipe::{Decision, Gesture, SwipeCard, SwipeDirection, SwipeState, SwipeThresholds};
