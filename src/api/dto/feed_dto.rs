//! Feed and gesture DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{SessionPreferences, Theme};
use crate::service::MembershipOutcome;
use crate::session::{Consumed, Decision, FeedTab, FeedView, Gesture, SwipeOutcome};

/// `?tab=` query parameter.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TabParams {
    /// Tab to act on; the session's active tab when absent.
    #[serde(default)]
    pub tab: Option<FeedTab>,
}

/// Pointer phase for `POST /feed/drag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    /// Pointer pressed.
    Down,
    /// Pointer moved.
    Move,
}

/// Request body for `POST /feed/drag`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct DragRequest {
    /// Pointer phase.
    pub phase: DragPhase,
    /// Horizontal pointer position in pixels.
    pub x: f64,
}

/// Request body for `POST /feed/swipe`.
///
/// With a `decision` this is a like/pass button press; without one it
/// releases the current drag.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct SwipeRequest {
    /// Button decision.
    #[serde(default)]
    pub decision: Option<Decision>,
}

/// Request body for `POST /feed/block`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BlockRequest {
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for `PUT /feed/theme`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct ThemeRequest {
    /// Theme for this session.
    pub theme: Theme,
}

/// Feed view plus what the last request did.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedResponse {
    /// Feed after the request.
    pub view: FeedView,
    /// Card reaction to a gesture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture: Option<Gesture>,
    /// Committed swipe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe: Option<SwipeOutcome>,
    /// Membership write for save/block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership: Option<MembershipOutcome>,
    /// Queue update for skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed: Option<Consumed>,
    /// Leads appended by a load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<usize>,
}

impl FeedResponse {
    /// A response carrying only the view.
    #[must_use]
    pub const fn view(view: FeedView) -> Self {
        Self {
            view,
            gesture: None,
            swipe: None,
            membership: None,
            consumed: None,
            loaded: None,
        }
    }
}

/// Response body for the session preference endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreferencesResponse {
    /// Preferences in effect for this session.
    pub preferences: SessionPreferences,
}
