//! Notification DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Notification;
use crate::service::DEFAULT_NOTIFICATION_LIMIT;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationParams {
    /// Maximum rows, newest first.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_NOTIFICATION_LIMIT
}

/// Response body for `GET /notifications`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationListResponse {
    /// Notifications, newest first.
    pub data: Vec<Notification>,
    /// Unread notifications in total.
    pub unread: u64,
}

/// Response body for the unread counter endpoints.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct UnreadResponse {
    /// Unread notifications (or rows marked read for `read-all`).
    pub count: u64,
}
