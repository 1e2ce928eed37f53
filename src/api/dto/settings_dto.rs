//! Settings DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::Theme;

/// Request body for `PUT /settings`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    /// Keyword filter.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Stored theme.
    #[serde(default)]
    pub theme: Option<Theme>,
    /// E-mail notifications.
    #[serde(default)]
    pub notification_email: Option<bool>,
    /// Push notifications.
    #[serde(default)]
    pub notification_push: Option<bool>,
}
