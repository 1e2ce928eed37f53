//! Profile DTOs.

use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

use crate::domain::ProfileUpdate;

/// Keeps `null` apart from an absent field: absent is `None`, `null` is
/// `Some(None)`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Request body for `PUT /profile`. Absent fields are left unchanged and
/// `null` clears a field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// Display name.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub full_name: Option<Option<String>>,
    /// Avatar as an `http(s)` or `data:image/...` URL.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub avatar_url: Option<Option<String>>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            full_name: req.full_name,
            avatar_url: req.avatar_url,
        }
    }
}
