//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain types that already derive `Serialize`/`ToSchema` (leads, groups,
//! notifications, settings) are returned as-is; the types here wrap them or
//! describe request bodies and query strings.

pub mod auth_dto;
pub mod common_dto;
pub mod feed_dto;
pub mod lead_dto;
pub mod notification_dto;
pub mod profile_dto;
pub mod settings_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use feed_dto::*;
pub use lead_dto::*;
pub use notification_dto::*;
pub use profile_dto::*;
pub use settings_dto::*;
