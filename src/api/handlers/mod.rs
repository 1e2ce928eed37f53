//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod feed;
pub mod groups;
pub mod leads;
pub mod notifications;
pub mod profile;
pub mod settings;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(feed::routes())
        .merge(leads::routes())
        .merge(notifications::routes())
        .merge(groups::routes())
        .merge(settings::routes())
        .merge(profile::routes())
}
