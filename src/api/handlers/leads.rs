//! Lead list and membership action handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ActionResponse, LeadListResponse, ListParams, PaginationMeta};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::{BlockedLead, Lead, LeadId, LeadStats};
use crate::error::{ErrorResponse, LeadSwipeError};
use crate::session::LeadAction;

/// `GET /leads`: One page of leads, optionally scoped to a membership view.
///
/// Without `keywords` the caller's stored keyword filter applies.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/leads",
    tag = "Leads",
    summary = "List leads",
    description = "Paginated lead table. `view` selects all leads or one membership set; `search` matches name, e-mail, description, post text and comment text; pages past the end are clamped to the last page.",
    security(("bearer" = [])),
    params(ListParams),
    responses(
        (status = 200, description = "Lead page", body = LeadListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn list_leads(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let mut filter = params.filter();
    if params.keywords.is_none() {
        filter.keywords = state.settings.get(caller.user.id).await?.keywords;
    }
    let page = state
        .leads
        .list(caller.user.id, params.view, params.request(), &filter, params.sort())
        .await?;
    let (data, pagination) = PaginationMeta::split(page);
    Ok(Json(LeadListResponse { data, pagination }))
}

/// `GET /leads/blocked`: Blocked leads with reasons.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/leads/blocked",
    tag = "Leads",
    summary = "List blocked leads",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Blocked leads, newest first", body = Vec<BlockedLead>),
    )
)]
pub async fn blocked_leads(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.leads.blocked_entries(caller.user.id).await?))
}

/// `GET /leads/{id}`: One lead.
///
/// # Errors
///
/// Returns [`LeadSwipeError::LeadNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    summary = "Get a lead",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Lead not found", body = ErrorResponse),
    )
)]
pub async fn get_lead(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.leads.get_lead(LeadId::new(id)).await?))
}

/// `POST /leads/{id}/actions`: Save, match, block, archive or undo.
///
/// Runs through the caller's session so the feed drops blocked and archived
/// leads immediately.
///
/// # Errors
///
/// Returns [`LeadSwipeError::LeadNotFound`] when matching an unknown lead,
/// [`LeadSwipeError::PartialSequence`] when a two-step action stops
/// half-way, or [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    post,
    path = "/api/v1/leads/{id}/actions",
    tag = "Leads",
    summary = "Apply a membership action",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    request_body = LeadAction,
    responses(
        (status = 200, description = "Membership writes", body = ActionResponse),
        (status = 404, description = "Lead not found", body = ErrorResponse),
        (status = 500, description = "Store failure or partial sequence", body = ErrorResponse),
    )
)]
pub async fn apply_action(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i64>,
    Json(action): Json<LeadAction>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let outcomes = session.apply(LeadId::new(id), action).await?;
    Ok(Json(ActionResponse { outcomes }))
}

/// `GET /stats`: Lead and membership counts.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Leads",
    summary = "Lead statistics",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Counts", body = LeadStats),
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.leads.stats(caller.user.id).await?))
}

/// Lead routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads))
        .route("/leads/blocked", get(blocked_leads))
        .route("/leads/{id}", get(get_lead))
        .route("/leads/{id}/actions", post(apply_action))
        .route("/stats", get(stats))
}
