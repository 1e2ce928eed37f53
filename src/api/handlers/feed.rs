//! Swipe feed handlers: the caller's [`crate::session::LeadSession`].

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    BlockRequest, DragPhase, DragRequest, FeedResponse, PreferencesResponse, SwipeRequest,
    TabParams, ThemeRequest,
};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::LeadId;
use crate::error::{ErrorResponse, LeadSwipeError};

/// `GET /feed`: Current card and queue state.
///
/// # Errors
///
/// Returns [`LeadSwipeError`] if the session cannot be started.
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    tag = "Feed",
    summary = "Current feed view",
    description = "Returns the head of the active tab. Passing `tab` switches the active tab first.",
    security(("bearer" = [])),
    params(TabParams),
    responses(
        (status = 200, description = "Feed view", body = FeedResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn current(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(params): Query<TabParams>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    if let Some(tab) = params.tab {
        session.set_tab(tab);
    }
    Ok(Json(FeedResponse::view(session.view())))
}

/// `POST /feed/load`: Load the next page of a tab.
///
/// # Errors
///
/// Returns [`LeadSwipeError`] if the session cannot be started. A failed
/// page load is reported in `view.last_error`.
#[utoipa::path(
    post,
    path = "/api/v1/feed/load",
    tag = "Feed",
    summary = "Load next page",
    security(("bearer" = [])),
    params(TabParams),
    responses(
        (status = 200, description = "Feed view with the number of leads appended", body = FeedResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn load(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(params): Query<TabParams>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let tab = params.tab.unwrap_or_else(|| session.tab());
    let loaded = session.load_more(tab).await;
    Ok(Json(FeedResponse {
        loaded: Some(loaded),
        ..FeedResponse::view(session.view())
    }))
}

/// `POST /feed/refresh`: Re-read membership sets and drop queued leads that
/// were acted on elsewhere.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] if the sets cannot be reloaded.
#[utoipa::path(
    post,
    path = "/api/v1/feed/refresh",
    tag = "Feed",
    summary = "Refresh membership sets",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Feed view", body = FeedResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    session.refresh().await?;
    Ok(Json(FeedResponse::view(session.view())))
}

/// `POST /feed/drag`: Pointer down or move on the card.
///
/// # Errors
///
/// Returns [`LeadSwipeError`] if the session cannot be started.
#[utoipa::path(
    post,
    path = "/api/v1/feed/drag",
    tag = "Feed",
    summary = "Drag the card",
    security(("bearer" = [])),
    request_body = DragRequest,
    responses(
        (status = 200, description = "Card state with drag hint", body = FeedResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn drag(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<DragRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let gesture = match req.phase {
        DragPhase::Down => session.pointer_down(req.x),
        DragPhase::Move => session.pointer_move(req.x),
    };
    Ok(Json(FeedResponse {
        gesture: Some(gesture),
        ..FeedResponse::view(session.view())
    }))
}

/// `POST /feed/swipe`: Release the drag, or press like/pass.
///
/// # Errors
///
/// Returns [`LeadSwipeError`] if the decision cannot be recorded; the card
/// snaps back and the lead stays at the head.
#[utoipa::path(
    post,
    path = "/api/v1/feed/swipe",
    tag = "Feed",
    summary = "Swipe the card",
    description = "Without a decision, releases the current drag and commits if it passed the threshold. With a decision, acts as the like/pass button.",
    security(("bearer" = [])),
    request_body = SwipeRequest,
    responses(
        (status = 200, description = "Gesture result and new feed view", body = FeedResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Decision not recorded", body = ErrorResponse),
    )
)]
pub async fn swipe(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<SwipeRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let result = match req.decision {
        Some(decision) => session.press(decision).await?,
        None => session.release().await?,
    };
    Ok(Json(FeedResponse {
        gesture: Some(result.gesture),
        swipe: result.swipe,
        ..FeedResponse::view(session.view())
    }))
}

/// `POST /feed/save`: Toggle the bookmark on the head.
///
/// # Errors
///
/// Returns [`LeadSwipeError::InvalidRequest`] with an empty feed.
#[utoipa::path(
    post,
    path = "/api/v1/feed/save",
    tag = "Feed",
    summary = "Toggle save on the current lead",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Membership outcome", body = FeedResponse),
        (status = 400, description = "No current lead", body = ErrorResponse),
    )
)]
pub async fn save(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let outcome = session.save_current().await?;
    Ok(Json(FeedResponse {
        membership: Some(outcome),
        ..FeedResponse::view(session.view())
    }))
}

/// `POST /feed/block`: Block the head and move on.
///
/// # Errors
///
/// Returns [`LeadSwipeError::InvalidRequest`] with an empty feed, or the
/// store error.
#[utoipa::path(
    post,
    path = "/api/v1/feed/block",
    tag = "Feed",
    summary = "Block the current lead",
    security(("bearer" = [])),
    request_body = BlockRequest,
    responses(
        (status = 200, description = "Membership outcome and new feed view", body = FeedResponse),
        (status = 400, description = "No current lead", body = ErrorResponse),
    )
)]
pub async fn block(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<BlockRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let outcome = session.block_current(req.reason).await?;
    Ok(Json(FeedResponse {
        membership: Some(outcome),
        ..FeedResponse::view(session.view())
    }))
}

/// `POST /feed/skip`: Drop the head from this session without recording it.
///
/// # Errors
///
/// Returns [`LeadSwipeError::InvalidRequest`] with an empty feed.
#[utoipa::path(
    post,
    path = "/api/v1/feed/skip",
    tag = "Feed",
    summary = "Skip the current lead",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New feed view", body = FeedResponse),
        (status = 400, description = "No current lead", body = ErrorResponse),
    )
)]
pub async fn skip(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let consumed = session.skip_current().await?;
    Ok(Json(FeedResponse {
        consumed: Some(consumed),
        ..FeedResponse::view(session.view())
    }))
}

/// `POST /feed/restore/{id}`: Restore an archived lead into the feed.
///
/// # Errors
///
/// Returns [`LeadSwipeError::LeadNotFound`] for an unknown lead, or
/// [`LeadSwipeError::PartialSequence`] if it was restored but not un-viewed.
#[utoipa::path(
    post,
    path = "/api/v1/feed/restore/{id}",
    tag = "Feed",
    summary = "Restore an archived lead",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    responses(
        (status = 200, description = "New feed view", body = FeedResponse),
        (status = 404, description = "Lead not found", body = ErrorResponse),
        (status = 500, description = "Restore partially applied", body = ErrorResponse),
    )
)]
pub async fn restore(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    session.restore(LeadId::new(id)).await?;
    Ok(Json(FeedResponse::view(session.view())))
}

/// `GET /feed/preferences`: Preferences in effect for this session.
///
/// # Errors
///
/// Returns [`LeadSwipeError`] if stored settings cannot be re-read.
#[utoipa::path(
    get,
    path = "/api/v1/feed/preferences",
    tag = "Feed",
    summary = "Session preferences",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Preferences", body = PreferencesResponse),
    )
)]
pub async fn preferences(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let preferences = session.sync_settings().await?.clone();
    Ok(Json(PreferencesResponse { preferences }))
}

/// `PUT /feed/theme`: Pick a theme for this session only.
///
/// # Errors
///
/// Returns [`LeadSwipeError`] if the session cannot be started.
#[utoipa::path(
    put,
    path = "/api/v1/feed/theme",
    tag = "Feed",
    summary = "Choose a session theme",
    description = "Overrides the stored theme for this session. Later settings reloads keep the choice.",
    security(("bearer" = [])),
    request_body = ThemeRequest,
    responses(
        (status = 200, description = "Preferences", body = PreferencesResponse),
    )
)]
pub async fn theme(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<ThemeRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let session = caller.session(&state).await?;
    let mut session = session.lock().await;
    let preferences = session.choose_theme(req.theme).clone();
    Ok(Json(PreferencesResponse { preferences }))
}

/// Feed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(current))
        .route("/feed/load", post(load))
        .route("/feed/refresh", post(refresh))
        .route("/feed/drag", post(drag))
        .route("/feed/swipe", post(swipe))
        .route("/feed/save", post(save))
        .route("/feed/block", post(block))
        .route("/feed/skip", post(skip))
        .route("/feed/restore/{id}", post(restore))
        .route("/feed/preferences", get(preferences))
        .route("/feed/theme", put(theme))
}
