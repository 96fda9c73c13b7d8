use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::{parse_id, AppResult};
use crate::extractors::CurrentUser;
use crate::posts;
use crate::state::AppState;
use crate::users::{self, UserParams};
use crate::validation::since_id;
use crate::views::{PostPage, RegisteredUser, UserEnvelope};

use super::communities::SinceIdQuery;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/{id}", get(show_user).put(update_user))
        .route("/users/{id}/posts", get(user_posts))
        .route("/me", get(me))
}

/// Registration is the one unauthenticated endpoint; it hands out the
/// access token every other request needs.
async fn register(
    State(state): State<AppState>,
    body: Result<Json<UserParams>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RegisteredUser>)> {
    let Json(params) = body?;
    let input = params.validate()?;

    let mut conn = state.db.get()?;
    let (user, key) = users::create(&mut conn, &input, state.thumbnails.as_ref())?;
    Ok((StatusCode::CREATED, Json(RegisteredUser::new(user, key))))
}

async fn me(user: CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope { user: user.0.into() })
}

async fn show_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserEnvelope>> {
    let id = parse_id(&id)?;
    let conn = state.db.get()?;
    let user = users::require(&conn, id)?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<UserParams>, JsonRejection>,
) -> AppResult<Json<UserEnvelope>> {
    let id = parse_id(&id)?;
    let Json(params) = body?;
    let input = params.validate()?;

    let mut conn = state.db.get()?;
    let user = users::update(&mut conn, id, caller.id(), &input, state.thumbnails.as_ref())?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

async fn user_posts(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    query: Result<Query<SinceIdQuery>, QueryRejection>,
) -> AppResult<Json<PostPage>> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    let since_id = since_id(query.since_id.as_deref())?;

    let conn = state.db.get()?;
    users::require(&conn, id)?;
    let posts = posts::list_by_user(&conn, id, since_id, state.config.pagination.page_size)?;
    Ok(Json(PostPage {
        posts: posts.into_iter().map(Into::into).collect(),
    }))
}
