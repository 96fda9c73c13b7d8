use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::posts::{self, PostParams};
use crate::state::AppState;
use crate::views::PostEnvelope;

pub fn router() -> Router<AppState> {
    Router::new().route("/posts", post(create_post))
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<PostParams>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PostEnvelope>)> {
    let Json(params) = body?;
    let conn = state.db.get()?;
    let post = posts::create(&conn, user.id(), params)?;
    Ok((StatusCode::CREATED, Json(PostEnvelope { post: post.into() })))
}
