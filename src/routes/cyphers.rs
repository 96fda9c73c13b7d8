use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::cypher::{self, CypherParams};
use crate::error::{parse_id, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::views::CypherEnvelope;

pub fn router() -> Router<AppState> {
    Router::new().route("/communities/{id}/cyphers", post(create_cypher))
}

async fn create_cypher(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<CypherParams>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CypherEnvelope>)> {
    let community_id = parse_id(&id)?;
    let Json(params) = body?;
    let input = params.validate()?;

    let mut conn = state.db.get()?;
    let created = cypher::create(&mut conn, community_id, user.id(), &input)?;

    Ok((
        StatusCode::CREATED,
        Json(CypherEnvelope {
            cypher: created.into(),
        }),
    ))
}
