use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::membership::{self, Relation};
use crate::community::pagination;
use crate::community::regular_cypher::{self, RegularCypherParams};
use crate::community::{self, tags, CommunityParams};
use crate::cypher;
use crate::error::{parse_id, AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::users;
use crate::validation::{required, since_id};
use crate::views::{
    CommunityEnvelope, CommunityPage, CommunitySummary, RegularCypherView, TagView,
};

// --- Request bodies ---

#[derive(Debug, Deserialize)]
pub struct SinceIdQuery {
    pub since_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddHostParams {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TagParams {
    pub content: Option<String>,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities", post(create_community))
        .route(
            "/communities/{id}",
            get(show_community)
                .put(update_community)
                .delete(delete_community),
        )
        .route("/communities/{id}/hosts", post(add_host))
        .route("/communities/{id}/participants", post(join_community))
        .route("/communities/{id}/followers", post(follow_community))
        .route("/communities/{id}/tags", post(add_tag))
        .route("/communities/{id}/regular_cypher", put(set_regular_cypher))
        .route("/my_communities", get(my_communities))
        .route("/hosting_communities", get(hosting_communities))
        .route("/following_communities", get(following_communities))
}

// --- Handlers ---

async fn show_community(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<CommunityEnvelope>> {
    let id = parse_id(&id)?;
    let conn = state.db.get()?;
    let detail = community::load_detail(&conn, id, Utc::now())?;
    Ok(Json(CommunityEnvelope {
        community: detail.into(),
    }))
}

async fn create_community(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<CommunityParams>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CommunityEnvelope>)> {
    let Json(params) = body?;
    let input = params.validate()?;

    let mut conn = state.db.get()?;
    let created = community::create(&mut conn, user.id(), &input, state.thumbnails.as_ref())?;
    let detail = community::load_detail(&conn, created.id, Utc::now())?;

    Ok((
        StatusCode::CREATED,
        Json(CommunityEnvelope {
            community: detail.into(),
        }),
    ))
}

async fn update_community(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<CommunityParams>, JsonRejection>,
) -> AppResult<Json<CommunityEnvelope>> {
    let id = parse_id(&id)?;
    let Json(params) = body?;
    let input = params.validate()?;

    let mut conn = state.db.get()?;
    community::update(&mut conn, id, user.id(), &input, state.thumbnails.as_ref())?;
    let detail = community::load_detail(&conn, id, Utc::now())?;

    Ok(Json(CommunityEnvelope {
        community: detail.into(),
    }))
}

async fn delete_community(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    let mut conn = state.db.get()?;
    community::delete(&mut conn, id, user.id())?;
    Ok(StatusCode::OK)
}

async fn add_host(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<AddHostParams>, JsonRejection>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    let Json(params) = body?;
    let new_host = params
        .user_id
        .ok_or_else(|| AppError::BadRequest("user_id is required".into()))?;

    let conn = state.db.get()?;
    community::require(&conn, id)?;
    membership::require_host(&conn, user.id(), id)?;
    users::require(&conn, new_host)?;

    let added = membership::add_member(&conn, Relation::Hosting, id, new_host)?;
    tracing::info!(community_id = id, host_id = new_host, added, "Added host");
    Ok(if added { StatusCode::CREATED } else { StatusCode::OK })
}

async fn join_community(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    add_self(&state, &user, &id, Relation::Participating)
}

async fn follow_community(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    add_self(&state, &user, &id, Relation::Following)
}

fn add_self(
    state: &AppState,
    user: &CurrentUser,
    raw_id: &str,
    relation: Relation,
) -> AppResult<StatusCode> {
    let id = parse_id(raw_id)?;
    let conn = state.db.get()?;
    community::require(&conn, id)?;

    let added = membership::add_member(&conn, relation, id, user.id())?;
    tracing::info!(community_id = id, user_id = user.id(), ?relation, added, "Added member");
    Ok(if added { StatusCode::CREATED } else { StatusCode::OK })
}

async fn add_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<TagParams>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TagView>)> {
    let id = parse_id(&id)?;
    let Json(params) = body?;
    let content = required(params.content, "content")?;

    let conn = state.db.get()?;
    community::require(&conn, id)?;
    membership::require_host(&conn, user.id(), id)?;

    let tag = tags::add(&conn, id, &content)?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

async fn set_regular_cypher(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<RegularCypherParams>, JsonRejection>,
) -> AppResult<Json<RegularCypherView>> {
    let id = parse_id(&id)?;
    let Json(params) = body?;
    let input = params.validate()?;

    let conn = state.db.get()?;
    community::require(&conn, id)?;
    membership::require_host(&conn, user.id(), id)?;

    let saved = regular_cypher::upsert(&conn, id, &input)?;
    Ok(Json(saved.into()))
}

async fn my_communities(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<SinceIdQuery>, QueryRejection>,
) -> AppResult<Json<CommunityPage>> {
    list_communities(&state, &user, query?.0, Relation::Participating)
}

async fn hosting_communities(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<SinceIdQuery>, QueryRejection>,
) -> AppResult<Json<CommunityPage>> {
    list_communities(&state, &user, query?.0, Relation::Hosting)
}

async fn following_communities(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<SinceIdQuery>, QueryRejection>,
) -> AppResult<Json<CommunityPage>> {
    list_communities(&state, &user, query?.0, Relation::Following)
}

fn list_communities(
    state: &AppState,
    user: &CurrentUser,
    query: SinceIdQuery,
    relation: Relation,
) -> AppResult<Json<CommunityPage>> {
    let since_id = since_id(query.since_id.as_deref())?;
    let settings = &state.config.pagination;

    let conn = state.db.get()?;
    let page = pagination::page(&conn, relation, user.id(), since_id, settings.page_size)?;

    let now = Utc::now();
    let communities = page
        .communities
        .into_iter()
        .map(|c| {
            let next = cypher::upcoming(&conn, c.id, now, Some(settings.next_cyphers))?;
            Ok(CommunitySummary::new(c, next))
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(CommunityPage {
        communities,
        total: page.total,
    }))
}
