// Community records: validation, persistence and cascade deletion.

pub mod pagination;
pub mod regular_cypher;
pub mod tags;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Deserialize;

use crate::auth::membership::{self, Relation};
use crate::cypher;
use crate::db::models::{Community, CommunityTag, Cypher, RegularCypher, User};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::storage::{reserve_after_commit, thumbnail_file_name, ThumbnailOwner, ThumbnailStore};
use crate::validation::{optional, required};

/// Raw request body for create and update.
#[derive(Debug, Default, Deserialize)]
pub struct CommunityParams {
    pub name: Option<String>,
    pub home: Option<String>,
    pub bio: Option<String>,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommunityInput {
    pub name: String,
    pub home: String,
    pub bio: String,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail: Option<String>,
}

impl CommunityParams {
    pub fn validate(self) -> AppResult<CommunityInput> {
        let name = required(self.name, "name")?;
        let home = required(self.home, "home")?;
        let bio = required(self.bio, "bio")?;
        let thumbnail = optional(self.thumbnail);
        if let Some(source) = &thumbnail {
            thumbnail_file_name(source)?;
        }

        Ok(CommunityInput {
            name,
            home,
            bio,
            twitter_account: optional(self.twitter_account),
            facebook_account: optional(self.facebook_account),
            google_account: optional(self.google_account),
            thumbnail,
        })
    }
}

/// Everything the detail endpoint shows about one community.
#[derive(Debug)]
pub struct CommunityDetail {
    pub community: Community,
    pub tags: Vec<CommunityTag>,
    pub hosts: Vec<User>,
    pub members: Vec<User>,
    pub regular_cypher: Option<RegularCypher>,
    pub past_cyphers: Vec<Cypher>,
    pub future_cyphers: Vec<Cypher>,
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Community>> {
    conn.query_row(
        &format!("SELECT {} FROM communities c WHERE c.id = ?1", Community::COLUMNS),
        params![id],
        Community::from_row,
    )
    .optional()
}

/// Like [`find`], but a missing community is a 404.
pub fn require(conn: &Connection, id: i64) -> AppResult<Community> {
    find(conn, id)?.ok_or(AppError::NotFound)
}

fn name_taken(conn: &Connection, name: &str, except_id: Option<i64>) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM communities WHERE name = ?1 AND id != ?2",
        params![name, except_id.unwrap_or(0)],
        |row| row.get(0),
    )
}

/// Creates a community with `host_id` as its first host.
pub fn create(
    conn: &mut Connection,
    host_id: i64,
    input: &CommunityInput,
    thumbnails: &dyn ThumbnailStore,
) -> AppResult<Community> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if name_taken(&tx, &input.name, None)? {
        return Err(AppError::BadRequest(format!(
            "name has already been taken: {}",
            input.name
        )));
    }

    tx.execute(
        "INSERT INTO communities
            (name, home, bio, twitter_account, facebook_account, google_account)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            input.name,
            input.home,
            input.bio,
            input.twitter_account,
            input.facebook_account,
            input.google_account
        ],
    )?;
    let id = tx.last_insert_rowid();

    membership::add_member(&tx, Relation::Hosting, id, host_id)?;

    if let Some(source) = &input.thumbnail {
        let url = thumbnails.public_url(ThumbnailOwner::Community, id, source)?;
        tx.execute(
            "UPDATE communities SET thumbnail = ?1 WHERE id = ?2",
            params![url, id],
        )?;
    }

    let community = require(&tx, id)?;
    tx.commit()?;
    if input.thumbnail.is_some() {
        reserve_after_commit(thumbnails, ThumbnailOwner::Community, id);
    }

    tracing::info!(community_id = id, host_id, "Created community");
    Ok(community)
}

/// Replaces a community's editable fields. Only hosts may update.
///
/// Checks run in order: existence (404), host role (409), name clash (400).
/// A missing thumbnail keeps the current one.
pub fn update(
    conn: &mut Connection,
    id: i64,
    user_id: i64,
    input: &CommunityInput,
    thumbnails: &dyn ThumbnailStore,
) -> AppResult<Community> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    require(&tx, id)?;
    membership::require_host(&tx, user_id, id)?;

    if name_taken(&tx, &input.name, Some(id))? {
        return Err(AppError::BadRequest(format!(
            "name has already been taken: {}",
            input.name
        )));
    }

    tx.execute(
        "UPDATE communities
         SET name = ?1, home = ?2, bio = ?3, twitter_account = ?4,
             facebook_account = ?5, google_account = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            input.name,
            input.home,
            input.bio,
            input.twitter_account,
            input.facebook_account,
            input.google_account,
            now_timestamp(),
            id
        ],
    )?;

    if let Some(source) = &input.thumbnail {
        let url = thumbnails.public_url(ThumbnailOwner::Community, id, source)?;
        tx.execute(
            "UPDATE communities SET thumbnail = ?1 WHERE id = ?2",
            params![url, id],
        )?;
    }

    let community = require(&tx, id)?;
    tx.commit()?;
    if input.thumbnail.is_some() {
        reserve_after_commit(thumbnails, ThumbnailOwner::Community, id);
    }

    tracing::info!(community_id = id, user_id, "Updated community");
    Ok(community)
}

/// Deletes a community and every row scoped to it, atomically.
pub fn delete(conn: &mut Connection, id: i64, user_id: i64) -> AppResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    require(&tx, id)?;
    membership::require_host(&tx, user_id, id)?;

    for relation in Relation::ALL {
        tx.execute(
            &format!("DELETE FROM {} WHERE community_id = ?1", relation.table()),
            params![id],
        )?;
    }
    for table in ["cyphers", "community_tags", "regular_cyphers"] {
        tx.execute(
            &format!("DELETE FROM {table} WHERE community_id = ?1"),
            params![id],
        )?;
    }
    tx.execute("DELETE FROM communities WHERE id = ?1", params![id])?;
    tx.commit()?;

    tracing::info!(community_id = id, user_id, "Deleted community");
    Ok(())
}

/// Loads the full detail view; cyphers are split around `now`.
pub fn load_detail(conn: &Connection, id: i64, now: DateTime<Utc>) -> AppResult<CommunityDetail> {
    let community = require(conn, id)?;

    Ok(CommunityDetail {
        tags: tags::list(conn, id)?,
        hosts: membership::members(conn, Relation::Hosting, id)?,
        members: membership::members(conn, Relation::Participating, id)?,
        regular_cypher: regular_cypher::find(conn, id)?,
        past_cyphers: cypher::past(conn, id, now)?,
        future_cyphers: cypher::upcoming(conn, id, now, None)?,
        community,
    })
}
