use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Deserialize;

use crate::auth::api_keys;
use crate::db::models::{ApiKey, User};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::storage::{reserve_after_commit, thumbnail_file_name, ThumbnailOwner, ThumbnailStore};
use crate::validation::{optional, required};

#[derive(Debug, Default, Deserialize)]
pub struct UserParams {
    pub name: Option<String>,
    pub home: Option<String>,
    pub bio: Option<String>,
    pub type_flag: Option<i64>,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: String,
    pub home: String,
    pub bio: String,
    pub type_flag: i64,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail: Option<String>,
}

impl UserParams {
    pub fn validate(self) -> AppResult<UserInput> {
        let name = required(self.name, "name")?;
        let home = required(self.home, "home")?;
        let bio = required(self.bio, "bio")?;
        let type_flag = self.type_flag.unwrap_or(0);
        if type_flag < 0 {
            return Err(AppError::BadRequest(format!(
                "type_flag must not be negative, got {type_flag}"
            )));
        }
        let thumbnail = optional(self.thumbnail);
        if let Some(source) = &thumbnail {
            thumbnail_file_name(source)?;
        }

        Ok(UserInput {
            name,
            home,
            bio,
            type_flag,
            twitter_account: optional(self.twitter_account),
            facebook_account: optional(self.facebook_account),
            google_account: optional(self.google_account),
            thumbnail,
        })
    }
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users u WHERE u.id = ?1", User::COLUMNS),
        params![id],
        User::from_row,
    )
    .optional()
}

pub fn require(conn: &Connection, id: i64) -> AppResult<User> {
    find(conn, id)?.ok_or(AppError::NotFound)
}

/// Registers a user and issues their first access token.
pub fn create(
    conn: &mut Connection,
    input: &UserInput,
    thumbnails: &dyn ThumbnailStore,
) -> AppResult<(User, ApiKey)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO users
            (name, home, bio, type_flag, twitter_account, facebook_account, google_account)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.name,
            input.home,
            input.bio,
            input.type_flag,
            input.twitter_account,
            input.facebook_account,
            input.google_account
        ],
    )?;
    let id = tx.last_insert_rowid();

    if let Some(source) = &input.thumbnail {
        let url = thumbnails.public_url(ThumbnailOwner::User, id, source)?;
        tx.execute(
            "UPDATE users SET thumbnail = ?1 WHERE id = ?2",
            params![url, id],
        )?;
    }

    let key = api_keys::issue(&tx, id)?;
    let user = require(&tx, id)?;
    tx.commit()?;
    if input.thumbnail.is_some() {
        reserve_after_commit(thumbnails, ThumbnailOwner::User, id);
    }

    tracing::info!(user_id = id, "Registered user");
    Ok((user, key))
}

/// Updates a profile. Users may only edit themselves.
pub fn update(
    conn: &mut Connection,
    id: i64,
    caller_id: i64,
    input: &UserInput,
    thumbnails: &dyn ThumbnailStore,
) -> AppResult<User> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    require(&tx, id)?;
    if id != caller_id {
        return Err(AppError::Conflict(format!(
            "user {caller_id} cannot edit user {id}"
        )));
    }

    tx.execute(
        "UPDATE users
         SET name = ?1, home = ?2, bio = ?3, type_flag = ?4, twitter_account = ?5,
             facebook_account = ?6, google_account = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            input.name,
            input.home,
            input.bio,
            input.type_flag,
            input.twitter_account,
            input.facebook_account,
            input.google_account,
            now_timestamp(),
            id
        ],
    )?;

    if let Some(source) = &input.thumbnail {
        let url = thumbnails.public_url(ThumbnailOwner::User, id, source)?;
        tx.execute(
            "UPDATE users SET thumbnail = ?1 WHERE id = ?2",
            params![url, id],
        )?;
    }

    let user = require(&tx, id)?;
    tx.commit()?;
    if input.thumbnail.is_some() {
        reserve_after_commit(thumbnails, ThumbnailOwner::User, id);
    }

    tracing::info!(user_id = id, "Updated user");
    Ok(user)
}
