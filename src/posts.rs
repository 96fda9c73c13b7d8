use rusqlite::{params, Connection};
use serde::Deserialize;

use crate::cypher;
use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::validation::optional;

#[derive(Debug, Default, Deserialize)]
pub struct PostParams {
    pub content: Option<String>,
    pub cypher_id: Option<i64>,
    pub directory_url: Option<String>,
}

pub fn create(conn: &Connection, user_id: i64, params: PostParams) -> AppResult<Post> {
    let cypher_id = params
        .cypher_id
        .ok_or_else(|| AppError::BadRequest("cypher_id is required".into()))?;
    let content = optional(params.content);
    let directory_url = optional(params.directory_url);
    if content.is_none() && directory_url.is_none() {
        return Err(AppError::BadRequest(
            "a post needs content or a directory_url".into(),
        ));
    }

    if cypher::find(conn, cypher_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    conn.execute(
        "INSERT INTO posts (user_id, cypher_id, content, directory_url) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, cypher_id, content, directory_url],
    )?;
    let id = conn.last_insert_rowid();

    let post = conn.query_row(
        &format!("SELECT {} FROM posts p WHERE p.id = ?1", Post::COLUMNS),
        params![id],
        Post::from_row,
    )?;
    tracing::info!(post_id = id, user_id, cypher_id, "Created post");
    Ok(post)
}

/// A user's posts, newest first. `since_id = 0` starts at the newest; any
/// other cursor continues with strictly older posts.
pub fn list_by_user(
    conn: &Connection,
    user_id: i64,
    since_id: i64,
    limit: u32,
) -> rusqlite::Result<Vec<Post>> {
    let upper = if since_id == 0 { i64::MAX } else { since_id };
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts p
         WHERE p.user_id = ?1 AND p.id < ?2
         ORDER BY p.id DESC
         LIMIT ?3",
        Post::COLUMNS
    ))?;
    let posts = stmt
        .query_map(params![user_id, upper, limit], Post::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}
