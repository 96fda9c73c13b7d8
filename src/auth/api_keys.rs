use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{ApiKey, User};

/// Header carrying the caller's access token.
pub const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Issue a fresh access token for a user.
pub fn issue(conn: &Connection, user_id: i64) -> rusqlite::Result<ApiKey> {
    let token = generate_token();
    conn.execute(
        "INSERT INTO api_keys (user_id, access_token) VALUES (?1, ?2)",
        params![user_id, token],
    )?;
    let id = conn.last_insert_rowid();

    conn.query_row(
        "SELECT id, user_id, access_token, created_at FROM api_keys WHERE id = ?1",
        params![id],
        |row| {
            Ok(ApiKey {
                id: row.get(0)?,
                user_id: row.get(1)?,
                access_token: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
}

/// Resolve an access token to the user owning it.
pub fn resolve(conn: &Connection, token: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM api_keys k JOIN users u ON u.id = k.user_id \
             WHERE k.access_token = ?1",
            User::COLUMNS
        ),
        params![token],
        User::from_row,
    )
    .optional()
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
