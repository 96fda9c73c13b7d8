use rusqlite::{params, Connection};

use crate::db::models::CommunityTag;

pub fn list(conn: &Connection, community_id: i64) -> rusqlite::Result<Vec<CommunityTag>> {
    let mut stmt = conn.prepare(
        "SELECT id, community_id, content FROM community_tags
         WHERE community_id = ?1 ORDER BY id ASC",
    )?;
    let tags = stmt
        .query_map(params![community_id], |row| {
            Ok(CommunityTag {
                id: row.get(0)?,
                community_id: row.get(1)?,
                content: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn add(conn: &Connection, community_id: i64, content: &str) -> rusqlite::Result<CommunityTag> {
    conn.execute(
        "INSERT INTO community_tags (community_id, content) VALUES (?1, ?2)",
        params![community_id, content],
    )?;
    Ok(CommunityTag {
        id: conn.last_insert_rowid(),
        community_id,
        content: content.to_string(),
    })
}
