// Keyset pages of the communities a user hosts, participates in or follows.
//
// Ordering differs by relation:
// - participating: membership time descending, then community id ascending
// - hosting / following: community id ascending
//
// The cursor is a community id. A page holds the entries strictly after the
// cursor's position; when the cursor is not in the user's sequence the page
// starts at the first entry whose id is greater than the cursor.

use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::membership::Relation;
use crate::db::models::Community;

#[derive(Debug)]
pub struct Page {
    pub communities: Vec<Community>,
    /// Every community the user holds in the relation, regardless of cursor.
    pub total: i64,
}

pub fn page(
    conn: &Connection,
    relation: Relation,
    user_id: i64,
    since_id: i64,
    limit: u32,
) -> rusqlite::Result<Page> {
    let total = count(conn, relation, user_id)?;
    let communities = match relation {
        Relation::Participating => by_join_time(conn, user_id, since_id, limit)?,
        Relation::Hosting | Relation::Following => {
            by_id(conn, relation, user_id, since_id, limit)?
        }
    };
    Ok(Page { communities, total })
}

pub fn count(conn: &Connection, relation: Relation, user_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            relation.table(),
            relation.member_column()
        ),
        params![user_id],
        |row| row.get(0),
    )
}

fn by_id(
    conn: &Connection,
    relation: Relation,
    user_id: i64,
    since_id: i64,
    limit: u32,
) -> rusqlite::Result<Vec<Community>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM communities c
         JOIN {} m ON m.community_id = c.id
         WHERE m.{} = ?1 AND c.id > ?2
         ORDER BY c.id ASC
         LIMIT ?3",
        Community::COLUMNS,
        relation.table(),
        relation.member_column()
    ))?;
    let rows = stmt
        .query_map(params![user_id, since_id, limit], Community::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn by_join_time(
    conn: &Connection,
    user_id: i64,
    since_id: i64,
    limit: u32,
) -> rusqlite::Result<Vec<Community>> {
    let cursor_joined_at: Option<String> = if since_id == 0 {
        None
    } else {
        conn.query_row(
            "SELECT created_at FROM community_participants
             WHERE participant_id = ?1 AND community_id = ?2",
            params![user_id, since_id],
            |row| row.get(0),
        )
        .optional()?
    };

    let base = format!(
        "SELECT {} FROM communities c
         JOIN community_participants m ON m.community_id = c.id
         WHERE m.participant_id = ?1",
        Community::COLUMNS
    );
    let order = "ORDER BY m.created_at DESC, c.id ASC";

    let rows = match cursor_joined_at {
        Some(joined_at) => {
            let mut stmt = conn.prepare(&format!(
                "{base} AND (m.created_at < ?2 OR (m.created_at = ?2 AND c.id > ?3))
                 {order} LIMIT ?4"
            ))?;
            let rows = stmt
                .query_map(params![user_id, joined_at, since_id, limit], Community::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!("{base} AND c.id > ?2 {order} LIMIT ?3"))?;
            let rows = stmt
                .query_map(params![user_id, since_id, limit], Community::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}
