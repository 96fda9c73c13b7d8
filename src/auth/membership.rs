// Host / participant / follower relations between users and communities.
//
// The three roles are independent sets backed by separate join tables; a
// user may hold any combination of them on the same community.

use rusqlite::{params, Connection};

use crate::db::models::User;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Hosting,
    Participating,
    Following,
}

impl Relation {
    pub const ALL: [Relation; 3] = [
        Relation::Hosting,
        Relation::Participating,
        Relation::Following,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Relation::Hosting => "community_hosts",
            Relation::Participating => "community_participants",
            Relation::Following => "community_followers",
        }
    }

    /// Column holding the user id in the join table.
    pub fn member_column(self) -> &'static str {
        match self {
            Relation::Hosting => "host_id",
            Relation::Participating => "participant_id",
            Relation::Following => "follower_id",
        }
    }
}

pub fn is_member(
    conn: &Connection,
    relation: Relation,
    user_id: i64,
    community_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) > 0 FROM {} WHERE community_id = ?1 AND {} = ?2",
            relation.table(),
            relation.member_column()
        ),
        params![community_id, user_id],
        |row| row.get(0),
    )
}

pub fn is_host(conn: &Connection, user_id: i64, community_id: i64) -> rusqlite::Result<bool> {
    is_member(conn, Relation::Hosting, user_id, community_id)
}

pub fn is_participant(
    conn: &Connection,
    user_id: i64,
    community_id: i64,
) -> rusqlite::Result<bool> {
    is_member(conn, Relation::Participating, user_id, community_id)
}

pub fn is_follower(conn: &Connection, user_id: i64, community_id: i64) -> rusqlite::Result<bool> {
    is_member(conn, Relation::Following, user_id, community_id)
}

/// Fails with a conflict when `user_id` does not host `community_id`.
///
/// Callers check that the community exists first, so a conflict always means
/// "exists but not yours".
pub fn require_host(conn: &Connection, user_id: i64, community_id: i64) -> AppResult<()> {
    if is_host(conn, user_id, community_id)? {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "user {user_id} is not a host of community {community_id}"
        )))
    }
}

/// Adds a user to a relation. Returns false when the row already existed.
pub fn add_member(
    conn: &Connection,
    relation: Relation,
    community_id: i64,
    user_id: i64,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (community_id, {}) VALUES (?1, ?2)",
            relation.table(),
            relation.member_column()
        ),
        params![community_id, user_id],
    )?;
    Ok(inserted > 0)
}

/// Members of a community in the order they joined.
pub fn members(
    conn: &Connection,
    relation: Relation,
    community_id: i64,
) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} m JOIN users u ON u.id = m.{} \
         WHERE m.community_id = ?1 ORDER BY m.created_at ASC, m.id ASC",
        User::COLUMNS,
        relation.table(),
        relation.member_column()
    ))?;
    let users = stmt
        .query_map(params![community_id], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
