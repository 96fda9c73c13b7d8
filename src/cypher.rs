// Scheduled events ("cyphers") owned by a community.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Deserialize;

use crate::auth::membership;
use crate::community;
use crate::db::format_timestamp;
use crate::db::models::Cypher;
use crate::error::{AppError, AppResult};
use crate::validation::required;

#[derive(Debug, Default, Deserialize)]
pub struct CypherParams {
    pub name: Option<String>,
    pub info: Option<String>,
    pub cypher_from: Option<String>,
    pub cypher_to: Option<String>,
    pub place: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CypherInput {
    pub name: String,
    pub info: String,
    pub cypher_from: DateTime<Utc>,
    pub cypher_to: DateTime<Utc>,
    pub place: String,
    pub capacity: Option<i64>,
}

impl CypherParams {
    pub fn validate(self) -> AppResult<CypherInput> {
        let name = required(self.name, "name")?;
        let info = required(self.info, "info")?;
        let cypher_from = instant(required(self.cypher_from, "cypher_from")?, "cypher_from")?;
        let cypher_to = instant(required(self.cypher_to, "cypher_to")?, "cypher_to")?;
        let place = required(self.place, "place")?;

        if cypher_to < cypher_from {
            return Err(AppError::BadRequest(
                "cypher_to must not be before cypher_from".into(),
            ));
        }
        if let Some(capacity) = self.capacity {
            if capacity < 0 {
                return Err(AppError::BadRequest(format!(
                    "capacity must not be negative, got {capacity}"
                )));
            }
        }

        Ok(CypherInput {
            name,
            info,
            cypher_from,
            cypher_to,
            place,
            capacity: self.capacity,
        })
    }
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS` read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn instant(raw: String, field: &str) -> AppResult<DateTime<Utc>> {
    parse_instant(&raw)
        .ok_or_else(|| AppError::BadRequest(format!("{field} is not a valid date-time: {raw}")))
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Cypher>> {
    conn.query_row(
        &format!("SELECT {} FROM cyphers y WHERE y.id = ?1", Cypher::COLUMNS),
        params![id],
        Cypher::from_row,
    )
    .optional()
}

/// Creates a cypher hosted by `host_id`.
///
/// The serial number is the community's cypher count plus one. Counting and
/// inserting share one immediate transaction, so concurrent creations under
/// the same community are serialised and never reuse a number.
pub fn create(
    conn: &mut Connection,
    community_id: i64,
    host_id: i64,
    input: &CypherInput,
) -> AppResult<Cypher> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    community::require(&tx, community_id)?;
    membership::require_host(&tx, host_id, community_id)?;

    let existing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM cyphers WHERE community_id = ?1",
        params![community_id],
        |row| row.get(0),
    )?;
    let serial_num = existing + 1;

    tx.execute(
        "INSERT INTO cyphers
            (community_id, host_id, serial_num, name, info, cypher_from, cypher_to, place, capacity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            community_id,
            host_id,
            serial_num,
            input.name,
            input.info,
            format_timestamp(&input.cypher_from),
            format_timestamp(&input.cypher_to),
            input.place,
            input.capacity
        ],
    )?;
    let id = tx.last_insert_rowid();
    let cypher = find(&tx, id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;

    tracing::info!(cypher_id = id, community_id, serial_num, "Created cypher");
    Ok(cypher)
}

/// Cyphers that started before `now`, most recent first.
pub fn past(conn: &Connection, community_id: i64, now: DateTime<Utc>) -> rusqlite::Result<Vec<Cypher>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cyphers y
         WHERE y.community_id = ?1 AND y.cypher_from < ?2
         ORDER BY y.cypher_from DESC, y.id DESC",
        Cypher::COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![community_id, format_timestamp(&now)], Cypher::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Cyphers starting at or after `now`, soonest first.
pub fn upcoming(
    conn: &Connection,
    community_id: i64,
    now: DateTime<Utc>,
    limit: Option<u32>,
) -> rusqlite::Result<Vec<Cypher>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map(i64::from).unwrap_or(-1);
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cyphers y
         WHERE y.community_id = ?1 AND y.cypher_from >= ?2
         ORDER BY y.cypher_from ASC, y.id ASC
         LIMIT ?3",
        Cypher::COLUMNS
    ))?;
    let rows = stmt
        .query_map(
            params![community_id, format_timestamp(&now), limit],
            Cypher::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
