// The single recurring-schedule template a community may carry.

use chrono::NaiveTime;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::db::models::RegularCypher;
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::validation::required;

#[derive(Debug, Default, Deserialize)]
pub struct RegularCypherParams {
    pub place: Option<String>,
    /// 0 = Sunday .. 6 = Saturday
    pub cypher_day: Option<i64>,
    pub cypher_from: Option<String>,
    pub cypher_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegularCypherInput {
    pub place: String,
    pub cypher_day: i64,
    pub cypher_from: String,
    pub cypher_to: String,
}

impl RegularCypherParams {
    pub fn validate(self) -> AppResult<RegularCypherInput> {
        let place = required(self.place, "place")?;
        let cypher_day = self
            .cypher_day
            .ok_or_else(|| AppError::BadRequest("cypher_day is required".into()))?;
        if !(0..=6).contains(&cypher_day) {
            return Err(AppError::BadRequest(format!(
                "cypher_day must be between 0 and 6, got {cypher_day}"
            )));
        }
        let cypher_from = time_of_day(required(self.cypher_from, "cypher_from")?, "cypher_from")?;
        let cypher_to = time_of_day(required(self.cypher_to, "cypher_to")?, "cypher_to")?;

        Ok(RegularCypherInput {
            place,
            cypher_day,
            cypher_from,
            cypher_to,
        })
    }
}

/// Normalises "H:MM" / "HH:MM[:SS]" to "HH:MM".
fn time_of_day(raw: String, field: &str) -> AppResult<String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppError::BadRequest(format!("{field} must be a time of day: {raw}")))
}

pub fn find(conn: &Connection, community_id: i64) -> rusqlite::Result<Option<RegularCypher>> {
    conn.query_row(
        "SELECT id, community_id, place, cypher_day, cypher_from, cypher_to
         FROM regular_cyphers WHERE community_id = ?1",
        params![community_id],
        |row| {
            Ok(RegularCypher {
                id: row.get(0)?,
                community_id: row.get(1)?,
                place: row.get(2)?,
                cypher_day: row.get(3)?,
                cypher_from: row.get(4)?,
                cypher_to: row.get(5)?,
            })
        },
    )
    .optional()
}

/// Inserts or replaces the community's template.
pub fn upsert(
    conn: &Connection,
    community_id: i64,
    input: &RegularCypherInput,
) -> rusqlite::Result<RegularCypher> {
    conn.execute(
        "INSERT INTO regular_cyphers (community_id, place, cypher_day, cypher_from, cypher_to)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(community_id) DO UPDATE SET
           place = excluded.place,
           cypher_day = excluded.cypher_day,
           cypher_from = excluded.cypher_from,
           cypher_to = excluded.cypher_to,
           updated_at = ?6",
        params![
            community_id,
            input.place,
            input.cypher_day,
            input.cypher_from,
            input.cypher_to,
            now_timestamp()
        ],
    )?;
    find(conn, community_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}
