use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub home: String,
    pub bio: String,
    pub type_flag: i64,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub const COLUMNS: &'static str = "u.id, u.name, u.home, u.bio, u.type_flag, \
        u.twitter_account, u.facebook_account, u.google_account, u.thumbnail, \
        u.created_at, u.updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            home: row.get(2)?,
            bio: row.get(3)?,
            type_flag: row.get(4)?,
            twitter_account: row.get(5)?,
            facebook_account: row.get(6)?,
            google_account: row.get(7)?,
            thumbnail: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub home: String,
    pub bio: String,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Community {
    pub const COLUMNS: &'static str = "c.id, c.name, c.home, c.bio, \
        c.twitter_account, c.facebook_account, c.google_account, c.thumbnail, \
        c.created_at, c.updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            home: row.get(2)?,
            bio: row.get(3)?,
            twitter_account: row.get(4)?,
            facebook_account: row.get(5)?,
            google_account: row.get(6)?,
            thumbnail: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cypher {
    pub id: i64,
    pub community_id: i64,
    pub host_id: i64,
    pub serial_num: i64,
    pub name: String,
    pub info: String,
    pub cypher_from: String,
    pub cypher_to: String,
    pub place: String,
    pub capacity: Option<i64>,
    pub created_at: String,
}

impl Cypher {
    pub const COLUMNS: &'static str = "y.id, y.community_id, y.host_id, y.serial_num, \
        y.name, y.info, y.cypher_from, y.cypher_to, y.place, y.capacity, y.created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            community_id: row.get(1)?,
            host_id: row.get(2)?,
            serial_num: row.get(3)?,
            name: row.get(4)?,
            info: row.get(5)?,
            cypher_from: row.get(6)?,
            cypher_to: row.get(7)?,
            place: row.get(8)?,
            capacity: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityTag {
    pub id: i64,
    pub community_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularCypher {
    pub id: i64,
    pub community_id: i64,
    pub place: String,
    pub cypher_day: i64,
    pub cypher_from: String,
    pub cypher_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub cypher_id: i64,
    pub content: Option<String>,
    pub directory_url: Option<String>,
    pub created_at: String,
}

impl Post {
    pub const COLUMNS: &'static str =
        "p.id, p.user_id, p.cypher_id, p.content, p.directory_url, p.created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            cypher_id: row.get(2)?,
            content: row.get(3)?,
            directory_url: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
