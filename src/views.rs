// JSON shapes returned by the API.

use serde::Serialize;

use crate::community::CommunityDetail;
use crate::db::models::{ApiKey, Community, CommunityTag, Cypher, Post, RegularCypher, User};

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub thumbnail_url: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            thumbnail_url: user.thumbnail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub home: String,
    pub bio: String,
    pub type_flag: i64,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            home: user.home,
            bio: user.bio,
            type_flag: user.type_flag,
            twitter_account: user.twitter_account,
            facebook_account: user.facebook_account,
            google_account: user.google_account,
            thumbnail_url: user.thumbnail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub user: UserView,
    pub access_token: String,
}

impl RegisteredUser {
    pub fn new(user: User, key: ApiKey) -> Self {
        Self {
            user: user.into(),
            access_token: key.access_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CypherView {
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
}

impl From<Cypher> for CypherView {
    fn from(c: Cypher) -> Self {
        Self {
            id: c.id,
            community_id: c.community_id,
            host_id: c.host_id,
            serial_num: c.serial_num,
            name: c.name,
            info: c.info,
            cypher_from: c.cypher_from,
            cypher_to: c.cypher_to,
            place: c.place,
            capacity: c.capacity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CypherEnvelope {
    pub cypher: CypherView,
}

#[derive(Debug, Serialize)]
pub struct TagView {
    pub id: i64,
    pub content: String,
}

impl From<CommunityTag> for TagView {
    fn from(tag: CommunityTag) -> Self {
        Self {
            id: tag.id,
            content: tag.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegularCypherView {
    pub place: String,
    pub cypher_day: i64,
    pub cypher_from: String,
    pub cypher_to: String,
}

impl From<RegularCypher> for RegularCypherView {
    fn from(r: RegularCypher) -> Self {
        Self {
            place: r.place,
            cypher_day: r.cypher_day,
            cypher_from: r.cypher_from,
            cypher_to: r.cypher_to,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommunityView {
    pub id: i64,
    pub name: String,
    pub home: String,
    pub bio: String,
    pub twitter_account: Option<String>,
    pub facebook_account: Option<String>,
    pub google_account: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<TagView>,
    pub hosts: Vec<UserSummary>,
    pub members: Vec<UserSummary>,
    pub regular_cypher: Option<RegularCypherView>,
    pub past_cyphers: Vec<CypherView>,
    pub future_cyphers: Vec<CypherView>,
}

impl From<CommunityDetail> for CommunityView {
    fn from(d: CommunityDetail) -> Self {
        let c = d.community;
        Self {
            id: c.id,
            name: c.name,
            home: c.home,
            bio: c.bio,
            twitter_account: c.twitter_account,
            facebook_account: c.facebook_account,
            google_account: c.google_account,
            thumbnail_url: c.thumbnail,
            tags: d.tags.into_iter().map(Into::into).collect(),
            hosts: d.hosts.into_iter().map(Into::into).collect(),
            members: d.members.into_iter().map(Into::into).collect(),
            regular_cypher: d.regular_cypher.map(Into::into),
            past_cyphers: d.past_cyphers.into_iter().map(Into::into).collect(),
            future_cyphers: d.future_cyphers.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommunityEnvelope {
    pub community: CommunityView,
}

/// One entry of a community listing.
#[derive(Debug, Serialize)]
pub struct CommunitySummary {
    pub id: i64,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub next_cyphers: Vec<CypherView>,
}

impl CommunitySummary {
    pub fn new(community: Community, next_cyphers: Vec<Cypher>) -> Self {
        Self {
            id: community.id,
            name: community.name,
            thumbnail_url: community.thumbnail,
            next_cyphers: next_cyphers.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommunityPage {
    pub communities: Vec<CommunitySummary>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i64,
    pub user_id: i64,
    pub cypher_id: i64,
    pub content: Option<String>,
    pub directory_url: Option<String>,
    pub created_at: String,
}

impl From<Post> for PostView {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            cypher_id: p.cypher_id,
            content: p.content,
            directory_url: p.directory_url,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostEnvelope {
    pub post: PostView,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<PostView>,
}
