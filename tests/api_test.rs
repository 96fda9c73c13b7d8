// End-to-end tests for the REST API.
//
// Each test boots the full router on an ephemeral port backed by a fresh
// database in a temporary directory, then talks to it over HTTP.

use std::sync::Arc;

use chrono::{Duration, Utc};
use cypher_hub::config::Config;
use cypher_hub::db;
use cypher_hub::routes;
use cypher_hub::state::AppState;
use cypher_hub::storage::LocalThumbnailStore;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestServer {
    base: String,
    client: Client,
    _dir: TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = db::create_pool(&dir.path().join("test.db")).expect("Failed to create pool");
        db::run_migrations(&pool).expect("Failed to run migrations");

        let mut config = Config::default();
        config.resolve_paths(dir.path());
        let thumbnails = LocalThumbnailStore::new(config.uploads_path(), "/uploads");
        let state = AppState {
            db: pool,
            config,
            thumbnails: Arc::new(thumbnails),
        };

        let app = routes::build_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base: format!("http://{}/api/v1", addr),
            client: Client::new(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, token: &str, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("Access-Token", token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .header("Access-Token", token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> Response {
        self.client
            .put(self.url(path))
            .header("Access-Token", token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, token: &str, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .header("Access-Token", token)
            .send()
            .await
            .unwrap()
    }

    /// Registers a user and returns `(user_id, access_token)`.
    async fn register(&self, name: &str) -> (i64, String) {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "name": name, "home": "Tokyo", "bio": "mc" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        (
            body["user"]["id"].as_i64().unwrap(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_community(&self, token: &str, name: &str) -> i64 {
        let response = self
            .post(token, "/communities", community_body(name))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["community"]["id"].as_i64().unwrap()
    }
}

fn community_body(name: &str) -> Value {
    json!({
        "name": name,
        "home": "Shibuya, Tokyo",
        "bio": "Weekly freestyle session",
        "twitter_account": "shibuya_cypher",
        "thumbnail": "https://example.com/images/ufo_ushi.png"
    })
}

fn cypher_body(starts_in_days: i64) -> Value {
    let from = Utc::now() + Duration::days(starts_in_days);
    let to = from + Duration::hours(2);
    json!({
        "name": "Monthly battle",
        "info": "Bring your own beats",
        "cypher_from": from.to_rfc3339(),
        "cypher_to": to.to_rfc3339(),
        "place": "Hachiko exit",
        "capacity": 30
    })
}

async fn json_body(response: Response) -> Value {
    response.json().await.unwrap()
}

// --- Authentication ---

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;
    let id = server.create_community(&token, "Shibuya").await;

    let missing = server
        .client
        .get(server.url(&format!("/communities/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(missing).await["error"], "Unauthorized");

    let unknown = server.get("not-a-token", &format!("/communities/{id}")).await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_token_owner() {
    let server = TestServer::spawn().await;
    let (id, token) = server.register("alice").await;

    let response = server.get(&token, "/me").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["name"], "alice");
}

// --- Community detail ---

#[tokio::test]
async fn detail_distinguishes_malformed_and_missing_ids() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;
    let id = server.create_community(&token, "Shibuya").await;

    let found = server.get(&token, &format!("/communities/{id}")).await;
    assert_eq!(found.status(), StatusCode::OK);
    let body = json_body(found).await;
    assert_eq!(body["community"]["name"], "Shibuya");
    assert_eq!(body["community"]["hosts"][0]["name"], "alice");
    assert!(body["community"]["regular_cypher"].is_null());

    let malformed = server.get(&token, "/communities/abc").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let missing = server.get(&token, "/communities/9999").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;

    let response = server.get(&token, "/no_such_thing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn detail_splits_cyphers_around_now() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;
    let id = server.create_community(&token, "Shibuya").await;

    for days in [-7, 3, 10] {
        let response = server
            .post(&token, &format!("/communities/{id}/cyphers"), cypher_body(days))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = json_body(server.get(&token, &format!("/communities/{id}")).await).await;
    assert_eq!(body["community"]["past_cyphers"].as_array().unwrap().len(), 1);
    let future = body["community"]["future_cyphers"].as_array().unwrap();
    assert_eq!(future.len(), 2);
    assert_eq!(future[0]["serial_num"], 2);
    assert_eq!(future[1]["serial_num"], 3);
}

// --- Community create / update / delete ---

#[tokio::test]
async fn create_echoes_fields_verbatim() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;

    let response = server
        .post(&token, "/communities", community_body("Shibuya"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let community = &body["community"];
    let id = community["id"].as_i64().unwrap();
    assert_eq!(community["home"], "Shibuya, Tokyo");
    assert_eq!(community["bio"], "Weekly freestyle session");
    assert_eq!(community["twitter_account"], "shibuya_cypher");
    assert!(community["facebook_account"].is_null());
    assert_eq!(
        community["thumbnail_url"],
        format!("/uploads/community/{id}/ufo_ushi.png")
    );

    let hosting = json_body(server.get(&token, "/hosting_communities?since_id=0").await).await;
    assert_eq!(hosting["total"], 1);
    assert_eq!(hosting["communities"][0]["id"], id);
}

#[tokio::test]
async fn create_rejects_missing_fields_and_duplicates() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;

    let missing_bio = server
        .post(&token, "/communities", json!({ "name": "Shibuya", "home": "Tokyo" }))
        .await;
    assert_eq!(missing_bio.status(), StatusCode::BAD_REQUEST);

    let not_json = server
        .client
        .post(server.url("/communities"))
        .header("Access-Token", &token)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);

    server.create_community(&token, "Shibuya").await;
    let duplicate = server
        .post(&token, "/communities", community_body("Shibuya"))
        .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_checks_id_body_existence_then_host() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    let id = server.create_community(&alice, "Shibuya").await;
    let path = format!("/communities/{id}");

    let malformed = server.put(&alice, "/communities/x", community_body("Renamed")).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let bad_body = server.put(&alice, &path, json!({ "name": "Renamed" })).await;
    assert_eq!(bad_body.status(), StatusCode::BAD_REQUEST);

    let missing = server
        .put(&alice, "/communities/9999", community_body("Renamed"))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let not_host = server.put(&bob, &path, community_body("Renamed")).await;
    assert_eq!(not_host.status(), StatusCode::CONFLICT);

    let updated = server
        .put(
            &alice,
            &path,
            json!({ "name": "Renamed", "home": "Shinjuku", "bio": "Monthly" }),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = json_body(updated).await;
    assert_eq!(body["community"]["name"], "Renamed");
    assert_eq!(body["community"]["home"], "Shinjuku");
    assert_eq!(
        body["community"]["thumbnail_url"],
        format!("/uploads/community/{id}/ufo_ushi.png")
    );
}

#[tokio::test]
async fn delete_removes_community_and_its_rows() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    let id = server.create_community(&alice, "Shibuya").await;
    let path = format!("/communities/{id}");

    let setup = [
        server
            .post(&alice, &format!("{path}/cyphers"), cypher_body(3))
            .await,
        server
            .post(&alice, &format!("{path}/tags"), json!({ "content": "freestyle" }))
            .await,
        server.post(&bob, &format!("{path}/participants"), json!({})).await,
        server.post(&bob, &format!("{path}/followers"), json!({})).await,
    ];
    for response in &setup {
        assert_eq!(response.status(), StatusCode::CREATED, "{}", response.url());
    }

    let not_host = server.delete(&bob, &path).await;
    assert_eq!(not_host.status(), StatusCode::CONFLICT);

    let deleted = server.delete(&alice, &path).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    assert_eq!(server.get(&alice, &path).await.status(), StatusCode::NOT_FOUND);
    let hosting = json_body(server.get(&alice, "/hosting_communities?since_id=0").await).await;
    assert_eq!(hosting["total"], 0);
    let joined = json_body(server.get(&bob, "/my_communities?since_id=0").await).await;
    assert_eq!(joined["total"], 0);
    let following = json_body(server.get(&bob, "/following_communities?since_id=0").await).await;
    assert_eq!(following["total"], 0);

    let again = server.delete(&alice, &path).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

// --- Listings ---

#[tokio::test]
async fn listings_require_a_valid_since_id() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;

    for path in ["/my_communities", "/hosting_communities", "/following_communities"] {
        let missing = server.get(&token, path).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST, "{path}");

        let bad = server.get(&token, &format!("{path}?since_id=abc")).await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST, "{path}");

        let ok = server.get(&token, &format!("{path}?since_id=0")).await;
        assert_eq!(ok.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn hosting_listing_pages_by_twenty() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;
    for i in 0..25 {
        server.create_community(&token, &format!("Community {i}")).await;
    }

    let first = json_body(server.get(&token, "/hosting_communities?since_id=0").await).await;
    let communities = first["communities"].as_array().unwrap();
    assert_eq!(communities.len(), 20);
    assert_eq!(first["total"], 25);

    let last_id = communities[19]["id"].as_i64().unwrap();
    let second = json_body(
        server
            .get(&token, &format!("/hosting_communities?since_id={last_id}"))
            .await,
    )
    .await;
    let rest = second["communities"].as_array().unwrap();
    assert_eq!(rest.len(), 5);
    assert_eq!(second["total"], 25);
    assert!(rest.iter().all(|c| c["id"].as_i64().unwrap() > last_id));

    let end_id = rest[4]["id"].as_i64().unwrap();
    let beyond = json_body(
        server
            .get(&token, &format!("/hosting_communities?since_id={end_id}"))
            .await,
    )
    .await;
    assert!(beyond["communities"].as_array().unwrap().is_empty());
    assert_eq!(beyond["total"], 25);
}

#[tokio::test]
async fn participating_listing_pages_by_twenty() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    for i in 0..25 {
        let id = server.create_community(&alice, &format!("Community {i}")).await;
        let joined = server
            .post(&bob, &format!("/communities/{id}/participants"), json!({}))
            .await;
        assert_eq!(joined.status(), StatusCode::CREATED);
    }

    let first = json_body(server.get(&bob, "/my_communities?since_id=0").await).await;
    let first_ids: Vec<i64> = first["communities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(first_ids.len(), 20);
    assert_eq!(first["total"], 25);

    let cursor = first_ids[19];
    let second = json_body(
        server
            .get(&bob, &format!("/my_communities?since_id={cursor}"))
            .await,
    )
    .await;
    let second_ids: Vec<i64> = second["communities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(second_ids.len(), 5);
    assert_eq!(second["total"], 25);

    let mut all: Vec<i64> = first_ids.into_iter().chain(second_ids).collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 25, "pages overlap or skip entries");
}

#[tokio::test]
async fn listings_embed_next_cyphers() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("alice").await;
    let id = server.create_community(&token, "Shibuya").await;
    for days in [-1, 1, 2, 3, 4] {
        server
            .post(&token, &format!("/communities/{id}/cyphers"), cypher_body(days))
            .await;
    }

    let page = json_body(server.get(&token, "/hosting_communities?since_id=0").await).await;
    let next = page["communities"][0]["next_cyphers"].as_array().unwrap();
    let serials: Vec<i64> = next.iter().map(|c| c["serial_num"].as_i64().unwrap()).collect();
    assert_eq!(serials, vec![2, 3, 4]);
}

#[tokio::test]
async fn joining_is_idempotent() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    let id = server.create_community(&alice, "Shibuya").await;
    let path = format!("/communities/{id}/participants");

    assert_eq!(server.post(&bob, &path, json!({})).await.status(), StatusCode::CREATED);
    assert_eq!(server.post(&bob, &path, json!({})).await.status(), StatusCode::OK);
    assert_eq!(
        server.post(&bob, "/communities/9999/participants", json!({})).await.status(),
        StatusCode::NOT_FOUND
    );

    let joined = json_body(server.get(&bob, "/my_communities?since_id=0").await).await;
    assert_eq!(joined["total"], 1);
    assert_eq!(joined["communities"][0]["id"], id);
}

#[tokio::test]
async fn hosts_can_add_cohosts() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (bob_id, bob) = server.register("bob").await;
    let (carol_id, carol) = server.register("carol").await;
    let id = server.create_community(&alice, "Shibuya").await;
    let path = format!("/communities/{id}/hosts");

    let not_host = server.post(&carol, &path, json!({ "user_id": carol_id })).await;
    assert_eq!(not_host.status(), StatusCode::CONFLICT);

    let unknown_user = server.post(&alice, &path, json!({ "user_id": 9999 })).await;
    assert_eq!(unknown_user.status(), StatusCode::NOT_FOUND);

    let added = server.post(&alice, &path, json!({ "user_id": bob_id })).await;
    assert_eq!(added.status(), StatusCode::CREATED);

    // The new co-host can now schedule cyphers.
    let cypher = server
        .post(&bob, &format!("/communities/{id}/cyphers"), cypher_body(1))
        .await;
    assert_eq!(cypher.status(), StatusCode::CREATED);
}

// --- Cyphers ---

#[tokio::test]
async fn cypher_serial_numbers_count_up_per_community() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let shibuya = server.create_community(&alice, "Shibuya").await;
    let osaka = server.create_community(&alice, "Osaka").await;

    let mut serials = Vec::new();
    for _ in 0..2 {
        let response = server
            .post(&alice, &format!("/communities/{shibuya}/cyphers"), cypher_body(5))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["cypher"]["community_id"], shibuya);
        assert_eq!(body["cypher"]["capacity"], 30);
        serials.push(body["cypher"]["serial_num"].as_i64().unwrap());
    }
    assert_eq!(serials, vec![1, 2]);

    let other = json_body(
        server
            .post(&alice, &format!("/communities/{osaka}/cyphers"), cypher_body(5))
            .await,
    )
    .await;
    assert_eq!(other["cypher"]["serial_num"], 1);
}

#[tokio::test]
async fn cypher_creation_rejects_non_hosts_and_bad_bodies() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    let id = server.create_community(&alice, "Shibuya").await;
    let path = format!("/communities/{id}/cyphers");

    let not_host = server.post(&bob, &path, cypher_body(1)).await;
    assert_eq!(not_host.status(), StatusCode::CONFLICT);

    let missing_place = server
        .post(
            &alice,
            &path,
            json!({
                "name": "Battle",
                "info": "info",
                "cypher_from": "2030-01-01T18:00:00Z",
                "cypher_to": "2030-01-01T20:00:00Z"
            }),
        )
        .await;
    assert_eq!(missing_place.status(), StatusCode::BAD_REQUEST);

    let backwards = server
        .post(
            &alice,
            &path,
            json!({
                "name": "Battle",
                "info": "info",
                "cypher_from": "2030-01-01T20:00:00Z",
                "cypher_to": "2030-01-01T18:00:00Z",
                "place": "Hachiko exit"
            }),
        )
        .await;
    assert_eq!(backwards.status(), StatusCode::BAD_REQUEST);

    let no_community = server.post(&alice, "/communities/9999/cyphers", cypher_body(1)).await;
    assert_eq!(no_community.status(), StatusCode::NOT_FOUND);
}

// --- Tags and regular cypher ---

#[tokio::test]
async fn hosts_manage_tags_and_regular_cypher() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    let id = server.create_community(&alice, "Shibuya").await;

    let tag = server
        .post(&alice, &format!("/communities/{id}/tags"), json!({ "content": "freestyle" }))
        .await;
    assert_eq!(tag.status(), StatusCode::CREATED);
    let denied = server
        .post(&bob, &format!("/communities/{id}/tags"), json!({ "content": "spam" }))
        .await;
    assert_eq!(denied.status(), StatusCode::CONFLICT);

    let schedule = json!({
        "place": "Yoyogi park",
        "cypher_day": 6,
        "cypher_from": "18:00",
        "cypher_to": "21:30:00"
    });
    let saved = server
        .put(&alice, &format!("/communities/{id}/regular_cypher"), schedule)
        .await;
    assert_eq!(saved.status(), StatusCode::OK);
    assert_eq!(json_body(saved).await["cypher_to"], "21:30");

    let bad_day = server
        .put(
            &alice,
            &format!("/communities/{id}/regular_cypher"),
            json!({ "place": "p", "cypher_day": 7, "cypher_from": "18:00", "cypher_to": "19:00" }),
        )
        .await;
    assert_eq!(bad_day.status(), StatusCode::BAD_REQUEST);

    let detail = json_body(server.get(&alice, &format!("/communities/{id}")).await).await;
    assert_eq!(detail["community"]["tags"][0]["content"], "freestyle");
    assert_eq!(detail["community"]["regular_cypher"]["cypher_day"], 6);
    assert_eq!(detail["community"]["regular_cypher"]["place"], "Yoyogi park");
}

// --- Users and posts ---

#[tokio::test]
async fn users_can_only_edit_themselves() {
    let server = TestServer::spawn().await;
    let (alice_id, alice) = server.register("alice").await;
    let (_, bob) = server.register("bob").await;
    let body = json!({ "name": "alicia", "home": "Kyoto", "bio": "dj" });

    let denied = server.put(&bob, &format!("/users/{alice_id}"), body.clone()).await;
    assert_eq!(denied.status(), StatusCode::CONFLICT);

    let updated = server.put(&alice, &format!("/users/{alice_id}"), body).await;
    assert_eq!(updated.status(), StatusCode::OK);

    let shown = json_body(server.get(&bob, &format!("/users/{alice_id}")).await).await;
    assert_eq!(shown["user"]["name"], "alicia");
    assert_eq!(shown["user"]["home"], "Kyoto");

    assert_eq!(
        server.get(&bob, "/users/9999").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn posts_are_listed_newest_first() {
    let server = TestServer::spawn().await;
    let (alice_id, alice) = server.register("alice").await;
    let id = server.create_community(&alice, "Shibuya").await;
    let cypher = json_body(
        server
            .post(&alice, &format!("/communities/{id}/cyphers"), cypher_body(1))
            .await,
    )
    .await;
    let cypher_id = cypher["cypher"]["id"].as_i64().unwrap();

    for verse in ["first", "second"] {
        let response = server
            .post(&alice, "/posts", json!({ "cypher_id": cypher_id, "content": verse }))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let empty = server.post(&alice, "/posts", json!({ "cypher_id": cypher_id })).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let page = json_body(
        server
            .get(&alice, &format!("/users/{alice_id}/posts?since_id=0"))
            .await,
    )
    .await;
    let contents: Vec<&str> = page["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["second", "first"]);
}
