//! HTTP API layer for `rafiq serve`.
//!
//! Thin translation between JSON over HTTP and the engagement components:
//! handlers extract the caller from the gateway header, call one component
//! operation, and map its error taxonomy onto status codes.

pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use anyhow::{Context, Result};
use rafiq_store::Engagement;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use router::build_router;
pub use state::AppState;

/// Serve until `shutdown` is cancelled, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    engagement: Engagement,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = build_router(AppState { engagement });
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("http server failed")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rafiq_core::{ManualClock, NoMedia};
    use rafiq_store::StoreHandle;
    use reqwest::{Method, StatusCode};
    use serde_json::{Value, json};

    use super::*;
    use crate::api::utils::USER_ID_HEADER;

    const T0: i64 = 1_700_000_000;

    struct TestServer {
        base: String,
        client: reqwest::Client,
        clock: Arc<ManualClock>,
        engagement: Engagement,
        shutdown: CancellationToken,
    }

    impl TestServer {
        async fn start() -> Self {
            let clock = Arc::new(ManualClock::new(T0));
            let engagement = Engagement::new(
                StoreHandle::open_in_memory().unwrap(),
                clock.clone(),
                Arc::new(NoMedia),
            );
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let shutdown = CancellationToken::new();
            tokio::spawn(serve(listener, engagement.clone(), shutdown.clone()));
            Self {
                base: format!("http://{addr}"),
                client: reqwest::Client::new(),
                clock,
                engagement,
                shutdown,
            }
        }

        fn request(&self, method: reqwest::Method, path: &str, caller: i64) -> reqwest::RequestBuilder {
            self.client
                .request(method, format!("{}{path}", self.base))
                .header(USER_ID_HEADER, caller.to_string())
        }

        async fn send(&self, req: reqwest::RequestBuilder) -> (StatusCode, Value) {
            let resp = req.send().await.unwrap();
            let status = resp.status();
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            (status, body)
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.shutdown.cancel();
        }
    }

    #[tokio::test]
    async fn test_health_and_missing_caller() {
        let srv = TestServer::start().await;

        let (status, body) = srv
            .send(srv.client.get(format!("{}/api/health", srv.base)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["schemaVersion"], 1);
        assert_eq!(body["stats"]["storiesVisible"], 0);

        let (status, body) = srv
            .send(srv.client.get(format!("{}/api/stories", srv.base)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing caller identity");

        let (status, _) = srv
            .send(
                srv.client
                    .get(format!("{}/api/stories", srv.base))
                    .header(USER_ID_HEADER, "not-a-number"),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_story_expiry_over_http() {
        let srv = TestServer::start().await;
        srv.engagement.users.upsert_user(1, "Amina").await.unwrap();

        let (status, story) = srv
            .send(srv.request(Method::POST, "/api/stories", 1).json(&json!({
                "mediaRef": "stories/a.jpg",
                "mediaKind": "image/jpeg",
                "title": "Morning",
                "ttl": 3600,
            })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(story["mediaKind"], "image");
        assert_eq!(story["title"], "Morning");
        assert_eq!(story["createdAt"], "2023-11-14T22:13:20Z");
        let id = story["id"].as_i64().unwrap();

        for _ in 0..2 {
            let (status, _) = srv
                .send(srv.request(Method::POST, &format!("/api/stories/{id}/view"), 2))
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, feed) = srv.send(srv.request(Method::GET, "/api/stories", 2)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(feed.as_array().unwrap().len(), 1);
        assert_eq!(feed[0]["viewCount"], 1);
        assert_eq!(feed[0]["viewedByCaller"], true);
        assert_eq!(feed[0]["ownerName"], "Amina");

        let (_, own) = srv
            .send(srv.request(Method::GET, "/api/stories/user/1", 3))
            .await;
        assert_eq!(own[0]["viewedByCaller"], false);

        srv.clock.advance(3600);

        let (status, feed) = srv.send(srv.request(Method::GET, "/api/stories", 2)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(feed.as_array().unwrap().is_empty());
        let (status, _) = srv
            .send(srv.request(Method::GET, &format!("/api/stories/{id}"), 2))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = srv
            .send(srv.request(Method::POST, &format!("/api/stories/{id}/view"), 3))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_story_validation_and_delete() {
        let srv = TestServer::start().await;

        let (status, body) = srv
            .send(
                srv.request(Method::POST, "/api/stories", 1)
                    .json(&json!({ "mediaKind": "image" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("media reference"));

        let (status, _) = srv
            .send(
                srv.request(Method::POST, "/api/stories", 1)
                    .header("content-type", "application/json")
                    .body("{not json"),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, story) = srv
            .send(
                srv.request(Method::POST, "/api/stories", 1)
                    .json(&json!({ "mediaRef": "v.mp4", "mediaKind": "video" })),
            )
            .await;
        assert_eq!(story["expiresAt"], Value::Null);
        let path = format!("/api/stories/{}", story["id"]);

        let (status, _) = srv.send(srv.request(Method::DELETE, &path, 2)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = srv.send(srv.request(Method::DELETE, &path, 1)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = srv.send(srv.request(Method::DELETE, &path, 1)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_likes_over_http() {
        let srv = TestServer::start().await;

        let (status, _) = srv.send(srv.request(Method::POST, "/api/likes/7", 1)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = srv.send(srv.request(Method::POST, "/api/likes/7", 1)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already liked");
        srv.send(srv.request(Method::POST, "/api/likes/7", 2)).await;
        srv.send(srv.request(Method::POST, "/api/likes/9", 1)).await;

        let (_, info) = srv.send(srv.request(Method::GET, "/api/likes/7", 3)).await;
        assert_eq!(info, json!({ "count": 2, "likedByCaller": false }));

        let (_, liked) = srv
            .send(srv.request(Method::GET, "/api/likes/user/1", 3))
            .await;
        assert_eq!(liked, json!({ "likedPosts": [7, 9] }));

        for _ in 0..2 {
            let (status, _) = srv.send(srv.request(Method::DELETE, "/api/likes/7", 1)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (_, info) = srv.send(srv.request(Method::GET, "/api/likes/7", 2)).await;
        assert_eq!(info, json!({ "count": 1, "likedByCaller": true }));
    }

    #[tokio::test]
    async fn test_goal_increment_over_http() {
        let srv = TestServer::start().await;

        let (status, goal) = srv
            .send(
                srv.request(Method::POST, "/api/tasbih/goals", 1)
                    .json(&json!({ "text": "SubhanAllah", "targetCount": 33 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(goal["ownerId"], 1);
        assert_eq!(goal["currentCount"], 0);
        assert_eq!(goal["status"], "active");
        let path = format!("/api/tasbih/goals/{}", goal["id"]);

        let (status, goal) = srv
            .send(srv.request(Method::PATCH, &path, 1).json(&json!({ "increment": 5 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(goal["currentCount"], 5);

        for bad in [json!(1.5), json!(-1), json!("3"), Value::Null, json!(i64::MAX)] {
            let (status, _) = srv
                .send(srv.request(Method::PATCH, &path, 1).json(&json!({ "increment": bad })))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "increment {bad}");
        }

        let (status, _) = srv
            .send(
                srv.request(Method::PATCH, "/api/tasbih/goals/999", 1)
                    .json(&json!({ "increment": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = srv
            .send(
                srv.request(Method::POST, "/api/tasbih/goals", 1)
                    .json(&json!({ "text": "x", "targetCount": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        srv.clock.advance(8 * 86_400);
        let (_, goals) = srv
            .send(srv.request(Method::GET, "/api/tasbih/goals/1", 2))
            .await;
        assert_eq!(goals.as_array().unwrap().len(), 1);
        assert_eq!(goals[0]["currentCount"], 5);
        assert_eq!(goals[0]["status"], "expired");
    }

    #[tokio::test]
    async fn test_friend_privacy_over_http() {
        let srv = TestServer::start().await;
        srv.engagement.users.upsert_user(2, "Bilal").await.unwrap();
        srv.send(
            srv.request(Method::POST, "/api/tasbih/goals", 2)
                .json(&json!({ "text": "Alhamdulillah", "targetCount": 100, "initialCount": 10 })),
        )
        .await;

        let (status, link) = srv
            .send(
                srv.request(Method::POST, "/api/tasbih/friends", 1)
                    .json(&json!({ "friendUserId": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(link["isPublic"], false);
        let (status, _) = srv
            .send(
                srv.request(Method::POST, "/api/tasbih/friends", 1)
                    .json(&json!({ "friendUserId": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, progress) = srv
            .send(srv.request(Method::GET, "/api/tasbih/friends/1", 1))
            .await;
        assert_eq!(progress, json!([]));

        let privacy = format!("/api/tasbih/privacy/{}", link["id"]);
        let (status, _) = srv
            .send(srv.request(Method::PUT, &privacy, 1).json(&json!({ "isPublic": true })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, progress) = srv
            .send(srv.request(Method::GET, "/api/tasbih/friends/1", 1))
            .await;
        assert_eq!(
            progress,
            json!([{
                "friendName": "Bilal",
                "goalText": "Alhamdulillah",
                "progress": 10,
                "target": 100,
                "streak": 0,
            }])
        );

        let (status, _) = srv
            .send(
                srv.request(Method::PUT, "/api/tasbih/privacy/999", 1)
                    .json(&json!({ "isPublic": true })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
