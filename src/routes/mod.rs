use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod catalog;
pub mod docs;
pub mod health;
pub mod season;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(catalog::router())
        .merge(season::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, sync::Arc, time::Duration};

    use reqwest::{Client, StatusCode};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;
    use crate::{
        config::{AppConfig, CuratorConfig},
        dao::curator_store::{CuratorStore, memory::MemoryCuratorStore},
        services::curator_sync::tests::{FakeSource, tiers},
        state::AppState,
    };

    const TOKEN: &str = "letmein";

    async fn serve(state: SharedState) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state).into_make_service())
                .await
                .unwrap();
        });
        addr
    }

    async fn ready_state(source: FakeSource) -> SharedState {
        let config = AppConfig {
            curator: CuratorConfig {
                request_delay: Duration::ZERO,
                ..CuratorConfig::default()
            },
            ..AppConfig::default()
        };
        let state = AppState::new(config, Arc::new(source), Some(TOKEN.into()));
        let store = MemoryCuratorStore::new();
        store.replace_tiers(tiers()).await.unwrap();
        state.set_curator_store(Arc::new(store)).await;
        state
    }

    #[tokio::test]
    async fn healthcheck_reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default(), Arc::new(FakeSource::default()), None);
        let addr = serve(state).await;

        let body: Value = reqwest::get(format!("http://{addr}/healthcheck"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "degraded");

        let games = reqwest::get(format!("http://{addr}/games")).await.unwrap();
        assert_eq!(games.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn admin_routes_require_the_token() {
        let addr = serve(ready_state(FakeSource::default()).await).await;
        let client = Client::new();
        let url = format!("http://{addr}/admin/curator/status");

        let missing = client.get(&url).send().await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = client
            .get(&url)
            .header("X-Admin-Token", "nope")
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let ok = client
            .get(&url)
            .header("X-Admin-Token", TOKEN)
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body: Value = ok.json().await.unwrap();
        assert_eq!(body["running"], false);
    }

    #[tokio::test]
    async fn sync_then_browse_catalog() {
        let source = FakeSource::new(&[(10, "🌕 hardest"), (20, "🌒 easy")]);
        let addr = serve(ready_state(source).await).await;
        let client = Client::new();

        let accepted = client
            .post(format!("http://{addr}/admin/curator/sync"))
            .header("X-Admin-Token", TOKEN)
            .header("force_update", "true")
            .send()
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::ACCEPTED);
        let body: Value = accepted.json().await.unwrap();
        assert_eq!(body["listed"], 2);
        assert_eq!(body["force_update"], true);

        let mut games = Vec::new();
        for _ in 0..100 {
            games = reqwest::get(format!("http://{addr}/games"))
                .await
                .unwrap()
                .json::<Vec<Value>>()
                .await
                .unwrap();
            if games.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(games.len(), 2);

        let tier_five: Vec<Value> = reqwest::get(format!("http://{addr}/games/tier/5"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(tier_five.len(), 1);
        assert_eq!(tier_five[0]["id"], 10);

        let events: Vec<Value> = reqwest::get(format!("http://{addr}/events?limit=1"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "newGame");

        let too_many = reqwest::get(format!("http://{addr}/events?limit=0")).await.unwrap();
        assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_listing_surfaces_as_bad_gateway() {
        let addr = serve(ready_state(FakeSource::default()).await).await;
        let response = Client::new()
            .post(format!("http://{addr}/admin/curator/sync"))
            .header("X-Admin-Token", TOKEN)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn recorded_results_are_ranked() {
        let addr = serve(ready_state(FakeSource::default()).await).await;
        let client = Client::new();

        let member = client
            .put(format!("http://{addr}/admin/members/1001"))
            .header("X-Admin-Token", TOKEN)
            .json(&json!({"name": "Ada"}))
            .send()
            .await
            .unwrap();
        assert_eq!(member.status(), StatusCode::OK);

        let invalid = client
            .put(format!("http://{addr}/admin/members/not-a-snowflake"))
            .header("X-Admin-Token", TOKEN)
            .json(&json!({"name": "Eve"}))
            .send()
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let recorded = client
            .post(format!("http://{addr}/admin/seasons/s1/results"))
            .header("X-Admin-Token", TOKEN)
            .json(&json!({"results": [
                {"race_id": "r1", "discord_id": "1001", "points": 0},
                {"race_id": "r2", "discord_id": "1001", "points": 2, "dnf": true}
            ]}))
            .send()
            .await
            .unwrap();
        assert_eq!(recorded.status(), StatusCode::CREATED);

        let ranking: Value = reqwest::get(format!("http://{addr}/seasons/s1/ranking"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let entry = &ranking["entries"][0];
        assert_eq!(entry["discord_id"], "1001");
        assert_eq!(entry["points_total"], 2);
        assert_eq!(entry["participations_total"], 1);
        assert_eq!(entry["dnfs_total"], 1);
        assert_eq!(entry["golds"], 1);
        assert_eq!(entry["silvers"], 1);
        assert_eq!(entry["member"]["name"], "Ada");

        let missing = reqwest::get(format!("http://{addr}/seasons/s2/ranking")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
