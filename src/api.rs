use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::holders::{HolderClient, DEFAULT_HOLDER_COUNT};

#[derive(Clone)]
pub struct AppState {
    pub commands: CommandHandler,
    pub holders: Option<Arc<HolderClient>>,
}

#[derive(Deserialize)]
pub struct CommandRequest {
    pub user_id: String,
    pub command: String,
}

#[derive(Deserialize)]
pub struct HolderQuery {
    pub token: String,
    pub count: Option<usize>, // defaults to 10
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Token alert bot running" }))
        .route("/commands", post(post_command))
        .route("/subscribers/count", get(subscriber_count))
        .route("/holders", get(get_holders))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(cfg: Config, state: AppState) -> eyre::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], cfg.port));
    info!("Command API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Unknown commands answer 204 with no body
pub async fn post_command(State(state): State<AppState>, Json(req): Json<CommandRequest>) -> Response {
    match state.commands.dispatch(&req.user_id, &req.command).await {
        Some(reply) => Json(json!({ "reply": reply })).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn subscriber_count(State(state): State<AppState>) -> Response {
    let count = state.commands.subscriber_count().await;
    Json(json!({ "count": count })).into_response()
}

pub async fn get_holders(State(state): State<AppState>, Query(q): Query<HolderQuery>) -> Response {
    let Some(holders) = state.holders else {
        return (StatusCode::SERVICE_UNAVAILABLE, "holder lookup is not configured").into_response();
    };

    let count = q.count.unwrap_or(DEFAULT_HOLDER_COUNT).max(1);
    match holders.holders_with_winrates(&q.token, count).await {
        Some(lines) => Json(lines).into_response(),
        None => (StatusCode::BAD_GATEWAY, "holder list unavailable").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PersistentSet;
    use tempfile::tempdir;

    fn state(dir: &std::path::Path, holders: Option<Arc<HolderClient>>) -> AppState {
        AppState {
            commands: CommandHandler::new(PersistentSet::open(dir.join("subscribed_users.json"))),
            holders,
        }
    }

    fn request(user_id: &str, command: &str) -> Json<CommandRequest> {
        Json(CommandRequest {
            user_id: user_id.into(),
            command: command.into(),
        })
    }

    #[tokio::test]
    async fn subscribe_command_replies() {
        let dir = tempdir().unwrap();
        let st = state(dir.path(), None);

        let resp = post_command(State(st.clone()), request("1001", "!subscribe")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(st.commands.is_subscribed("1001").await);

        let resp = subscriber_count(State(st)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_command_is_no_content() {
        let dir = tempdir().unwrap();
        let resp = post_command(State(state(dir.path(), None)), request("1001", "!moon")).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn holders_without_backend_is_unavailable() {
        let dir = tempdir().unwrap();
        let q = Query(HolderQuery {
            token: "abc123pump".into(),
            count: None,
        });
        let resp = get_holders(State(state(dir.path(), None)), q).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn holders_with_dead_backend_is_bad_gateway() {
        let dir = tempdir().unwrap();
        let client = Arc::new(HolderClient::new("http://127.0.0.1:1").unwrap());
        let q = Query(HolderQuery {
            token: "abc123pump".into(),
            count: Some(3),
        });
        let resp = get_holders(State(state(dir.path(), Some(client))), q).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
