use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post, put},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use sideline_engagement::EngagementDeps;
use sideline_events::BroadcastBus;

use crate::{rest, ws};

pub struct AppState {
    pub deps: EngagementDeps,
    /// Same bus as `deps.bus`, kept concrete so sockets can subscribe.
    pub bus: Arc<BroadcastBus>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Profiles
        .route(
            "/api/user/profile/{user_id}/follow",
            post(rest::profile::api_toggle_follow),
        )
        .route(
            "/api/user/profile/{user_id}/push-token",
            put(rest::profile::api_set_push_token),
        )
        // Challenges
        .route(
            "/api/challenge/register",
            post(rest::challenge::api_register_challenge),
        )
        .route("/api/challenge/{id}/vote", post(rest::challenge::api_submit_vote))
        .route("/api/challenge/{id}/votes", get(rest::challenge::api_list_votes))
        .route("/api/challenge/{id}/results", get(rest::challenge::api_results))
        // Content reactions
        .route("/api/news/{id}/like", post(rest::content::api_toggle_news_like))
        .route("/api/news/{id}/unlike", post(rest::content::api_toggle_unlike))
        .route("/api/news/{id}/engagement", get(rest::content::api_news_engagement))
        .route("/api/{kind}/{id}/like", post(rest::content::api_toggle_like))
        .route("/api/{kind}/{id}/engagement", get(rest::content::api_engagement))
        // Real-time channel
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        // Method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
