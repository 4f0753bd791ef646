use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{announcements, auth, comments, events, health, invites, participants, users};
use crate::services::{auth::build_jwt_config, CookieHelper, HttpOAuthProvider, OAuthProvider};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub cookies: CookieHelper,
    /// `None` when no OAuth provider is configured.
    pub oauth: Option<Arc<dyn OAuthProvider>>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let jwt = build_jwt_config(&config.jwt)?;

        let cookies = CookieHelper::new(
            config.cookies.clone(),
            jwt.access_token_expiry_secs,
            jwt.refresh_token_expiry_secs,
        );

        let oauth: Option<Arc<dyn OAuthProvider>> = if config.oauth.is_configured() {
            Some(Arc::new(HttpOAuthProvider::new(config.oauth.clone())?))
        } else {
            None
        };

        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            cookies,
            oauth,
            rate_limiter,
        })
    }

    /// Replaces the OAuth provider (used to plug in a stub provider).
    pub fn with_oauth_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.oauth = Some(provider);
        self
    }
}

pub fn create_app(config: Config, pool: PgPool) -> anyhow::Result<Router> {
    Ok(build_router(AppState::new(config, pool)?))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Development default
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Unauthenticated credential endpoints, limited per client IP
    let limited_auth_routes = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/callback", get(auth::callback))
        // Profile
        .route(
            "/api/v1/users/me",
            get(users::get_me).patch(users::update_me),
        )
        // Events
        .route("/api/v1/events", post(events::create_event))
        .route("/api/v1/events/hosted", get(events::list_hosted))
        .route("/api/v1/events/participating", get(events::list_participating))
        .route(
            "/api/v1/events/:event_id",
            get(events::get_event).put(events::update_event),
        )
        .route("/api/v1/events/:event_id/cancel", post(events::cancel_event))
        // Invites
        .route("/api/v1/invites/:code", get(invites::preview_invite))
        .route("/api/v1/invites/:code/join", post(invites::join_event))
        // Participants
        .route(
            "/api/v1/events/:event_id/participants",
            get(participants::list_participants),
        )
        .route(
            "/api/v1/events/:event_id/participants/:participant_id/approve",
            post(participants::approve_participant),
        )
        .route(
            "/api/v1/events/:event_id/participants/:participant_id/reject",
            post(participants::reject_participant),
        )
        .route(
            "/api/v1/events/:event_id/participants/:participant_id/attendance",
            patch(participants::mark_attendance),
        )
        .route(
            "/api/v1/events/:event_id/participation/cancel",
            post(participants::cancel_participation),
        )
        // Announcements
        .route(
            "/api/v1/events/:event_id/announcements",
            get(announcements::list_announcements).post(announcements::create_announcement),
        )
        .route(
            "/api/v1/announcements/:announcement_id",
            get(announcements::get_announcement)
                .put(announcements::update_announcement)
                .delete(announcements::delete_announcement),
        )
        // Comments
        .route(
            "/api/v1/announcements/:announcement_id/comments",
            post(comments::create_comment),
        )
        .route("/api/v1/comments/:comment_id", delete(comments::delete_comment));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(limited_auth_routes)
        .merge(api_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
