//! API Server Entry Point
//!
//! Serves a form login endpoint guarded by the IP + username throttle.
//! Uses `anyhow` for startup errors; request-level errors go through
//! `kernel::error::AppError`.

use anyhow::Context;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use kernel::error::app_error::AppError;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use throttle::{
    InMemoryAuditRepository, PgAuditRepository, QueryFailurePolicy, SubmissionOutcome,
    ThrottleConfig, ThrottleInterceptor, throttled_router, throttled_router_generic,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The single account accepted by the login endpoint
struct LoginState {
    username_parameter: String,
    username: String,
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,throttle=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_throttle_config()?;

    let addr: SocketAddr = env_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?;
    let server_ip = match env::var("SERVER_IP") {
        Ok(ip) => Some(ip.parse::<IpAddr>().context("SERVER_IP is not an IP address")?),
        Err(_) if !addr.ip().is_unspecified() => Some(addr.ip()),
        Err(_) => None,
    };

    let login_state = Arc::new(LoginState {
        username_parameter: config.username_parameter.clone(),
        username: env::var("LOGIN_USERNAME").context("LOGIN_USERNAME must be set")?,
        password: env::var("LOGIN_PASSWORD").context("LOGIN_PASSWORD must be set")?,
    });

    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(login_state);

    let app = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to audit database");

            let mut repo = PgAuditRepository::new(pool);
            if let Ok(query) = env::var("THROTTLE_AUDIT_QUERY") {
                repo = repo.with_query(query)?;
            }
            throttled_router(login_router, repo, config, server_ip)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; audit trail is kept in memory");
            let store = Arc::new(InMemoryAuditRepository::new());
            let interceptor = ThrottleInterceptor::from_store(store, config);
            throttled_router_generic(login_router, interceptor, server_ip)
        }
    };

    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// POST /login
async fn login(
    State(state): State<Arc<LoginState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let username = form.get(&state.username_parameter);
    let authenticated =
        username == Some(&state.username) && form.get("password") == Some(&state.password);

    if authenticated {
        tracing::info!(username = %state.username, "User authenticated");
        let mut response = StatusCode::NO_CONTENT.into_response();
        response
            .extensions_mut()
            .insert(SubmissionOutcome::Authenticated);
        return response;
    }

    let mut response = AppError::unauthorized("Invalid credentials").into_response();
    response.extensions_mut().insert(SubmissionOutcome::Failed);
    response
}

fn load_throttle_config() -> anyhow::Result<ThrottleConfig> {
    let defaults = ThrottleConfig::default();

    let config = ThrottleConfig::new(
        env_or("THROTTLE_FAILURE_THRESHOLD", defaults.failure_threshold)?,
        env_or("THROTTLE_FAILURE_RANGE_SECONDS", defaults.failure_range_secs())?,
        env::var("THROTTLE_USERNAME_PARAMETER").unwrap_or(defaults.username_parameter),
        env::var("THROTTLE_APP_CODE").unwrap_or(defaults.application_code),
        env::var("THROTTLE_AUTH_FAILURE_CODE").unwrap_or(defaults.authentication_failure_code),
    )?;

    let policy = if env_or("THROTTLE_FAIL_OPEN", false)? {
        QueryFailurePolicy::FailOpen
    } else {
        QueryFailurePolicy::FailClosed
    };

    tracing::info!(
        failure_threshold = config.failure_threshold,
        failure_range_secs = config.failure_range_secs(),
        threshold_rate = config.threshold_rate(),
        ?policy,
        "Throttle configuration loaded"
    );

    Ok(config.with_query_failure_policy(policy))
}

/// Parse an environment variable, falling back to `default` when unset
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
