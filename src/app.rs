use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Body,
    http::{Request, Response},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnRequest, MakeSpan, OnResponse, TraceLayer},
};
use tracing::{error, field, info, info_span, warn, Span};

use crate::{config::AppConfig, state::AppState};
use crate::{auth, users, workouts};

pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let protected = Router::new()
        .merge(workouts::router())
        .merge(users::protected_router())
        .merge(auth::protected_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::authenticate,
        ));

    Router::new()
        .merge(users::router())
        .merge(auth::router())
        .merge(protected)
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .layer(trace_layer())
}

/// One span per request. The status is filled in once the response exists;
/// client errors log at `warn`, server errors at `error`.
fn trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    DefaultOnRequest,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            info_span!(
                "request",
                method = %req.method(),
                path = req.uri().path(),
                status = field::Empty,
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, span: &Span| {
            let status = res.status();
            span.record("status", status.as_u16());
            let latency_ms = latency.as_millis() as u64;
            if status.is_server_error() {
                error!(%status, latency_ms, "request failed");
            } else if status.is_client_error() {
                warn!(%status, latency_ms, "request rejected");
            } else {
                info!(%status, latency_ms, "request finished");
            }
        })
}

async fn health() -> &'static str {
    "Status is available\n"
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "liftlog listening");
    axum::serve(listener, app).await.context("http server")
}
