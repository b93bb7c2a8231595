//! Single-page review form served over HTTP.
//!
//! # Endpoints
//!
//! - `GET /` - The form
//! - `GET /health` - Health check
//! - `POST /api/review` - Run a review; frames stream back as NDJSON
//!
//! Each frame line carries the raw `content` and an `html` rendering of
//! `**source**: content`. Only one review runs at a time, from submission
//! until its last turn, even if the client hangs up. A request that arrives
//! meanwhile gets `409 Conflict`.

use super::ReviewForm;
use crate::models::Frame;
use crate::pipeline;
use crate::team::RoundRobinTeam;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

const PAGE: &str = include_str!("page.html");

const NDJSON: &str = "application/x-ndjson";

pub struct AppState {
    team: RoundRobinTeam,
    default_papers: u32,
    busy: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(team: RoundRobinTeam, default_papers: u32) -> Self {
        Self {
            team,
            default_papers,
            busy: Arc::new(Mutex::new(())),
        }
    }
}

/// Create the router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/review", post(review))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the form on `addr` until the process exits.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Review form listening on http://{}", listener.local_addr()?);
    println!("🌐 Open http://{} in your browser", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(PAGE.replace("__DEFAULT_PAPERS__", &state.default_papers.to_string()))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn review(State(state): State<Arc<AppState>>, Json(form): Json<ReviewForm>) -> Response {
    let Some(request) = form.submit() else {
        return error_response(StatusCode::BAD_REQUEST, "Topic must not be empty");
    };

    let Ok(guard) = state.busy.clone().try_lock_owned() else {
        return error_response(StatusCode::CONFLICT, "A review is already running");
    };

    // the driver holds the guard until the conversation ends
    let lines = pipeline::run_review_holding(&state.team, &request, guard)
        .map(|item| Ok::<_, Infallible>(frame_line(item)));

    (
        [(header::CONTENT_TYPE, NDJSON)],
        Body::from_stream(lines),
    )
        .into_response()
}

fn frame_line(item: crate::error::Result<Frame>) -> String {
    let value = match item {
        Ok(frame) => {
            let html = render_markdown(&format!("**{}**: {}", frame.source, frame.content));
            json!({ "source": frame.source, "content": frame.content, "html": html })
        }
        Err(e) => json!({ "error": e.to_string() }),
    };
    format!("{}\n", value)
}

/// Render model output as HTML. Raw HTML in the input is escaped.
pub fn render_markdown(markdown: &str) -> String {
    let events = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH).map(escape_raw_html);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn escape_raw_html(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    }
}
