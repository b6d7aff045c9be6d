//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use tracing::{debug, info};

use crate::ui::{self, Form as DemoForm};
use crate::workflow::{self, Action, DemoArgs, Session};

use super::error::{Result, ServerError};
use super::state::{AppState, SharedSession};

/// Cookie naming the caller's session
pub const SESSION_COOKIE: &str = "automl_session";

// ============================================================================
// Session plumbing
// ============================================================================

fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, id)| id.to_string())
}

/// Existing session for the request, or a new one. The flag is true when the
/// session was created and the cookie must be set.
async fn resolve_session(state: &Arc<AppState>, headers: &HeaderMap) -> Result<(String, SharedSession, bool)> {
    if let Some(id) = session_id_from(headers) {
        if let Some(session) = state.session(&id).await {
            return Ok((id, session, false));
        }
        debug!(session_id = %id, "Unknown session cookie, starting a new session");
    }

    let demo = state.demo.clone();
    let session = tokio::task::spawn_blocking(move || Session::new(&demo)).await??;
    let id = AppState::generate_session_id();
    let shared = state.insert_session(id.clone(), session).await;
    Ok((id, shared, true))
}

/// Run `action` for the caller's session and return the rendered form.
async fn run_action(state: &Arc<AppState>, headers: &HeaderMap, action: Action) -> Result<(DemoForm, Option<String>)> {
    let (id, session, created) = resolve_session(state, headers).await?;
    info!(session_id = %id, action = ?action, "Handling demo request");

    // Held until the workflow finishes, so a session runs one action at a time.
    let mut guard = session.lock_owned().await;
    if created && action == Action::Setup {
        // A session that was just created is already freshly set up.
        return Ok((ui::render(&guard), Some(id)));
    }
    let demo = state.demo.clone();
    let form = tokio::task::spawn_blocking(move || workflow::dispatch(&mut guard, action, &demo)).await??;

    Ok((form, created.then_some(id)))
}

fn with_session_cookie(mut response: Response, new_session: Option<String>) -> Result<Response> {
    if let Some(id) = new_session {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        let value = HeaderValue::from_str(&cookie).map_err(|e| ServerError::Internal(e.to_string()))?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(response)
}

// ============================================================================
// Demo Handlers
// ============================================================================

/// Initial render: fresh split, predict disabled
pub async fn get_demo(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response> {
    let (form, new_session) = run_action(&state, &headers, Action::Setup).await?;
    with_session_cookie(Html(ui::to_html(&form)).into_response(), new_session)
}

/// Button press from the HTML form
pub async fn post_demo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(args): Form<DemoArgs>,
) -> Result<Response> {
    let (form, new_session) = run_action(&state, &headers, args.action()).await?;
    with_session_cookie(Html(ui::to_html(&form)).into_response(), new_session)
}

/// Same workflow as [`post_demo`], answering with the form description as JSON
pub async fn api_demo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(args): Json<DemoArgs>,
) -> Result<Response> {
    let (form, new_session) = run_action(&state, &headers, args.action()).await?;
    with_session_cookie(Json(form).into_response(), new_session)
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.session_count().await,
    }))
}
