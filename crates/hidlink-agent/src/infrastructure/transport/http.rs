//! HTTP query-parameter transport.
//!
//! One request carries one command:
//!
//! | Method     | Path           | Parameters                                   |
//! |------------|----------------|----------------------------------------------|
//! | GET        | `/ping`        |                                              |
//! | GET        | `/mouse/move`  | `dx`, `dy`                                   |
//! | GET        | `/mouse/click` | `buttons`                                    |
//! | GET        | `/mouse/wheel` | `v`                                          |
//! | GET / POST | `/key/type`    | `text` (POST: urlencoded form body)          |
//! | GET        | `/key/combo`   | `mods`, `keys`                               |
//! | GET        | `/combo`       | `mods`, `keys`, `mouse`, `duration_ms`, `release` |
//!
//! The body is the same `OK` / `ERR <reason>` token the line protocol sends;
//! the status code classifies it:
//!
//! | Status | Meaning                                      |
//! |--------|----------------------------------------------|
//! | 200    | command executed                             |
//! | 400    | missing or malformed parameter               |
//! | 404    | unknown route                                |
//! | 500    | actuator failure                             |
//! | 503    | actuator not connected / dispatcher stopped  |

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::extract::{Form, Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::{get, MethodRouter};
use axum::Router;
use hidlink_core::protocol::query::parse_request;
use hidlink_core::{CommandError, Reply};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::application::control_loop::CommandHandle;
use crate::application::dispatch::DispatchError;

type Params = HashMap<String, String>;

#[derive(Clone)]
struct HttpState {
    handle: CommandHandle,
}

/// Builds the router for every command route.
pub fn router(handle: CommandHandle) -> Router {
    let key_type = command_route("key/type").post(
        |State(state): State<HttpState>, Form(params): Form<Params>| async move {
            respond(&state, "key/type", &params).await
        },
    );

    Router::new()
        .route("/ping", command_route("ping"))
        .route("/mouse/move", command_route("mouse/move"))
        .route("/mouse/click", command_route("mouse/click"))
        .route("/mouse/wheel", command_route("mouse/wheel"))
        .route("/key/type", key_type)
        .route("/key/combo", command_route("key/combo"))
        .route("/combo", command_route("combo"))
        .fallback(unknown_route)
        .with_state(HttpState { handle })
}

/// Binds `bind` and serves the router until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve_http(bind: &str, handle: CommandHandle, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {bind}"))?;
    info!(addr = %listener.local_addr()?, "HTTP transport listening");

    axum::serve(listener, router(handle))
        .with_graceful_shutdown(async move {
            while running.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
        .await
        .context("HTTP server failed")?;

    info!("HTTP transport stopped");
    Ok(())
}

fn command_route(route: &'static str) -> MethodRouter<HttpState> {
    get(
        move |State(state): State<HttpState>, Query(params): Query<Params>| async move {
            respond(&state, route, &params).await
        },
    )
}

async fn respond(state: &HttpState, route: &str, params: &Params) -> (StatusCode, String) {
    let command = match parse_request(route, params) {
        Ok(command) => command,
        Err(e) => {
            debug!(route, error = %e, "rejected request");
            let status = match e {
                CommandError::Unknown(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            };
            return (status, Reply::from(e).to_string());
        }
    };

    match state.handle.submit(command).await {
        Ok(()) => (StatusCode::OK, Reply::Ok.to_string()),
        Err(e) => {
            let status = match e {
                DispatchError::NotReady | DispatchError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
                DispatchError::Actuator(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Reply::from(e).to_string())
        }
    }
}

async fn unknown_route(uri: Uri) -> (StatusCode, String) {
    let route = uri.path().trim_start_matches('/').to_string();
    (
        StatusCode::NOT_FOUND,
        Reply::from(CommandError::Unknown(route)).to_string(),
    )
}
