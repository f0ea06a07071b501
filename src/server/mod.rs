//! HTTP API for session progression and wallet-service relays
//!
//! Listens on localhost:9877 by default and accepts:
//! - Progression endpoints under /sessions/* plus /levels and /catalog
//! - Relay endpoints under /api/* (paymaster, spend permissions, profile callback)
//!
//! A fixed pool of worker threads pulls requests off one listener. Writes to
//! a session are serialized by that session's mutex.

mod handlers;
mod sessions;

pub use handlers::{dispatch, query_param, route, ApiResponse, Route};
pub use sessions::{is_valid_session_id, SessionHandle, SessionRegistry};

use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Request, Response, Server};
use tracing::{error, info, warn};

use crate::config::{Config, ServerSettings};
use crate::progression::ProgressDb;
use crate::relay::RelayClient;

const AUTH_HEADER: &str = "X-HowToBase-Token";
const MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MiB

/// Everything a request handler needs
pub struct ServerState {
    pub sessions: SessionRegistry,
    pub relay: RelayClient,
    auth_token: Option<String>,
}

impl ServerState {
    pub fn new(sessions: SessionRegistry, relay: RelayClient, auth_token: Option<String>) -> Self {
        Self {
            sessions,
            relay,
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Build state from configuration (opens the database if persistence is on)
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = match config.database_path() {
            Some(path) => {
                info!("[howtobase:http] Persisting progress to {}", path.display());
                Some(ProgressDb::open(&path)?)
            }
            None => {
                warn!("[howtobase:http] Persistence disabled, progress is lost on restart");
                None
            }
        };

        info!("[howtobase:http] Notifications: {}", config.notifier_kind());
        let sessions = SessionRegistry::new(db, config.notifier()).with_limits(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_idle_secs),
        );

        Ok(Self::new(
            sessions,
            RelayClient::new(config.relay.clone()),
            config.server.auth_token.clone(),
        ))
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Check a presented token against the configured one
    pub fn is_authorized(&self, presented: Option<&str>) -> bool {
        match &self.auth_token {
            Some(expected) => presented == Some(expected.as_str()),
            None => true,
        }
    }
}

/// Run the HTTP server until the process exits
pub fn run_http_server(config: &Config) -> Result<()> {
    let state = Arc::new(ServerState::from_config(config)?);
    serve(state, &config.server)
}

/// Serve requests on `settings.bind_addr()` with `settings.workers` threads
pub fn serve(state: Arc<ServerState>, settings: &ServerSettings) -> Result<()> {
    let bind_addr = settings.bind_addr();
    let server = Server::http(&bind_addr)
        .map_err(|e| anyhow!("Failed to start server on {}: {}", bind_addr, e))?;
    let server = Arc::new(server);

    info!(
        "[howtobase:http] Server listening on http://{} (workers: {}, auth: {})",
        bind_addr,
        settings.workers.max(1),
        if state.auth_enabled() { "enabled" } else { "disabled" }
    );

    let mut workers = Vec::new();
    for n in 0..settings.workers.max(1) {
        let server = server.clone();
        let state = state.clone();
        let worker = thread::Builder::new()
            .name(format!("howtobase-http-{}", n))
            .spawn(move || {
                for request in server.incoming_requests() {
                    handle_request(&state, request);
                }
            })
            .context("Failed to spawn HTTP worker")?;
        workers.push(worker);
    }

    for worker in workers {
        if worker.join().is_err() {
            error!("[howtobase:http] Worker thread panicked");
        }
    }
    Ok(())
}

fn handle_request(state: &ServerState, mut request: Request) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let token = request
        .headers()
        .iter()
        .find(|h| h.field.equiv(AUTH_HEADER))
        .map(|h| h.value.as_str().to_string());

    let response = process_request(state, &method, &url, token.as_deref(), request.as_reader());
    info!("[howtobase:http] {} {} -> {}", method, url, response.status);
    respond(request, response);
}

/// Auth check, body read and dispatch for one request.
///
/// `token` is the `X-HowToBase-Token` header value. CORS preflights skip auth.
/// Only POST bodies are read, capped at 1 MiB.
pub fn process_request(
    state: &ServerState,
    method: &str,
    url: &str,
    token: Option<&str>,
    body: impl Read,
) -> ApiResponse {
    if method != "OPTIONS" && !state.is_authorized(token) {
        return ApiResponse::error(401, "unauthorized");
    }

    let body = if method == "POST" {
        match read_body(body) {
            Ok(body) => body,
            Err(response) => return response,
        }
    } else {
        String::new()
    };

    dispatch(state, method, url, &body)
}

fn read_body(reader: impl Read) -> Result<String, ApiResponse> {
    let mut body = String::new();
    if let Err(e) = reader
        .take((MAX_BODY_BYTES + 1) as u64)
        .read_to_string(&mut body)
    {
        error!("[howtobase:http] Failed to read body: {}", e);
        return Err(ApiResponse::error(400, "bad_request"));
    }

    if body.len() > MAX_BODY_BYTES {
        return Err(ApiResponse::error(413, "payload_too_large"));
    }

    Ok(body)
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn respond(request: Request, api: ApiResponse) {
    let body = if api.body.is_null() {
        String::new()
    } else {
        serde_json::to_string(&api.body).unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string())
    };

    let mut response = Response::from_string(body).with_status_code(api.status);
    if let Some(h) = header("Content-Type", "application/json") {
        response.add_header(h);
    }
    for (name, value) in api.headers {
        if let Some(h) = header(name, value) {
            response.add_header(h);
        }
    }

    if let Err(e) = request.respond(response) {
        warn!("[howtobase:http] Failed to send response: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelaySettings;
    use crate::notify::NullNotifier;

    fn empty() -> &'static [u8] {
        &[]
    }

    fn state_with_token(token: Option<&str>) -> ServerState {
        ServerState::new(
            SessionRegistry::new(None, Arc::new(NullNotifier)),
            RelayClient::new(RelaySettings::default()),
            token.map(str::to_string),
        )
    }

    #[test]
    fn test_auth_disabled_without_token() {
        let state = state_with_token(None);
        assert!(!state.auth_enabled());
        assert!(state.is_authorized(None));

        let blank = state_with_token(Some("  "));
        assert!(!blank.auth_enabled());
    }

    #[test]
    fn test_auth_requires_exact_token() {
        let state = state_with_token(Some("s3cret"));
        assert!(state.auth_enabled());
        assert!(state.is_authorized(Some("s3cret")));
        assert!(!state.is_authorized(Some("wrong")));
        assert!(!state.is_authorized(None));
    }

    #[test]
    fn test_missing_or_wrong_token_is_rejected() {
        let state = state_with_token(Some("s3cret"));

        let missing = process_request(&state, "GET", "/levels", None, empty());
        assert_eq!(missing.status, 401);
        assert_eq!(missing.body["error"], "unauthorized");

        let wrong = process_request(&state, "GET", "/levels", Some("guess"), empty());
        assert_eq!(wrong.status, 401);

        let ok = process_request(&state, "GET", "/levels", Some("s3cret"), empty());
        assert_eq!(ok.status, 200);
    }

    #[test]
    fn test_preflight_needs_no_token() {
        let state = state_with_token(Some("s3cret"));
        let preflight = process_request(&state, "OPTIONS", "/api/data-validation", None, empty());
        assert_eq!(preflight.status, 200);
        assert!(preflight
            .headers
            .iter()
            .any(|(name, _)| *name == "Access-Control-Allow-Origin"));

        let post = process_request(&state, "POST", "/api/data-validation", None, &b"{}"[..]);
        assert_eq!(post.status, 401);
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let state = state_with_token(None);
        let too_big = vec![b' '; MAX_BODY_BYTES + 1];
        let response = process_request(&state, "POST", "/api/data-validation", None, &too_big[..]);
        assert_eq!(response.status, 413);
        assert_eq!(response.body["error"], "payload_too_large");
    }

    #[test]
    fn test_body_at_limit_is_accepted() {
        let state = state_with_token(None);
        let mut body = b"{}".to_vec();
        body.resize(MAX_BODY_BYTES, b' ');
        let response = process_request(&state, "POST", "/api/data-validation", None, &body[..]);
        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], true);
    }

    #[test]
    fn test_non_utf8_body_is_bad_request() {
        let state = state_with_token(None);
        let response =
            process_request(&state, "POST", "/api/paymaster", None, &[0xff, 0xfe, 0xfd][..]);
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_from_config_without_persistence() {
        let mut config = Config::default();
        config.storage.persist = false;
        let state = ServerState::from_config(&config).unwrap();
        assert!(state.sessions.is_empty());
    }
}
