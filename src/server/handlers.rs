//! Request routing and handlers for the progression API
//!
//! Handlers are plain functions from (state, request data) to [`ApiResponse`]
//! so they can be exercised without a socket.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use super::sessions::{is_valid_session_id, SessionHandle};
use super::ServerState;
use crate::progression::{
    calculate_level, today, Achievement, AchievementCategory, ProgressionManager, CATALOG, LEVELS,
};
use crate::relay::{
    parse_body, ProfileCallback, RelayError, SpendAction, SpendPermissionRequest, SponsorRequest,
};

/// Status, JSON body and extra headers for one response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            headers: Vec::new(),
        }
    }

    pub fn error(status: u16, code: &str) -> Self {
        Self::with_status(status, json!({ "error": code }))
    }

    fn relay_error(err: RelayError, failure: &str) -> Self {
        if err.status_code() >= 500 {
            error!("[howtobase:http] {}: {}", failure, err);
        }
        Self::with_status(err.status_code(), err.to_json(failure))
    }
}

/// Recognized endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Health,
    Levels,
    Catalog,
    CreateSession,
    Progress(&'a str),
    Achievements(&'a str),
    Complete(&'a str, &'a str),
    Activity(&'a str),
    ResetSession(&'a str),
    Paymaster,
    ApproveSpendPermission,
    CollectSubscription,
    DataValidation,
    DataValidationPreflight,
    NotFound,
}

/// Map a method and path (without query string) to a route
pub fn route<'a>(method: &str, path: &'a str) -> Route<'a> {
    let segments: Vec<&'a str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("GET", ["health"]) => Route::Health,
        ("GET", ["levels"]) => Route::Levels,
        ("GET", ["catalog"]) => Route::Catalog,
        ("POST", ["sessions"]) => Route::CreateSession,
        ("GET", ["sessions", sid, "progress"]) => Route::Progress(*sid),
        ("GET", ["sessions", sid, "achievements"]) => Route::Achievements(*sid),
        ("POST", ["sessions", sid, "achievements", aid, "complete"]) => Route::Complete(*sid, *aid),
        ("POST", ["sessions", sid, "activity"]) => Route::Activity(*sid),
        ("DELETE", ["sessions", sid]) => Route::ResetSession(*sid),
        ("POST", ["api", "paymaster"]) => Route::Paymaster,
        ("POST", ["api", "approve-spend-permission"]) => Route::ApproveSpendPermission,
        ("POST", ["api", "collect-subscription"]) => Route::CollectSubscription,
        ("POST", ["api", "data-validation"]) => Route::DataValidation,
        ("OPTIONS", ["api", "data-validation"]) => Route::DataValidationPreflight,
        _ => Route::NotFound,
    }
}

/// Value of a query parameter (no percent-decoding; ids and categories are plain)
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Handle one request. `url` may carry a query string.
pub fn dispatch(state: &ServerState, method: &str, url: &str, body: &str) -> ApiResponse {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match route(method, path) {
        Route::Health => ApiResponse::ok(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "sessions": state.sessions.len(),
        })),
        Route::Levels => ApiResponse::ok(json!({ "levels": LEVELS })),
        Route::Catalog => handle_catalog(query),
        Route::CreateSession => match state.sessions.create() {
            Ok(session_id) => ApiResponse::with_status(201, json!({ "sessionId": session_id })),
            Err(e) => internal_error(&e),
        },
        Route::Progress(sid) => with_session(state, sid, Access::Read, |manager| {
            ApiResponse::ok(json!({ "progress": manager.snapshot() }))
        }),
        Route::Achievements(sid) => {
            let category = query_param(query, "category");
            with_session(state, sid, Access::Read, |manager| {
                let achievements = filter_achievements(manager.store().achievements(), category);
                ApiResponse::ok(json!({ "achievements": achievements }))
            })
        }
        Route::Complete(sid, aid) => with_session(state, sid, Access::Write, |manager| {
            match manager.complete(aid) {
                Ok(outcome) => ApiResponse::ok(json!({
                    "unlocked": outcome.unlocked,
                    "events": outcome.events,
                    "progress": manager.snapshot(),
                })),
                Err(e) => internal_error(&e),
            }
        }),
        Route::Activity(sid) => with_session(state, sid, Access::Write, |manager| {
            match manager.record_activity(today()) {
                Ok(event) => ApiResponse::ok(json!({
                    "streak": event,
                    "progress": manager.snapshot(),
                })),
                Err(e) => internal_error(&e),
            }
        }),
        Route::ResetSession(sid) => {
            let response = with_session(state, sid, Access::Read, |manager| match manager.reset() {
                Ok(()) => ApiResponse::ok(json!({ "status": "reset", "sessionId": sid })),
                Err(e) => internal_error(&e),
            });
            if response.status == 200 {
                if let Err(e) = state.sessions.remove(sid) {
                    return internal_error(&e);
                }
            }
            response
        }
        Route::Paymaster => {
            let failure = "Failed to sponsor transaction";
            match parse_body::<SponsorRequest>(body).and_then(|r| state.relay.sponsor(&r)) {
                Ok(value) => ApiResponse::ok(value),
                Err(e) => ApiResponse::relay_error(e, failure),
            }
        }
        Route::ApproveSpendPermission => handle_spend(state, SpendAction::Approve, body),
        Route::CollectSubscription => handle_spend(state, SpendAction::Collect, body),
        Route::DataValidation => match parse_body::<ProfileCallback>(body) {
            Ok(callback) => with_cors(ApiResponse::ok(callback.acknowledge(Utc::now()))),
            Err(e) => with_cors(ApiResponse::with_status(
                500,
                json!({
                    "success": false,
                    "error": "Failed to process profile data",
                    "details": e.to_string(),
                }),
            )),
        },
        Route::DataValidationPreflight => with_cors(ApiResponse::ok(Value::Null)),
        Route::NotFound => ApiResponse::error(404, "not_found"),
    }
}

fn handle_catalog(query: &str) -> ApiResponse {
    let category = query_param(query, "category");
    let entries: Vec<Value> = CATALOG
        .iter()
        .filter(|def| match category {
            Some(c) => AchievementCategory::parse(c) == Some(def.category),
            None => true,
        })
        .map(|def| {
            json!({
                "id": def.id.as_str(),
                "title": def.title,
                "description": def.description,
                "xp": def.xp,
                "icon": def.icon,
                "category": def.category,
            })
        })
        .collect();

    ApiResponse::ok(json!({
        "achievements": entries,
        "maxLevel": calculate_level(i64::MAX),
    }))
}

/// Unknown category names yield an empty list rather than an error
fn filter_achievements<'a>(
    achievements: &'a [Achievement],
    category: Option<&str>,
) -> Vec<&'a Achievement> {
    match category {
        None => achievements.iter().collect(),
        Some(name) => match AchievementCategory::parse(name) {
            Some(category) => achievements
                .iter()
                .filter(|a| a.category() == category)
                .collect(),
            None => Vec::new(),
        },
    }
}

fn handle_spend(state: &ServerState, action: SpendAction, body: &str) -> ApiResponse {
    match parse_body::<SpendPermissionRequest>(body).and_then(|r| state.relay.spend(action, &r)) {
        Ok(value) => ApiResponse::ok(value),
        Err(e) => ApiResponse::relay_error(e, action.failure()),
    }
}

/// Reads never cache a session that is not already in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

fn with_session(
    state: &ServerState,
    session_id: &str,
    access: Access,
    f: impl FnOnce(&mut ProgressionManager) -> ApiResponse,
) -> ApiResponse {
    if !is_valid_session_id(session_id) {
        return ApiResponse::error(400, "invalid_session_id");
    }

    let opened = match access {
        Access::Read => state.sessions.peek(session_id),
        Access::Write => state.sessions.get(session_id),
    };
    let handle: SessionHandle = match opened {
        Ok(handle) => handle,
        Err(e) => return internal_error(&e),
    };

    let Ok(mut manager) = handle.lock() else {
        error!("[howtobase:http] Session {} lock poisoned", session_id);
        return ApiResponse::error(500, "session_unavailable");
    };
    f(&mut manager)
}

fn with_cors(mut response: ApiResponse) -> ApiResponse {
    response.headers.extend([
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
    ]);
    response
}

fn internal_error(e: &anyhow::Error) -> ApiResponse {
    error!("[howtobase:http] Request failed: {:#}", e);
    ApiResponse::with_status(500, json!({ "error": "internal", "details": format!("{:#}", e) }))
}
