//! Integration tests for the progression HTTP API handlers

mod common;

use std::sync::Arc;
use std::thread;

use serde_json::Value;

use howtobase::progression::ProgressDb;
use howtobase::server::dispatch;

use common::{limited_state, memory_state, persistent_state, persistent_state_with_limit};

#[test]
fn health_and_static_tables() {
    let state = memory_state();

    let health = dispatch(&state, "GET", "/health", "");
    assert_eq!(health.status, 200);
    assert_eq!(health.body["status"], "ok");

    let levels = dispatch(&state, "GET", "/levels", "");
    assert_eq!(levels.body["levels"].as_array().map(Vec::len), Some(10));
    assert_eq!(levels.body["levels"][9]["title"], "Base God");

    let catalog = dispatch(&state, "GET", "/catalog?category=nft", "");
    let entries = catalog.body["achievements"].as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["category"] == "nft"));
    assert_eq!(catalog.body["maxLevel"]["level"], 10);
}

#[test]
fn session_lifecycle() {
    let state = memory_state();

    let created = dispatch(&state, "POST", "/sessions", "");
    assert_eq!(created.status, 201);
    let sid = created.body["sessionId"].as_str().expect("session id").to_string();

    let first = dispatch(
        &state,
        "POST",
        &format!("/sessions/{}/achievements/wallet_connected/complete", sid),
        "",
    );
    assert_eq!(first.status, 200);
    assert_eq!(first.body["unlocked"]["id"], "wallet_connected");
    assert_eq!(first.body["progress"]["totalXP"], 100);
    assert_eq!(first.body["events"][0]["type"], "achievement_unlocked");

    let second = dispatch(
        &state,
        "POST",
        &format!("/sessions/{}/achievements/wallet_connected/complete", sid),
        "",
    );
    assert_eq!(second.status, 200);
    assert_eq!(second.body["unlocked"], Value::Null);
    assert_eq!(second.body["events"].as_array().map(Vec::len), Some(0));
    assert_eq!(second.body["progress"]["totalXP"], 100);

    let unknown = dispatch(
        &state,
        "POST",
        &format!("/sessions/{}/achievements/not_real/complete", sid),
        "",
    );
    assert_eq!(unknown.status, 200);
    assert_eq!(unknown.body["unlocked"], Value::Null);

    let progress = dispatch(&state, "GET", &format!("/sessions/{}/progress", sid), "");
    assert_eq!(progress.body["progress"]["level"]["title"], "Base Beginner");
    assert_eq!(progress.body["progress"]["completedCount"], 1);
    assert_eq!(progress.body["progress"]["totalCount"], 16);

    let reset = dispatch(&state, "DELETE", &format!("/sessions/{}", sid), "");
    assert_eq!(reset.status, 200);
    let progress = dispatch(&state, "GET", &format!("/sessions/{}/progress", sid), "");
    assert_eq!(progress.body["progress"]["totalXP"], 0);
}

#[test]
fn achievements_filtered_by_category() {
    let state = memory_state();

    let wallet = dispatch(&state, "GET", "/sessions/abc/achievements?category=wallet", "");
    assert_eq!(wallet.body["achievements"].as_array().map(Vec::len), Some(2));

    let all = dispatch(&state, "GET", "/sessions/abc/achievements", "");
    assert_eq!(all.body["achievements"].as_array().map(Vec::len), Some(16));

    let unknown = dispatch(&state, "GET", "/sessions/abc/achievements?category=gaming", "");
    assert_eq!(unknown.status, 200);
    assert_eq!(unknown.body["achievements"].as_array().map(Vec::len), Some(0));
}

#[test]
fn bad_session_ids_and_unknown_routes() {
    let state = memory_state();

    let bad = dispatch(&state, "GET", "/sessions/not%20ok/progress", "");
    assert_eq!(bad.status, 400);
    assert_eq!(bad.body["error"], "invalid_session_id");

    let too_long = format!("/sessions/{}/progress", "a".repeat(65));
    assert_eq!(dispatch(&state, "GET", &too_long, "").status, 400);

    assert_eq!(dispatch(&state, "GET", "/nope", "").status, 404);
    assert_eq!(dispatch(&state, "PUT", "/levels", "").status, 404);
}

#[test]
fn reads_do_not_keep_sessions_in_memory() {
    let state = memory_state();

    for i in 0..5000 {
        let r = dispatch(&state, "GET", &format!("/sessions/reader{}/progress", i), "");
        assert_eq!(r.status, 200);
    }
    let r = dispatch(&state, "GET", "/sessions/reader1/achievements", "");
    assert_eq!(r.status, 200);
    assert_eq!(state.sessions.len(), 0);
}

#[test]
fn reset_drops_session_from_memory() {
    let state = memory_state();

    dispatch(&state, "POST", "/sessions/gone/achievements/first_swap/complete", "");
    dispatch(&state, "POST", "/sessions/kept/activity", "");
    assert_eq!(state.sessions.len(), 2);

    let reset = dispatch(&state, "DELETE", "/sessions/gone", "");
    assert_eq!(reset.status, 200);
    assert_eq!(state.sessions.len(), 1);

    let progress = dispatch(&state, "GET", "/sessions/gone/progress", "");
    assert_eq!(progress.body["progress"]["totalXP"], 0);
    assert_eq!(state.sessions.len(), 1);
}

#[test]
fn session_cache_is_bounded() {
    let state = limited_state(50);

    for i in 0..500 {
        let r = dispatch(
            &state,
            "POST",
            &format!("/sessions/writer{}/achievements/wallet_connected/complete", i),
            "",
        );
        assert_eq!(r.status, 200);
    }
    assert_eq!(state.sessions.len(), 50);
}

#[test]
fn evicted_sessions_reload_from_database() {
    let db = ProgressDb::open_in_memory().expect("db");
    let state = persistent_state_with_limit(db, 1);

    dispatch(&state, "POST", "/sessions/first/achievements/first_earn/complete", "");
    dispatch(&state, "POST", "/sessions/second/achievements/first_swap/complete", "");
    assert_eq!(state.sessions.len(), 1);

    let again = dispatch(&state, "POST", "/sessions/first/achievements/first_earn/complete", "");
    assert_eq!(again.body["unlocked"], Value::Null);
    assert_eq!(again.body["progress"]["totalXP"], 300);
}

#[test]
fn concurrent_completions_award_xp_once() {
    let state = Arc::new(memory_state());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            thread::spawn(move || {
                dispatch(
                    &state,
                    "POST",
                    "/sessions/racer/achievements/base_master/complete",
                    "",
                )
            })
        })
        .collect();

    let unlocked = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .filter(|r| r.body["unlocked"] != Value::Null)
        .count();
    assert_eq!(unlocked, 1);

    let progress = dispatch(&state, "GET", "/sessions/racer/progress", "");
    assert_eq!(progress.body["progress"]["totalXP"], 1000);
}

#[test]
fn sessions_reload_from_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("progress.db");

    {
        let state = persistent_state(ProgressDb::open(&path).expect("open"));
        let r = dispatch(&state, "POST", "/sessions/keep/achievements/first_earn/complete", "");
        assert_eq!(r.status, 200);
    }

    let state = persistent_state(ProgressDb::open(&path).expect("reopen"));
    let progress = dispatch(&state, "GET", "/sessions/keep/progress", "");
    assert_eq!(progress.body["progress"]["totalXP"], 300);
    assert_eq!(
        progress.body["progress"]["completedAchievements"][0],
        "first_earn"
    );
}

#[test]
fn paymaster_validation() {
    let state = memory_state();

    let wrong_chain = dispatch(
        &state,
        "POST",
        "/api/paymaster",
        r#"{"calls":[{"to":"0x1"}],"chainId":1}"#,
    );
    assert_eq!(wrong_chain.status, 400);
    assert_eq!(wrong_chain.body["error"], "Paymaster only available on Base Sepolia");

    let no_calls = dispatch(&state, "POST", "/api/paymaster", r#"{"chainId":84532}"#);
    assert_eq!(no_calls.status, 400);
    assert_eq!(no_calls.body["error"], "Missing calls");

    let string_chain = dispatch(
        &state,
        "POST",
        "/api/paymaster",
        r#"{"calls":[{"to":"0x1"}],"chainId":"84532"}"#,
    );
    assert_eq!(string_chain.status, 400);
    assert_eq!(string_chain.body["error"], "Paymaster only available on Base Sepolia");

    let garbage = dispatch(&state, "POST", "/api/paymaster", "not json");
    assert_eq!(garbage.status, 400);

    let unconfigured = dispatch(
        &state,
        "POST",
        "/api/paymaster",
        r#"{"calls":[{"to":"0x1"}],"chainId":84532}"#,
    );
    assert_eq!(unconfigured.status, 500);
}

#[test]
fn spend_permission_validation() {
    let state = memory_state();

    let approve = dispatch(
        &state,
        "POST",
        "/api/approve-spend-permission",
        r#"{"signature":"0xsig"}"#,
    );
    assert_eq!(approve.status, 400);
    assert_eq!(approve.body["error"], "Missing spendPermission or signature");

    let collect = dispatch(
        &state,
        "POST",
        "/api/collect-subscription",
        r#"{"spendPermission":{},"signature":"0xsig"}"#,
    );
    assert_eq!(collect.status, 400);
    assert_eq!(
        collect.body["error"],
        "Missing required parameters: spendPermission, signature, or amount"
    );
}

#[test]
fn data_validation_acknowledges_profile_with_cors() {
    let state = memory_state();

    let r = dispatch(
        &state,
        "POST",
        "/api/data-validation",
        r#"{"email":"a@b.c","name":{"first":"Ada"}}"#,
    );
    assert_eq!(r.status, 200);
    assert_eq!(r.body["success"], true);
    assert_eq!(r.body["processedData"]["email"], "✅ Verified");
    assert_eq!(r.body["processedData"]["phone"], Value::Null);
    assert!(r
        .headers
        .iter()
        .any(|(k, v)| *k == "Access-Control-Allow-Origin" && *v == "*"));

    let preflight = dispatch(&state, "OPTIONS", "/api/data-validation", "");
    assert_eq!(preflight.status, 200);
    assert!(!preflight.headers.is_empty());
}
