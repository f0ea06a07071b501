//! Relays for paymaster sponsorship and spend-permission payloads
//!
//! Payloads are opaque: we only check that the required fields are present
//! (and that sponsorship targets Base Sepolia) before forwarding them as JSON
//! to the configured upstream service.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::RelaySettings;

/// Chain id of Base Sepolia, the only chain the paymaster sponsors
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

/// Relay failures, each mapping to an HTTP status
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Paymaster only available on Base Sepolia")]
    UnsupportedChain(Option<Value>),

    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBody(_) | Self::MissingFields(_) | Self::UnsupportedChain(_) => 400,
            Self::NotConfigured(_) | Self::Upstream(_) => 500,
        }
    }

    /// JSON error body; upstream failures are reported under `failure`
    pub fn to_json(&self, failure: &str) -> Value {
        match self {
            Self::Upstream(details) => json!({ "error": failure, "details": details }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// JS-style truthiness: null, "", false and 0 count as missing
fn is_present(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Parse a JSON request body into a relay request type
pub fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, RelayError> {
    serde_json::from_str(body).map_err(|e| RelayError::InvalidBody(e.to_string()))
}

/// `POST /api/paymaster` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorRequest {
    #[serde(default)]
    pub calls: Option<Value>,
    /// Kept loose so a string or other wrong type is reported as the wrong chain
    #[serde(default)]
    pub chain_id: Option<Value>,
}

impl SponsorRequest {
    /// JSON-RPC request sent to the paymaster
    pub fn to_rpc(&self) -> Result<Value, RelayError> {
        let on_base_sepolia = matches!(
            &self.chain_id,
            Some(Value::Number(n)) if n.as_f64() == Some(BASE_SEPOLIA_CHAIN_ID as f64)
        );
        if !on_base_sepolia {
            return Err(RelayError::UnsupportedChain(self.chain_id.clone()));
        }
        if !is_present(&self.calls) {
            return Err(RelayError::MissingFields("Missing calls"));
        }

        Ok(json!({
            "method": "pm_sponsorUserOperation",
            "params": [{
                "calls": self.calls,
                "chainId": BASE_SEPOLIA_CHAIN_ID.to_string(),
            }],
            "id": 1,
            "jsonrpc": "2.0",
        }))
    }
}

/// What to do with a signed spend permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendAction {
    Approve,
    Collect,
}

impl SpendAction {
    fn path(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Collect => "collect",
        }
    }

    fn missing_message(&self) -> &'static str {
        match self {
            Self::Approve => "Missing spendPermission or signature",
            Self::Collect => "Missing required parameters: spendPermission, signature, or amount",
        }
    }

    /// Label used for upstream failures
    pub fn failure(&self) -> &'static str {
        match self {
            Self::Approve => "Failed to approve spend permission",
            Self::Collect => "Failed to collect subscription payment",
        }
    }
}

/// `POST /api/approve-spend-permission` and `/api/collect-subscription` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendPermissionRequest {
    #[serde(default)]
    pub spend_permission: Option<Value>,
    #[serde(default)]
    pub signature: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
}

impl SpendPermissionRequest {
    /// Payload forwarded to the spender service
    pub fn to_payload(&self, action: SpendAction) -> Result<Value, RelayError> {
        let mut complete = is_present(&self.spend_permission) && is_present(&self.signature);
        if action == SpendAction::Collect {
            complete &= is_present(&self.amount);
        }
        if !complete {
            return Err(RelayError::MissingFields(action.missing_message()));
        }

        let mut payload = json!({
            "spendPermission": self.spend_permission,
            "signature": self.signature,
        });
        if action == SpendAction::Collect {
            payload["amount"] = self.amount.clone().unwrap_or(Value::Null);
        }
        Ok(payload)
    }
}

/// Profile data posted back by the smart wallet
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCallback {
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub physical_address: Option<Value>,
    #[serde(default)]
    pub phone_number: Option<Value>,
}

impl ProfileCallback {
    /// Acknowledge which profile fields were received
    pub fn acknowledge(&self, now: DateTime<Utc>) -> Value {
        let verified = |v: &Option<Value>| {
            if is_present(v) {
                Value::from("✅ Verified")
            } else {
                Value::Null
            }
        };

        json!({
            "success": true,
            "message": "Profile data received and processed",
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            "processedData": {
                "email": verified(&self.email),
                "name": verified(&self.name),
                "address": verified(&self.physical_address),
                "phone": verified(&self.phone_number),
            },
        })
    }
}

/// HTTP client for the upstream paymaster and spender services
#[derive(Clone)]
pub struct RelayClient {
    settings: RelaySettings,
    client: ureq::Agent,
}

impl RelayClient {
    pub fn new(settings: RelaySettings) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(settings.timeout_secs))
            .build();

        Self { settings, client }
    }

    /// Forward a sponsorship request to the paymaster
    pub fn sponsor(&self, request: &SponsorRequest) -> Result<Value, RelayError> {
        let rpc = request.to_rpc()?;
        let url = self
            .settings
            .paymaster_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(RelayError::NotConfigured("Paymaster URL"))?;

        let mut call = self.client.post(url);
        if let Some(key) = self.settings.paymaster_api_key.as_deref() {
            call = call.set("Authorization", &format!("Bearer {}", key));
        }

        let paymaster_data = send(call, &rpc)?;
        info!("[howtobase:relay] Sponsored user operation via paymaster");

        Ok(json!({
            "success": true,
            "paymasterData": paymaster_data,
            "message": "Transaction sponsored successfully",
        }))
    }

    /// Forward a signed spend permission to the spender service
    pub fn spend(
        &self,
        action: SpendAction,
        request: &SpendPermissionRequest,
    ) -> Result<Value, RelayError> {
        let payload = request.to_payload(action)?;
        let base = self
            .settings
            .spender_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(RelayError::NotConfigured("Spender URL"))?;
        let url = format!("{}/{}", base.trim_end_matches('/'), action.path());

        let result = send(self.client.post(&url), &payload)?;
        info!("[howtobase:relay] Spend permission {} forwarded", action.path());

        let mut response = json!({ "success": true, "result": result });
        if action == SpendAction::Collect {
            response["amountCollected"] = payload["amount"].clone();
            response["message"] = Value::from("Subscription payment collected successfully");
        }
        Ok(response)
    }
}

fn send(call: ureq::Request, body: &Value) -> Result<Value, RelayError> {
    let response = call.send_json(body).map_err(|e| {
        error!("[howtobase:relay] Upstream error: {}", e);
        match e {
            ureq::Error::Status(code, _) => {
                RelayError::Upstream(format!("upstream returned status {}", code))
            }
            ureq::Error::Transport(t) => RelayError::Upstream(t.to_string()),
        }
    })?;

    response
        .into_json::<Value>()
        .map_err(|e| RelayError::Upstream(format!("invalid upstream JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sponsor_rpc_shape() {
        let request: SponsorRequest =
            parse_body(r#"{"calls":[{"to":"0xabc","data":"0x"}],"chainId":84532}"#).unwrap();
        let rpc = request.to_rpc().unwrap();
        assert_eq!(rpc["method"], "pm_sponsorUserOperation");
        assert_eq!(rpc["params"][0]["chainId"], "84532");
        assert_eq!(rpc["params"][0]["calls"][0]["to"], "0xabc");
        assert_eq!(rpc["jsonrpc"], "2.0");
        assert_eq!(rpc["id"], 1);
    }

    #[test]
    fn test_sponsor_rejects_other_chains() {
        let request: SponsorRequest = parse_body(r#"{"calls":[],"chainId":8453}"#).unwrap();
        let err = request.to_rpc().unwrap_err();
        assert!(matches!(&err, RelayError::UnsupportedChain(Some(v)) if v == 8453));
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_json("Failed to sponsor transaction")["error"],
            "Paymaster only available on Base Sepolia"
        );

        let missing = SponsorRequest::default().to_rpc().unwrap_err();
        assert!(matches!(missing, RelayError::UnsupportedChain(None)));
    }

    #[test]
    fn test_sponsor_rejects_chain_id_given_as_string() {
        let request: SponsorRequest =
            parse_body(r#"{"calls":[{"to":"0x1"}],"chainId":"84532"}"#).unwrap();
        let err = request.to_rpc().unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedChain(Some(Value::String(_)))));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Paymaster only available on Base Sepolia");
    }

    #[test]
    fn test_sponsor_accepts_float_chain_id() {
        let request: SponsorRequest =
            parse_body(r#"{"calls":[{"to":"0x1"}],"chainId":84532.0}"#).unwrap();
        assert!(request.to_rpc().is_ok());
    }

    #[test]
    fn test_sponsor_requires_calls() {
        let request: SponsorRequest = parse_body(r#"{"chainId":84532}"#).unwrap();
        let err = request.to_rpc().unwrap_err();
        assert_eq!(err.to_string(), "Missing calls");
    }

    #[test]
    fn test_approve_requires_permission_and_signature() {
        let request: SpendPermissionRequest =
            parse_body(r#"{"spendPermission":{"account":"0x1"},"signature":""}"#).unwrap();
        let err = request.to_payload(SpendAction::Approve).unwrap_err();
        assert_eq!(err.to_string(), "Missing spendPermission or signature");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_collect_requires_nonzero_amount() {
        let request: SpendPermissionRequest = parse_body(
            r#"{"spendPermission":{"account":"0x1"},"signature":"0xsig","amount":0}"#,
        )
        .unwrap();
        assert!(request.to_payload(SpendAction::Approve).is_ok());
        let err = request.to_payload(SpendAction::Collect).unwrap_err();
        assert!(err.to_string().starts_with("Missing required parameters"));

        let request: SpendPermissionRequest = parse_body(
            r#"{"spendPermission":{"account":"0x1"},"signature":"0xsig","amount":"1000000"}"#,
        )
        .unwrap();
        let payload = request.to_payload(SpendAction::Collect).unwrap();
        assert_eq!(payload["amount"], "1000000");
        assert_eq!(payload["signature"], "0xsig");
    }

    #[test]
    fn test_unconfigured_upstreams() {
        let client = RelayClient::new(RelaySettings::default());

        let sponsor: SponsorRequest = parse_body(r#"{"calls":[1],"chainId":84532}"#).unwrap();
        let err = client.sponsor(&sponsor).unwrap_err();
        assert!(matches!(err, RelayError::NotConfigured("Paymaster URL")));
        assert_eq!(err.status_code(), 500);

        let spend: SpendPermissionRequest =
            parse_body(r#"{"spendPermission":{},"signature":"0x1"}"#).unwrap();
        let err = client.spend(SpendAction::Approve, &spend).unwrap_err();
        assert!(matches!(err, RelayError::NotConfigured("Spender URL")));
    }

    #[test]
    fn test_invalid_body() {
        let err = parse_body::<SponsorRequest>("{not json").unwrap_err();
        assert!(matches!(err, RelayError::InvalidBody(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_upstream_error_body_has_details() {
        let err = RelayError::Upstream("timeout".to_string());
        let body = err.to_json("Failed to sponsor transaction");
        assert_eq!(body["error"], "Failed to sponsor transaction");
        assert_eq!(body["details"], "timeout");
    }

    #[test]
    fn test_profile_acknowledgement() {
        let callback: ProfileCallback =
            parse_body(r#"{"email":"a@b.c","name":"","phoneNumber":"+1"}"#).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let ack = callback.acknowledge(now);
        assert_eq!(ack["success"], true);
        assert_eq!(ack["timestamp"], "2026-04-01T12:00:00.000Z");
        assert_eq!(ack["processedData"]["email"], "✅ Verified");
        assert!(ack["processedData"]["name"].is_null());
        assert!(ack["processedData"]["address"].is_null());
        assert_eq!(ack["processedData"]["phone"], "✅ Verified");
    }
}
