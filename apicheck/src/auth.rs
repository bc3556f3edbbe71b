use crate::{
    assertions::expect, error::Error, request_builder::RequestBuilder,
    session_configuration::SessionConfiguration, trace_log::TraceLog,
};
use lazy_static::lazy_static;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;

lazy_static! {
    static ref WORKER_TOKENS: Mutex<HashMap<(String, String), String>> = Mutex::new(HashMap::new());
}

/// Exchanges the configured credentials for a bearer token.
pub async fn acquire_token(configuration: &SessionConfiguration) -> Result<String, Error> {
    let credentials = configuration
        .credentials()
        .ok_or_else(|| Error::Configuration("Credentials are required for a token".into()))?;

    let trace_log = TraceLog::new();
    let mut api = RequestBuilder::new(
        configuration.http_client(),
        configuration.base_url().cloned(),
        trace_log.clone(),
        "",
    );
    let response = api
        .path(configuration.auth_path())
        .body(json!({
            "username": credentials.username(),
            "password": credentials.password(),
        }))
        .suppress_auth()
        .post(200)
        .await?;

    expect(&trace_log, &response.get("token")).should_be_defined()?;

    response["token"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| Error::InvalidResponseBody {
            reason: String::from("`token` is not a string"),
            transcript: trace_log.recent_logs(),
        })
}

/// Token shared by every session of this process for the configured base URL
/// and user. It is acquired once and never refreshed; call
/// [`acquire_token`] for a fresh one.
pub async fn worker_token(configuration: &SessionConfiguration) -> Result<String, Error> {
    let key = (
        configuration.base_url().cloned().unwrap_or_default(),
        configuration
            .credentials()
            .map(|credentials| credentials.username().to_string())
            .unwrap_or_default(),
    );

    let mut tokens = WORKER_TOKENS.lock().await;
    if let Some(token) = tokens.get(&key) {
        return Ok(token.clone());
    }

    let token = acquire_token(configuration).await?;
    tracing::info!(base_url = %key.0, username = %key.1, "acquired worker token");
    tokens.insert(key, token.clone());

    Ok(token)
}
