use crate::{
    data::{HttpMethod, RequestData, ResponseData},
    error::Error,
    http_client::HttpClient,
    trace_log::TraceLog,
    util,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, sync::Arc};
use tracing::Instrument;
use url::{form_urlencoded, Url};

const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{[^{}/]+\}").unwrap();
}

/// Per-call request parameters. Every terminal call replaces it with
/// `CallState::new(default_base_url)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallState {
    pub base_url: Option<String>,
    pub path: String,
    pub path_params: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl CallState {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url,
            path: String::new(),
            path_params: BTreeMap::new(),
            query_params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: Value::Object(Map::new()),
        }
    }

    /// Substitutes `{key}` placeholders with URL-encoded path parameters and
    /// appends the query parameters to `base_url + path`.
    ///
    /// Placeholders without a matching parameter stay in the URL as written.
    pub fn resolve_url(&self) -> Result<String, Error> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            Error::Configuration(String::from(
                "Base URL is not defined. Set it on the session configuration or call `url(...)`",
            ))
        })?;
        Url::parse(base_url).map_err(|e| {
            Error::Configuration(format!("Base URL `{}` is not a valid URL: {}", base_url, e))
        })?;

        let mut resolved_path = self.path.clone();
        for (key, value) in &self.path_params {
            let encoded = urlencoding::encode(value);
            resolved_path = resolved_path.replace(&format!("{{{}}}", key), &encoded);
        }

        for unresolved in PLACEHOLDER_REGEX.find_iter(&resolved_path) {
            tracing::warn!(
                placeholder = unresolved.as_str(),
                path = %self.path,
                "no path parameter for placeholder, leaving it in the URL"
            );
        }

        let mut url = format!("{}{}", base_url, resolved_path);
        if !self.query_params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query_params)
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        Ok(url)
    }
}

/// Fluent builder that issues one HTTP call per terminal method
/// ([`get`](Self::get), [`post`](Self::post), [`put`](Self::put),
/// [`delete`](Self::delete)), checks the status code and logs the exchange
/// into the session's [`TraceLog`].
///
/// Configuration methods overwrite the previous value of their field. After
/// every terminal call, successful or not, the per-call state goes back to its
/// defaults; the bearer token and the `suppress_auth` flag are kept for the
/// builder's lifetime.
///
/// Terminal calls borrow the builder mutably, so only one call can be in
/// flight per builder.
#[derive(Debug)]
pub struct RequestBuilder {
    http_client: Arc<dyn HttpClient + Send + Sync>,
    trace_log: TraceLog,
    default_base_url: Option<String>,
    state: CallState,
    auth_token: String,
    suppress_auth: bool,
}

impl RequestBuilder {
    pub fn new<S: Into<String>>(
        http_client: Arc<dyn HttpClient + Send + Sync>,
        base_url: Option<String>,
        trace_log: TraceLog,
        auth_token: S,
    ) -> Self {
        Self {
            http_client,
            trace_log,
            state: CallState::new(base_url.clone()),
            default_base_url: base_url,
            auth_token: auth_token.into(),
            suppress_auth: false,
        }
    }

    pub fn url<S: Into<String>>(&mut self, url: S) -> &mut Self {
        self.state.base_url = Some(url.into());
        self
    }

    pub fn path<S: Into<String>>(&mut self, path: S) -> &mut Self {
        self.state.path = path.into();
        self
    }

    pub fn path_params<K, V, I>(&mut self, params: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.state.path_params = collect_pairs(params);
        self
    }

    pub fn query_params<K, V, I>(&mut self, params: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.state.query_params = collect_pairs(params);
        self
    }

    pub fn headers<K, V, I>(&mut self, headers: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.state.headers = collect_pairs(headers);
        self
    }

    pub fn body<B: Into<Value>>(&mut self, body: B) -> &mut Self {
        self.state.body = body.into();
        self
    }

    /// Stops injecting `Authorization: Bearer <token>` for the rest of the
    /// builder's lifetime.
    pub fn suppress_auth(&mut self) -> &mut Self {
        self.suppress_auth = true;
        self
    }

    pub fn call_state(&self) -> &CallState {
        &self.state
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn suppresses_auth(&self) -> bool {
        self.suppress_auth
    }

    pub fn trace_log(&self) -> &TraceLog {
        &self.trace_log
    }

    pub async fn get(&mut self, expected_status: u16) -> Result<Value, Error> {
        self.call_json(HttpMethod::Get, expected_status).await
    }

    pub async fn post(&mut self, expected_status: u16) -> Result<Value, Error> {
        self.call_json(HttpMethod::Post, expected_status).await
    }

    pub async fn put(&mut self, expected_status: u16) -> Result<Value, Error> {
        self.call_json(HttpMethod::Put, expected_status).await
    }

    /// Deletions answer with a plain confirmation message, so the body is
    /// returned as text and never parsed as JSON.
    pub async fn delete(&mut self, expected_status: u16) -> Result<String, Error> {
        let (url, response) = self.dispatch(HttpMethod::Delete).await?;

        self.trace_log.log_response(
            response.status_code,
            &Value::String(response.body.clone()),
            &response.headers,
        );
        self.validate_status(
            HttpMethod::Delete,
            &url,
            expected_status,
            response.status_code,
        )?;

        Ok(response.body)
    }

    async fn call_json(
        &mut self,
        method: HttpMethod,
        expected_status: u16,
    ) -> Result<Value, Error> {
        let (url, response) = self.dispatch(method).await?;

        let parsed = parse_json_body(&response.body);
        let logged_body = match &parsed {
            Ok(value) => value.clone(),
            Err(_) => Value::String(response.body.clone()),
        };
        self.trace_log
            .log_response(response.status_code, &logged_body, &response.headers);
        self.validate_status(method, &url, expected_status, response.status_code)?;

        parsed.map_err(|e| Error::InvalidResponseBody {
            reason: format!("{} {} did not return JSON: {}", method, url, e),
            transcript: self.trace_log.recent_logs(),
        })
    }

    /// Resolves, logs and sends the request. The call state is reset before
    /// anything can fail.
    async fn dispatch(&mut self, method: HttpMethod) -> Result<(String, ResponseData), Error> {
        let defaults = CallState::new(self.default_base_url.clone());
        let call = std::mem::replace(&mut self.state, defaults);

        let url = call.resolve_url()?;
        let headers = self.effective_headers(method, &call.headers);
        let body = if method.sends_body() {
            Some(serde_json::to_string(&call.body)?)
        } else {
            None
        };

        self.trace_log
            .log_request(method.as_str(), url.as_str(), &headers, &call.body);

        let request_data = RequestData {
            method,
            url: url.clone(),
            headers,
            body,
        };
        let span = tracing::info_span!("api_call", %method, url = %url);
        let response = self
            .http_client
            .make_request(&request_data)
            .instrument(span)
            .await
            .map_err(|source| Error::Transport {
                source: Box::new(source),
                transcript: self.trace_log.recent_logs(),
            })?;

        Ok((url, response))
    }

    fn effective_headers(
        &self,
        method: HttpMethod,
        explicit: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut headers = explicit.clone();

        if !self.suppress_auth && !util::contains_header(&headers, AUTHORIZATION) {
            let bearer = format!("Bearer {}", self.auth_token);
            headers.insert(String::from(AUTHORIZATION), bearer);
        }
        if method.sends_body() && !util::contains_header(&headers, CONTENT_TYPE) {
            headers.insert(String::from(CONTENT_TYPE), String::from("application/json"));
        }

        headers
    }

    fn validate_status(
        &self,
        method: HttpMethod,
        url: &str,
        expected: u16,
        actual: u16,
    ) -> Result<(), Error> {
        if expected == actual {
            return Ok(());
        }

        tracing::error!(%method, url, expected, actual, "unexpected status code");
        Err(Error::StatusMismatch {
            method: method.to_string(),
            url: url.into(),
            expected,
            actual,
            transcript: self.trace_log.recent_logs(),
        })
    }
}

fn collect_pairs<K, V, I>(pairs: I) -> BTreeMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

fn parse_json_body(body: &str) -> Result<Value, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
}
