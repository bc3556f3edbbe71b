use crate::{
    data::{RequestData, ResponseData},
    error::Error,
    http_client::HttpClient,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

/// Replays queued responses in order and records every request it receives.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<ResponseData, Error>>>,
    requests: Mutex<Vec<RequestData>>,
}

impl ScriptedHttpClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond<S: Into<String>>(self, status_code: u16, body: S) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".into(), "application/json".into());

        self.responses.lock().push_back(Ok(ResponseData {
            status_code,
            headers,
            body: body.into(),
        }));
        self
    }

    pub(crate) fn fail_with(self, error: Error) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RequestData> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn make_request(&self, request_data: &RequestData) -> Result<ResponseData, Error> {
        self.requests.lock().push(request_data.clone());

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Configuration(String::from("no scripted response left"))))
    }
}
