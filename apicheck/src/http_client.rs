use crate::{
    data::{RequestData, ResponseData},
    error::Error,
    util,
};
use async_trait::async_trait;
use hyper::{body, client::HttpConnector, Body, Client, Request};
use hyper_tls::HttpsConnector;
use std::{fmt::Debug, time::Duration};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait HttpClient: Debug {
    async fn make_request(&self, request_data: &RequestData) -> Result<ResponseData, Error>;
}

#[derive(Debug)]
pub struct HyperHttpClient {
    client: Client<HttpsConnector<HttpConnector>>,
    timeout: Option<Duration>,
}

impl HyperHttpClient {
    pub fn new() -> Self {
        Self::with_timeout(Some(DEFAULT_TIMEOUT))
    }

    /// `None` waits for as long as the transport does.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            client: Client::builder().build(HttpsConnector::new()),
            timeout,
        }
    }

    async fn exchange(&self, request: Request<Body>) -> Result<ResponseData, Error> {
        let response = self.client.request(request).await?;

        let status_code = response.status().as_u16();
        let headers = util::extract_headers(response.headers());
        let body = body::to_bytes(response.into_body()).await?;
        let body: String = String::from_utf8_lossy(&body).into();

        Ok(ResponseData {
            status_code,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn make_request(&self, request_data: &RequestData) -> Result<ResponseData, Error> {
        let mut request_builder = Request::builder()
            .uri(request_data.url.as_str())
            .method(request_data.method.as_str());

        if let Some(headers_mut) = request_builder.headers_mut() {
            util::put_headers(headers_mut, &request_data.headers)?;
        }

        let body = match &request_data.body {
            Some(body) => Body::from(body.clone()),
            None => Body::empty(),
        };
        let request = request_builder.body(body)?;

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(request))
                .await
                .map_err(|_| Error::Timeout(timeout))?,
            None => self.exchange(request).await,
        }
    }
}

impl Default for HyperHttpClient {
    fn default() -> Self {
        Self::new()
    }
}
