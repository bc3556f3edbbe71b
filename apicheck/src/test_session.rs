use crate::{
    assertions::{self, Expect},
    auth,
    error::Error,
    request_builder::RequestBuilder,
    schema_store::SchemaStore,
    session_configuration::SessionConfiguration,
    trace_log::TraceLog,
};
use tokio::runtime::{Builder, Runtime};

/// Everything one test needs: a fresh [`TraceLog`], a [`RequestBuilder`]
/// writing into it and a [`SchemaStore`]. Nothing is shared with other
/// sessions except the cached worker token.
#[derive(Debug)]
pub struct TestSession {
    configuration: SessionConfiguration,
    trace_log: TraceLog,
    request_builder: RequestBuilder,
    schema_store: SchemaStore,
}

impl TestSession {
    /// Starts a session, acquiring the worker token first when credentials
    /// are configured.
    pub async fn start(configuration: SessionConfiguration) -> Result<Self, Error> {
        let token = match configuration.credentials() {
            Some(_) => auth::worker_token(&configuration).await?,
            None => String::new(),
        };

        Ok(Self::with_token(configuration, token))
    }

    pub fn with_token<S: Into<String>>(configuration: SessionConfiguration, token: S) -> Self {
        let trace_log = TraceLog::new();
        let request_builder = RequestBuilder::new(
            configuration.http_client(),
            configuration.base_url().cloned(),
            trace_log.clone(),
            token,
        );
        let schema_store = SchemaStore::new(configuration.schema_root());

        Self {
            configuration,
            trace_log,
            request_builder,
            schema_store,
        }
    }

    pub fn api(&mut self) -> &mut RequestBuilder {
        &mut self.request_builder
    }

    pub fn expect<'a, T: ?Sized>(&self, received: &'a T) -> Expect<'a, T> {
        assertions::expect(&self.trace_log, received).with_schema_store(self.schema_store.clone())
    }

    pub fn trace_log(&self) -> &TraceLog {
        &self.trace_log
    }

    pub fn schema_store(&self) -> &SchemaStore {
        &self.schema_store
    }

    pub fn configuration(&self) -> &SessionConfiguration {
        &self.configuration
    }
}

/// Runtime driving one `#[apicheck_test]` body.
#[doc(hidden)]
pub fn test_runtime() -> Result<Runtime, Error> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}
