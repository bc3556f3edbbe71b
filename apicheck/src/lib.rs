mod assertions;
pub mod auth;
mod data;
mod error;
mod http_client;
mod request_builder;
mod schema_inference;
mod schema_store;
mod session_configuration;
pub mod telemetry;
mod test_session;
mod trace_log;
mod util;

#[cfg(test)]
mod testing;

pub use apicheck_codegen::apicheck_test;
pub use assertions::{
    conclude, defined, equals, expect, less_than_or_equal, matches_schema, Expect, MatcherResult,
};
pub use data::{HttpMethod, RequestData, ResponseData};
pub use error::Error;
pub use http_client::{HttpClient, HyperHttpClient, DEFAULT_TIMEOUT};
pub use request_builder::{CallState, RequestBuilder};
pub use schema_inference::infer_schema;
pub use schema_store::{
    evaluate, SchemaMode, SchemaStore, ValidationResult, Violation, DEFAULT_SCHEMA_ROOT,
};
pub use session_configuration::{Credentials, SessionConfiguration};
pub use test_session::{test_runtime, TestSession};
pub use trace_log::{LogEntry, RequestRecord, ResponseRecord, TraceLog};
