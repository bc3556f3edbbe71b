//! Expectations that attach the session's HTTP transcript to their failures.
//!
//! Each predicate is a plain function producing a [`MatcherResult`];
//! [`conclude`] turns a result into `Ok(())` or an [`Error::Assertion`]
//! carrying the transcript, for both plain and negated expectations.

use crate::{
    error::Error,
    schema_store::{SchemaMode, SchemaStore},
    trace_log::TraceLog,
};
use serde_json::Value;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherResult {
    pub pass: bool,
    pub message: String,
}

impl MatcherResult {
    pub fn new<S: Into<String>>(pass: bool, message: S) -> Self {
        Self {
            pass,
            message: message.into(),
        }
    }
}

pub fn equals<T, U>(received: &T, expected: &U) -> MatcherResult
where
    T: PartialEq<U> + Debug + ?Sized,
    U: Debug + ?Sized,
{
    MatcherResult::new(
        received == expected,
        format!("Expected: {:#?}\nReceived: {:#?}", expected, received),
    )
}

pub fn less_than_or_equal<T, U>(received: &T, bound: &U) -> MatcherResult
where
    T: PartialOrd<U> + Debug + ?Sized,
    U: Debug + ?Sized,
{
    MatcherResult::new(
        received <= bound,
        format!("Expected: <= {:#?}\nReceived: {:#?}", bound, received),
    )
}

pub fn defined<T: Debug>(received: &Option<T>) -> MatcherResult {
    MatcherResult::new(received.is_some(), format!("Received: {:#?}", received))
}

/// Only schema violations fail the match. A missing or broken schema, or a
/// failed capture, is returned as an error whatever the polarity.
pub async fn matches_schema(
    schema_store: &SchemaStore,
    received: &Value,
    group: &str,
    name: &str,
    mode: SchemaMode,
) -> Result<MatcherResult, Error> {
    match schema_store.validate(group, name, received, mode).await {
        Ok(()) => Ok(MatcherResult::new(true, "Validation schema passed.")),
        Err(e @ Error::SchemaValidation { .. }) => Ok(MatcherResult::new(false, e.to_string())),
        Err(e) => Err(e),
    }
}

/// Fails when `result.pass` disagrees with the expectation's polarity, with
/// the matcher hint, the predicate's message and the transcript.
pub fn conclude(
    matcher: &str,
    negated: bool,
    result: MatcherResult,
    trace_log: &TraceLog,
) -> Result<(), Error> {
    if result.pass != negated {
        return Ok(());
    }

    let hint = if negated {
        format!("expect(received).not.{}()", matcher)
    } else {
        format!("expect(received).{}()", matcher)
    };

    Err(Error::Assertion(format!(
        "{}\n\n{}\n\nAPI Logs:\n{}",
        hint,
        result.message,
        trace_log.recent_logs()
    )))
}

pub struct Expect<'a, T: ?Sized> {
    received: &'a T,
    trace_log: TraceLog,
    schema_store: SchemaStore,
    negated: bool,
}

pub fn expect<'a, T: ?Sized>(trace_log: &TraceLog, received: &'a T) -> Expect<'a, T> {
    Expect {
        received,
        trace_log: trace_log.clone(),
        schema_store: SchemaStore::default(),
        negated: false,
    }
}

impl<'a, T: ?Sized> Expect<'a, T> {
    pub fn with_schema_store(mut self, schema_store: SchemaStore) -> Self {
        self.schema_store = schema_store;
        self
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn should_equal<U>(&self, expected: U) -> Result<(), Error>
    where
        T: PartialEq<U> + Debug,
        U: Debug,
    {
        let result = equals(self.received, &expected);
        conclude("should_equal", self.negated, result, &self.trace_log)
    }

    pub fn should_be_less_than_or_equal<U>(&self, bound: U) -> Result<(), Error>
    where
        T: PartialOrd<U> + Debug,
        U: Debug,
    {
        let result = less_than_or_equal(self.received, &bound);
        conclude(
            "should_be_less_than_or_equal",
            self.negated,
            result,
            &self.trace_log,
        )
    }
}

impl<'a, V: Debug> Expect<'a, Option<V>> {
    pub fn should_be_defined(&self) -> Result<(), Error> {
        let result = defined(self.received);
        conclude("should_be_defined", self.negated, result, &self.trace_log)
    }
}

impl<'a> Expect<'a, Value> {
    pub async fn should_match_schema(&self, group: &str, name: &str) -> Result<(), Error> {
        self.should_match_schema_with(group, name, SchemaMode::Verify)
            .await
    }

    pub async fn should_match_schema_with(
        &self,
        group: &str,
        name: &str,
        mode: SchemaMode,
    ) -> Result<(), Error> {
        let result = matches_schema(&self.schema_store, self.received, group, name, mode).await?;
        conclude("should_match_schema", self.negated, result, &self.trace_log)
    }
}
