use crate::schema_store::Violation;
use crate::util;
use hyper::http;
use std::{fmt::Display, io, path::PathBuf, time::Duration};

#[derive(Debug)]
pub enum Error {
    Configuration(String),
    StatusMismatch {
        method: String,
        url: String,
        expected: u16,
        actual: u16,
        transcript: String,
    },
    SchemaNotFound(PathBuf),
    InvalidSchema {
        path: PathBuf,
        reason: String,
    },
    SchemaValidation {
        file_name: String,
        violations: Vec<Violation>,
        payload: String,
    },
    SchemaCapture {
        path: PathBuf,
        source: io::Error,
    },
    Transport {
        source: Box<Error>,
        transcript: String,
    },
    Timeout(Duration),
    InvalidResponseBody {
        reason: String,
        transcript: String,
    },
    Assertion(String),
    InvalidHeaderName,
    InvalidHeaderValue,
    HyperError(hyper::Error),
    HttpError(http::Error),
    JsonError(serde_json::Error),
    IoError(io::Error),
}

impl Error {
    /// The request/response transcript carried by the error, if any.
    pub fn transcript(&self) -> Option<&str> {
        match self {
            Error::StatusMismatch { transcript, .. }
            | Error::Transport { transcript, .. }
            | Error::InvalidResponseBody { transcript, .. } => Some(transcript),
            _ => None,
        }
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Configuration(message) => write!(f, "Configuration error: {}", message),
            Error::StatusMismatch {
                method,
                url,
                expected,
                actual,
                transcript,
            } => write!(
                f,
                "{} {}: Expected status code {} but got {}\n\nRecent API logs:\n{}",
                method, url, expected, actual, transcript
            ),
            Error::SchemaNotFound(path) => {
                write!(f, "Schema file not found at path: {}", path.display())
            }
            Error::InvalidSchema { path, reason } => {
                write!(f, "Schema at {} is not usable: {}", path.display(), reason)
            }
            Error::SchemaValidation {
                file_name,
                violations,
                payload,
            } => write!(
                f,
                "Schema validation for {} failed: \n{}\nActual Response Data: \n{}",
                file_name,
                util::pretty_json(violations),
                payload
            ),
            Error::SchemaCapture { path, source } => write!(
                f,
                "Failed to generate schema at path: {}, Error: {}",
                path.display(),
                source
            ),
            Error::Transport { source, transcript } => {
                write!(f, "{}\n\nRecent API logs:\n{}", source, transcript)
            }
            Error::Timeout(timeout) => write!(f, "The request timed out after {:?}", timeout),
            Error::InvalidResponseBody { reason, transcript } => write!(
                f,
                "The response body is invalid: {}\n\nRecent API logs:\n{}",
                reason, transcript
            ),
            Error::Assertion(message) => write!(f, "{}", message),
            Error::InvalidHeaderName => write!(f, "Invalid header name"),
            Error::InvalidHeaderValue => write!(f, "Invalid header value"),
            Error::HyperError(e) => write!(f, "Hyper error: {}", e),
            Error::HttpError(e) => write!(f, "Http Error: {}", e),
            Error::JsonError(e) => write!(f, "Json error: {}", e),
            Error::IoError(e) => write!(f, "IoError: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(_: hyper::header::InvalidHeaderName) -> Self {
        Error::InvalidHeaderName
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(_: hyper::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeaderValue
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::HyperError(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::HttpError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}
