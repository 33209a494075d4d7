//! Crate-wide error types.
//!
//! Two kinds matter to callers crossing the Crawl Loop / Outer Driver
//! boundary: [`AuthenticationError`] (session rejected, recoverable once via
//! a cookie refresh) and [`ProtocolRequestError`] (any other terminal
//! request failure). Everything else is either absorbed by the retry
//! machinery inside the client, or surfaces as [`InputError`] before any
//! network work begins.

use thiserror::Error;

/// The session's cookies were rejected by the platform (HTTP 401/403).
#[derive(Debug, Error)]
#[error("authentication failed: {0}")]
pub struct AuthenticationError(pub String);

/// A request failed in a way the retry state machine could not recover
/// from (retries exhausted, or an unexpected non-auth 4xx).
#[derive(Debug, Error)]
#[error("protocol request failed: {0}")]
pub struct ProtocolRequestError(pub String);

/// Errors surfaced while issuing a request or decoding its response, before
/// the retry loop has classified them as auth/protocol failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Protocol(#[from] ProtocolRequestError),
}

/// Failures while reconstructing the per-request transaction id.
#[derive(Debug, Error)]
pub enum TxidError {
    #[error("missing {0} in home page/ondemand script")]
    MissingKey(&'static str),
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("network error fetching bootstrap artifacts: {0}")]
    Network(#[from] reqwest::Error),
}

/// Input-validation failures. These terminate the program with exit code 2
/// before any network work happens.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid date format '{0}', expected YYYY_M_D")]
    BadDate(String),
    #[error("start_date {start} is after end_date {end}")]
    StartAfterEnd { start: String, end: String },
    #[error("missing input file: {0}")]
    MissingFile(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid account URL scheme: {0}")]
    BadUrlScheme(String),
    #[error("account URL must point to x.com/twitter.com: {0}")]
    BadUrlHost(String),
    #[error("missing account handle in URL: {0}")]
    MissingHandle(String),
    #[error("invalid account handle '{handle}' from URL: {url}")]
    BadHandle { handle: String, url: String },
    #[error("accounts file filtered to empty")]
    EmptyAccounts,
    #[error("keywords file filtered to empty")]
    EmptyKeywords,
}

/// Failures loading/saving/refreshing the cookie jar.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not read cookie file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse cookie file as JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("login completed but credential probe failed{0}")]
    ProbeFailed(String),
    #[error("interactive login failed: {0}")]
    Login(String),
}
