//! Protocol-level client core for harvesting public posts from a
//! microblogging platform's internal account+keyword search API.
//!
//! The outer shell (CLI parsing, the interactive browser login, output
//! writing) lives in `main`; this library re-exports the pieces that do
//! the actual work: session management, request signing, the retrying
//! HTTP client, response parsing, and the crawl loop that ties them
//! together.

pub mod client;
pub mod config;
pub mod crawler;
pub mod date_util;
pub mod driver;
pub mod error;
pub mod io_loader;
pub mod jsonl;
pub mod logging;
pub mod parser;
pub mod session;
pub mod txid;
