//! Loads and normalizes the accounts and keyword input files.
//!
//! Grounded on `original_source/src/io_loader.py`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::InputError;

static HANDLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap());
static KEYWORD_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,\u{ff0c}+]+").unwrap());

/// A single account crawl target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSpec {
    pub url: String,
    pub handle: String,
}

fn clean_lines<'a>(lines: impl Iterator<Item = &'a str>) -> impl Iterator<Item = &'a str> {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn extract_handle(url: &str) -> Result<String, InputError> {
    let parsed = Url::parse(url).map_err(|_| InputError::BadUrlScheme(url.to_owned()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(InputError::BadUrlScheme(url.to_owned()));
    }
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    if !matches!(host.as_str(), "x.com" | "www.x.com" | "twitter.com" | "www.twitter.com") {
        return Err(InputError::BadUrlHost(url.to_owned()));
    }

    let path = parsed.path().trim_matches('/');
    if path.is_empty() {
        return Err(InputError::MissingHandle(url.to_owned()));
    }
    let handle = path.split('/').next().unwrap_or("");
    if !HANDLE_RE.is_match(handle) {
        return Err(InputError::BadHandle {
            handle: handle.to_owned(),
            url: url.to_owned(),
        });
    }
    Ok(handle.to_owned())
}

/// Parses account URLs into deduplicated [`AccountSpec`]s (first URL wins
/// on a case-insensitive handle collision).
pub fn load_accounts<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Vec<AccountSpec>, InputError> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    for url in clean_lines(lines) {
        let handle = extract_handle(url)?;
        let dedupe_key = handle.to_lowercase();
        if !seen.insert(dedupe_key) {
            continue;
        }
        result.push(AccountSpec {
            url: url.to_owned(),
            handle,
        });
    }
    Ok(result)
}

fn normalize_keyword_rule(raw: &str) -> String {
    KEYWORD_SPLIT_RE
        .split(raw.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses and deduplicates the keyword list, collapsing whitespace/comma/
/// plus-separated phrases into single space-joined terms.
pub fn load_keywords<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    for keyword in clean_lines(lines) {
        let normalized = normalize_keyword_rule(keyword);
        if normalized.is_empty() {
            continue;
        }
        let key = normalized.to_lowercase();
        if !seen.insert(key) {
            continue;
        }
        result.push(normalized);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_accounts_skipping_comments_and_blanks() {
        let input = "# comment\n\nhttps://x.com/alice\nhttps://twitter.com/bob/status/1\n";
        let accounts = load_accounts(input.lines()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].handle, "alice");
        assert_eq!(accounts[1].handle, "bob");
    }

    #[test]
    fn dedupes_accounts_case_insensitively_keeping_first() {
        let input = "https://x.com/Alice\nhttps://x.com/alice\n";
        let accounts = load_accounts(input.lines()).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].handle, "Alice");
    }

    #[test]
    fn rejects_non_x_host() {
        let err = load_accounts("https://example.com/alice".lines()).unwrap_err();
        assert!(matches!(err, InputError::BadUrlHost(_)));
    }

    #[test]
    fn rejects_missing_handle() {
        let err = load_accounts("https://x.com/".lines()).unwrap_err();
        assert!(matches!(err, InputError::MissingHandle(_)));
    }

    #[test]
    fn normalizes_keyword_separators_and_dedupes() {
        let input = "hello,world\nhello   world\nHELLO+WORLD\n";
        let keywords = load_keywords(input.lines());
        assert_eq!(keywords, vec!["hello world".to_owned()]);
    }
}
