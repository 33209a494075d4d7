//! Parses X search timeline payloads into normalized post rows.
//!
//! The endpoint returns one of two JSON shapes — a modern GraphQL shape or
//! a legacy "globalObjects + timeline.instructions" shape — dispatched on
//! the presence of a top-level `"data"` key. Grounded on
//! `original_source/src/parser/post_parser.py`.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::date_util::parse_x_created_at;

/// A single normalized post row, immutable once parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedPost {
    pub tweet_id: String,
    pub account_handle: String,
    pub created_at_utc: DateTime<Utc>,
    pub text: String,
    pub post_url: String,
    pub views: String,
    pub likes: String,
    pub reposts: String,
    pub replies: String,
    pub quoted_text: String,
    pub in_reply_to_status_id: Option<String>,
}

impl ParsedPost {
    pub fn post_time(&self) -> String {
        self.created_at_utc.to_rfc3339()
    }
}

/// A single page of search results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
    pub posts: Vec<ParsedPost>,
    pub next_cursor: Option<String>,
}

/// Parses either payload shape and returns the normalized page.
pub fn parse_search_page(payload: &Value) -> SearchPage {
    if payload.get("data").is_some() {
        parse_graphql_search_page(payload)
    } else {
        parse_legacy_search_page(payload)
    }
}

fn parse_graphql_search_page(payload: &Value) -> SearchPage {
    let instructions = payload
        .pointer("/data/search_by_raw_query/search_timeline/timeline/instructions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut posts = Vec::new();
    let mut next_cursor = None;

    for instruction in &instructions {
        if let Some(entries) = instruction.get("entries").and_then(Value::as_array) {
            for entry in entries {
                if let Some(post) = parse_graphql_entry(entry) {
                    posts.push(post);
                }
                if let Some(cursor) = extract_cursor_from_entry(entry) {
                    next_cursor = Some(cursor);
                }
            }
        }
        if let Some(entry) = instruction.get("entry") {
            if let Some(cursor) = extract_cursor_from_entry(entry) {
                next_cursor = Some(cursor);
            }
        }
    }

    SearchPage { posts, next_cursor }
}

fn parse_graphql_entry(entry: &Value) -> Option<ParsedPost> {
    let entry_id = entry.get("entryId").and_then(Value::as_str)?;
    if !entry_id.starts_with("tweet-") {
        return None;
    }

    let tweet_result = entry.pointer("/content/itemContent/tweet_results/result")?;
    let tweet = unwrap_graphql_tweet(tweet_result)?;
    tweet_to_parsed_post(tweet)
}

/// Unwraps visibility-result wrappers (`TweetWithVisibilityResults` ->
/// `tweet`) until a `Tweet` typename is reached.
fn unwrap_graphql_tweet(tweet_result: &Value) -> Option<&Value> {
    let typename = tweet_result.get("__typename").and_then(Value::as_str);
    if typename == Some("Tweet") {
        return Some(tweet_result);
    }
    let nested = tweet_result.get("tweet")?;
    unwrap_graphql_tweet(nested)
}

fn tweet_to_parsed_post(tweet: &Value) -> Option<ParsedPost> {
    let legacy = tweet.get("legacy").cloned().unwrap_or(Value::Null);
    let created_raw = legacy.get("created_at").and_then(Value::as_str)?;
    let created_at_utc = parse_x_created_at(created_raw)?;

    let tweet_id = tweet
        .get("rest_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| legacy.get("id_str").and_then(Value::as_str).filter(|s| !s.is_empty()))?
        .to_owned();

    let account_handle = tweet
        .pointer("/core/user_results/result/core/screen_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            tweet
                .pointer("/core/user_results/result/legacy/screen_name")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or("unknown")
        .to_owned();

    let quoted_text = extract_graphql_referenced_text(tweet);

    let views = match tweet.get("views") {
        Some(views_obj) if views_obj.get("count").is_some() => {
            json_scalar_to_string(views_obj.get("count").unwrap())
        }
        // `state == "Enabled"` with no `count` is preserved as empty —
        // views are not always populated for new posts.
        _ => String::new(),
    };

    let post_url = format!("https://x.com/{account_handle}/status/{tweet_id}");

    Some(ParsedPost {
        tweet_id,
        account_handle,
        created_at_utc,
        text: string_field(&legacy, "full_text"),
        post_url,
        views,
        likes: string_field(&legacy, "favorite_count"),
        reposts: string_field(&legacy, "retweet_count"),
        replies: string_field(&legacy, "reply_count"),
        quoted_text,
        in_reply_to_status_id: legacy
            .get("in_reply_to_status_id_str")
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

/// Looks, in order, for quoted-post text, a native retweet, a legacy
/// wrapper retweet result, and an inline legacy retweet payload; the first
/// non-empty `full_text` wins.
fn extract_graphql_referenced_text(tweet: &Value) -> String {
    if let Some(result) = tweet.pointer("/quoted_status_result/result") {
        if let Some(quoted) = unwrap_graphql_tweet(result) {
            let text = string_field(&quoted.get("legacy").cloned().unwrap_or(Value::Null), "full_text");
            if !text.is_empty() {
                return text;
            }
        }
    }

    if let Some(result) = tweet.pointer("/retweeted_status_result/result") {
        if let Some(retweet) = unwrap_graphql_tweet(result) {
            let text = string_field(&retweet.get("legacy").cloned().unwrap_or(Value::Null), "full_text");
            if !text.is_empty() {
                return text;
            }
        }
    }

    let legacy = tweet.get("legacy").cloned().unwrap_or(Value::Null);

    if let Some(result) = legacy.pointer("/retweeted_status_result/result") {
        if let Some(retweet) = unwrap_graphql_tweet(result) {
            let text = string_field(&retweet.get("legacy").cloned().unwrap_or(Value::Null), "full_text");
            if !text.is_empty() {
                return text;
            }
        }
    }

    if let Some(inline) = legacy.get("retweeted_status") {
        let text = string_field(inline, "full_text");
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}

fn extract_cursor_from_entry(entry: &Value) -> Option<String> {
    let content = entry.get("content")?;
    if content.get("cursorType").and_then(Value::as_str) == Some("Bottom") {
        if let Some(value) = content.get("value").and_then(Value::as_str) {
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    content
        .pointer("/operation/cursor/value")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn parse_legacy_search_page(payload: &Value) -> SearchPage {
    let empty = serde_json::Map::new();
    let tweets = payload
        .pointer("/globalObjects/tweets")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let users = payload
        .pointer("/globalObjects/users")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut posts = Vec::new();
    for (tweet_id, tweet) in tweets {
        let Some(created_raw) = tweet.get("created_at").and_then(Value::as_str) else {
            continue;
        };
        let Some(created_at_utc) = parse_x_created_at(created_raw) else {
            continue;
        };

        let user_id = tweet
            .get("user_id_str")
            .and_then(Value::as_str)
            .or_else(|| tweet.get("user_id").and_then(Value::as_str))
            .unwrap_or("");
        let account_handle = users
            .get(user_id)
            .and_then(|u| u.get("screen_name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();

        let id_str = tweet
            .get("id_str")
            .and_then(Value::as_str)
            .unwrap_or(tweet_id.as_str())
            .to_owned();

        let mut quoted_text = String::new();
        if let Some(quoted_id) = tweet.get("quoted_status_id_str").and_then(Value::as_str) {
            if let Some(quoted) = tweets.get(quoted_id) {
                quoted_text = string_field(quoted, "full_text");
            }
        }
        if quoted_text.is_empty() {
            if let Some(retweet_id) = tweet.get("retweeted_status_id_str").and_then(Value::as_str) {
                if let Some(retweet) = tweets.get(retweet_id) {
                    quoted_text = string_field(retweet, "full_text");
                }
            }
        }
        if quoted_text.is_empty() {
            if let Some(inline) = tweet.get("retweeted_status") {
                quoted_text = string_field(inline, "full_text");
            }
        }
        if quoted_text.is_empty() {
            if let Some(legacy) = tweet.pointer("/retweeted_status_result/result/legacy") {
                quoted_text = string_field(legacy, "full_text");
            }
        }

        let views = tweet
            .pointer("/ext_views/count")
            .map(json_scalar_to_string)
            .unwrap_or_default();

        let post_url = format!("https://x.com/{account_handle}/status/{id_str}");

        posts.push(ParsedPost {
            tweet_id: id_str,
            account_handle,
            created_at_utc,
            text: string_field(tweet, "full_text"),
            post_url,
            views,
            likes: string_field(tweet, "favorite_count"),
            reposts: string_field(tweet, "retweet_count"),
            replies: string_field(tweet, "reply_count"),
            quoted_text,
            in_reply_to_status_id: tweet
                .get("in_reply_to_status_id_str")
                .and_then(Value::as_str)
                .map(str::to_owned),
        });
    }

    let mut next_cursor = None;
    if let Some(instructions) = payload
        .pointer("/timeline/instructions")
        .and_then(Value::as_array)
    {
        for instruction in instructions {
            if let Some(entries) = instruction
                .pointer("/addEntries/entries")
                .and_then(Value::as_array)
            {
                for entry in entries {
                    if let Some(cursor) = extract_cursor_from_entry(entry) {
                        next_cursor = Some(cursor);
                    }
                }
            }
        }
    }

    SearchPage { posts, next_cursor }
}

fn string_field(value: &Value, field: &str) -> String {
    value.get(field).map(json_scalar_to_string).unwrap_or_default()
}

fn json_scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
