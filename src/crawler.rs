//! The Crawl Loop: pages through one account+keyword search, filters and
//! dedupes posts, and emits normalized rows.
//!
//! Grounded on `original_source/src/crawler/account_search_crawler.py`.
//! Rendered as a sink-callback function rather than a Python-generator
//! equivalent, since threading a `&mut dyn
//! SearchApi` borrow through a lazy iterator would fight the borrow
//! checker for no real benefit here.

use std::collections::HashSet;

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::client::SearchApi;
use crate::error::ClientError;
use crate::io_loader::AccountSpec;
use crate::jsonl::OutputRecord;
use crate::parser::{parse_search_page, ParsedPost, SearchPage};
use crate::date_util::{in_date_range, to_local_date};
use chrono::NaiveDate;

/// Configuration for a single crawl invocation.
pub struct CrawlOptions {
    pub timezone: Tz,
    pub max_empty_pages: u32,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            timezone: crate::config::DEFAULT_TIMEZONE
                .parse()
                .expect("static default timezone is valid"),
            max_empty_pages: crate::config::DEFAULT_MAX_EMPTY_PAGES,
        }
    }
}

/// Crawls one account+keyword search, invoking `sink` for every matched
/// post or terminal error. Returns `Err` only when the platform rejects
/// the session outright (`AuthenticationError`) — every other failure is
/// converted into an error row and the loop returns normally.
pub fn crawl_account_keyword(
    client: &dyn SearchApi,
    account: &AccountSpec,
    keyword: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    options: &CrawlOptions,
    mut sink: impl FnMut(OutputRecord),
) -> Result<(), ClientError> {
    let mut seen_tweet_ids: HashSet<String> = HashSet::new();
    let mut seen_cursors: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut empty_page_streak: u32 = 0;
    let mut page_index: u32 = 0;

    loop {
        page_index += 1;
        let payload = match client.search_account_keyword(
            &account.handle,
            keyword,
            start_date,
            end_date,
            cursor.as_deref(),
        ) {
            Ok(payload) => payload,
            Err(ClientError::Authentication(auth)) => {
                return Err(ClientError::Authentication(auth));
            }
            Err(err) => {
                warn!(
                    account = account.handle,
                    keyword, page_index, error = %err, "page request failed"
                );
                sink(OutputRecord::error(&account.handle, keyword, err.to_string()));
                return Ok(());
            }
        };

        let page: SearchPage = parse_search_page(&payload);
        if !page.posts.is_empty() {
            empty_page_streak = 0;
        } else {
            empty_page_streak += 1;
        }
        info!(
            account = account.handle,
            keyword,
            page_index,
            post_count = page.posts.len(),
            has_cursor = page.next_cursor.is_some(),
            empty_page_streak,
            "page received",
        );

        if page.posts.is_empty() && page.next_cursor.is_none() {
            info!(account = account.handle, keyword, "stopping: no posts and no cursor");
            return Ok(());
        }

        let mut reached_older_posts = false;
        for post in &page.posts {
            emit_if_matching(
                post,
                account,
                keyword,
                start_date,
                end_date,
                options.timezone,
                &mut seen_tweet_ids,
                &mut reached_older_posts,
                &mut sink,
            );
        }

        if reached_older_posts {
            info!(account = account.handle, keyword, "stopping: reached posts before start date");
            return Ok(());
        }
        if empty_page_streak >= options.max_empty_pages {
            info!(
                account = account.handle,
                keyword,
                max_empty_pages = options.max_empty_pages,
                "stopping: empty page streak limit reached",
            );
            return Ok(());
        }

        let Some(next_cursor) = page.next_cursor else {
            info!(account = account.handle, keyword, "stopping: no next cursor");
            return Ok(());
        };
        if Some(&next_cursor) == cursor.as_ref() || seen_cursors.contains(&next_cursor) {
            info!(account = account.handle, keyword, "stopping: repeated cursor");
            return Ok(());
        }
        seen_cursors.insert(next_cursor.clone());
        cursor = Some(next_cursor);
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_if_matching(
    post: &ParsedPost,
    account: &AccountSpec,
    keyword: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    timezone: Tz,
    seen_tweet_ids: &mut HashSet<String>,
    reached_older_posts: &mut bool,
    sink: &mut impl FnMut(OutputRecord),
) -> bool {
    if post.account_handle.to_lowercase() != account.handle.to_lowercase() {
        return false;
    }
    if !seen_tweet_ids.insert(post.tweet_id.clone()) {
        return false;
    }
    if post.in_reply_to_status_id.is_some() {
        return false;
    }
    if !in_date_range(post.created_at_utc, start_date, end_date, timezone) {
        if to_local_date(post.created_at_utc, timezone) < start_date {
            *reached_older_posts = true;
        }
        return false;
    }
    if !keyword_hit(keyword, &post.text, &post.quoted_text) {
        return false;
    }

    sink(OutputRecord {
        account: account.handle.clone(),
        keyword: keyword.to_owned(),
        post_time: post.post_time(),
        text: post.text.clone(),
        post_url: post.post_url.clone(),
        views: post.views.clone(),
        likes: post.likes.clone(),
        reposts: post.reposts.clone(),
        replies: post.replies.clone(),
        quoted_text: post.quoted_text.clone(),
        error: String::new(),
    });
    true
}

/// A post matches when every whitespace-separated term of `keyword`
/// appears somewhere across its text and quoted text, case-insensitively.
fn keyword_hit(keyword: &str, text: &str, quoted_text: &str) -> bool {
    let terms: Vec<String> = keyword
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    if terms.is_empty() {
        return false;
    }
    let haystack = format!("{}\n{}", text, quoted_text).to_lowercase();
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::cell::RefCell;

    fn account() -> AccountSpec {
        AccountSpec {
            url: "https://x.com/alice".into(),
            handle: "alice".into(),
        }
    }

    fn post(id: &str, handle: &str, text: &str, days_offset: i64, reply_to: Option<&str>) -> Value {
        let created = Utc.with_ymd_and_hms(2021, 9, 1, 12, 0, 0).unwrap() + chrono::Duration::days(days_offset);
        json!({
            "entryId": format!("tweet-{id}"),
            "content": {
                "itemContent": {
                    "tweet_results": {
                        "result": {
                            "__typename": "Tweet",
                            "rest_id": id,
                            "core": {"user_results": {"result": {"core": {"screen_name": handle}}}},
                            "legacy": {
                                "id_str": id,
                                "full_text": text,
                                "created_at": created.format("%a %b %d %H:%M:%S %z %Y").to_string(),
                                "in_reply_to_status_id_str": reply_to,
                            },
                        }
                    }
                }
            }
        })
    }

    fn page_payload(entries: Vec<Value>, cursor: Option<&str>) -> Value {
        let mut all_entries = entries;
        if let Some(cursor) = cursor {
            all_entries.push(json!({"content": {"cursorType": "Bottom", "value": cursor}}));
        }
        json!({
            "data": {"search_by_raw_query": {"search_timeline": {"timeline": {
                "instructions": [{"entries": all_entries}]
            }}}}
        })
    }

    struct StubApi {
        pages: RefCell<Vec<Value>>,
    }

    impl SearchApi for StubApi {
        fn search_account_keyword(
            &self,
            _handle: &str,
            _keyword: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
            _cursor: Option<&str>,
        ) -> Result<Value, ClientError> {
            let mut pages = self.pages.borrow_mut();
            if pages.is_empty() {
                return Ok(json!({"data": {"search_by_raw_query": {"search_timeline": {"timeline": {"instructions": []}}}}}));
            }
            Ok(pages.remove(0))
        }
    }

    fn run(api: &StubApi) -> Vec<OutputRecord> {
        let mut rows = Vec::new();
        crawl_account_keyword(
            api,
            &account(),
            "target",
            NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
            &CrawlOptions::default(),
            |row| rows.push(row),
        )
        .unwrap();
        rows
    }

    #[test]
    fn two_pages_with_replies_filtered() {
        let page1 = page_payload(
            vec![
                post("1", "alice", "target text", 0, None),
                post("2", "alice", "target reply", 0, Some("999")),
            ],
            Some("CURSOR1"),
        );
        let page2 = page_payload(vec![post("3", "alice", "target again", 0, None)], None);
        let api = StubApi { pages: RefCell::new(vec![page1, page2]) };
        let rows = run(&api);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "target text");
        assert_eq!(rows[1].text, "target again");
    }

    #[test]
    fn quoted_text_alone_satisfies_keyword_match() {
        let mut tweet = post("1", "alice", "unrelated body", 0, None);
        tweet
            .pointer_mut("/content/itemContent/tweet_results/result")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .insert(
                "quoted_status_result".to_owned(),
                json!({"result": {"__typename": "Tweet", "legacy": {"full_text": "target inside quote"}}}),
            );
        let page = page_payload(vec![tweet], None);
        let api = StubApi { pages: RefCell::new(vec![page]) };
        let rows = run(&api);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn repeated_cursor_stops_the_loop() {
        let page1 = page_payload(vec![post("1", "alice", "target text", 0, None)], Some("SAME"));
        let page2 = page_payload(vec![post("2", "alice", "target text", 0, None)], Some("SAME"));
        let api = StubApi { pages: RefCell::new(vec![page1, page2]) };
        let rows = run(&api);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn empty_page_streak_stops_after_limit() {
        let empty_with_cursor = |cursor: &str| page_payload(vec![], Some(cursor));
        let api = StubApi {
            pages: RefCell::new(vec![
                empty_with_cursor("C1"),
                empty_with_cursor("C2"),
                empty_with_cursor("C3"),
            ]),
        };
        let rows = run(&api);
        assert!(rows.is_empty());
    }

    #[test]
    fn multi_term_keyword_requires_every_term() {
        let page = page_payload(vec![post("1", "alice", "only has target", 0, None)], None);
        let api = StubApi { pages: RefCell::new(vec![page]) };
        let mut rows = Vec::new();
        crawl_account_keyword(
            &api,
            &account(),
            "target missing",
            NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
            &CrawlOptions::default(),
            |row| rows.push(row),
        )
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn posts_before_start_date_stop_the_loop() {
        let page = page_payload(vec![post("1", "alice", "target old", -5, None)], Some("NEXT"));
        let api = StubApi { pages: RefCell::new(vec![page]) };
        let rows = run(&api);
        assert!(rows.is_empty());
    }

    #[test]
    fn authentication_errors_propagate_without_an_error_row() {
        struct FailingApi;
        impl SearchApi for FailingApi {
            fn search_account_keyword(
                &self,
                _handle: &str,
                _keyword: &str,
                _start_date: NaiveDate,
                _end_date: NaiveDate,
                _cursor: Option<&str>,
            ) -> Result<Value, ClientError> {
                Err(ClientError::Authentication(crate::error::AuthenticationError(
                    "rejected".to_owned(),
                )))
            }
        }
        let mut rows = Vec::new();
        let result = crawl_account_keyword(
            &FailingApi,
            &account(),
            "target",
            NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
            &CrawlOptions::default(),
            |row| rows.push(row),
        );
        assert!(result.is_err());
        assert!(rows.is_empty());
    }
}
