//! End-to-end tests exercising io_loader + client parsing + the crawl loop
//! + jsonl output together, the way a single account+keyword run does.
//!
//! Grounded on `original_source/tests/test_account_search_crawler.py`'s
//! fixture-driven scenarios, adapted to drive the public crate surface
//! instead of reaching into internals.

use std::cell::RefCell;

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::tempdir;

use x_search_harvester::client::SearchApi;
use x_search_harvester::crawler::{crawl_account_keyword, CrawlOptions};
use x_search_harvester::error::{AuthenticationError, ClientError};
use x_search_harvester::io_loader::{load_accounts, load_keywords};
use x_search_harvester::jsonl::JsonlWriter;

fn tweet_entry(id: &str, handle: &str, text: &str, days_offset: i64) -> Value {
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
                            "in_reply_to_status_id_str": Value::Null,
                        },
                    }
                }
            }
        }
    })
}

fn search_page(entries: Vec<Value>, cursor: Option<&str>) -> Value {
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

struct ScriptedApi {
    pages: RefCell<Vec<Value>>,
}

impl SearchApi for ScriptedApi {
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
            return Ok(search_page(vec![], None));
        }
        Ok(pages.remove(0))
    }
}

/// Loads an accounts file and a keywords file the way the CLI does, then
/// runs a scripted two-page crawl for the first account/keyword pair and
/// writes every matched row to a fresh JSONL run directory.
#[test]
fn crawl_run_writes_matched_rows_through_the_whole_pipeline() {
    let accounts_text = "\
        # primary accounts\n\
        https://x.com/alice\n\
        https://twitter.com/alice\n\
        https://x.com/bob\n\
    ";
    let keys_text = "rust systems, golang\n";

    let accounts = load_accounts(accounts_text.lines()).unwrap();
    let keywords = load_keywords(keys_text.lines());

    assert_eq!(accounts.len(), 2, "duplicate alice URL should be deduped");
    assert_eq!(keywords, vec!["rust systems".to_owned(), "golang".to_owned()]);

    let account = accounts.iter().find(|a| a.handle == "alice").unwrap();
    let keyword = &keywords[0];

    let page1 = search_page(
        vec![
            tweet_entry("1", "alice", "rust systems programming is fun", 0),
            tweet_entry("2", "alice", "unrelated post about golang", 0),
        ],
        Some("CURSOR1"),
    );
    let page2 = search_page(vec![tweet_entry("3", "alice", "more rust systems content", 0)], None);
    let api = ScriptedApi { pages: RefCell::new(vec![page1, page2]) };

    let out_dir = tempdir().unwrap();
    let mut writer = JsonlWriter::new(out_dir.path()).unwrap();

    let mut written = Vec::new();
    let result = crawl_account_keyword(
        &api,
        account,
        keyword,
        NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
        &CrawlOptions::default(),
        |row| {
            writer.write(&row).unwrap();
            written.push(row);
        },
    );

    assert!(result.is_ok());
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].post_url, "https://x.com/alice/status/1");
    assert_eq!(written[1].post_url, "https://x.com/alice/status/3");

    let contents = std::fs::read_to_string(writer.output_path()).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("\"account\":\"alice\""));
}

/// A client that always reports the session as rejected should stop the
/// crawl immediately, leaving nothing in the output file, so the driver
/// layer can decide whether to refresh and retry.
#[test]
fn authentication_rejection_short_circuits_before_any_row_is_written() {
    struct RejectingApi;
    impl SearchApi for RejectingApi {
        fn search_account_keyword(
            &self,
            _handle: &str,
            _keyword: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
            _cursor: Option<&str>,
        ) -> Result<Value, ClientError> {
            Err(ClientError::Authentication(AuthenticationError("401".to_owned())))
        }
    }

    let accounts = load_accounts(["https://x.com/alice"].into_iter()).unwrap();
    let out_dir = tempdir().unwrap();
    let mut writer = JsonlWriter::new(out_dir.path()).unwrap();

    let result = crawl_account_keyword(
        &RejectingApi,
        &accounts[0],
        "rust",
        NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
        &CrawlOptions::default(),
        |row| writer.write(&row).unwrap(),
    );

    assert!(matches!(result, Err(ClientError::Authentication(_))));
    let contents = std::fs::read_to_string(writer.output_path()).unwrap();
    assert!(contents.is_empty());
}
