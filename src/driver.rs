//! Outer Driver: iterates accounts × keywords, writes rows, and retries
//! once through a cookie refresh when the session is rejected mid-run.
//!
//! Grounded on `original_source/run.py`'s `main()`.

use tracing::{error, info};

use crate::client::ProtocolClient;
use crate::config::RuntimeConfig;
use crate::crawler::{crawl_account_keyword, CrawlOptions};
use crate::error::{ClientError, SessionError};
use crate::io_loader::AccountSpec;
use crate::jsonl::{JsonlWriter, OutputRecord};
use crate::session::{CredentialProbe, LoginProvider, SessionManager};
use chrono::NaiveDate;

/// Everything the driver needs besides the accounts/keywords/date window,
/// so tests can substitute fakes for the session manager and login flow.
pub struct DriverContext<'a> {
    pub session_manager: &'a SessionManager,
    pub probe: &'a dyn CredentialProbe,
    pub login: &'a dyn LoginProvider,
    pub config: RuntimeConfig,
}

/// Runs the full accounts × keywords sweep, writing every matched post
/// (and any terminal per-keyword error) to `writer`. Returns the total
/// number of rows written.
pub fn run(
    ctx: &DriverContext<'_>,
    accounts: &[AccountSpec],
    keywords: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    writer: &mut JsonlWriter,
) -> Result<u64, SessionError> {
    let mut total_rows: u64 = 0;
    let mut cookies = ctx.session_manager.ensure_cookies(ctx.probe, ctx.login)?;
    let mut client = ProtocolClient::new(&cookies, ctx.config.clone())
        .map_err(|e| SessionError::Login(e.to_string()))?;

    for account in accounts {
        for keyword in keywords {
            info!(account = account.handle, keyword, "starting crawl");
            let mut write_row = |row: OutputRecord| {
                let is_error = !row.error.is_empty();
                if is_error {
                    error!(account = account.handle, keyword, error = row.error, "record");
                } else {
                    info!(account = account.handle, keyword, post_url = row.post_url, "record");
                }
                let _ = writer.write(&row);
                total_rows += 1;
            };

            let result = crawl_account_keyword(
                &client,
                account,
                keyword,
                start_date,
                end_date,
                &CrawlOptions::default(),
                &mut write_row,
            );

            if let Err(ClientError::Authentication(_)) = result {
                info!("session rejected mid-run, refreshing cookies once");
                cookies = ctx.session_manager.refresh_cookies(ctx.probe, ctx.login)?;
                client = ProtocolClient::new(&cookies, ctx.config.clone())
                    .map_err(|e| SessionError::Login(e.to_string()))?;

                let retry = crawl_account_keyword(
                    &client,
                    account,
                    keyword,
                    start_date,
                    end_date,
                    &CrawlOptions::default(),
                    &mut write_row,
                );
                if let Err(ClientError::Authentication(auth)) = retry {
                    let _ = writer.write(&OutputRecord::error(
                        &account.handle,
                        keyword,
                        format!("authentication_failed_after_refresh: {auth}"),
                    ));
                    error!(account = account.handle, keyword, "still unauthenticated after refresh");
                }
            }
        }
    }

    Ok(total_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Cookie, CookieJar};
    use tempfile::tempdir;

    fn account() -> AccountSpec {
        AccountSpec {
            url: "https://x.com/alice".into(),
            handle: "alice".into(),
        }
    }

    #[test]
    fn ensure_cookies_is_consulted_before_any_crawl() {
        let dir = tempdir().unwrap();
        let manager = SessionManager::new(dir.path().join("cookies.json"));
        let seeded = vec![Cookie {
            name: "auth_token".into(),
            value: "a".into(),
            domain: Some(".x.com".into()),
            path: "/".into(),
        }, Cookie {
            name: "ct0".into(),
            value: "b".into(),
            domain: Some(".x.com".into()),
            path: "/".into(),
        }];
        manager.save_cookies(&seeded).unwrap();

        let probe = |_: &CookieJar| true;
        let login = || -> Result<CookieJar, SessionError> { panic!("must not refresh") };
        let loaded = manager.ensure_cookies(&probe, &login).unwrap();
        assert_eq!(loaded, seeded);
        let _ = account();
    }
}
