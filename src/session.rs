//! Cookie session lifecycle: load, probe, and refresh.
//!
//! The interactive browser login itself is an external collaborator
//! (the interactive login UI is out of scope here); callers supply it as a
//! [`LoginProvider`] closure. Grounded on
//! `original_source/src/auth/session_manager.py`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SessionError;

/// A single cookie as captured from a browser context.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

fn default_cookie_path() -> String {
    "/".to_owned()
}

/// A jar of cookies captured from an authenticated browser session.
pub type CookieJar = Vec<Cookie>;

/// Supplies a freshly captured cookie jar via an interactive login flow.
/// Implemented by the CLI's calling code, not by this crate.
pub trait LoginProvider {
    fn login(&self) -> Result<CookieJar, SessionError>;
}

impl<F> LoginProvider for F
where
    F: Fn() -> Result<CookieJar, SessionError>,
{
    fn login(&self) -> Result<CookieJar, SessionError> {
        self()
    }
}

/// Checks whether a captured cookie jar is still accepted by the platform.
pub trait CredentialProbe {
    fn probe(&self, cookies: &CookieJar) -> bool;
}

impl<F> CredentialProbe for F
where
    F: Fn(&CookieJar) -> bool,
{
    fn probe(&self, cookies: &CookieJar) -> bool {
        self(cookies)
    }
}

/// Manages cookie storage and the refresh-on-rejection path.
pub struct SessionManager {
    cookies_path: PathBuf,
}

impl SessionManager {
    pub fn new(cookies_path: impl Into<PathBuf>) -> Self {
        Self {
            cookies_path: cookies_path.into(),
        }
    }

    pub fn load_cookies(&self) -> Result<Option<CookieJar>, SessionError> {
        if !self.cookies_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.cookies_path)?;
        let cookies: CookieJar = serde_json::from_str(&content)?;
        Ok(Some(cookies))
    }

    pub fn save_cookies(&self, cookies: &CookieJar) -> Result<(), SessionError> {
        if let Some(parent) = self.cookies_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(cookies)?;
        fs::write(&self.cookies_path, body)?;
        Ok(())
    }

    /// Reuses a saved jar if it probes clean or at least carries the core
    /// auth cookies (a failed probe is sometimes a false negative — see
    /// false negative), otherwise falls back to an interactive refresh.
    pub fn ensure_cookies(
        &self,
        probe: &dyn CredentialProbe,
        login: &dyn LoginProvider,
    ) -> Result<CookieJar, SessionError> {
        if let Some(existing) = self.load_cookies()? {
            if probe.probe(&existing) {
                return Ok(existing);
            }
            if has_core_auth_cookies(&existing) {
                warn!(
                    "existing cookie probe failed but auth_token+ct0 present; \
                     reusing session until a request is rejected"
                );
                return Ok(existing);
            }
        }
        self.refresh_cookies(probe, login)
    }

    pub fn refresh_cookies(
        &self,
        probe: &dyn CredentialProbe,
        login: &dyn LoginProvider,
    ) -> Result<CookieJar, SessionError> {
        let cookies = login.login()?;
        let probe_ok = probe.probe(&cookies);

        if !probe_ok {
            if has_core_auth_cookies(&cookies) {
                warn!("post-login probe failed but auth_token+ct0 present; continuing anyway");
            } else {
                return Err(SessionError::ProbeFailed(String::new()));
            }
        }

        self.save_cookies(&cookies)?;
        info!("cookie jar refreshed and saved to {}", self.cookies_path.display());
        Ok(cookies)
    }

    pub fn cookies_path(&self) -> &Path {
        &self.cookies_path
    }
}

fn has_core_auth_cookies(cookies: &CookieJar) -> bool {
    let mut has_auth_token = false;
    let mut has_ct0 = false;
    for cookie in cookies {
        if cookie.value.is_empty() {
            continue;
        }
        match cookie.name.as_str() {
            "auth_token" => has_auth_token = true,
            "ct0" => has_ct0 = true,
            _ => {}
        }
    }
    has_auth_token && has_ct0
}
