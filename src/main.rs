//! CLI entry point: wires configuration, session management, the
//! protocol client, and the outer driver together.
//!
//! Grounded on `original_source/run.py`'s `main()`, with the interactive
//! browser login kept as an external collaborator, specified only by
//! contract, rather than implemented here.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use x_search_harvester::client::ProtocolClient;
use x_search_harvester::config::{self, RuntimeConfig};
use x_search_harvester::date_util::parse_cli_date;
use x_search_harvester::driver::{self, DriverContext};
use x_search_harvester::error::{InputError, SessionError};
use x_search_harvester::io_loader::{load_accounts, load_keywords};
use x_search_harvester::jsonl::JsonlWriter;
use x_search_harvester::logging;
use x_search_harvester::session::{CookieJar, SessionManager};

/// Account-keyword protocol crawler, emitting matched posts as JSONL.
#[derive(Parser)]
#[command(about = "X account keyword protocol crawler (JSONL output)")]
struct Args {
    /// Start date in format YYYY_M_D, inclusive.
    start_date: String,
    /// End date in format YYYY_M_D, inclusive.
    end_date: String,
    #[arg(long)]
    accounts_file: Option<PathBuf>,
    #[arg(long)]
    keys_file: Option<PathBuf>,
    #[arg(long)]
    cookies_file: Option<PathBuf>,
}

fn read_lines(path: &std::path::Path) -> Result<String, InputError> {
    if !path.exists() {
        return Err(InputError::MissingFile(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

fn run() -> Result<(), InputError> {
    let args = Args::parse();

    let start_date = parse_cli_date(&args.start_date)
        .ok_or_else(|| InputError::BadDate(args.start_date.clone()))?;
    let end_date =
        parse_cli_date(&args.end_date).ok_or_else(|| InputError::BadDate(args.end_date.clone()))?;
    if start_date > end_date {
        return Err(InputError::StartAfterEnd {
            start: args.start_date.clone(),
            end: args.end_date.clone(),
        });
    }

    let accounts_file = args.accounts_file.unwrap_or_else(config::default_accounts_file);
    let keys_file = args.keys_file.unwrap_or_else(config::default_keys_file);
    let cookies_file = args.cookies_file.unwrap_or_else(config::default_cookies_file);

    let accounts_text = read_lines(&accounts_file)?;
    let keys_text = read_lines(&keys_file)?;
    let accounts = load_accounts(accounts_text.lines())?;
    let keywords = load_keywords(keys_text.lines());

    if accounts.is_empty() {
        return Err(InputError::EmptyAccounts);
    }
    if keywords.is_empty() {
        return Err(InputError::EmptyKeywords);
    }

    let mut writer = JsonlWriter::new(config::default_output_dir())
        .map_err(InputError::Io)?;
    let _log_guard = logging::init(writer.run_dir());
    tracing::info!(log_dir = %writer.run_dir().display(), "run log directory");

    let runtime_config = RuntimeConfig::from_env();
    let session_manager = SessionManager::new(cookies_file);
    let probe = |cookies: &CookieJar| -> bool {
        match ProtocolClient::new(cookies, RuntimeConfig::from_env()) {
            Ok(client) => client.verify_credentials(),
            Err(_) => false,
        }
    };
    let login = || -> Result<CookieJar, SessionError> {
        Err(SessionError::Login(
            "interactive login is not implemented by this crate; populate the cookie file \
             out-of-band and re-run"
                .to_owned(),
        ))
    };

    let ctx = DriverContext {
        session_manager: &session_manager,
        probe: &probe,
        login: &login,
        config: runtime_config,
    };

    let total_rows = driver::run(&ctx, &accounts, &keywords, start_date, end_date, &mut writer)
        .map_err(|e| InputError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

    tracing::info!(total_rows, output = %writer.output_path().display(), "run complete");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[error] {err}");
            ExitCode::from(2)
        }
    }
}
