//! Streaming JSONL output sink.
//!
//! Grounded on `original_source/src/export/jsonl_writer.py`; each run gets
//! its own timestamped directory so repeated invocations never clobber
//! each other's output.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

/// A single output row, whether a matched post or an error placeholder.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OutputRecord {
    pub account: String,
    pub keyword: String,
    pub post_time: String,
    pub text: String,
    pub post_url: String,
    pub views: String,
    pub likes: String,
    pub reposts: String,
    pub replies: String,
    pub quoted_text: String,
    pub error: String,
}

impl OutputRecord {
    pub fn error(account: impl Into<String>, keyword: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            keyword: keyword.into(),
            post_time: String::new(),
            text: String::new(),
            post_url: String::new(),
            views: String::new(),
            likes: String::new(),
            reposts: String::new(),
            replies: String::new(),
            quoted_text: String::new(),
            error: error.into(),
        }
    }
}

/// Writes output rows to a per-run `data.jsonl` file, flushing after every
/// write so a killed process loses at most the in-flight row.
pub struct JsonlWriter {
    run_id: String,
    run_dir: PathBuf,
    output_path: PathBuf,
    file: File,
}

impl JsonlWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> io::Result<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;
        let run_id = Local::now().format("%Y-%m-%d_%H%M%S").to_string();
        let run_dir = output_dir.join(&run_id);
        fs::create_dir_all(&run_dir)?;
        let output_path = run_dir.join("data.jsonl");
        let file = File::create(&output_path)?;
        Ok(Self {
            run_id,
            run_dir,
            output_path,
            file,
        })
    }

    pub fn write(&mut self, row: &OutputRecord) -> io::Result<()> {
        let line = serde_json::to_string(row)?;
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::tempdir;

    #[test]
    fn writes_newline_delimited_json_rows() {
        let dir = tempdir().unwrap();
        let mut writer = JsonlWriter::new(dir.path()).unwrap();
        let row = OutputRecord {
            account: "alice".into(),
            keyword: "hello".into(),
            post_time: "2021-09-01T00:00:00+00:00".into(),
            text: "hi".into(),
            post_url: "https://x.com/alice/status/1".into(),
            views: "10".into(),
            likes: "1".into(),
            reposts: "0".into(),
            replies: "0".into(),
            quoted_text: "".into(),
            error: "".into(),
        };
        writer.write(&row).unwrap();

        let contents = fs::read_to_string(writer.output_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: OutputRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, row);
    }

    #[test]
    fn error_record_has_blank_fields_except_error() {
        let row = OutputRecord::error("alice", "hello", "boom");
        assert_eq!(row.error, "boom");
        assert_eq!(row.post_time, "");
        assert_eq!(row.text, "");
    }

    #[test]
    fn run_dir_nests_under_output_dir_by_run_id() {
        let dir = tempdir().unwrap();
        let writer = JsonlWriter::new(dir.path()).unwrap();
        assert_eq!(writer.run_dir(), dir.path().join(writer.run_id()));
        let mut reader = io::BufReader::new(File::open(writer.output_path()).unwrap());
        let mut buf = String::new();
        reader.read_line(&mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
