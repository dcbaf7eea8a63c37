// src/parse.rs
//
// Parsers for the line-oriented output of `git log` and `git grep -c`.

use crate::error::{Result, TrendError};
use chrono::{DateTime, Utc};

/// One `<unix-seconds> <commit-id>` line of the history listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: i64,
    pub id: String,
}

/// One `<commit-id>:<path>:<count>` line of a `git grep -c` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepCount {
    pub id: String,
    pub path: String,
    pub count: u64,
}

fn is_commit_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn parse_log(text: &str) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let bad = |reason| TrendError::MalformedLogLine { line_no: i + 1, line: line.to_string(), reason };

        let (time, id) = line.split_once(' ').ok_or_else(|| bad("expected `<timestamp> <commit>`"))?;
        let timestamp: i64 = time.parse().map_err(|_| bad("timestamp is not an integer"))?;
        if DateTime::<Utc>::from_timestamp(timestamp, 0).is_none() {
            return Err(bad("timestamp out of range"));
        }
        if !is_commit_id(id) {
            return Err(bad("commit id is not hexadecimal"));
        }
        entries.push(LogEntry { timestamp, id: id.to_string() });
    }
    Ok(entries)
}

pub fn parse_grep_counts(text: &str) -> Result<Vec<GrepCount>> {
    let mut counts = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let bad = |reason| TrendError::MalformedGrepLine { line_no: i + 1, line: line.to_string(), reason };

        // Paths may contain ':' themselves, so split at the first and last one.
        let (id, rest) = line.split_once(':').ok_or_else(|| bad("expected `<commit>:<path>:<count>`"))?;
        let (path, count) = rest.rsplit_once(':').ok_or_else(|| bad("expected `<commit>:<path>:<count>`"))?;
        if !is_commit_id(id) {
            return Err(bad("commit id is not hexadecimal"));
        }
        if path.is_empty() {
            return Err(bad("empty path"));
        }
        let count = count.parse().map_err(|_| bad("count is not an integer"))?;
        counts.push(GrepCount { id: id.to_string(), path: path.to_string(), count });
    }
    Ok(counts)
}
