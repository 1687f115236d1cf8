//! Grouping of API Gateway execution log rows per request.
use crate::event::{LogBatch, LogEntry, LogRow};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Query sent to Logs Insights for every execution log group
pub const QUERY: &str = "fields @timestamp, @message";

const REQUEST_ID_LEN: usize = 36;
const RESPONSE_MARKER: &str = "response body after transformations:";
const MARKER_WINDOW: usize = 85;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Split an execution log message into its request id and body.
///
/// Messages look like `(6a1c9f5e-1b2d-4c3e-8f90-123456789abc) Method request body ...`.
fn split_request_id(message: &str) -> Option<(&str, &str)> {
    let rest = message.strip_prefix('(')?;
    let id = rest.get(..REQUEST_ID_LEN)?;
    let body = rest.get(REQUEST_ID_LEN..)?.strip_prefix(')')?;
    Some((id, body.strip_prefix(' ').unwrap_or(body)))
}

/// First `chars` characters of `body`.
fn head(body: &str, chars: usize) -> &str {
    match body.char_indices().nth(chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}

/// A row qualifies its request when it is newer than `since`
/// and carries the transformed response body.
fn qualifies(timestamp: &str, body: &str, since: &NaiveDateTime) -> bool {
    let newer = matches!(parse_timestamp(timestamp), Some(t) if t > *since);
    newer && head(body, MARKER_WINDOW).contains(RESPONSE_MARKER)
}

/// Group Insights rows by request id and keep only the requests that
/// produced a response after `since`.
pub fn group_rows(log_group: &str, rows: &[LogRow], since: DateTime<Utc>) -> LogBatch {
    let since = since.naive_utc();

    let mut parsed: Vec<(&str, &str, &str)> = rows
        .iter()
        .filter_map(|row| {
            split_request_id(&row.message).map(|(id, body)| (id, row.timestamp.as_str(), body))
        })
        .collect();
    parsed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut data = Vec::new();
    let mut current: Vec<LogEntry> = Vec::new();
    let mut keep = false;

    for (id, timestamp, body) in parsed {
        if current.first().map_or(false, |e| e.id != id) {
            let group = std::mem::take(&mut current);
            if keep {
                data.push(group);
            }
            keep = false;
        }

        keep |= qualifies(timestamp, body, &since);
        current.push(LogEntry {
            time: timestamp.into(),
            message: body.into(),
            id: id.into(),
        });
    }

    if keep {
        data.push(current);
    }

    LogBatch {
        log_group_name: log_group.into(),
        data,
    }
}
