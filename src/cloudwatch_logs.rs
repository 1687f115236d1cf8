use aws_sdk_cloudwatchlogs::{
    model::{QueryStatus, ResultField},
    Client, Error,
};
use chrono::{DateTime, Utc};

use crate::{config::Poll, error::RuntimeError, event::LogRow};

/// `QueryWindow` is the time range of an Insights query, in epoch seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryWindow {
    /// Start of the range
    pub start: i64,
    /// End of the range
    pub end: i64,
}

impl QueryWindow {
    /// Window starting slightly before `since` and covering the next ten minutes,
    /// so requests that straddle the schedule boundary are fully read.
    pub fn around(since: DateTime<Utc>) -> QueryWindow {
        let since = since.timestamp();
        QueryWindow {
            start: since - 30,
            end: since + 600,
        }
    }
}

/// Find every log group whose name starts with `prefix`.
#[tracing::instrument(skip(client))]
pub async fn list_log_groups(client: &Client, prefix: &str) -> Result<Vec<String>, RuntimeError> {
    let mut names = Vec::new();
    let mut next_token = None;

    loop {
        let output = client
            .describe_log_groups()
            .log_group_name_prefix(prefix)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(Error::from)?;

        if let Some(groups) = output.log_groups {
            names.extend(groups.into_iter().filter_map(|g| g.log_group_name));
        }

        next_token = output.next_token;
        if next_token.is_none() {
            break;
        }
    }

    tracing::info!(count = names.len(), "found log groups");
    Ok(names)
}

/// Run an Insights query on one log group and wait for its results.
#[tracing::instrument(skip(client, poll))]
pub async fn run_query(
    client: &Client,
    log_group: &str,
    window: QueryWindow,
    query: &str,
    poll: Poll,
) -> Result<Vec<LogRow>, RuntimeError> {
    let query_id = client
        .start_query()
        .log_group_name(log_group)
        .start_time(window.start)
        .end_time(window.end)
        .query_string(query)
        .send()
        .await
        .map_err(Error::from)?
        .query_id
        .ok_or_else(|| RuntimeError::MissingField("queryId".into()))?;

    for _ in 0..poll.max_attempts {
        tokio::time::sleep(poll.interval).await;

        let output = client
            .get_query_results()
            .query_id(&query_id)
            .send()
            .await
            .map_err(Error::from)?;

        match output.status {
            Some(QueryStatus::Scheduled) | Some(QueryStatus::Running) => continue,
            Some(QueryStatus::Complete) => {
                let rows: Vec<LogRow> = output
                    .results
                    .unwrap_or_default()
                    .into_iter()
                    .map(to_log_row)
                    .collect();
                tracing::info!(rows = rows.len(), "query completed");
                return Ok(rows);
            }
            status => {
                return Err(RuntimeError::QueryFailed {
                    query_id,
                    status: status
                        .as_ref()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_else(|| "unknown".into()),
                })
            }
        }
    }

    Err(RuntimeError::PollExhausted(format!("query {}", query_id)))
}

fn to_log_row(fields: Vec<ResultField>) -> LogRow {
    let mut row = LogRow::default();
    for field in fields {
        match (field.field.as_deref(), field.value) {
            (Some("@timestamp"), Some(value)) => row.timestamp = value,
            (Some("@message"), Some(value)) => row.message = value,
            _ => {}
        }
    }
    row
}
