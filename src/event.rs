use serde::Serialize;

/// `LogRow` is one row returned by a Logs Insights query
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogRow {
    /// `@timestamp` as formatted by Insights
    pub timestamp: String,
    /// `@message`, including the request id prefix
    pub message: String,
}

/// `LogEntry` is a single shipped message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Insights timestamp, unchanged
    pub time: String,
    /// Message body without the request id prefix
    pub message: String,
    /// API Gateway request id
    pub id: String,
}

/// `LogBatch` is the payload sent to the collector for one log group.
/// Each item of `data` holds all the messages of one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LogBatch {
    /// Log group the entries were read from
    pub log_group_name: String,
    /// Entries grouped per request
    pub data: Vec<Vec<LogEntry>>,
}

impl LogBatch {
    /// True when no request qualified for shipping
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
