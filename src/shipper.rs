use reqwest::Client;

use crate::{error::RuntimeError, event::LogBatch};

/// HTTP client that forwards log batches to the collector endpoint.
pub struct LogShipper {
    inner: Client,
    endpoint: String,
}

impl LogShipper {
    /// Initialize the shipper for `endpoint`.
    pub fn new(endpoint: &str) -> LogShipper {
        LogShipper {
            inner: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Post one log group's batch. Empty batches are skipped.
    #[tracing::instrument(skip(self, batch), fields(log_group = %batch.log_group_name, requests = batch.data.len()))]
    pub async fn ship(&self, batch: &LogBatch) -> Result<bool, RuntimeError> {
        if batch.is_empty() {
            tracing::info!("nothing to ship");
            return Ok(false);
        }

        self.inner
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("shipped logs");
        Ok(true)
    }
}
