// src/notify/healthchecks.rs

//! Client for a Healthchecks.io-style ping API.
//!
//! - `POST <base>/<id>/start` with no body when the job starts.
//! - `POST <base>/<id>/<exit code>` with the report as body when it ends.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::notify::{DeliveryError, DeliveryFuture, Monitor, check_status, until_cancelled};

pub const DEFAULT_PING_URL: &str = "https://hc-ping.com";

/// The service shouldn't send anything back, but if it does we read up to
/// this much so the connection can be reused.
const MAX_DISCARD: usize = 640 * 1024;

#[derive(Debug, Clone)]
pub struct HealthchecksClient {
    http: reqwest::Client,
    base_url: String,
    check_id: String,
}

impl HealthchecksClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, check_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            check_id: check_id.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.check_id,
            suffix
        )
    }

    async fn ping(&self, url: String, body: Vec<u8>) -> Result<(), DeliveryError> {
        debug!(%url, body_bytes = body.len(), "pinging monitor");

        let mut req = self.http.post(&url);
        if !body.is_empty() {
            req = req.body(body);
        }

        let mut res = req.send().await?;
        check_status(&res)?;

        let mut discarded = 0;
        while discarded < MAX_DISCARD {
            match res.chunk().await? {
                Some(chunk) => discarded += chunk.len(),
                None => break,
            }
        }
        Ok(())
    }
}

impl Monitor for HealthchecksClient {
    fn start<'a>(&'a self, cancel: &'a CancellationToken) -> DeliveryFuture<'a> {
        Box::pin(until_cancelled(cancel, self.ping(self.url("start"), Vec::new())))
    }

    fn status<'a>(
        &'a self,
        exit_code: i32,
        body: Vec<u8>,
        cancel: &'a CancellationToken,
    ) -> DeliveryFuture<'a> {
        let url = self.url(&exit_code.to_string());
        Box::pin(until_cancelled(cancel, self.ping(url, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let client = HealthchecksClient::new(reqwest::Client::new(), "http://ping.local/", "abc");
        assert_eq!(client.url("start"), "http://ping.local/abc/start");
        assert_eq!(client.url("0"), "http://ping.local/abc/0");
    }
}
