// src/notify/slack.rs

//! Minimal Slack incoming-webhook client.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::notify::{Alert, Alerter, DeliveryError, DeliveryFuture, check_status, until_cancelled};

/// Attachment colour used for failure alerts.
pub const FAILURE_COLOR: &str = "#f00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub title: String,
    pub color: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
}

impl From<&Alert> for Message {
    fn from(alert: &Alert) -> Self {
        Message {
            text: alert.text.clone(),
            attachments: vec![Attachment {
                title: alert.title.clone(),
                color: FAILURE_COLOR.to_string(),
                fields: vec![Field {
                    title: "Job output".to_string(),
                    value: alert.output.clone(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, webhook_url: impl Into<String>) -> Self {
        Self {
            http,
            webhook_url: webhook_url.into(),
        }
    }

    pub async fn post(&self, msg: &Message) -> Result<(), DeliveryError> {
        debug!(text = %msg.text, "posting to Slack webhook");
        let res = self.http.post(&self.webhook_url).json(msg).send().await?;
        check_status(&res)
    }
}

impl Alerter for SlackClient {
    fn alert<'a>(&'a self, alert: &'a Alert, cancel: &'a CancellationToken) -> DeliveryFuture<'a> {
        Box::pin(async move {
            let msg = Message::from(alert);
            until_cancelled(cancel, self.post(&msg)).await
        })
    }
}
