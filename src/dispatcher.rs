use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::DispatchError;

const ENVELOPE_PREFIX: &str = "From RMA's Slack Bot: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    /// Anything outside the selector's choices. Never delays.
    #[serde(other)]
    Unknown,
}

impl FromStr for DelayUnit {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "seconds" => Self::Seconds,
            "minutes" => Self::Minutes,
            "hours" => Self::Hours,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for DelayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Converts a delay amount into whole milliseconds.
///
/// The product is truncated toward zero; negative and NaN amounts come out
/// as 0 because the float-to-int cast saturates.
pub fn compute_delay_millis(amount: f64, unit: DelayUnit) -> u64 {
    let factor = match unit {
        DelayUnit::Seconds => 1_000.0,
        DelayUnit::Minutes => 60_000.0,
        DelayUnit::Hours => 3_600_000.0,
        DelayUnit::Unknown => return 0,
    };
    (amount * factor) as u64
}

/// One scheduled send, built from the form values at trigger time.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub delay_amount: f64,
    pub delay_unit: DelayUnit,
    pub message: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Success,
    Failure { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    Idle,
    Delaying,
    Sending,
    Succeeded,
    Failed,
}

/// Body posted to the webhook.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub text: String,
}

impl Envelope {
    pub fn new(message: &str) -> Self {
        Self {
            text: format!("{ENVELOPE_PREFIX}{message}"),
        }
    }
}

/// Waits out the requested delay, then posts the envelope exactly once.
///
/// Neither the wait nor the request can be aborted from here. Without a
/// client timeout the request may block indefinitely when the endpoint never
/// answers.
pub struct DelayedDispatcher {
    client: Client,
    phase: watch::Sender<DispatchPhase>,
}

impl DelayedDispatcher {
    pub fn new(client: Client) -> Self {
        let (phase, _) = watch::channel(DispatchPhase::Idle);
        Self { client, phase }
    }

    pub fn phase(&self) -> DispatchPhase {
        *self.phase.borrow()
    }

    /// Back to `Idle` once the caller has taken the outcome.
    pub fn reset(&self) {
        self.phase.send_replace(DispatchPhase::Idle);
    }

    pub async fn dispatch(&self, request: &DispatchRequest) -> DispatchOutcome {
        let delay_ms = compute_delay_millis(request.delay_amount, request.delay_unit);

        self.phase.send_replace(DispatchPhase::Delaying);
        info!("Waiting {} ms before posting to webhook", delay_ms);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        self.phase.send_replace(DispatchPhase::Sending);
        match self.send(request).await {
            Ok(()) => {
                info!("Message sent successfully");
                self.phase.send_replace(DispatchPhase::Succeeded);
                DispatchOutcome::Success
            }
            Err(e) => {
                let reason = e.reason();
                warn!("Failed to send message: {}", reason);
                self.phase.send_replace(DispatchPhase::Failed);
                DispatchOutcome::Failure { reason }
            }
        }
    }

    async fn send(&self, request: &DispatchRequest) -> Result<(), DispatchError> {
        let envelope = Envelope::new(&request.message);

        // `json` sets Content-Type: application/json
        let response = self
            .client
            .post(request.endpoint.as_str())
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(DispatchError::RemoteRejection {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
