use serde::{Deserialize, Serialize};

use crate::dispatcher::{DelayUnit, DispatchOutcome, DispatchPhase, DispatchRequest};
use crate::error::ValidationError;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub delay_amount: f64,
    #[serde(default)]
    pub delay_unit: DelayUnit,
    pub message: String,
    pub webhook_url: String,
}

impl SendRequest {
    /// Applies the same rules that keep the page's send button disabled.
    pub fn validate(self) -> Result<DispatchRequest, ValidationError> {
        if !(self.delay_amount.is_finite() && self.delay_amount > 0.0) {
            return Err(ValidationError::InvalidDelay);
        }
        if self.message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if self.webhook_url.is_empty() {
            return Err(ValidationError::EmptyWebhookUrl);
        }

        Ok(DispatchRequest {
            delay_amount: self.delay_amount,
            delay_unit: self.delay_unit,
            message: self.message,
            endpoint: self.webhook_url,
        })
    }
}

#[derive(Serialize)]
pub struct SendResponse {
    pub cycle_id: String,
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
}

/// Unit is kept as raw text so the label can echo it back.
#[derive(Debug, Deserialize)]
pub struct LabelQuery {
    #[serde(default)]
    pub delay_amount: f64,
    #[serde(default = "default_label_unit")]
    pub delay_unit: String,
}

fn default_label_unit() -> String {
    DelayUnit::default().to_string()
}

#[derive(Serialize)]
pub struct LabelResponse {
    pub label: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub phase: DispatchPhase,
    pub in_flight: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}
