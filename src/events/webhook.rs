use crate::errors::ServiceError;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Body POSTed to the notification webhook
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub payload: serde_json::Value,
    pub timestamp: String,
}

/// HMAC signature generator for webhook authentication
pub struct SignatureGenerator {
    secret: String,
}

impl SignatureGenerator {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Hex-encoded HMAC-SHA256 over `"{timestamp}.{body}"`
    pub fn sign_payload(&self, timestamp: &str, body: &str) -> Result<String, ServiceError> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let signed_payload = format!("{}.{}", timestamp, body);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| ServiceError::InternalError(format!("invalid webhook secret: {}", e)))?;
        mac.update(signed_payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Delivers notification events to an external HTTP endpoint
pub struct NotificationWebhook {
    client: reqwest::Client,
    url: String,
    signature_generator: Option<SignatureGenerator>,
    max_retries: u32,
    base_backoff: Duration,
}

impl NotificationWebhook {
    pub fn new(url: String, secret: Option<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("webhook client: {}", e)))?;

        Ok(Self {
            client,
            url,
            signature_generator: secret
                .filter(|s| !s.is_empty())
                .map(SignatureGenerator::new),
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
        })
    }

    pub fn with_retry_policy(mut self, max_retries: u32, base_backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.base_backoff = base_backoff;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one envelope, retrying with exponential backoff
    #[instrument(skip(self, envelope), fields(event = %envelope.event))]
    pub async fn deliver(&self, envelope: &WebhookEnvelope) -> Result<(), ServiceError> {
        let body = serde_json::to_string(envelope)?;

        let signature = match &self.signature_generator {
            Some(generator) => Some(generator.sign_payload(&envelope.timestamp, &body)?),
            None => None,
        };

        for attempt in 1..=self.max_retries {
            let mut request = self
                .client
                .post(&self.url)
                .header("Content-Type", "application/json")
                .header(TIMESTAMP_HEADER, &envelope.timestamp)
                .body(body.clone());

            if let Some(ref sig) = signature {
                request = request.header(SIGNATURE_HEADER, sig);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Webhook delivered successfully to {}", self.url);
                    return Ok(());
                }
                Ok(response) => {
                    warn!(
                        "Webhook delivery failed with status: {} (attempt {}/{})",
                        response.status(),
                        attempt,
                        self.max_retries
                    );
                }
                Err(e) => {
                    warn!(
                        "Webhook delivery error: {} (attempt {}/{})",
                        e, attempt, self.max_retries
                    );
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.base_backoff * 2_u32.pow(attempt - 1)).await;
            }
        }

        error!(
            "Webhook delivery failed after {} attempts",
            self.max_retries
        );
        Err(ServiceError::ExternalServiceError(format!(
            "Failed to deliver webhook after {} retries",
            self.max_retries
        )))
    }
}
