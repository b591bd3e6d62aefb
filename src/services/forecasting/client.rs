use crate::errors::ServiceError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_MODEL_NAME: &str = "unknown";

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    sku: &'a str,
    horizon_days: u32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    success: bool,
    data: Option<PredictData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictData {
    #[serde(default)]
    forecast: Vec<PredictedPoint>,
    #[serde(default = "default_model_name")]
    model_name: String,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

/// One dated prediction as returned by the forecasting service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictedPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    #[serde(default)]
    pub yhat_lower: Option<f64>,
    #[serde(default)]
    pub yhat_upper: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSet {
    pub model_name: String,
    pub points: Vec<PredictedPoint>,
}

/// HTTP client for the external forecasting service
#[derive(Clone)]
pub struct ForecastClient {
    http: reqwest::Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("forecast client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests `horizon_days` of daily predictions for `sku`
    #[instrument(skip(self))]
    pub async fn predict(&self, sku: &str, horizon_days: u32) -> Result<PredictionSet, ServiceError> {
        let url = format!("{}/predict", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&PredictRequest { sku, horizon_days })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "forecast service unreachable");
                ServiceError::DependencyUnavailable(format!("forecast service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "forecast service returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid forecast response: {}", e))
        })?;

        if !parsed.success {
            return Err(ServiceError::ExternalServiceError(
                parsed
                    .error
                    .unwrap_or_else(|| "forecast service reported failure".to_string()),
            ));
        }

        let data = parsed.data.ok_or_else(|| {
            ServiceError::ExternalServiceError("forecast response missing data".to_string())
        })?;

        debug!(points = data.forecast.len(), model = %data.model_name, "forecast received");
        Ok(PredictionSet {
            model_name: data.model_name,
            points: data.forecast,
        })
    }

    /// Pings `GET /health`
    pub async fn health(&self) -> Result<(), ServiceError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| {
            ServiceError::DependencyUnavailable(format!("forecast service unreachable: {}", e))
        })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::ExternalServiceError(format!(
                "forecast service health returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ForecastClient {
        ForecastClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn predict_parses_forecast_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_json(json!({"sku": "SKU-1", "horizon_days": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "sku": "SKU-1",
                    "horizon_days": 2,
                    "forecast": [
                        {"date": "2025-03-02", "yhat": 4.5, "yhat_lower": 3.0, "yhat_upper": 6.0},
                        {"date": "2025-03-03", "yhat": 5.0, "yhat_lower": null, "yhat_upper": null}
                    ],
                    "model_name": "prophet",
                    "generated_at": "2025-03-01T08:00:00"
                }
            })))
            .mount(&server)
            .await;

        let set = client(&server).predict("SKU-1", 2).await.unwrap();
        assert_eq!(set.model_name, "prophet");
        assert_eq!(set.points.len(), 2);
        assert_eq!(set.points[0].yhat_lower, Some(3.0));
        assert_eq!(set.points[1].yhat_upper, None);
    }

    #[tokio::test]
    async fn unsuccessful_payload_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "error": "no model"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).predict("SKU-1", 7).await.unwrap_err();
        assert_matches!(err, ServiceError::ExternalServiceError(msg) if msg == "no model");
    }

    #[tokio::test]
    async fn server_error_status_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
            .mount(&server)
            .await;

        let err = client(&server).predict("SKU-1", 7).await.unwrap_err();
        assert_matches!(err, ServiceError::ExternalServiceError(_));
    }

    #[tokio::test]
    async fn unreachable_service_is_dependency_unavailable() {
        let client = ForecastClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.health().await.unwrap_err();
        assert_matches!(err, ServiceError::DependencyUnavailable(_));
    }

    #[tokio::test]
    async fn health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        assert!(client(&server).health().await.is_ok());
    }
}
