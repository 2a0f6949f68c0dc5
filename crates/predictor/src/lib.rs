// In crates/predictor/src/lib.rs

use app_config::MlApiSettings;
use async_trait::async_trait;
use core_types::{PredictionSignal, Symbol};
use std::time::Duration;

pub mod error;

pub use error::{Error, Result};

/// A source of trading signals.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Fetches the latest prediction for `symbol`.
    async fn fetch_prediction(&self, symbol: &Symbol) -> Result<PredictionSignal>;
}

/// HTTP client for the ML prediction service.
#[derive(Clone)]
pub struct PredictionClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for PredictionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl PredictionClient {
    pub fn new(settings: &MlApiSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionSource for PredictionClient {
    async fn fetch_prediction(&self, symbol: &Symbol) -> Result<PredictionSignal> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("symbol", symbol.0.as_str())])
            .header("X-API-Key", &self.api_key)
            .send()
            .await?
            .error_for_status()?;

        // Read as text first so a malformed body surfaces as a parse error, not a transport one.
        let body = response.text().await?;
        let prediction: PredictionSignal = serde_json::from_str(&body)?;
        tracing::debug!(%symbol, signal = %prediction.signal, "Prediction received.");
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::TradeSignal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PredictionClient {
        PredictionClient::new(&MlApiSettings {
            endpoint: format!("{}/predict", server.uri()),
            api_key: "ml-key".to_string(),
            symbol: "BTC-USDT".to_string(),
            poll_interval_seconds: 10,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_prediction_with_symbol_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict"))
            .and(query_param("symbol", "BTC-USDT"))
            .and(header("X-API-Key", "ml-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "signal": "buy",
                "confidence": 0.8,
                "profit_after_fee": 0.002,
                "current_price": 100.0,
                "expected_price": 102.0,
                "predicted_return": 0.02,
                "updated_at": "2024-05-01T12:00:00Z",
                "model_version": "v3"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pred = client(&server).fetch_prediction(&Symbol::new("BTC-USDT")).await.unwrap();
        assert_eq!(pred.signal, TradeSignal::Buy);
        assert_eq!(pred.current_price, dec!(100));
        assert_eq!(pred.expected_price(), dec!(102));
        assert_eq!(pred.predicted_return, Some(0.02));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_prediction(&Symbol::new("BTC-USDT")).await.unwrap_err();
        assert!(matches!(err, Error::RequestFailed(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"signal\": \"buy\"}"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_prediction(&Symbol::new("BTC-USDT")).await.unwrap_err();
        assert!(matches!(err, Error::DeserializationFailed(_)));
    }
}
