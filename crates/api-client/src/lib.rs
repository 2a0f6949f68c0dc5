// In crates/api-client/src/lib.rs

use app_config::ExchangeSettings;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use core_types::{Candle, OrderRequest, Symbol};
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::Duration;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// The largest candle page the exchange serves in one request.
const MAX_CANDLE_LIMIT: u16 = 300;

/// The trade and account operations the bot needs from an exchange.
///
/// Every call is a single request/response and may fail; failures carry the
/// upstream payload when the exchange produced one.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Fetches recent OHLCV candles, newest first.
    async fn fetch_candles(&self, symbol: &Symbol, timeframe: &str, limit: u16) -> Result<Vec<Candle>>;

    /// The available balance of `currency`, or zero when the account holds none.
    async fn get_balance(&self, currency: &str) -> Result<Decimal>;

    /// Submits an order. The price is only sent for order types that need one.
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck>;

    /// Requests cancellation of a single order.
    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> Result<CancelAck>;
}

impl ApiClient {
    /// Constructs a new ApiClient from ExchangeSettings.
    pub fn new(settings: &ExchangeSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            passphrase: settings.passphrase.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            simulated_trading: settings.simulated_trading,
            td_mode: settings.td_mode.clone(),
        })
    }

    /// The request timestamp format the exchange expects, e.g. `2020-12-08T09:08:57.715Z`.
    fn timestamp() -> String {
        Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    /// Generates the base64 HMAC-SHA256 signature of `timestamp + method + path + body`.
    ///
    /// # Arguments
    ///
    /// * `timestamp`: The value sent in the `OK-ACCESS-TIMESTAMP` header.
    /// * `method`: The upper-case HTTP method.
    /// * `request_path`: The path including its query string.
    /// * `body`: The exact JSON body sent, or an empty string.
    pub(crate) fn sign(&self, timestamp: &str, method: &str, request_path: &str, body: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| Error::Signing(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.to_uppercase().as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Joins `path` to the base URL and appends `query` form-encoded.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// The path and encoded query exactly as sent, which is what gets signed.
    fn request_path(url: &Url) -> String {
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }

    /// Sends a signed request and returns the `data` array of the response envelope.
    async fn send_signed(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Vec<Value>> {
        let body = match body {
            Some(b) => serde_json::to_string(b)?,
            None => String::new(),
        };
        let url = self.endpoint(path, query)?;
        let timestamp = Self::timestamp();
        let signature = self.sign(&timestamp, method.as_str(), &Self::request_path(&url), &body)?;

        let mut request = self
            .http_client
            .request(method, url)
            .header("OK-ACCESS-KEY", &self.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", &timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.passphrase)
            .header(CONTENT_TYPE, "application/json");
        if self.simulated_trading {
            request = request.header("x-simulated-trading", "1");
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await.map_err(Error::RequestFailed)?;
        Self::read_envelope(response).await
    }

    /// Sends an unsigned request to a public endpoint.
    async fn send_public(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = self.endpoint(path, query)?;
        let response = self.http_client.get(url).send().await.map_err(Error::RequestFailed)?;
        Self::read_envelope(response).await
    }

    /// Checks the `{code, msg, data}` envelope. Any non-zero code is an `ApiError`.
    async fn read_envelope(response: reqwest::Response) -> Result<Vec<Value>> {
        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;

        let value: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) if !status.is_success() => {
                tracing::debug!(error = %e, %status, "Non-JSON error body from exchange.");
                return Err(Error::ApiError {
                    code: status.as_u16().to_string(),
                    msg: text,
                    payload: Value::Null,
                });
            }
            Err(e) => return Err(Error::DeserializationFailed(e)),
        };

        let code = match value.get("code") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ if status.is_success() => "0".to_string(),
            _ => status.as_u16().to_string(),
        };
        if code != "0" {
            let msg = value.get("msg").and_then(Value::as_str).unwrap_or("Unknown error").to_string();
            return Err(Error::ApiError { code, msg, payload: value });
        }

        match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(data)) => Ok(data),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(other) => Err(Error::InvalidResponse(format!("`data` is not an array: {}", other))),
            },
            other => Err(Error::InvalidResponse(format!("Response is not an object: {}", other))),
        }
    }

    /// Takes the first entry of a `data` array, failing on an empty one.
    fn first_entry<T: serde::de::DeserializeOwned>(data: Vec<Value>, operation: &str) -> Result<T> {
        let entry = data
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse(format!("{} returned no data", operation)))?;
        Ok(serde_json::from_value(entry)?)
    }
}

fn parse_field(row: &[String], index: usize) -> Result<Decimal> {
    let raw = row
        .get(index)
        .ok_or_else(|| Error::InvalidResponse(format!("candle row has no column {}", index)))?;
    raw.parse()
        .map_err(|_| Error::InvalidResponse(format!("candle column {} is not numeric: {}", index, raw)))
}

#[async_trait]
impl ExchangeGateway for ApiClient {
    /// Corresponds to `GET /api/v5/market/candles`.
    async fn fetch_candles(&self, symbol: &Symbol, timeframe: &str, limit: u16) -> Result<Vec<Candle>> {
        let limit = limit.clamp(1, MAX_CANDLE_LIMIT);
        let limit = limit.to_string();
        let query = [("instId", symbol.0.as_str()), ("bar", timeframe), ("limit", limit.as_str())];
        let data = self.send_public("/api/v5/market/candles", &query).await?;

        // Convert the raw rows into our clean, internal Candle type.
        data.into_iter()
            .map(|row| -> Result<Candle> {
                let RawCandle(row) = serde_json::from_value(row)?;
                let open_time = row
                    .first()
                    .and_then(|ts| ts.parse::<i64>().ok())
                    .ok_or_else(|| Error::InvalidResponse("candle row has no timestamp".to_string()))?;
                Ok(Candle {
                    open_time,
                    open: parse_field(&row, 1)?,
                    high: parse_field(&row, 2)?,
                    low: parse_field(&row, 3)?,
                    close: parse_field(&row, 4)?,
                    volume: parse_field(&row, 5)?,
                })
            })
            .collect()
    }

    /// Corresponds to `GET /api/v5/account/balance`.
    async fn get_balance(&self, currency: &str) -> Result<Decimal> {
        let data = self
            .send_signed(Method::GET, "/api/v5/account/balance", &[("ccy", currency)], None)
            .await?;

        for entry in data {
            let account: AccountBalance = serde_json::from_value(entry)?;
            if let Some(detail) = account.details.iter().find(|d| d.ccy == currency) {
                let available = match non_empty(&detail.avail_bal) {
                    Some(raw) => raw.parse().map_err(|_| {
                        Error::InvalidResponse(format!("availBal is not numeric: {}", raw))
                    })?,
                    None => Decimal::ZERO,
                };
                return Ok(available);
            }
        }
        Ok(Decimal::ZERO)
    }

    /// Corresponds to `POST /api/v5/trade/order`.
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck> {
        let mut body = json!({
            "instId": request.symbol.0,
            "tdMode": self.td_mode,
            "side": request.side.as_str(),
            "ordType": request.order_type.as_str(),
            "sz": request.size.to_string(),
        });
        if request.order_type.requires_price() {
            body["px"] = json!(request.price.to_string());
        }

        let data = self.send_signed(Method::POST, "/api/v5/trade/order", &[], Some(&body)).await?;
        let ack: OrderAck = Self::first_entry(data, "place_order")?;

        // A per-order rejection can arrive inside an otherwise successful envelope.
        if let Some(code) = non_empty(&ack.s_code) {
            if code != "0" {
                return Err(Error::ApiError {
                    code: code.to_string(),
                    msg: ack.s_msg.clone().unwrap_or_default(),
                    payload: body,
                });
            }
        }
        Ok(ack)
    }

    /// Corresponds to `POST /api/v5/trade/cancel-order`.
    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> Result<CancelAck> {
        let body = json!({
            "instId": symbol.0,
            "ordId": order_id,
        });
        let data = self.send_signed(Method::POST, "/api/v5/trade/cancel-order", &[], Some(&body)).await?;
        Self::first_entry(data, "cancel_order")
    }
}
