// In crates/api-client/src/types.rs

use reqwest::Client;
use serde::Deserialize;

/// The main client for interacting with the OKX v5 REST API.
#[derive(Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub(crate) http_client: Client,
    pub(crate) api_key: String,
    pub(crate) secret_key: String,
    pub(crate) passphrase: String,
    /// The base URL for the REST API, without a trailing slash.
    pub(crate) base_url: String,
    /// Adds the demo-trading header to every signed request.
    pub(crate) simulated_trading: bool,
    /// Trade mode sent with orders ("cash" for spot).
    pub(crate) td_mode: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("simulated_trading", &self.simulated_trading)
            .field("td_mode", &self.td_mode)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}

/// One entry of `GET /api/v5/account/balance`.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountBalance {
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

/// A single currency's balance inside the account breakdown.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDetail {
    pub ccy: String,
    /// Available balance; the exchange sends it as a string and sometimes empty.
    #[serde(default)]
    pub avail_bal: Option<String>,
}

/// Temporary struct to deserialize a candle row, which is a JSON array of strings:
/// `[ts, open, high, low, close, vol, volCcy, volCcyQuote, confirm]`.
#[derive(Debug, Deserialize)]
pub struct RawCandle(pub Vec<String>);

/// Acknowledgment returned by `POST /api/v5/trade/order`.
///
/// Every field is optional; the executor falls back to the requested values.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default, alias = "ord_id")]
    pub ord_id: Option<String>,
    #[serde(default)]
    pub cl_ord_id: Option<String>,
    #[serde(default)]
    pub px: Option<String>,
    /// Average fill price; only present once the order has traded.
    #[serde(default)]
    pub fill_px: Option<String>,
    #[serde(default)]
    pub sz: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Creation time in unix milliseconds.
    #[serde(default)]
    pub c_time: Option<String>,
    #[serde(default)]
    pub s_code: Option<String>,
    #[serde(default)]
    pub s_msg: Option<String>,
}

impl OrderAck {
    /// The exchange order id, falling back to the client order id.
    pub fn order_id(&self) -> Option<&str> {
        non_empty(&self.ord_id).or_else(|| non_empty(&self.cl_ord_id))
    }
}

/// Acknowledgment returned by `POST /api/v5/trade/cancel-order`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CancelAck {
    #[serde(default)]
    pub ord_id: Option<String>,
    #[serde(default)]
    pub cl_ord_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub s_code: Option<String>,
    #[serde(default)]
    pub s_msg: Option<String>,
}

impl CancelAck {
    /// A synthetic acknowledgment for an order canceled locally.
    pub fn canceled(order_id: impl Into<String>) -> Self {
        Self {
            ord_id: Some(order_id.into()),
            state: Some("canceled".to_string()),
            ..Self::default()
        }
    }

    /// Whether the acknowledgment confirms the cancellation: a zero (or absent)
    /// status code, a canceled state, or an echoed order id.
    pub fn is_confirmed(&self) -> bool {
        let code_ok = self.s_code.as_deref().is_none_or(|code| code.is_empty() || code == "0");
        code_ok || self.state.as_deref() == Some("canceled") || non_empty(&self.ord_id).is_some()
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
