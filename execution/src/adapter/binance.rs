//! Binance `ExchangeAdapter` (spec §4.2, component C1): signed REST
//! calls over [`conduit_integration::protocol::http::RestClient`],
//! grounded on the same path/signer split the teacher's
//! `client::binance::request::BinanceRequestSigner` used — HMAC-SHA256
//! over the query string, API key in `X-MBX-APIKEY`.

use async_trait::async_trait;
use chrono::Utc;
use conduit_core::{
    contracts::{CreateOrderRequest, CreateOrderResult, ExchangeAdapter, FetchedOrder},
    error::ExecutionError,
};
use conduit_integration::{
    error::SocketError,
    protocol::http::{RequestSigner, RestClient, RestRequest},
    rate_limit::RateLimiter,
};
use conduit_markets::{ExchangeId, PrecisionRules};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{borrow::Cow, collections::HashMap, sync::Arc};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct BinanceCredentials {
    pub api_key: String,
    pub secret_key: String,
}

/// HMAC-SHA256 query-string signer (spec §4.2: every adapter owns its
/// own auth scheme behind the same [`RequestSigner`] seam).
#[derive(Debug, Clone)]
struct BinanceSigner {
    api_key: String,
    secret_key: String,
}

impl RequestSigner for BinanceSigner {
    fn sign(
        &self,
        builder: reqwest::RequestBuilder,
        query_string: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, SocketError> {
        let timestamp = Utc::now().timestamp_millis();
        let base = match query_string {
            Some(qs) if !qs.is_empty() => format!("{qs}&timestamp={timestamp}"),
            _ => format!("timestamp={timestamp}"),
        };

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| SocketError::BuildRequest(e.to_string()))?;
        mac.update(base.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(builder
            .header("X-MBX-APIKEY", &self.api_key)
            .query(&[("timestamp", timestamp.to_string()), ("signature", signature)]))
    }
}

pub struct BinanceAdapter {
    client: RestClient<BinanceSigner>,
    precision: HashMap<&'static str, PrecisionRules>,
}

impl BinanceAdapter {
    pub fn new(base_url: impl Into<String>, credentials: BinanceCredentials, limiter: Arc<dyn RateLimiter>) -> Self {
        let signer = BinanceSigner {
            api_key: credentials.api_key,
            secret_key: credentials.secret_key,
        };
        Self {
            client: RestClient::new(base_url, signer, limiter, "binance", std::time::Duration::from_secs(30)),
            precision: default_precision_table(),
        }
    }
}

/// A handful of well-known pairs; anything else falls back to
/// [`DEFAULT_PRECISION`] (spec §4.3 — the adapter is expected to keep
/// this in a periodically refreshed table, not re-fetch it per call).
const DEFAULT_PRECISION: PrecisionRules = PrecisionRules {
    step_size: Decimal::from_parts(1, 0, 0, false, 6),
    tick_size: Decimal::from_parts(1, 0, 0, false, 2),
    min_notional: Decimal::from_parts(10, 0, 0, false, 0),
    min_qty: Decimal::from_parts(1, 0, 0, false, 6),
};

fn default_precision_table() -> HashMap<&'static str, PrecisionRules> {
    let mut table = HashMap::new();
    table.insert(
        "BTCUSDT",
        PrecisionRules {
            step_size: Decimal::from_parts(1, 0, 0, false, 5),
            tick_size: Decimal::from_parts(1, 0, 0, false, 2),
            min_notional: Decimal::from_parts(10, 0, 0, false, 0),
            min_qty: Decimal::from_parts(1, 0, 0, false, 5),
        },
    );
    table.insert(
        "ETHUSDT",
        PrecisionRules {
            step_size: Decimal::from_parts(1, 0, 0, false, 4),
            tick_size: Decimal::from_parts(1, 0, 0, false, 2),
            min_notional: Decimal::from_parts(10, 0, 0, false, 0),
            min_qty: Decimal::from_parts(1, 0, 0, false, 4),
        },
    );
    table
}

// ---------------------------------------------------------------- wire

#[derive(Debug, Clone, Serialize)]
struct CreateOrderQuery {
    symbol: String,
    side: String,
    #[serde(rename = "type")]
    order_type: String,
    quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
    #[serde(rename = "stopPrice", skip_serializing_if = "Option::is_none")]
    stop_price: Option<Decimal>,
}

struct CreateOrder(CreateOrderQuery);

impl RestRequest for CreateOrder {
    type Response = BinanceOrder;
    type QueryParams = CreateOrderQuery;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/order")
    }
    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }
    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CancelOrderQuery {
    symbol: String,
    #[serde(rename = "origClientOrderId", skip_serializing_if = "Option::is_none")]
    orig_client_order_id: Option<String>,
    #[serde(rename = "orderId", skip_serializing_if = "Option::is_none")]
    order_id: Option<String>,
}

struct CancelOrder(CancelOrderQuery);

impl RestRequest for CancelOrder {
    type Response = BinanceOrder;
    type QueryParams = CancelOrderQuery;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/order")
    }
    fn method() -> reqwest::Method {
        reqwest::Method::DELETE
    }
    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GetOrderQuery {
    symbol: String,
    #[serde(rename = "orderId")]
    order_id: String,
}

struct GetOrder(GetOrderQuery);

impl RestRequest for GetOrder {
    type Response = BinanceOrder;
    type QueryParams = GetOrderQuery;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/order")
    }
    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GetOpenOrdersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
}

struct GetOpenOrders(GetOpenOrdersQuery);

impl RestRequest for GetOpenOrders {
    type Response = Vec<BinanceOrder>;
    type QueryParams = GetOpenOrdersQuery;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/openOrders")
    }
    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
struct SymbolQuery {
    symbol: String,
}

struct GetTickerPrice(SymbolQuery);

impl RestRequest for GetTickerPrice {
    type Response = BinanceTickerPrice;
    type QueryParams = SymbolQuery;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/ticker/price")
    }
    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

struct GetAccountInfo;

impl RestRequest for GetAccountInfo {
    type Response = BinanceAccountInfo;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/account")
    }
    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BinanceOrder {
    #[serde(rename = "orderId")]
    order_id: i64,
    status: String,
    #[serde(rename = "executedQty", default)]
    executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty", default)]
    cummulative_quote_qty: Decimal,
    #[serde(default)]
    price: Decimal,
}

impl BinanceOrder {
    fn average_price(&self) -> Option<Decimal> {
        if self.executed_qty > Decimal::ZERO {
            Some(self.cummulative_quote_qty / self.executed_qty)
        } else if self.price > Decimal::ZERO {
            Some(self.price)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BinanceTickerPrice {
    price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
struct BinanceAccountInfo {
    balances: Vec<BinanceBalance>,
}

#[derive(Debug, Clone, Deserialize)]
struct BinanceBalance {
    asset: String,
    free: Decimal,
}

fn map_socket_error(err: SocketError) -> ExecutionError {
    match err {
        SocketError::RateLimited { .. } | SocketError::Timeout { .. } => {
            ExecutionError::Exchange(err.to_string())
        }
        other => ExecutionError::Exchange(other.to_string()),
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<CreateOrderResult, ExecutionError> {
        let query = CreateOrderQuery {
            symbol: request.symbol.clone(),
            side: request.side.to_string(),
            order_type: request.order_type.to_string(),
            quantity: request.quantity,
            price: request.price,
            stop_price: request.stop_price,
        };
        let order = self.client.execute(CreateOrder(query)).await.map_err(map_socket_error)?;
        Ok(CreateOrderResult {
            exchange_order_id: order.order_id.to_string(),
            status: order.status.clone(),
            filled_quantity: order.executed_qty,
            average_price: order.average_price(),
            adjusted_quantity: request.quantity,
            adjusted_price: request.price,
            adjusted_stop_price: request.stop_price,
            raw_response: serde_json::to_value(&order).unwrap_or(serde_json::Value::Null),
        })
    }

    async fn cancel_order(&self, exchange_order_id: &str, symbol: &str) -> Result<(), ExecutionError> {
        self.client
            .execute(CancelOrder(CancelOrderQuery {
                symbol: symbol.to_string(),
                orig_client_order_id: None,
                order_id: Some(exchange_order_id.to_string()),
            }))
            .await
            .map_err(map_socket_error)?;
        Ok(())
    }

    async fn fetch_order(&self, exchange_order_id: &str, symbol: &str) -> Result<FetchedOrder, ExecutionError> {
        let order = self
            .client
            .execute(GetOrder(GetOrderQuery {
                symbol: symbol.to_string(),
                order_id: exchange_order_id.to_string(),
            }))
            .await
            .map_err(map_socket_error)?;
        Ok(FetchedOrder {
            exchange_order_id: order.order_id.to_string(),
            status: order.status.clone(),
            filled_quantity: order.executed_qty,
            average_price: order.average_price(),
        })
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<FetchedOrder>, ExecutionError> {
        let orders = self
            .client
            .execute(GetOpenOrders(GetOpenOrdersQuery {
                symbol: symbol.map(str::to_string),
            }))
            .await
            .map_err(map_socket_error)?;
        Ok(orders
            .iter()
            .map(|order| FetchedOrder {
                exchange_order_id: order.order_id.to_string(),
                status: order.status.clone(),
                filled_quantity: order.executed_qty,
                average_price: order.average_price(),
            })
            .collect())
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Decimal, ExecutionError> {
        let ticker = self
            .client
            .execute(GetTickerPrice(SymbolQuery { symbol: symbol.to_string() }))
            .await
            .map_err(map_socket_error)?;
        Ok(ticker.price)
    }

    async fn fetch_balance(&self, asset: &str) -> Result<Decimal, ExecutionError> {
        let account = self.client.execute(GetAccountInfo).await.map_err(map_socket_error)?;
        account
            .balances
            .into_iter()
            .find(|balance| balance.asset == asset)
            .map(|balance| balance.free)
            .ok_or_else(|| ExecutionError::Exchange(format!("no balance entry for asset {asset}")))
    }

    async fn create_batch_orders(
        &self,
        requests: Vec<CreateOrderRequest>,
    ) -> Vec<Result<CreateOrderResult, ExecutionError>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.create_order(request).await);
        }
        results
    }

    fn get_precision(&self, symbol: &str) -> PrecisionRules {
        self.precision.get(symbol).copied().unwrap_or(DEFAULT_PRECISION)
    }
}
