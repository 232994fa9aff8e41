//! Binance spot REST integration.
//!
//! API docs: https://developers.binance.com/docs/binance-spot-api-docs/rest-api
//! Base URL: https://api.binance.com
//! Auth: `X-MBX-APIKEY` header on account endpoints; SIGNED endpoints
//! append `timestamp`, `recvWindow` and an HMAC-SHA256 `signature` of the
//! query string, hex-encoded.
//!
//! Numeric fields arrive as strings ("0.00100000") and are parsed into
//! `Decimal` for quantities and `f64` for quotes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::filters::{LotSize, SymbolFilters};
use super::{AccountTrade, BookLevel, Exchange, OrderAck, OrderBook, SymbolInfo};
use crate::types::{
    BotError, Fill, OrderStatus, OrderType, PriceSnapshot, Quote, Side, TradeConfirmation,
    TradingPair,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const EXCHANGE_NAME: &str = "binance";

/// Default `recvWindow` for SIGNED requests, in milliseconds.
const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Binance API types
// ---------------------------------------------------------------------------

/// Error body returned on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    symbol: String,
    bid_price: String,
    ask_price: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfoResponse {
    symbols: Vec<SymbolEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolEntry {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default)]
    filters: Vec<FilterEntry>,
}

/// Filters are a tagged union on `filterType`; only the fields we read
/// are declared, all optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterEntry {
    filter_type: String,
    #[serde(default)]
    min_qty: Option<String>,
    #[serde(default)]
    max_qty: Option<String>,
    #[serde(default)]
    step_size: Option<String>,
    #[serde(default)]
    tick_size: Option<String>,
    #[serde(default)]
    min_notional: Option<String>,
}

/// `POST /api/v3/order` with `newOrderRespType=FULL`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    symbol: String,
    order_id: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    executed_qty: Option<String>,
    #[serde(default, rename = "cummulativeQuoteQty")]
    cumulative_quote_qty: Option<String>,
    #[serde(default)]
    transact_time: Option<i64>,
    #[serde(default)]
    fills: Vec<FillEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FillEntry {
    price: String,
    qty: String,
    commission: String,
    commission_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryOrderResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyTradeEntry {
    id: u64,
    order_id: u64,
    price: String,
    qty: String,
    quote_qty: String,
    commission: String,
    commission_asset: String,
}

#[derive(Debug, Deserialize)]
struct DepthResponse {
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    #[serde(default)]
    can_trade: bool,
    #[serde(default)]
    balances: Vec<BalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    asset: String,
    free: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Binance spot REST client.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
    recv_window_ms: u64,
}

impl BinanceClient {
    /// Create a client with explicit credentials.
    ///
    /// `timeout` bounds every HTTP round-trip.
    pub fn new(
        api_key: String,
        api_secret: SecretString,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("TRIARB/0.1.0 (triangular-arbitrage-bot)")
            .build()
            .context("Failed to build HTTP client for Binance")?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            api_secret,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        })
    }

    /// Override the `recvWindow` sent with SIGNED requests.
    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    // -- Request helpers ---------------------------------------------------

    /// HMAC-SHA256 of the query string, hex-encoded.
    fn sign(&self, query: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .map_err(|e| anyhow::anyhow!("HMAC key error: {e}"))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Unauthenticated GET.
    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = encode_query(params);
        let url = if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        };

        debug!(url = %url, "Binance public request");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;

        Self::decode(path, resp).await
    }

    /// SIGNED request: appends timestamp, recvWindow and signature.
    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut all: Vec<(&str, String)> = params.to_vec();
        all.push(("recvWindow", self.recv_window_ms.to_string()));
        all.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query = encode_query(&all);
        let signature = self.sign(&query)?;
        let url = format!("{}{path}?{query}&signature={signature}", self.base_url);

        debug!(method = %method, path, "Binance signed request");

        let resp = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;

        Self::decode(path, resp).await
    }

    /// Map non-2xx responses to `BotError::Api` and parse the body.
    async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => BotError::Api {
                    endpoint: path.to_string(),
                    code: err.code,
                    message: err.msg,
                }
                .into(),
                Err(_) => BotError::Exchange {
                    endpoint: path.to_string(),
                    message: format!("{status}: {body}"),
                }
                .into(),
            });
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Binance {path} response"))
    }

    async fn place_market(
        &self,
        symbol: &str,
        side: Side,
        qty_param: &str,
        qty: Decimal,
    ) -> Result<TradeConfirmation> {
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            (qty_param, qty.to_string()),
            ("newOrderRespType", "FULL".to_string()),
        ];
        let resp: OrderResponse = self.signed(Method::POST, "/api/v3/order", &params).await?;

        info!(
            symbol,
            side = %side,
            order_id = resp.order_id,
            status = resp.status.as_deref().unwrap_or("?"),
            "Binance market order placed"
        );

        resp.into_confirmation(side)
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn transport_error(path: &str, err: reqwest::Error) -> anyhow::Error {
    BotError::Exchange {
        endpoint: path.to_string(),
        message: err.to_string(),
    }
    .into()
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("Invalid decimal in {field}: {raw:?}"))
}

fn parse_opt_decimal(raw: Option<&String>) -> Option<Decimal> {
    raw.and_then(|s| Decimal::from_str(s).ok())
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl SymbolEntry {
    fn into_symbol_info(self) -> SymbolInfo {
        let mut filters = SymbolFilters::default();
        let mut legacy_min_notional = None;

        for f in &self.filters {
            match f.filter_type.as_str() {
                "LOT_SIZE" => {
                    let step = parse_opt_decimal(f.step_size.as_ref());
                    if let Some(step_size) = step {
                        filters.lot_size = Some(LotSize {
                            min_qty: parse_opt_decimal(f.min_qty.as_ref()).unwrap_or_default(),
                            step_size,
                            max_qty: parse_opt_decimal(f.max_qty.as_ref()).unwrap_or(Decimal::MAX),
                        });
                    }
                }
                "PRICE_FILTER" => filters.tick_size = parse_opt_decimal(f.tick_size.as_ref()),
                "NOTIONAL" => filters.min_notional = parse_opt_decimal(f.min_notional.as_ref()),
                "MIN_NOTIONAL" => legacy_min_notional = parse_opt_decimal(f.min_notional.as_ref()),
                _ => {}
            }
        }
        if filters.min_notional.is_none() {
            filters.min_notional = legacy_min_notional;
        }

        SymbolInfo {
            pair: TradingPair {
                symbol: self.symbol,
                base_asset: self.base_asset,
                quote_asset: self.quote_asset,
                status: self.status,
            },
            filters,
        }
    }
}

impl OrderResponse {
    /// Confirmation of an executed MARKET order. An order the exchange
    /// expired or rejected, or one that executed nothing, is an error.
    fn into_confirmation(self, requested_side: Side) -> Result<TradeConfirmation> {
        if let Some(status) = self.status.as_deref() {
            if !matches!(status, "FILLED" | "PARTIALLY_FILLED") {
                return Err(BotError::OrderRejected {
                    symbol: self.symbol,
                    reason: format!("order {} ended with status {status}", self.order_id),
                }
                .into());
            }
        }

        let side = match self.side.as_deref() {
            Some("SELL") => Side::Sell,
            Some("BUY") => Side::Buy,
            _ => requested_side,
        };

        let fills = self
            .fills
            .iter()
            .map(|f| {
                Ok(Fill {
                    price: parse_decimal("fills.price", &f.price)?,
                    qty: parse_decimal("fills.qty", &f.qty)?,
                    commission: parse_decimal("fills.commission", &f.commission)?,
                    commission_asset: f.commission_asset.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let executed_qty = match self.executed_qty.as_deref() {
            Some(raw) => parse_decimal("executedQty", raw)?,
            None => fills.iter().map(|f| f.qty).sum(),
        };
        if executed_qty <= Decimal::ZERO {
            return Err(BotError::OrderRejected {
                symbol: self.symbol,
                reason: format!("order {} executed nothing", self.order_id),
            }
            .into());
        }
        let quote_qty = match self.cumulative_quote_qty.as_deref() {
            Some(raw) => parse_decimal("cummulativeQuoteQty", raw)?,
            None => fills.iter().map(|f| f.qty * f.price).sum(),
        };
        let timestamp = self
            .transact_time
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        Ok(TradeConfirmation {
            symbol: self.symbol,
            order_id: self.order_id,
            side,
            order_type: OrderType::Market,
            executed_qty,
            quote_qty,
            fills,
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Exchange trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl Exchange for BinanceClient {
    async fn verify_account(&self) -> Result<()> {
        let account: AccountResponse = self
            .signed(Method::GET, "/api/v3/account", &[])
            .await
            .context("Binance account verification failed")?;

        if !account.can_trade {
            warn!("Binance account reports canTrade=false");
        }
        info!(balances = account.balances.len(), "Binance client verified");
        Ok(())
    }

    async fn order_book_tickers(&self) -> Result<PriceSnapshot> {
        let tickers: Vec<BookTicker> = self.public_get("/api/v3/ticker/bookTicker", &[]).await?;

        let snapshot: PriceSnapshot = tickers
            .into_iter()
            .filter_map(|t| {
                let bid = parse_f64(&t.bid_price)?;
                let ask = parse_f64(&t.ask_price)?;
                Some((t.symbol, Quote::new(bid, ask)))
            })
            .collect();

        debug!(symbols = snapshot.len(), "Book tickers fetched");
        Ok(snapshot)
    }

    async fn exchange_info(&self) -> Result<Vec<SymbolInfo>> {
        let info: ExchangeInfoResponse = self.public_get("/api/v3/exchangeInfo", &[]).await?;
        let symbols: Vec<SymbolInfo> = info
            .symbols
            .into_iter()
            .map(SymbolEntry::into_symbol_info)
            .collect();

        debug!(symbols = symbols.len(), "Exchange info fetched");
        Ok(symbols)
    }

    async fn market_buy(&self, symbol: &str, quote_qty: Decimal) -> Result<TradeConfirmation> {
        self.place_market(symbol, Side::Buy, "quoteOrderQty", quote_qty)
            .await
    }

    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<TradeConfirmation> {
        self.place_market(symbol, Side::Sell, "quantity", quantity)
            .await
    }

    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderAck> {
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", quantity.to_string()),
            ("price", price.to_string()),
            ("newOrderRespType", "ACK".to_string()),
        ];
        let resp: OrderResponse = self.signed(Method::POST, "/api/v3/order", &params).await?;

        Ok(OrderAck {
            symbol: resp.symbol,
            order_id: resp.order_id,
            status: resp
                .status
                .as_deref()
                .map(OrderStatus::parse)
                .unwrap_or(OrderStatus::New),
        })
    }

    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<OrderStatus> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let resp: QueryOrderResponse = self.signed(Method::GET, "/api/v3/order", &params).await?;
        Ok(OrderStatus::parse(&resp.status))
    }

    async fn my_trades(&self, symbol: &str, order_id: u64) -> Result<Vec<AccountTrade>> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let trades: Vec<MyTradeEntry> = self
            .signed(Method::GET, "/api/v3/myTrades", &params)
            .await?;

        trades
            .into_iter()
            .map(|t| {
                Ok(AccountTrade {
                    id: t.id,
                    order_id: t.order_id,
                    price: parse_decimal("price", &t.price)?,
                    qty: parse_decimal("qty", &t.qty)?,
                    quote_qty: parse_decimal("quoteQty", &t.quote_qty)?,
                    commission: parse_decimal("commission", &t.commission)?,
                    commission_asset: t.commission_asset,
                })
            })
            .collect()
    }

    async fn order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        let depth: DepthResponse = self.public_get("/api/v3/depth", &params).await?;

        let levels = |side: Vec<(String, String)>| -> Vec<BookLevel> {
            side.into_iter()
                .filter_map(|(p, q)| {
                    Some(BookLevel {
                        price: parse_f64(&p)?,
                        qty: parse_f64(&q)?,
                    })
                })
                .collect()
        };

        Ok(OrderBook {
            bids: levels(depth.bids),
            asks: levels(depth.asks),
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<()> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let _: serde_json::Value = self
            .signed(Method::DELETE, "/api/v3/order", &params)
            .await?;
        info!(symbol, order_id, "Binance order cancelled");
        Ok(())
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal> {
        let account: AccountResponse = self
            .signed(Method::GET, "/api/v3/account", &[("omitZeroBalances", "true".to_string())])
            .await?;

        match account.balances.iter().find(|b| b.asset == asset) {
            Some(b) => parse_decimal("free", &b.free),
            None => Ok(Decimal::ZERO),
        }
    }

    fn name(&self) -> &str {
        EXCHANGE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client() -> BinanceClient {
        BinanceClient::new(
            "key".into(),
            SecretString::new("secret".into()),
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        // Example request from the Binance SIGNED endpoint documentation.
        let client = BinanceClient::new(
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A".into(),
            SecretString::new(
                "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j".into(),
            ),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            client.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_encode_query() {
        let q = encode_query(&[("symbol", "BTCUSDT".into()), ("price", "0.1".into())]);
        assert_eq!(q, "symbol=BTCUSDT&price=0.1");
        assert_eq!(encode_query(&[]), "");
    }

    #[test]
    fn test_parse_exchange_info() {
        let json = r#"{
            "symbols": [{
                "symbol": "ETHBTC",
                "status": "TRADING",
                "baseAsset": "ETH",
                "quoteAsset": "BTC",
                "filters": [
                    {"filterType": "PRICE_FILTER", "minPrice": "0.00001000", "maxPrice": "922327.00000000", "tickSize": "0.00001000"},
                    {"filterType": "LOT_SIZE", "minQty": "0.00010000", "maxQty": "100000.00000000", "stepSize": "0.00010000"},
                    {"filterType": "MIN_NOTIONAL", "minNotional": "0.00010000"},
                    {"filterType": "NOTIONAL", "minNotional": "0.00020000", "applyMinToMarket": true},
                    {"filterType": "MAX_NUM_ORDERS", "maxNumOrders": 200}
                ]
            }]
        }"#;
        let info: ExchangeInfoResponse = serde_json::from_str(json).unwrap();
        let sym = info.symbols.into_iter().next().unwrap().into_symbol_info();

        assert_eq!(sym.pair, TradingPair::new("ETHBTC", "ETH", "BTC"));
        let lot = sym.filters.lot_size.unwrap();
        assert_eq!(lot.step_size, dec!(0.0001));
        assert_eq!(lot.min_qty, dec!(0.0001));
        assert_eq!(sym.filters.tick_size, Some(dec!(0.00001)));
        // NOTIONAL wins over legacy MIN_NOTIONAL
        assert_eq!(sym.filters.min_notional, Some(dec!(0.0002)));
    }

    #[test]
    fn test_parse_legacy_min_notional() {
        let json = r#"{"symbol": "OLDUSDT", "status": "BREAK", "baseAsset": "OLD", "quoteAsset": "USDT",
            "filters": [{"filterType": "MIN_NOTIONAL", "minNotional": "10.00000000"}]}"#;
        let entry: SymbolEntry = serde_json::from_str(json).unwrap();
        let sym = entry.into_symbol_info();
        assert!(!sym.pair.is_trading());
        assert_eq!(sym.filters.min_notional, Some(dec!(10)));
        assert!(sym.filters.lot_size.is_none());
    }

    #[test]
    fn test_parse_full_market_order() {
        let json = r#"{
            "symbol": "BTCUSDT", "orderId": 28, "clientOrderId": "abc",
            "transactTime": 1507725176595, "price": "0.00000000",
            "origQty": "0.00200000", "executedQty": "0.00200000",
            "cummulativeQuoteQty": "100.00000000", "status": "FILLED",
            "timeInForce": "GTC", "type": "MARKET", "side": "BUY",
            "fills": [
                {"price": "50000.00", "qty": "0.00150000", "commission": "0.00000150", "commissionAsset": "BTC", "tradeId": 56},
                {"price": "50000.00", "qty": "0.00050000", "commission": "0.00000050", "commissionAsset": "BTC", "tradeId": 57}
            ]
        }"#;
        let resp: OrderResponse = serde_json::from_str(json).unwrap();
        let conf = resp.into_confirmation(Side::Buy).unwrap();

        assert_eq!(conf.order_id, 28);
        assert_eq!(conf.side, Side::Buy);
        assert_eq!(conf.order_type, OrderType::Market);
        assert_eq!(conf.executed_qty, dec!(0.002));
        assert_eq!(conf.quote_qty, dec!(100));
        assert_eq!(conf.fills.len(), 2);
        assert_eq!(conf.net_received("BTC"), dec!(0.001998));
    }

    #[test]
    fn test_expired_market_order_is_rejected() {
        let json = r#"{
            "symbol": "ETHBTC", "orderId": 31, "transactTime": 1507725176595,
            "executedQty": "0.00000000", "cummulativeQuoteQty": "0.00000000",
            "status": "EXPIRED", "type": "MARKET", "side": "SELL", "fills": []
        }"#;
        let resp: OrderResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_confirmation(Side::Sell).unwrap_err();

        let Some(BotError::OrderRejected { symbol, reason }) = err.downcast_ref::<BotError>() else {
            panic!("expected an order rejection, got {err:#}");
        };
        assert_eq!(symbol, "ETHBTC");
        assert!(reason.contains("EXPIRED"));
    }

    #[test]
    fn test_empty_market_fill_is_rejected() {
        let json = r#"{
            "symbol": "ETHBTC", "orderId": 32, "executedQty": "0.00000000",
            "status": "FILLED", "side": "BUY", "fills": []
        }"#;
        let resp: OrderResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_confirmation(Side::Buy).unwrap_err();
        assert!(err.to_string().contains("executed nothing"));
    }

    #[test]
    fn test_parse_api_error_body() {
        let body = r#"{"code": -2010, "msg": "Account has insufficient balance for requested action."}"#;
        let err: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(err.code, -2010);
        assert!(err.msg.contains("insufficient balance"));
    }

    #[test]
    fn test_client_name() {
        assert_eq!(client().name(), "binance");
    }
}
