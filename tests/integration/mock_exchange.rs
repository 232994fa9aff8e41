//! Mock exchange for integration testing.
//!
//! Provides a deterministic `Exchange` implementation that lists known
//! symbols, quotes fixed prices, fills market orders at top of book and
//! tracks balances, all in-memory with no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio_test::assert_err;

use triarb::exchange::filters::{LotSize, SymbolFilters};
use triarb::exchange::{
    AccountTrade, BookLevel, Exchange, OrderAck, OrderBook, SymbolInfo,
};
use triarb::types::*;

/// Commission charged on every fill, in the received asset.
pub const MOCK_FEE: Decimal = dec!(0.001);

/// How resting limit orders behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitBehaviour {
    /// Fill at the limit price on the first status check.
    FillImmediately,
    /// Stay `NEW` forever.
    NeverFill,
    /// Fill half the quantity on the first status check, then rest.
    FillHalf,
}

#[derive(Debug, Clone)]
struct RestingOrder {
    symbol: String,
    side: Side,
    quantity: Decimal,
    price: Decimal,
    status: OrderStatus,
    trades: Vec<AccountTrade>,
}

/// A mock spot exchange for deterministic testing.
pub struct MockExchange {
    symbols: Vec<SymbolInfo>,
    quotes: Mutex<HashMap<String, Quote>>,
    balances: Mutex<HashMap<String, Decimal>>,
    orders: Mutex<HashMap<u64, RestingOrder>>,
    next_order_id: Mutex<u64>,
    /// Every submitted order as `(symbol, side, type)`.
    submitted: Mutex<Vec<(String, Side, OrderType)>>,
    cancelled: Mutex<Vec<u64>>,
    /// Symbols whose orders are rejected.
    failing_symbols: Mutex<HashSet<String>>,
    /// Multiplier applied to order book prices (not to tickers).
    book_drift: Mutex<f64>,
    limit_behaviour: Mutex<LimitBehaviour>,
    /// If set, market data calls return this error.
    force_error: Mutex<Option<String>>,
}

impl MockExchange {
    /// BTC/ETH/USDT market where USDT → ETH → BTC → USDT is profitable.
    pub fn new() -> Self {
        let mock = Self::with_symbols(vec![
            symbol("BTCUSDT", "BTC", "USDT", dec!(0.00001), dec!(0.01), dec!(5)),
            symbol("ETHUSDT", "ETH", "USDT", dec!(0.0001), dec!(0.01), dec!(5)),
            symbol("ETHBTC", "ETH", "BTC", dec!(0.0001), dec!(0.00001), dec!(0.0001)),
        ]);
        mock.set_quote("BTCUSDT", 50500.0, 50501.0);
        mock.set_quote("ETHBTC", 0.05, 0.0501);
        mock.set_quote("ETHUSDT", 2500.0, 2500.5);
        mock.set_balance("USDT", dec!(1000));
        mock
    }

    pub fn with_symbols(symbols: Vec<SymbolInfo>) -> Self {
        Self {
            symbols,
            quotes: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            next_order_id: Mutex::new(1),
            submitted: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            failing_symbols: Mutex::new(HashSet::new()),
            book_drift: Mutex::new(1.0),
            limit_behaviour: Mutex::new(LimitBehaviour::FillImmediately),
            force_error: Mutex::new(None),
        }
    }

    pub fn set_quote(&self, symbol: &str, bid: f64, ask: f64) {
        self.quotes
            .lock()
            .unwrap()
            .insert(symbol.to_string(), Quote::new(bid, ask));
    }

    pub fn set_balance(&self, asset: &str, amount: Decimal) {
        self.balances
            .lock()
            .unwrap()
            .insert(asset.to_string(), amount);
    }

    pub fn balance(&self, asset: &str) -> Decimal {
        self.balances
            .lock()
            .unwrap()
            .get(asset)
            .copied()
            .unwrap_or_default()
    }

    pub fn fail_orders_on(&self, symbol: &str) {
        self.failing_symbols
            .lock()
            .unwrap()
            .insert(symbol.to_string());
    }

    pub fn set_book_drift(&self, factor: f64) {
        *self.book_drift.lock().unwrap() = factor;
    }

    pub fn set_limit_behaviour(&self, behaviour: LimitBehaviour) {
        *self.limit_behaviour.lock().unwrap() = behaviour;
    }

    /// Force all market data calls to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn submitted(&self) -> Vec<(String, Side, OrderType)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<u64> {
        self.cancelled.lock().unwrap().clone()
    }

    // -- Internals -------------------------------------------------------

    fn check_error(&self) -> Result<()> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(()),
        }
    }

    fn pair(&self, symbol: &str) -> Result<&TradingPair> {
        if self.failing_symbols.lock().unwrap().contains(symbol) {
            return Err(anyhow!("Order rejected on {symbol}"));
        }
        self.symbols
            .iter()
            .map(|s| &s.pair)
            .find(|p| p.symbol == symbol)
            .ok_or_else(|| anyhow!("Invalid symbol: {symbol}"))
    }

    fn quote(&self, symbol: &str) -> Result<Quote> {
        self.quotes
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow!("No price for {symbol}"))
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_order_id.lock().unwrap();
        *id += 1;
        *id
    }

    /// Move balances for a fill. Commission is taken from the received asset.
    fn settle(
        &self,
        pair: &TradingPair,
        side: Side,
        base_qty: Decimal,
        quote_qty: Decimal,
    ) -> Result<(Decimal, String)> {
        let mut balances = self.balances.lock().unwrap();
        let (spend_asset, spend, recv_asset, recv) = match side {
            Side::Buy => (&pair.quote_asset, quote_qty, &pair.base_asset, base_qty),
            Side::Sell => (&pair.base_asset, base_qty, &pair.quote_asset, quote_qty),
        };

        let available = balances.get(spend_asset).copied().unwrap_or_default();
        if available < spend {
            return Err(anyhow!(
                "Account has insufficient balance for requested action: {spend} {spend_asset} > {available}"
            ));
        }
        let commission = recv * MOCK_FEE;
        *balances.entry(spend_asset.clone()).or_default() -= spend;
        *balances.entry(recv_asset.clone()).or_default() += recv - commission;
        Ok((commission, recv_asset.clone()))
    }

    fn fill_market(
        &self,
        symbol: &str,
        side: Side,
        base_qty: Decimal,
        quote_qty: Decimal,
        price: Decimal,
    ) -> Result<TradeConfirmation> {
        let pair = self.pair(symbol)?.clone();
        let (commission, commission_asset) = self.settle(&pair, side, base_qty, quote_qty)?;
        self.submitted
            .lock()
            .unwrap()
            .push((symbol.to_string(), side, OrderType::Market));

        Ok(TradeConfirmation {
            symbol: symbol.to_string(),
            order_id: self.next_id(),
            side,
            order_type: OrderType::Market,
            executed_qty: base_qty,
            quote_qty,
            fills: vec![Fill {
                price,
                qty: base_qty,
                commission,
                commission_asset,
            }],
            timestamp: Utc::now(),
        })
    }
}

pub fn symbol(
    symbol: &str,
    base: &str,
    quote: &str,
    step: Decimal,
    tick: Decimal,
    min_notional: Decimal,
) -> SymbolInfo {
    SymbolInfo {
        pair: TradingPair::new(symbol, base, quote),
        filters: SymbolFilters {
            lot_size: Some(LotSize {
                min_qty: step,
                step_size: step,
                max_qty: dec!(9000000),
            }),
            tick_size: Some(tick),
            min_notional: Some(min_notional),
        },
    }
}

fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| anyhow!("Unrepresentable price {value}"))
}

#[async_trait]
impl Exchange for MockExchange {
    async fn verify_account(&self) -> Result<()> {
        self.check_error()
    }

    async fn order_book_tickers(&self) -> Result<PriceSnapshot> {
        self.check_error()?;
        Ok(PriceSnapshot::new(self.quotes.lock().unwrap().clone()))
    }

    async fn exchange_info(&self) -> Result<Vec<SymbolInfo>> {
        self.check_error()?;
        Ok(self.symbols.clone())
    }

    async fn market_buy(&self, symbol: &str, quote_qty: Decimal) -> Result<TradeConfirmation> {
        let ask = to_decimal(self.quote(symbol)?.ask)?;
        let base_qty = quote_qty / ask;
        self.fill_market(symbol, Side::Buy, base_qty, quote_qty, ask)
    }

    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<TradeConfirmation> {
        let bid = to_decimal(self.quote(symbol)?.bid)?;
        self.fill_market(symbol, Side::Sell, quantity, quantity * bid, bid)
    }

    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderAck> {
        self.pair(symbol)?;
        let order_id = self.next_id();
        self.orders.lock().unwrap().insert(
            order_id,
            RestingOrder {
                symbol: symbol.to_string(),
                side,
                quantity,
                price,
                status: OrderStatus::New,
                trades: Vec::new(),
            },
        );
        self.submitted
            .lock()
            .unwrap()
            .push((symbol.to_string(), side, OrderType::Limit));

        Ok(OrderAck {
            symbol: symbol.to_string(),
            order_id,
            status: OrderStatus::New,
        })
    }

    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<OrderStatus> {
        let order = self
            .orders
            .lock()
            .unwrap()
            .get(&order_id)
            .cloned()
            .ok_or_else(|| anyhow!("Order does not exist: {order_id}"))?;

        let behaviour = *self.limit_behaviour.lock().unwrap();
        if order.status != OrderStatus::New || behaviour == LimitBehaviour::NeverFill {
            return Ok(order.status);
        }

        let (qty, status) = match behaviour {
            LimitBehaviour::FillHalf => (order.quantity / dec!(2), OrderStatus::PartiallyFilled),
            _ => (order.quantity, OrderStatus::Filled),
        };
        let pair = self.pair(symbol)?.clone();
        let quote_qty = qty * order.price;
        let (commission, commission_asset) = self.settle(&pair, order.side, qty, quote_qty)?;
        let trade = AccountTrade {
            id: order_id * 10,
            order_id,
            price: order.price,
            qty,
            quote_qty,
            commission,
            commission_asset,
        };

        let mut orders = self.orders.lock().unwrap();
        if let Some(o) = orders.get_mut(&order_id) {
            o.status = status.clone();
            o.trades = vec![trade];
        }
        Ok(status)
    }

    async fn my_trades(&self, _symbol: &str, order_id: u64) -> Result<Vec<AccountTrade>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .get(&order_id)
            .map(|o| o.trades.clone())
            .unwrap_or_default())
    }

    async fn order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        let quote = self.quote(symbol)?;
        let drift = *self.book_drift.lock().unwrap();
        let level = |price: f64| BookLevel { price: price * drift, qty: 10.0 };
        let depth = limit.max(1) as usize;
        Ok(OrderBook {
            bids: std::iter::repeat(level(quote.bid)).take(depth).collect(),
            asks: std::iter::repeat(level(quote.ask)).take(depth).collect(),
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<()> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&order_id)
            .filter(|o| o.symbol == symbol)
            .ok_or_else(|| anyhow!("Unknown order sent: {order_id}"))?;
        if order.status.is_closed() {
            return Err(anyhow!("Order {order_id} already closed"));
        }
        order.status = OrderStatus::Canceled;
        self.cancelled.lock().unwrap().push(order_id);
        Ok(())
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal> {
        Ok(self.balance(asset))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests for the mock itself
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mock_market_orders_move_balances() {
    let mock = MockExchange::new();

    let buy = mock.market_buy("ETHUSDT", dec!(100)).await.unwrap();
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(mock.balance("USDT"), dec!(900));
    assert_eq!(mock.balance("ETH"), buy.executed_qty - buy.fills[0].commission);

    let sell = mock.market_sell("ETHUSDT", dec!(0.01)).await.unwrap();
    assert_eq!(sell.quote_qty, dec!(25));
    assert_eq!(sell.fills[0].commission_asset, "USDT");
}

#[tokio::test]
async fn test_mock_insufficient_balance() {
    let mock = MockExchange::new();
    let err = mock.market_buy("ETHUSDT", dec!(5000)).await.unwrap_err();
    assert!(err.to_string().contains("insufficient balance"));
}

#[tokio::test]
async fn test_mock_forced_error_and_failing_symbol() {
    let mock = MockExchange::new();
    mock.set_error("HTTP 503");
    assert_err!(mock.exchange_info().await);
    mock.clear_error();
    assert_eq!(mock.exchange_info().await.unwrap().len(), 3);

    mock.fail_orders_on("ETHBTC");
    assert_err!(mock.market_sell("ETHBTC", dec!(1)).await);
    assert!(mock.submitted().is_empty());
}
