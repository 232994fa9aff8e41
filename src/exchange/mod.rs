//! Exchange integration.
//!
//! Defines the `Exchange` trait the engine trades through and provides
//! the Binance spot REST implementation. The engine never talks HTTP
//! itself, so tests drive it with in-memory implementations.

pub mod binance;
pub mod filters;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{OrderStatus, PriceSnapshot, Side, TradeConfirmation, TradingPair};
use filters::SymbolFilters;

// ---------------------------------------------------------------------------
// Interface types
// ---------------------------------------------------------------------------

/// Trading rules for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub pair: TradingPair,
    pub filters: SymbolFilters,
}

/// Acknowledgement of a newly placed resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub symbol: String,
    pub order_id: u64,
    pub status: OrderStatus,
}

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub qty: f64,
}

/// Top levels of an order book, best first on each side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }
}

/// A single account trade belonging to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTrade {
    pub id: u64,
    pub order_id: u64,
    pub price: Decimal,
    pub qty: Decimal,
    pub quote_qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over a spot exchange account.
///
/// Market orders return the full confirmation including fills. Limit
/// orders return an acknowledgement; their fills are fetched with
/// `my_trades` once the order reports `FILLED`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Check that the credentials can read the account.
    async fn verify_account(&self) -> Result<()>;

    /// Best bid/ask for every listed symbol.
    async fn order_book_tickers(&self) -> Result<PriceSnapshot>;

    /// Trading rules for every listed symbol.
    async fn exchange_info(&self) -> Result<Vec<SymbolInfo>>;

    /// Market buy spending `quote_qty` of the quote asset.
    async fn market_buy(&self, symbol: &str, quote_qty: Decimal) -> Result<TradeConfirmation>;

    /// Market sell of `quantity` base asset.
    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<TradeConfirmation>;

    /// Place a good-till-cancelled limit order.
    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderAck>;

    /// Current status of an order.
    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<OrderStatus>;

    /// Account trades that filled an order.
    async fn my_trades(&self, symbol: &str, order_id: u64) -> Result<Vec<AccountTrade>>;

    /// Top `limit` levels of the order book.
    async fn order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook>;

    /// Cancel a resting order.
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<()>;

    /// Free (unlocked) balance of an asset.
    async fn free_balance(&self, asset: &str) -> Result<Decimal>;

    /// Exchange name for logging and identification.
    fn name(&self) -> &str;
}
