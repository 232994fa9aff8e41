//! Shared types for the TRIARB bot.
//!
//! These types form the data model used across all modules.
//! They are kept free of exchange-client details so that the engine,
//! the exchange adapters and the tests can depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Asset every triangle starts and ends in.
pub const ANCHOR_ASSET: &str = "USDT";

/// Flat taker fee applied per trade by the evaluator (0.1%).
pub const FEE_RATE: f64 = 0.001;

/// Asset that pays discounted commissions when the account opts in.
pub const FEE_ASSET: &str = "BNB";

/// Exchange status of a symbol that accepts orders.
pub const STATUS_TRADING: &str = "TRADING";

// ---------------------------------------------------------------------------
// Market metadata
// ---------------------------------------------------------------------------

/// A spot trading pair as described by the exchange trading rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    /// Exchange status string, e.g. "TRADING" or "BREAK".
    pub status: String,
}

impl TradingPair {
    pub fn new(symbol: &str, base: &str, quote: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            base_asset: base.to_string(),
            quote_asset: quote.to_string(),
            status: STATUS_TRADING.to_string(),
        }
    }

    /// Whether the pair currently accepts orders.
    pub fn is_trading(&self) -> bool {
        self.status == STATUS_TRADING
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}, {})",
            self.symbol, self.base_asset, self.quote_asset, self.status
        )
    }
}

// ---------------------------------------------------------------------------
// Triangles
// ---------------------------------------------------------------------------

/// Which side of the pair the hop trades out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// `from` is the pair's base asset, `to` is its quote asset.
    BaseToQuote,
    /// `from` is the pair's quote asset, `to` is its base asset.
    QuoteToBase,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::BaseToQuote => write!(f, "base-quote"),
            Direction::QuoteToBase => write!(f, "quote-base"),
        }
    }
}

/// One leg of a triangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub symbol: String,
    pub direction: Direction,
}

impl Hop {
    pub fn new(from: &str, to: &str, symbol: &str, direction: Direction) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            symbol: symbol.to_string(),
            direction,
        }
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} via {} ({})", self.from, self.to, self.symbol, self.direction)
    }
}

/// A 3-hop cycle that starts and ends at the anchor asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub hops: [Hop; 3],
}

impl Triangle {
    pub fn new(first: Hop, second: Hop, third: Hop) -> Self {
        Self {
            hops: [first, second, third],
        }
    }

    /// The asset the cycle starts and ends in.
    pub fn anchor(&self) -> &str {
        &self.hops[0].from
    }

    /// Check the structural invariants against an anchor.
    pub fn is_anchored_at(&self, anchor: &str) -> bool {
        self.hops[0].from == anchor
            && self.hops[2].to == anchor
            && self.hops[1].to != anchor
            && self.hops[0].to != anchor
            && self.hops[0].to != self.hops[1].to
            && self.hops[0].to == self.hops[1].from
            && self.hops[1].to == self.hops[2].from
    }

    /// The three symbols in leg order.
    pub fn symbols(&self) -> [&str; 3] {
        [
            self.hops[0].symbol.as_str(),
            self.hops[1].symbol.as_str(),
            self.hops[2].symbol.as_str(),
        ]
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} → {} → {} [{} | {} | {}]",
            self.hops[0].from,
            self.hops[0].to,
            self.hops[1].to,
            self.hops[2].to,
            self.hops[0].symbol,
            self.hops[1].symbol,
            self.hops[2].symbol,
        )
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// Best bid and ask for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    pub fn new(bid: f64, ask: f64) -> Self {
        Self { bid, ask }
    }

    /// Both sides are positive finite numbers.
    pub fn is_usable(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask > 0.0
    }
}

/// Top-of-book prices for every symbol, captured once per scan tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    quotes: HashMap<String, Quote>,
    pub captured_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(quotes: HashMap<String, Quote>) -> Self {
        Self {
            quotes,
            captured_at: Utc::now(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<(String, Quote)> for PriceSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Quote)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Evaluation results
// ---------------------------------------------------------------------------

/// How one hop was priced during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub symbol: String,
    pub direction: Direction,
    /// Bid for base-quote hops, ask for quote-base hops.
    pub price_used: f64,
    /// Amount held after this hop, starting from 1.0.
    pub cumulative_amount: f64,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) @ {:.8} → Amount: {:.6}",
            self.symbol, self.direction, self.price_used, self.cumulative_amount
        )
    }
}

/// A triangle that cleared the profit threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageResult {
    pub triangle: Triangle,
    pub steps: Vec<Step>,
    pub profit_percent: f64,
}

impl ArbitrageResult {
    /// Price the evaluator used on the middle leg. The limit-entry path
    /// rests its order at this price.
    pub fn reference_price(&self) -> f64 {
        self.steps.get(1).map(|s| s.price_used).unwrap_or_default()
    }

    /// Expected anchor amount after the cycle for a given stake.
    pub fn expected_final_value(&self, stake: f64) -> f64 {
        stake + stake * self.profit_percent / 100.0
    }
}

impl fmt::Display for ArbitrageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} profit={:.4}%", self.triangle, self.profit_percent)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire representation expected by the exchange.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Lifecycle status of a resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    Other(String),
}

impl OrderStatus {
    /// Parse the exchange status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "NEW" => OrderStatus::New,
            "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
            "FILLED" => OrderStatus::Filled,
            "CANCELED" => OrderStatus::Canceled,
            "PENDING_CANCEL" => OrderStatus::PendingCancel,
            "REJECTED" => OrderStatus::Rejected,
            "EXPIRED" | "EXPIRED_IN_MATCH" => OrderStatus::Expired,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    /// Whether the order can no longer fill.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Canceled => write!(f, "CANCELED"),
            OrderStatus::PendingCancel => write!(f, "PENDING_CANCEL"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
            OrderStatus::Expired => write!(f, "EXPIRED"),
            OrderStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One partial execution of an order, with its commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
}

/// Raw confirmation of a filled order, as written to the trade journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeConfirmation {
    pub symbol: String,
    pub order_id: u64,
    pub side: Side,
    pub order_type: OrderType,
    /// Base-asset quantity executed.
    pub executed_qty: Decimal,
    /// Quote-asset quantity exchanged.
    pub quote_qty: Decimal,
    pub fills: Vec<Fill>,
    pub timestamp: DateTime<Utc>,
}

impl TradeConfirmation {
    /// Quantity received before commissions: base for a BUY, quote for a SELL.
    pub fn gross_received(&self) -> Decimal {
        match self.side {
            Side::Buy => self.executed_qty,
            Side::Sell => self.quote_qty,
        }
    }

    /// Commissions charged against the received asset.
    ///
    /// When the received asset is the fee asset only fee-asset commissions
    /// count; otherwise only commissions paid in something else count.
    pub fn commission_for(&self, received_asset: &str) -> Decimal {
        let receiving_fee_asset = received_asset == FEE_ASSET;
        self.fills
            .iter()
            .filter(|f| (f.commission_asset == FEE_ASSET) == receiving_fee_asset)
            .map(|f| f.commission)
            .sum()
    }

    /// Net quantity of `received_asset` credited by this trade.
    pub fn net_received(&self, received_asset: &str) -> Decimal {
        self.gross_received() - self.commission_for(received_asset)
    }
}

impl fmt::Display for TradeConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} #{}: qty={} quote={} fills={}",
            self.order_type,
            self.side,
            self.symbol,
            self.order_id,
            self.executed_qty,
            self.quote_qty,
            self.fills.len(),
        )
    }
}

/// How a single leg resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum LegOutcome {
    Filled(TradeConfirmation),
    /// The exchange refused the order, or the submission itself failed.
    Rejected(String),
    /// The order was withdrawn before filling (deviation, timeout, shutdown).
    Cancelled(String),
    /// The order was withdrawn after part of it executed. `trade` is the
    /// executed part; its proceeds sit in the leg's target asset.
    PartiallyFilled {
        trade: TradeConfirmation,
        reason: String,
    },
}

impl LegOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, LegOutcome::Filled(_))
    }
}

impl fmt::Display for LegOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegOutcome::Filled(t) => write!(f, "filled: {t}"),
            LegOutcome::Rejected(r) => write!(f, "rejected: {r}"),
            LegOutcome::Cancelled(r) => write!(f, "cancelled: {r}"),
            LegOutcome::PartiallyFilled { trade, reason } => {
                write!(f, "partially filled ({trade}), then cancelled: {reason}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Execution state
// ---------------------------------------------------------------------------

/// How a trade cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    /// All three legs filled; funds are back in the anchor asset.
    Success,
    /// A leg failed; any stranded balance was converted back (or none existed).
    PartialFailure,
    /// Conversion back to the anchor failed; funds are stranded.
    RecoveryFailure,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Success => write!(f, "✅ SUCCESS"),
            Terminal::PartialFailure => write!(f, "⚠️ PARTIAL FAILURE"),
            Terminal::RecoveryFailure => write!(f, "❌ RECOVERY FAILURE"),
        }
    }
}

/// Mutable state of one trade cycle.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    pub current_asset: String,
    pub current_quantity: Decimal,
    pub completed_trades: Vec<TradeConfirmation>,
    pub terminal: Option<Terminal>,
}

impl ExecutionState {
    pub fn new(asset: &str, quantity: Decimal) -> Self {
        Self {
            current_asset: asset.to_string(),
            current_quantity: quantity,
            completed_trades: Vec::new(),
            terminal: None,
        }
    }

    /// Record a filled leg: move into `to_asset` with the net received amount.
    pub fn advance(&mut self, to_asset: &str, trade: TradeConfirmation) {
        self.current_quantity = trade.net_received(to_asset);
        self.current_asset = to_asset.to_string();
        self.completed_trades.push(trade);
    }

    /// Record a trade that converted a side balance into `asset`. The
    /// held quantity only grows when `asset` is the one currently held.
    pub fn absorb(&mut self, asset: &str, trade: TradeConfirmation) {
        if self.holds(asset) {
            self.current_quantity += trade.net_received(asset);
        }
        self.completed_trades.push(trade);
    }

    pub fn holds(&self, asset: &str) -> bool {
        self.current_asset == asset
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for TRIARB.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Exchange error ({endpoint}): {message}")]
    Exchange { endpoint: String, message: String },

    #[error("Exchange API error {code} ({endpoint}): {message}")]
    Api {
        endpoint: String,
        code: i64,
        message: String,
    },

    #[error("Order rejected on {symbol}: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("Deviation {deviation:.2}% > max {max:.2}% on {symbol}")]
    DeviationExceeded {
        symbol: String,
        deviation: f64,
        max: f64,
    },

    #[error("Failed to convert {asset} back to {anchor}: {reason}")]
    RecoveryFailed {
        asset: String,
        anchor: String,
        reason: String,
    },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
