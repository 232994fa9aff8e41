//! Limit order monitor.
//!
//! Submits a GTC limit order and watches it until it fills, the exchange
//! closes it, the market drifts too far from the limit price, the wait
//! times out, or the bot is asked to stop. Every path that leaves an
//! order resting on the book cancels it first, then re-reads the order
//! so that a fill racing the cancel, or a partial fill before it, is
//! reported rather than lost.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rust_decimal::prelude::*;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::ProgressSink;
use crate::exchange::filters::FilterBook;
use crate::exchange::{AccountTrade, Exchange};
use crate::types::{BotError, Fill, LegOutcome, OrderStatus, OrderType, Side, TradeConfirmation};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Order book levels fetched for each deviation check.
const BOOK_DEPTH: u32 = 5;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    /// Upper bound on how long an order may rest; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub max_deviation_percent: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            timeout: None,
            max_deviation_percent: 1.0,
        }
    }
}

/// Percentage gap between the live market price and the resting limit price.
pub fn deviation_percent(market_price: f64, limit_price: f64) -> f64 {
    ((market_price - limit_price) / limit_price).abs() * 100.0
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct LimitOrderMonitor<'a> {
    exchange: &'a dyn Exchange,
    filters: &'a FilterBook,
    settings: &'a MonitorSettings,
    progress: &'a ProgressSink,
    cancel: &'a CancellationToken,
}

impl<'a> LimitOrderMonitor<'a> {
    pub fn new(
        exchange: &'a dyn Exchange,
        filters: &'a FilterBook,
        settings: &'a MonitorSettings,
        progress: &'a ProgressSink,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            exchange,
            filters,
            settings,
            progress,
            cancel,
        }
    }

    /// Place the order and wait for it to resolve.
    pub async fn run(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> LegOutcome {
        let quantity = match self.filters.round_quantity(symbol, quantity) {
            Ok(q) => q,
            Err(e) => return self.rejected(symbol, side, e.to_string()),
        };
        let price = self.filters.round_price(symbol, limit_price);
        let Some(price_f64) = price.to_f64().filter(|p| *p > 0.0) else {
            return self.rejected(symbol, side, format!("Invalid limit price {price}"));
        };

        let ack = match self
            .exchange
            .create_limit_order(symbol, side, quantity, price)
            .await
        {
            Ok(ack) => ack,
            Err(e) => return self.rejected(symbol, side, format!("{e:#}")),
        };
        let order_id = ack.order_id;

        info!(%symbol, %side, %quantity, %price, order_id, "Limit order placed");
        self.progress
            .info(format!("🚚 Sent {side} order on {symbol}: {quantity} @ {price}"));

        let deadline = self.settings.timeout.map(|t| Instant::now() + t);

        loop {
            match self.poll_once(symbol, side, order_id, price_f64).await {
                Ok(Some(outcome)) => return outcome,
                Ok(None) => {}
                Err(e) => {
                    self.cancel_best_effort(symbol, order_id).await;
                    return self.rejected(symbol, side, format!("{e:#}"));
                }
            }

            let mut wait = self.settings.poll_interval;
            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return self
                        .withdraw(symbol, side, order_id, "Limit order timed out".into())
                        .await;
                }
                wait = wait.min(remaining);
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return self
                        .withdraw(symbol, side, order_id, "Bot stopping".into())
                        .await;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// One status check. `Ok(None)` means keep waiting.
    async fn poll_once(
        &self,
        symbol: &str,
        side: Side,
        order_id: u64,
        limit_price: f64,
    ) -> Result<Option<LegOutcome>> {
        debug!(%symbol, order_id, "Checking order status");
        let status = self.exchange.get_order(symbol, order_id).await?;

        match status {
            OrderStatus::Filled => {
                let trade = self.fetch_fill(symbol, side, order_id).await?;
                return Ok(Some(self.filled(symbol, side, trade)));
            }
            OrderStatus::Canceled | OrderStatus::Expired => {
                let reason = format!("Order {order_id} on {symbol} closed by exchange: {status}");
                self.progress.warn(format!("⚠️ {reason}"));
                return Ok(Some(self.closed(symbol, side, order_id, reason).await));
            }
            OrderStatus::Rejected => {
                return Ok(Some(self.rejected(
                    symbol,
                    side,
                    format!("Order {order_id} rejected by exchange"),
                )));
            }
            _ => {}
        }

        let book = self
            .exchange
            .order_book(symbol, BOOK_DEPTH)
            .await
            .with_context(|| format!("Failed to fetch order book for {symbol}"))?;
        let market_price = match side {
            Side::Sell => book.best_bid(),
            Side::Buy => book.best_ask(),
        }
        .ok_or_else(|| anyhow!("Empty order book for {symbol}"))?;

        let deviation = deviation_percent(market_price, limit_price);
        let max = self.settings.max_deviation_percent;
        if deviation > max {
            let err = BotError::DeviationExceeded {
                symbol: symbol.to_string(),
                deviation,
                max,
            };
            warn!(%symbol, order_id, deviation, max, "Deviation exceeded, cancelling");
            return Ok(Some(self.withdraw(symbol, side, order_id, err.to_string()).await));
        }

        Ok(None)
    }

    /// Cancel a resting order and report what it executed before leaving
    /// the book.
    async fn withdraw(
        &self,
        symbol: &str,
        side: Side,
        order_id: u64,
        reason: String,
    ) -> LegOutcome {
        self.progress
            .warn(format!("⚠️ {reason}. Cancelling order {order_id} on {symbol}."));

        if !self.cancel_best_effort(symbol, order_id).await {
            // The cancel is refused once the order has left the book.
            match self.exchange.get_order(symbol, order_id).await {
                Ok(OrderStatus::Filled) => {
                    info!(%symbol, order_id, "Order filled before it could be cancelled");
                    return match self.fetch_fill(symbol, side, order_id).await {
                        Ok(trade) => self.filled(symbol, side, trade),
                        Err(e) => self.rejected(symbol, side, format!("{e:#}")),
                    };
                }
                Ok(status) => {
                    debug!(%symbol, order_id, %status, "Order status after failed cancel")
                }
                Err(e) => {
                    warn!(%symbol, order_id, error = %format!("{e:#}"), "Failed to re-read order")
                }
            }
        }

        self.closed(symbol, side, order_id, reason).await
    }

    /// Outcome of an order that left the book without filling completely.
    async fn closed(&self, symbol: &str, side: Side, order_id: u64, reason: String) -> LegOutcome {
        let trades = match self.exchange.my_trades(symbol, order_id).await {
            Ok(trades) => trades,
            Err(e) => {
                error!(
                    %symbol,
                    order_id,
                    error = %format!("{e:#}"),
                    "Failed to fetch fills of closed order"
                );
                self.progress.error(format!(
                    "❌ Could not check order {order_id} on {symbol} for partial fills: {e:#}"
                ));
                return LegOutcome::Cancelled(reason);
            }
        };
        match aggregate_trades(symbol, order_id, side, &trades) {
            Ok(trade) => {
                warn!(
                    %symbol,
                    order_id,
                    qty = %trade.executed_qty,
                    "Order partially filled before closing"
                );
                self.progress.error(format!(
                    "❌ Order {order_id} on {symbol} partially filled {} of its quantity before closing",
                    trade.executed_qty
                ));
                LegOutcome::PartiallyFilled { trade, reason }
            }
            // No trades: nothing executed.
            Err(_) => LegOutcome::Cancelled(reason),
        }
    }

    async fn fetch_fill(
        &self,
        symbol: &str,
        side: Side,
        order_id: u64,
    ) -> Result<TradeConfirmation> {
        let trades = self.exchange.my_trades(symbol, order_id).await?;
        aggregate_trades(symbol, order_id, side, &trades)
    }

    fn filled(&self, symbol: &str, side: Side, trade: TradeConfirmation) -> LegOutcome {
        info!(
            %symbol,
            %side,
            qty = %trade.executed_qty,
            quote = %trade.quote_qty,
            "Limit order filled"
        );
        self.progress.info(format!(
            "✅ Executed LIMIT {side} order on {symbol}: {} -> {}",
            trade.executed_qty,
            trade.gross_received()
        ));
        LegOutcome::Filled(trade)
    }

    /// Returns `false` when the exchange refused the cancel.
    async fn cancel_best_effort(&self, symbol: &str, order_id: u64) -> bool {
        match self.exchange.cancel_order(symbol, order_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%symbol, order_id, error = %format!("{e:#}"), "Failed to cancel limit order");
                false
            }
        }
    }

    fn rejected(&self, symbol: &str, side: Side, reason: String) -> LegOutcome {
        self.progress
            .error(format!("❌ Limit order error: {reason} - {symbol} {side}"));
        LegOutcome::Rejected(reason)
    }
}

/// Fold all trades of one order into a single confirmation.
fn aggregate_trades(
    symbol: &str,
    order_id: u64,
    side: Side,
    trades: &[AccountTrade],
) -> Result<TradeConfirmation> {
    if trades.is_empty() {
        return Err(anyhow!("Order {order_id} on {symbol} is FILLED but has no trades"));
    }

    Ok(TradeConfirmation {
        symbol: symbol.to_string(),
        order_id,
        side,
        order_type: OrderType::Limit,
        executed_qty: trades.iter().map(|t| t.qty).sum(),
        quote_qty: trades.iter().map(|t| t.quote_qty).sum(),
        fills: trades
            .iter()
            .map(|t| Fill {
                price: t.price,
                qty: t.qty,
                commission: t.commission,
                commission_asset: t.commission_asset.clone(),
            })
            .collect(),
        timestamp: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
