//! Symbol trading rules: lot size, tick size and minimum notional.
//!
//! Orders that do not respect a symbol's `LOT_SIZE` step are rejected by
//! the exchange, so every quantity is floored to the step before it is
//! submitted. Minimum notional only decides whether the middle leg may
//! rest as a limit order.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::SymbolInfo;

// ---------------------------------------------------------------------------
// Filter types
// ---------------------------------------------------------------------------

/// `LOT_SIZE` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotSize {
    pub min_qty: Decimal,
    pub step_size: Decimal,
    pub max_qty: Decimal,
}

impl LotSize {
    /// Floor a quantity onto this lot's step grid.
    pub fn round(&self, quantity: Decimal) -> Decimal {
        round_step_size(quantity, self.step_size)
    }
}

/// The subset of a symbol's filters the engine cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolFilters {
    pub lot_size: Option<LotSize>,
    /// `PRICE_FILTER.tickSize`.
    pub tick_size: Option<Decimal>,
    /// `NOTIONAL.minNotional`, falling back to legacy `MIN_NOTIONAL`.
    pub min_notional: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Floor `quantity` to the nearest multiple of `step_size`.
///
/// The result carries the step's own decimal precision, ignoring the
/// trailing zeros exchanges pad their filter strings with, so a step of
/// `"1.00000000"` yields whole units and `"0.00100000"` yields three
/// decimals. A non-positive step leaves the quantity untouched.
pub fn round_step_size(quantity: Decimal, step_size: Decimal) -> Decimal {
    if step_size <= Decimal::ZERO {
        return quantity;
    }
    if quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let step = step_size.normalize();
    let mut rounded = (quantity / step).floor() * step;
    rounded.rescale(step.scale());
    rounded
}

// ---------------------------------------------------------------------------
// Filter book
// ---------------------------------------------------------------------------

/// Per-symbol filters indexed from one exchange-info fetch.
#[derive(Debug, Clone, Default)]
pub struct FilterBook {
    symbols: HashMap<String, SymbolFilters>,
}

impl FilterBook {
    pub fn from_symbols(symbols: &[SymbolInfo]) -> Self {
        Self {
            symbols: symbols
                .iter()
                .map(|s| (s.pair.symbol.clone(), s.filters.clone()))
                .collect(),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Lot-size lookup: `{minQty, stepSize, maxQty}`.
    pub fn lot_size(&self, symbol: &str) -> Option<&LotSize> {
        self.symbols.get(symbol).and_then(|f| f.lot_size.as_ref())
    }

    /// Minimum order value in quote terms, if the symbol declares one.
    pub fn min_notional(&self, symbol: &str) -> Option<Decimal> {
        self.symbols.get(symbol).and_then(|f| f.min_notional)
    }

    /// Floor a quantity to the symbol's step size.
    ///
    /// Fails for symbols without a `LOT_SIZE` filter and for quantities
    /// that round down to nothing.
    pub fn round_quantity(&self, symbol: &str, quantity: Decimal) -> Result<Decimal> {
        let Some(lot) = self.lot_size(symbol) else {
            bail!("No LOT_SIZE filter for {symbol}");
        };
        let rounded = lot.round(quantity);
        if rounded <= Decimal::ZERO {
            bail!("Quantity {quantity} rounds to zero on {symbol} (step {})", lot.step_size);
        }
        Ok(rounded)
    }

    /// Floor a price to the symbol's tick size. Symbols without a price
    /// filter keep the price as given.
    pub fn round_price(&self, symbol: &str, price: Decimal) -> Decimal {
        match self.symbols.get(symbol).and_then(|f| f.tick_size) {
            Some(tick) => round_step_size(price, tick),
            None => price,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
