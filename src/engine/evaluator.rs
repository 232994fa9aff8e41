//! Arbitrage evaluator.
//!
//! Prices a triangle against one top-of-book snapshot with a flat fee per
//! hop. Base → quote hops sell at the bid, quote → base hops buy at the
//! ask. Book depth is ignored.

use crate::types::{ArbitrageResult, Direction, PriceSnapshot, Step, Triangle};

/// Walk the triangle starting from 1 unit of the anchor.
///
/// Returns the priced steps and the final amount, or `None` when any
/// symbol has no usable quote.
pub fn simulate(
    triangle: &Triangle,
    prices: &PriceSnapshot,
    fee_rate: f64,
) -> Option<(Vec<Step>, f64)> {
    let mut amount = 1.0_f64;
    let mut steps = Vec::with_capacity(3);

    for hop in &triangle.hops {
        let quote = prices.get(&hop.symbol).filter(|q| q.is_usable())?;
        let price_used = match hop.direction {
            Direction::BaseToQuote => {
                amount = amount * quote.bid * (1.0 - fee_rate);
                quote.bid
            }
            Direction::QuoteToBase => {
                amount = amount / quote.ask * (1.0 - fee_rate);
                quote.ask
            }
        };
        steps.push(Step {
            symbol: hop.symbol.clone(),
            direction: hop.direction,
            price_used,
            cumulative_amount: amount,
        });
    }

    Some((steps, amount))
}

/// Evaluate a triangle; `Some` only when profit strictly exceeds
/// `threshold_percent`.
pub fn evaluate(
    triangle: &Triangle,
    prices: &PriceSnapshot,
    fee_rate: f64,
    threshold_percent: f64,
) -> Option<ArbitrageResult> {
    let (steps, amount) = simulate(triangle, prices, fee_rate)?;
    let profit_percent = (amount - 1.0) * 100.0;

    if profit_percent > threshold_percent {
        Some(ArbitrageResult {
            triangle: triangle.clone(),
            steps,
            profit_percent,
        })
    } else {
        None
    }
}

/// First triangle in `triangles` that clears the threshold.
pub fn first_profitable<'a>(
    triangles: impl IntoIterator<Item = &'a Triangle>,
    prices: &PriceSnapshot,
    fee_rate: f64,
    threshold_percent: f64,
) -> Option<ArbitrageResult> {
    triangles
        .into_iter()
        .find_map(|t| evaluate(t, prices, fee_rate, threshold_percent))
}
