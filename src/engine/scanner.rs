//! Market scanner.
//!
//! One scan tick: load trading rules, build the pair graph and the
//! anchored triangle set, take one price snapshot and walk the triangles
//! in enumeration order until the first one clears the profit threshold.
//!
//! By default the market view is rebuilt on every tick. With caching
//! enabled it is reused for a fixed number of ticks; prices are always
//! fresh.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use super::evaluator;
use super::graph::PairGraph;
use super::triangles::find_triangles;
use crate::exchange::filters::FilterBook;
use crate::exchange::Exchange;
use crate::types::{ArbitrageResult, Triangle, ANCHOR_ASSET, FEE_RATE};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub anchor: String,
    pub fee_rate: f64,
    pub threshold_percent: f64,
    /// Reuse the market view between ticks.
    pub cache_triangles: bool,
    /// Ticks a cached market view stays valid.
    pub triangle_refresh_ticks: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            anchor: ANCHOR_ASSET.to_string(),
            fee_rate: FEE_RATE,
            threshold_percent: 0.0,
            cache_triangles: false,
            triangle_refresh_ticks: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Market view
// ---------------------------------------------------------------------------

/// Graph, triangles and filters derived from one exchange-info fetch.
#[derive(Debug)]
pub struct MarketView {
    pub graph: PairGraph,
    pub triangles: Vec<Triangle>,
    pub filters: FilterBook,
    built_at_tick: u64,
}

impl MarketView {
    fn build(symbols: &[crate::exchange::SymbolInfo], anchor: &str, tick: u64) -> Self {
        let graph = PairGraph::from_symbols(symbols);
        let triangles = find_triangles(&graph, anchor);
        let filters = FilterBook::from_symbols(symbols);
        Self {
            graph,
            triangles,
            filters,
            built_at_tick: tick,
        }
    }
}

/// Result of one scan tick.
#[derive(Debug)]
pub struct ScanOutcome {
    pub market: Arc<MarketView>,
    /// First qualifying triangle, if any.
    pub opportunity: Option<ArbitrageResult>,
}

impl ScanOutcome {
    pub fn triangles_checked(&self) -> usize {
        self.market.triangles.len()
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct Scanner {
    exchange: Arc<dyn Exchange>,
    settings: ScanSettings,
    cache: Option<Arc<MarketView>>,
    tick: u64,
}

impl Scanner {
    pub fn new(exchange: Arc<dyn Exchange>, settings: ScanSettings) -> Self {
        Self {
            exchange,
            settings,
            cache: None,
            tick: 0,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run one tick.
    pub async fn scan_once(&mut self) -> Result<ScanOutcome> {
        self.tick += 1;
        let market = self.market_view().await?;

        let prices = self
            .exchange
            .order_book_tickers()
            .await
            .context("Failed to fetch order book tickers")?;

        debug!(
            tick = self.tick,
            triangles = market.triangles.len(),
            prices = prices.len(),
            "Evaluating triangles"
        );

        let opportunity = evaluator::first_profitable(
            &market.triangles,
            &prices,
            self.settings.fee_rate,
            self.settings.threshold_percent,
        );

        if let Some(found) = &opportunity {
            info!(
                triangle = %found.triangle,
                profit = found.profit_percent,
                "Profitable triangle found"
            );
        }

        Ok(ScanOutcome {
            market,
            opportunity,
        })
    }

    /// Current market view, rebuilding it when stale or caching is off.
    async fn market_view(&mut self) -> Result<Arc<MarketView>> {
        if self.settings.cache_triangles {
            if let Some(view) = &self.cache {
                if self.tick - view.built_at_tick < self.settings.triangle_refresh_ticks {
                    return Ok(view.clone());
                }
            }
        }

        let symbols = self
            .exchange
            .exchange_info()
            .await
            .context("Failed to fetch exchange info")?;
        let view = Arc::new(MarketView::build(&symbols, &self.settings.anchor, self.tick));

        info!(
            symbols = symbols.len(),
            assets = view.graph.asset_count(),
            triangles = view.triangles.len(),
            anchor = %self.settings.anchor,
            "Market view rebuilt"
        );

        if self.settings.cache_triangles {
            self.cache = Some(view.clone());
        }
        Ok(view)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
