//! Market graph builder.
//!
//! Turns exchange trading rules into an adjacency map over assets. Every
//! trading pair contributes two edges tagged with the same symbol: base →
//! quote and quote → base. The graph is rebuilt wholesale, never patched.

use std::collections::BTreeMap;

use crate::exchange::SymbolInfo;
use crate::types::{Direction, TradingPair};

/// An outgoing edge from an asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub neighbor: String,
    pub symbol: String,
    pub direction: Direction,
}

/// `asset -> [(neighbor, symbol, direction)]`, each list sorted by
/// neighbor then symbol.
#[derive(Debug, Clone, Default)]
pub struct PairGraph {
    adjacency: BTreeMap<String, Vec<Edge>>,
}

impl PairGraph {
    /// Build from trading pairs, keeping only those with `TRADING` status.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a TradingPair>) -> Self {
        let mut adjacency: BTreeMap<String, Vec<Edge>> = BTreeMap::new();

        for pair in pairs.into_iter().filter(|p| p.is_trading()) {
            adjacency
                .entry(pair.base_asset.clone())
                .or_default()
                .push(Edge {
                    neighbor: pair.quote_asset.clone(),
                    symbol: pair.symbol.clone(),
                    direction: Direction::BaseToQuote,
                });
            adjacency
                .entry(pair.quote_asset.clone())
                .or_default()
                .push(Edge {
                    neighbor: pair.base_asset.clone(),
                    symbol: pair.symbol.clone(),
                    direction: Direction::QuoteToBase,
                });
        }

        for edges in adjacency.values_mut() {
            edges.sort();
        }

        Self { adjacency }
    }

    /// Build from a full exchange-info listing.
    pub fn from_symbols(symbols: &[SymbolInfo]) -> Self {
        Self::from_pairs(symbols.iter().map(|s| &s.pair))
    }

    /// Outgoing edges of an asset; empty for unknown assets.
    pub fn edges(&self, asset: &str) -> &[Edge] {
        self.adjacency.get(asset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn asset_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Total directed edges (two per trading pair).
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}
