//! Triangle enumeration.
//!
//! Depth-3 cycle search anchored at one asset: anchor → A → B → anchor.
//! Cycles that visit the same assets through different symbols or in the
//! opposite order are all kept. Order follows the graph's sorted
//! adjacency lists, so output is reproducible.

use super::graph::PairGraph;
use crate::types::{Hop, Triangle};

/// Enumerate every triangle that starts and ends at `anchor`.
pub fn find_triangles(graph: &PairGraph, anchor: &str) -> Vec<Triangle> {
    let mut triangles = Vec::new();

    for first in graph.edges(anchor) {
        let a = first.neighbor.as_str();
        if a == anchor {
            continue;
        }

        for second in graph.edges(a) {
            let b = second.neighbor.as_str();
            if b == anchor || b == a {
                continue;
            }

            for third in graph.edges(b).iter().filter(|e| e.neighbor == anchor) {
                triangles.push(Triangle::new(
                    Hop::new(anchor, a, &first.symbol, first.direction),
                    Hop::new(a, b, &second.symbol, second.direction),
                    Hop::new(b, anchor, &third.symbol, third.direction),
                ));
            }
        }
    }

    triangles
}
