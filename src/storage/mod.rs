//! Trade journal.
//!
//! Appends every completed trade confirmation to a plain text file as
//! one JSON object per record, each preceded by a newline. The file is
//! never rewritten or truncated.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::TradeConfirmation;

/// Default journal file path.
pub const DEFAULT_TRADE_LOG: &str = "trades.log";

#[derive(Debug, Clone)]
pub struct TradeJournal {
    path: PathBuf,
}

impl TradeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records, returning how many were written.
    pub fn append(&self, trades: &[TradeConfirmation]) -> Result<usize> {
        if trades.is_empty() {
            return Ok(0);
        }

        let mut buf = String::new();
        for trade in trades {
            let json = serde_json::to_string(trade)
                .with_context(|| format!("Failed to serialise trade {}", trade.order_id))?;
            buf.push('\n');
            buf.push_str(&json);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open trade journal {}", self.path.display()))?;
        file.write_all(buf.as_bytes())
            .with_context(|| format!("Failed to write trade journal {}", self.path.display()))?;

        debug!(path = %self.path.display(), records = trades.len(), "Trades journaled");
        Ok(trades.len())
    }

    /// Read every record back. A missing file is an empty journal.
    pub fn load(&self) -> Result<Vec<TradeConfirmation>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No trade journal found");
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read trade journal {}", self.path.display()))?;

        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("Malformed record {} in {}", i + 1, self.path.display())
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
