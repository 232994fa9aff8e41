//! Integration tests for the TRIARB engine.

mod mock_exchange;
mod scenarios;
