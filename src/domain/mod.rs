//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod signal;
pub mod portfolio;
pub mod backtest;
pub mod metrics;
pub mod sanitize;
pub mod report;
pub mod universe;
pub mod config_validation;
pub mod error;
