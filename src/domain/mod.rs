//! Core domain types and logic.

pub mod valuation;
pub mod quote;
pub mod indicator;
pub mod decision;
pub mod cache;
pub mod batch;
pub mod watchlist;
pub mod config_validation;
pub mod error;
