//! Fund data access port trait.

use crate::domain::error::FundsignalError;
use crate::domain::quote::FundQuote;

pub trait FundDataPort {
    /// Fetches and parses everything known about one fund.
    ///
    /// An empty nav series is a valid answer (insufficient history), not an error.
    fn fetch_quote(&self, code: &str) -> Result<FundQuote, FundsignalError>;
}
