//! Fund code lists for batch analysis.
//!
//! Parses comma-separated code lists from configuration or the command line.

use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("no codes given")]
    Empty,
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, WatchlistError> {
    if input.trim().is_empty() {
        return Err(WatchlistError::Empty);
    }

    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(WatchlistError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}
