//! Domain error types.

/// Top-level error type for fundsignal.
#[derive(Debug, thiserror::Error)]
pub enum FundsignalError {
    #[error("transport error for {code}: {reason}")]
    Transport { code: String, reason: String },

    #[error("format error for {code}: {reason}")]
    Format { code: String, reason: String },

    #[error("fund {code} does not exist or returned no data")]
    UnknownFund { code: String },

    #[error("invalid nav series: {reason}")]
    InvalidSeries { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundsignalError {
    /// True for the failures a batch records per fund instead of aborting.
    pub fn is_per_fund(&self) -> bool {
        matches!(
            self,
            FundsignalError::Transport { .. }
                | FundsignalError::Format { .. }
                | FundsignalError::UnknownFund { .. }
                | FundsignalError::InvalidSeries { .. }
        )
    }
}

impl From<&FundsignalError> for std::process::ExitCode {
    fn from(err: &FundsignalError) -> Self {
        let code: u8 = match err {
            FundsignalError::Io(_) => 1,
            FundsignalError::ConfigParse { .. }
            | FundsignalError::ConfigMissing { .. }
            | FundsignalError::ConfigInvalid { .. } => 2,
            FundsignalError::Transport { .. } => 3,
            FundsignalError::Format { .. } | FundsignalError::UnknownFund { .. } => 4,
            FundsignalError::InvalidSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
