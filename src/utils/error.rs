use thiserror::Error;

/// Failures reported by a [`DataProvider`](crate::core::DataProvider).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Block {key} not found")]
    NotFound { key: u64 },

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::Network(_) => "network",
        }
    }
}

impl From<web3::Error> for ProviderError {
    fn from(err: web3::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Terminal error: {0}")]
    TerminalError(#[from] std::io::Error),
}
