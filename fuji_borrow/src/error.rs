/// Error type for the whole crate.
///
/// Errors coming from external calls are mapped to one of these kinds where the call happens,
/// keeping the original message.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// Bad caller input: amount, ratio or oracle list
    #[error("Invalid borrow request: {0}")]
    Validation(String),

    #[error("Contract service unavailable: {0}")]
    ServiceUnavailable(String),

    /// No price attestation could be obtained
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// No coins, not enough coins, or negative change
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Selected coin at input {idx} has no range proof")]
    MissingRangeProof { idx: usize },

    /// The contract service rejected the proposal or returned an unacceptable transaction
    #[error("Remote proposal error: {0}")]
    RemoteProposal(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Finalization error: {0}")]
    Finalization(String),

    /// Underlying RPC or HTTP failure
    #[error("{0}")]
    Transport(String),

    /// A call succeeded but returned something we cannot make sense of
    #[error("Unexpected return value: {0}")]
    UnexpectedReturn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Method not implemented yet: {0}")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Amount(#[from] fuji_common::amount::Error),
}

impl Error {
    /// Maps any error of a proposal call to [`Error::RemoteProposal`], keeping the message
    pub(crate) fn into_remote_proposal(self) -> Error {
        match self {
            Error::RemoteProposal(m) | Error::Transport(m) | Error::UnexpectedReturn(m) => {
                Error::RemoteProposal(m)
            }
            e => Error::RemoteProposal(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
