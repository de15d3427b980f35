use thiserror::Error;

/// Failures talking to the purchase-order backend.
///
/// `Rejected` carries the backend's `detail` text; its `Display` is that text
/// verbatim, so it can be handed to the notification sink unmodified.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{detail}")]
    Rejected {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("purchase-order backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl BackendError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected { .. })
    }
}
