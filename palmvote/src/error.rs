use thiserror::Error;
use uuid::Uuid;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("palmvote: invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("palmvote: template key must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("palmvote: sealed template too short")]
    SealedTooShort,

    #[error("palmvote: failed to open sealed template")]
    OpenFailed,

    #[error("palmvote: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("palmvote: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Domain rule violations raised by the registry
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Election title required")]
    TitleRequired,

    #[error("Voter not found")]
    VoterNotFound,

    #[error("Election not found")]
    ElectionNotFound,

    #[error("Candidate not found")]
    CandidateNotFound,

    #[error("Candidate {0} is not standing in election {1}")]
    CandidateNotInElection(Uuid, Uuid),

    #[error("Election {0} is not active")]
    ElectionNotActive(Uuid),

    #[error("Vote failed (already voted)")]
    AlreadyVoted,

    #[error("Ballot not found")]
    BallotNotFound,

    #[error("VVPAT not generated yet")]
    VvpatNotGenerated,

    #[error("Invalid template: {0}")]
    InvalidTemplate(Error),

    #[error("Failed to write VVPAT: {0}")]
    ReceiptFailed(Error),
}

impl ValidationError {
    /// HTTP status the daemon answers with
    pub fn status(&self) -> u16 {
        match self {
            ValidationError::InvalidCredentials => 401,
            ValidationError::VoterNotFound | ValidationError::BallotNotFound => 404,
            ValidationError::ReceiptFailed(_) => 500,
            _ => 400,
        }
    }
}

/// Client-side failure of a backend or capture-service call.
///
/// The display text is what a screen puts in its error banner, so HTTP
/// failures render as the bare backend message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Capture(String),
}

impl ApiError {
    /// HTTP status, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A router event that is not valid in the current screen
#[derive(Debug, Clone, PartialEq, Error)]
#[error("palmvote: cannot apply {event} on screen {from}")]
pub struct TransitionError {
    pub from: String,
    pub event: String,
}
