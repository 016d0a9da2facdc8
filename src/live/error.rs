use thiserror::Error;

/// Failures of the live session engine.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Session is not accepting this action in its current state")]
    SessionNotJoinable,
    #[error("Nickname '{0}' is already taken in this session")]
    DuplicateNickname(String),
    #[error("Session is full ({0} players)")]
    SessionFull(i32),
    #[error("Quiz has no questions")]
    EmptyQuiz,
    #[error("Only the host may {0}")]
    UnauthorizedAction(&'static str),
    #[error("Session is not in progress")]
    NotPlaying,
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Conflicting update: {0}")]
    Conflict(String),
    #[error("Database Error")]
    Storage(#[from] sqlx::Error),
}

impl LiveError {
    pub fn not_found(what: impl Into<String>) -> Self {
        LiveError::NotFound(what.into())
    }
}
