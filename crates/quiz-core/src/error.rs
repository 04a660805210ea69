use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Malformed session token: {0}")]
    MalformedSession(String),

    #[error("Guess must be a positive number")]
    InvalidGuess,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

pub type QuizResult<T> = Result<T, QuizError>;
