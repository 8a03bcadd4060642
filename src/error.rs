use std::error::Error as StdError;

/// Failure to encode synthesized audio into a container.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while serving one synthesis request.
///
/// Engine errors pass through untouched; the service adds no taxonomy of its
/// own on top of them.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError<E: StdError + 'static> {
    #[error(transparent)]
    Synthesis(E),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl<E: StdError + 'static> ServiceError<E> {
    /// The engine error, if this request failed during synthesis.
    pub fn synthesis(&self) -> Option<&E> {
        match self {
            Self::Synthesis(err) => Some(err),
            Self::Encode(_) => None,
        }
    }
}
