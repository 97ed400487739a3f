use std::error::Error as StdError;
use std::fmt::{self, Display};

use orchestrations_model::{ErrorKind, ModelProviderError};

use crate::checkpoint::CheckpointError;

/// Errors that end a run or a chat turn.
#[derive(Debug)]
pub enum Error {
    /// The model provider failed.
    Model(Box<dyn ModelProviderError>),
    /// The model answered with something that is not a chat message.
    UnexpectedResponse(String),
    /// The control loop ran out of steps before the model gave an answer.
    StepLimitExceeded {
        /// The number of steps that were allowed.
        limit: usize,
    },
    /// Saving or loading a thread failed.
    Checkpoint(CheckpointError),
}

impl Error {
    /// Returns the provider error kind, if the model failed.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Model(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Model(err) => write!(f, "model request failed: {err}"),
            Error::UnexpectedResponse(what) => {
                write!(f, "unexpected model response: {what}")
            }
            Error::StepLimitExceeded { limit } => write!(
                f,
                "exceeded step limit of {limit} without reaching an answer"
            ),
            Error::Checkpoint(err) => write!(f, "checkpoint failed: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Model(err) => Some(err.as_ref()),
            Error::Checkpoint(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CheckpointError> for Error {
    #[inline]
    fn from(err: CheckpointError) -> Self {
        Error::Checkpoint(err)
    }
}
