use embedded_time::{clock, ConversionError};
use thiserror::Error;

/// A scheduler error caused by clock timing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("clock error: {0:?}")]
    Clock(clock::Error),
    #[error("time conversion error: {0:?}")]
    Time(ConversionError),
}

impl From<clock::Error> for Error {
    fn from(clock_error: clock::Error) -> Self {
        Error::Clock(clock_error)
    }
}

impl From<ConversionError> for Error {
    fn from(time_error: ConversionError) -> Self {
        Error::Time(time_error)
    }
}
