use std::{error::Error, fmt::Display};

/// Everything the terminal UI helpers can fail with.
#[derive(Debug)]
pub enum PinpointGuiError {
    /// Terminal setup, drawing, or input polling failed.
    IoError(std::io::Error),
}

impl Display for PinpointGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinpointGuiError::IoError(error) => write!(f, "terminal io error: {}", error),
        }
    }
}

impl Error for PinpointGuiError {}

impl From<std::io::Error> for PinpointGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}
