use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Not connected to execution engine")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // Frame errors
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // Value errors
    #[error("Duty cycle out of range (0-100): {0}")]
    InvalidDutyCycle(f64),

    #[error("Frequency must be positive and finite: {0}")]
    InvalidFrequency(f64),

    // Session errors
    #[error("Session closed")]
    SessionClosed,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
