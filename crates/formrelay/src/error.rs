//! Error types for formrelay.
//!
//! This module defines all error types used throughout the formrelay crate,
//! grouped by the component that raises them.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::decoder::FormError;

/// The main error type for formrelay operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Transport Errors ===
    /// Failed to bind a listening or sending socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that couldn't be bound.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to hand a payload to the decoder.
    #[error("failed to send datagram to {addr}: {source}")]
    Send {
        /// Destination of the datagram.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to receive a datagram.
    #[error("failed to receive datagram: {0}")]
    Receive(#[source] std::io::Error),

    /// The in-process channel has no receiver left.
    #[error("relay channel closed")]
    ChannelClosed,

    /// The in-process queue was full and the payload was dropped.
    #[error("relay queue full, dropped {dropped}-byte payload")]
    QueueFull {
        /// Length of the dropped payload.
        dropped: usize,
    },

    // === Parse Errors ===
    /// A datagram could not be decoded into a record.
    #[error("failed to decode payload: {0}")]
    Decode(#[from] FormError),

    // === Persistence Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the store document.
    #[error("failed to write store document {path}: {source}")]
    StoreWrite {
        /// Path of the document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for formrelay operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
