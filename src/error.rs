//! Error types for voxcall.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxcallError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Serial / modem errors
    #[error("Failed to open serial port {port}: {message}")]
    SerialOpen { port: String, message: String },

    #[error("Modem did not answer liveness probe on {port}")]
    ModemUnresponsive { port: String },

    #[error("Modem channel error: {message}")]
    Modem { message: String },

    // Audio routing errors
    #[error("Audio routing failed: {message}")]
    AudioRouting { message: String },

    // Contact persistence errors
    #[error("Failed to store contact {name}: {message}")]
    ContactStore { name: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxcallError>;
