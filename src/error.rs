//! Error types for the target-following core

use thiserror::Error;

/// Result type alias for the target-following core
pub type Result<T> = std::result::Result<T, FollowError>;

/// Errors that can occur while driving a follow session
///
/// `TrackingLost` is an expected, recoverable signal rather than a fault:
/// the session transitions to a lost state and waits for an explicit
/// re-acquisition. Only `FrameSourceExhausted` is fatal for a session.
#[derive(Error, Debug)]
pub enum FollowError {
    #[error("invalid region {x},{y} {w}x{h} for {frame_w}x{frame_h} frame")]
    InvalidRegion {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        frame_w: u32,
        frame_h: u32,
    },

    #[error("tracking lost")]
    TrackingLost,

    #[error("frame source exhausted")]
    FrameSourceExhausted,

    #[error("tracker session not initialized")]
    NotInitialized,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl FollowError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// True for the per-frame lost signal, which callers must not treat as fatal
    pub fn is_tracking_lost(&self) -> bool {
        matches!(self, Self::TrackingLost)
    }
}
