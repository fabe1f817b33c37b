//! Visual Target-Following Core
//!
//! Per-frame feedback pipeline for a camera-equipped vehicle: an opaque
//! visual tracker reports a target region, the target position (2D pixel
//! centroid, optionally fused with a monocular depth sample) is converted
//! into bounded RC-style yaw/pitch commands or a simulated 3D pursuit
//! trajectory, and a session driver sequences the whole loop including
//! loss handling and operator-triggered re-acquisition.
//!
//! The tracker, depth estimator, frame source and region selector are
//! external collaborators behind narrow traits; this crate owns only the
//! recurring per-frame state and the control laws.

pub mod controller;
pub mod error;
pub mod estimator;
pub mod session;
pub mod stub;
pub mod tracker;
pub mod trail;
pub mod types;

pub use controller::{
    CommandConfig, CommandLaw, FollowerState, PursuitConfig, PursuitController,
};
pub use error::{FollowError, Result};
pub use estimator::{centroid, with_depth, DepthSampler};
pub use session::{
    DriverState, FrameSource, LossPolicy, RegionSelector, SessionConfig, SessionDriver,
    SessionMode, SessionSignal,
};
pub use tracker::{TrackerSession, TrackerState, VisualTracker};
pub use trail::Trail;
pub use types::{CommandPair, Frame, PixelFormat, Position2D, Position3D, Region};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
