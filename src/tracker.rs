//! Tracker session lifecycle
//!
//! The visual tracking algorithm itself is an external collaborator behind
//! the `VisualTracker` trait; this module owns only the lifecycle of one
//! tracker instance: initialize on an operator-chosen region, update per
//! frame, flip to `Lost` on failure, and re-acquire on demand.

use crate::error::{FollowError, Result};
use crate::types::{Frame, Region};

/// Common interface for single-object visual trackers
///
/// Implementations bind an appearance model on `init` and report a new
/// region (or failure) on every `update`. The exact algorithm is
/// unspecified; the session only requires this contract.
pub trait VisualTracker: Send {
    /// Bind the tracker's appearance model to `region` in `frame`
    fn init(&mut self, frame: &Frame, region: Region);

    /// Track the bound object into `frame`; `None` means tracking failed
    fn update(&mut self, frame: &Frame) -> Option<Region>;

    /// Tracker name (for logging/debugging)
    fn name(&self) -> &str;
}

/// Lifecycle state of a tracker session
///
/// `Lost` retains the last successfully reported region for display and
/// fallback; the only way back to `Active` is an explicit re-acquisition
/// with a fresh region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Active { region: Region },
    Lost { last: Region },
}

/// Owns one visual tracker instance and its lifecycle across frames
pub struct TrackerSession {
    tracker: Box<dyn VisualTracker>,
    state: Option<TrackerState>,
}

impl TrackerSession {
    pub fn new(tracker: Box<dyn VisualTracker>) -> Self {
        Self {
            tracker,
            state: None,
        }
    }

    /// Bind the tracker to `region`, rejecting degenerate or out-of-bounds input
    pub fn initialize(&mut self, frame: &Frame, region: Region) -> Result<()> {
        region.validate(frame)?;
        self.tracker.init(frame, region);
        self.state = Some(TrackerState::Active { region });
        log::info!("{} initialized on region {}", self.tracker.name(), region);
        Ok(())
    }

    /// Advance the tracker by one frame
    ///
    /// A single failed update flips the session to `Lost` immediately;
    /// there is no implicit retry. While lost, every call keeps returning
    /// `TrackingLost` until `reacquire` succeeds.
    pub fn update(&mut self, frame: &Frame) -> Result<Region> {
        match self.state {
            Some(TrackerState::Active { region }) => match self.tracker.update(frame) {
                Some(new_region) => {
                    self.state = Some(TrackerState::Active { region: new_region });
                    Ok(new_region)
                }
                None => {
                    log::warn!("{} lost target near {}", self.tracker.name(), region);
                    self.state = Some(TrackerState::Lost { last: region });
                    Err(FollowError::TrackingLost)
                }
            },
            Some(TrackerState::Lost { .. }) => Err(FollowError::TrackingLost),
            None => Err(FollowError::NotInitialized),
        }
    }

    /// Discard the current appearance model and start over on a fresh region
    ///
    /// Allowed from any state; this is the only transition out of `Lost`.
    pub fn reacquire(&mut self, frame: &Frame, region: Region) -> Result<()> {
        region.validate(frame)?;
        self.tracker.init(frame, region);
        self.state = Some(TrackerState::Active { region });
        log::info!("{} re-acquired on region {}", self.tracker.name(), region);
        Ok(())
    }

    pub fn state(&self) -> Option<&TrackerState> {
        self.state.as_ref()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, Some(TrackerState::Active { .. }))
    }

    /// Last successfully reported region, in either state
    pub fn last_region(&self) -> Option<Region> {
        match self.state {
            Some(TrackerState::Active { region }) => Some(region),
            Some(TrackerState::Lost { last }) => Some(last),
            None => None,
        }
    }
}
