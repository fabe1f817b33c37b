//! Scripted collaborators for tests and the simulator binary
//!
//! Stand-ins for the real camera, tracker and depth network: a tracker
//! that replays a per-frame script of results, a constant-value depth
//! sampler, a blank-frame source and a queued region selector. They
//! exercise the full session loop without any video or model dependency.

use std::collections::VecDeque;

use crate::estimator::DepthSampler;
use crate::session::{FrameSource, RegionSelector};
use crate::tracker::VisualTracker;
use crate::types::{Frame, Region};

/// Tracker that replays a pre-built script of per-update results
///
/// Each `update` pops the next entry: `Some(region)` is a successful track,
/// `None` a failure. An exhausted script keeps reporting failure.
pub struct ScriptedTracker {
    script: VecDeque<Option<Region>>,
    bound: Option<Region>,
}

impl ScriptedTracker {
    pub fn new(script: Vec<Option<Region>>) -> Self {
        Self {
            script: script.into(),
            bound: None,
        }
    }
}

impl VisualTracker for ScriptedTracker {
    fn init(&mut self, _frame: &Frame, region: Region) {
        self.bound = Some(region);
    }

    fn update(&mut self, _frame: &Frame) -> Option<Region> {
        let result = self.script.pop_front().flatten();
        if let Some(region) = result {
            self.bound = Some(region);
        }
        result
    }

    fn name(&self) -> &str {
        "scripted-tracker"
    }
}

/// Depth sampler returning the same value everywhere
pub struct UniformDepth(pub f32);

impl DepthSampler for UniformDepth {
    fn sample(&self, _frame: &Frame, _x: u32, _y: u32) -> f32 {
        self.0
    }
}

/// Depth sampler with a horizontal near-to-far ramp across the frame
pub struct RampDepth {
    pub near: f32,
    pub far: f32,
}

impl DepthSampler for RampDepth {
    fn sample(&self, frame: &Frame, x: u32, _y: u32) -> f32 {
        let span = (frame.width.saturating_sub(1)).max(1) as f32;
        self.near + (self.far - self.near) * (x as f32 / span)
    }
}

/// Frame source producing a fixed number of blank frames
pub struct SyntheticFrames {
    width: u32,
    height: u32,
    remaining: u32,
}

impl SyntheticFrames {
    pub fn new(width: u32, height: u32, count: u32) -> Self {
        Self {
            width,
            height,
            remaining: count,
        }
    }
}

impl FrameSource for SyntheticFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Frame::blank(self.width, self.height))
    }
}

/// Region selector replaying a queue of operator choices
///
/// An empty queue means the operator declined to select.
pub struct QueuedSelector {
    regions: VecDeque<Region>,
}

impl QueuedSelector {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions: regions.into(),
        }
    }
}

impl RegionSelector for QueuedSelector {
    fn select(&mut self, _frame: &Frame) -> Option<Region> {
        self.regions.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_tracker_replays_script() {
        let frame = Frame::blank(64, 64);
        let r = Region::new(10, 10, 8, 8);
        let mut tracker = ScriptedTracker::new(vec![Some(r), None]);
        tracker.init(&frame, r);
        assert_eq!(tracker.update(&frame), Some(r));
        assert_eq!(tracker.update(&frame), None);
        // exhausted script stays failed
        assert_eq!(tracker.update(&frame), None);
    }

    #[test]
    fn test_synthetic_frames_exhaust() {
        let mut source = SyntheticFrames::new(32, 32, 2);
        assert!(source.next_frame().is_some());
        assert!(source.next_frame().is_some());
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_ramp_depth_spans_frame() {
        let frame = Frame::blank(101, 10);
        let ramp = RampDepth {
            near: 1.0,
            far: 2.0,
        };
        assert_eq!(ramp.sample(&frame, 0, 5), 1.0);
        assert_eq!(ramp.sample(&frame, 100, 5), 2.0);
    }
}
