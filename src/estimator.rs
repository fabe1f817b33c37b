//! Target position estimation
//!
//! Derives a 2D pixel centroid from a tracked region and, when a depth
//! collaborator is present, augments it to 3D by sampling the depth map at
//! the centroid. Depth is advisory, never safety-critical: samples that
//! would fall outside the frame after rounding are clamped into range
//! instead of failing.

use crate::types::{Frame, Position2D, Position3D, Region};

/// Common interface for monocular depth estimators
///
/// `sample` must be defined over the full frame extent; accuracy is
/// best-effort and the returned scalar is in the model's native relative
/// scale.
pub trait DepthSampler: Send {
    fn sample(&self, frame: &Frame, x: u32, y: u32) -> f32;
}

/// Integer-midpoint centroid of a region
pub fn centroid(region: &Region) -> Position2D {
    Position2D {
        cx: region.x + region.w / 2,
        cy: region.y + region.h / 2,
    }
}

/// Augment a 2D centroid with a depth sample at its pixel position
///
/// Sample coordinates are clamped to the frame bounds, so a centroid on the
/// last row or column still yields a usable depth.
pub fn with_depth(frame: &Frame, position: Position2D, sampler: &dyn DepthSampler) -> Position3D {
    let sx = position.cx.min(frame.width.saturating_sub(1));
    let sy = position.cy.min(frame.height.saturating_sub(1));
    let z = sampler.sample(frame, sx, sy);
    Position3D {
        x: position.cx as f32,
        y: position.cy as f32,
        z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::UniformDepth;
    use std::sync::Mutex;

    /// Records the coordinates it was asked to sample
    struct RecordingSampler {
        calls: Mutex<Vec<(u32, u32)>>,
    }

    impl RecordingSampler {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl DepthSampler for RecordingSampler {
        fn sample(&self, _frame: &Frame, x: u32, y: u32) -> f32 {
            self.calls.lock().unwrap().push((x, y));
            7.5
        }
    }

    #[test]
    fn test_centroid_midpoint() {
        let pos = centroid(&Region::new(100, 100, 50, 50));
        assert_eq!(pos, Position2D { cx: 125, cy: 125 });

        // odd extents floor like the integer division they come from
        let pos = centroid(&Region::new(10, 20, 5, 7));
        assert_eq!(pos, Position2D { cx: 12, cy: 23 });
    }

    #[test]
    fn test_centroid_strictly_inside_region() {
        for (x, y, w, h) in [(0, 0, 1, 1), (600, 400, 39, 79), (5, 5, 2, 2)] {
            let region = Region::new(x, y, w, h);
            let pos = centroid(&region);
            assert!(pos.cx >= x && pos.cx < x + w);
            assert!(pos.cy >= y && pos.cy < y + h);
        }
    }

    #[test]
    fn test_with_depth_samples_at_centroid() {
        let frame = Frame::blank(640, 480);
        let sampler = RecordingSampler::new();
        let pos3 = with_depth(&frame, Position2D { cx: 125, cy: 125 }, &sampler);
        assert_eq!(sampler.calls.lock().unwrap().as_slice(), &[(125, 125)]);
        assert_eq!(pos3.x, 125.0);
        assert_eq!(pos3.y, 125.0);
        assert_eq!(pos3.z, 7.5);
    }

    #[test]
    fn test_with_depth_clamps_edge_coordinates() {
        let frame = Frame::blank(640, 480);
        let sampler = RecordingSampler::new();
        // centroid on the frame boundary after rounding
        let pos3 = with_depth(&frame, Position2D { cx: 640, cy: 480 }, &sampler);
        assert_eq!(sampler.calls.lock().unwrap().as_slice(), &[(639, 479)]);
        // reported position keeps the unclamped centroid
        assert_eq!(pos3.x, 640.0);
        assert_eq!(pos3.y, 480.0);
    }

    #[test]
    fn test_uniform_depth_stub() {
        let frame = Frame::blank(64, 64);
        let pos3 = with_depth(&frame, Position2D { cx: 32, cy: 32 }, &UniformDepth(0.42));
        assert_eq!(pos3.z, 0.42);
    }
}
