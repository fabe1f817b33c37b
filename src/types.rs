//! Geometry and raster types shared across the follow pipeline

use serde::{Deserialize, Serialize};

use crate::error::{FollowError, Result};

/// Pixel format of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Bgr,
    Grayscale,
}

impl PixelFormat {
    pub fn channels(&self) -> u32 {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Grayscale => 1,
        }
    }
}

/// A single captured video frame
///
/// Origin top-left, x right, y down. The core never mutates pixel data;
/// it reads dimensions and hands the buffer to the opaque tracker and
/// depth collaborators.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// All-black grayscale frame, handy for synthetic sources
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; width as usize * height as usize],
            width,
            height,
            format: PixelFormat::Grayscale,
        }
    }

    /// Frame center, integer pixel coordinates
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    /// Validate buffer size against dimensions and format
    pub fn validate(&self) -> bool {
        let expected =
            self.width as u64 * self.height as u64 * u64::from(self.format.channels());
        self.width > 0 && self.height > 0 && self.data.len() as u64 == expected
    }
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Reject degenerate or out-of-bounds regions before they reach a tracker
    pub fn validate(&self, frame: &Frame) -> Result<()> {
        // checked addition: coordinates near u32::MAX must not wrap into bounds
        let inside = self.w > 0
            && self.h > 0
            && self
                .x
                .checked_add(self.w)
                .is_some_and(|right| right <= frame.width)
            && self
                .y
                .checked_add(self.h)
                .is_some_and(|bottom| bottom <= frame.height);
        if inside {
            Ok(())
        } else {
            Err(FollowError::InvalidRegion {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
                frame_w: frame.width,
                frame_h: frame.height,
            })
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{}) {}x{}", self.x, self.y, self.w, self.h)
    }
}

/// Pixel centroid of a tracked region
///
/// Integer midpoint, recomputed from the region on every successful update
/// rather than stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position2D {
    pub cx: u32,
    pub cy: u32,
}

/// Centroid augmented with a depth sample
///
/// `z` is in the depth collaborator's native model-relative scale, not a
/// metric unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<nalgebra::Vector3<f32>> for Position3D {
    fn from(v: nalgebra::Vector3<f32>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Position3D> for nalgebra::Vector3<f32> {
    fn from(p: Position3D) -> Self {
        nalgebra::Vector3::new(p.x, p.y, p.z)
    }
}

/// Simulated RC actuator commands, neutral-centered at 1500
///
/// Values are always within `[1000, 2000]`; the clamp is enforced by the
/// command law, never by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPair {
    pub yaw: u16,
    pub pitch: u16,
}
