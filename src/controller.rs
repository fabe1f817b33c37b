//! Feedback control laws
//!
//! Two independent laws, one active per session mode:
//!
//! - Mode A maps the pixel offset between the target centroid and the frame
//!   center into clamped RC-style yaw/pitch commands. Stateless across
//!   frames apart from the fixed gains and neutral constants.
//! - Mode B maintains a simulated follower that pursues a desired offset
//!   from the 3D target with a first-order proportional step, plus a
//!   finite-difference velocity estimate. For `0 < follow_gain < 1` the
//!   error decays exponentially: the follower never overshoots and never
//!   reaches the target in finitely many steps.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::types::{CommandPair, Position2D, Position3D};

/// Neutral RC value (stick centered)
pub const RC_NEUTRAL: f32 = 1500.0;
/// Lower RC clamp bound
pub const RC_MIN: u16 = 1000;
/// Upper RC clamp bound
pub const RC_MAX: u16 = 2000;

/// Configuration for the 2D proportional command law
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Horizontal gain, pixels of offset to RC units (yaw)
    pub gain_x: f32,
    /// Vertical gain, pixels of offset to RC units (pitch)
    pub gain_y: f32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            gain_x: 0.3,
            gain_y: 0.3,
        }
    }
}

/// 2D proportional command law bound to a frame geometry
#[derive(Debug, Clone)]
pub struct CommandLaw {
    config: CommandConfig,
    center_x: i64,
    center_y: i64,
}

impl CommandLaw {
    pub fn new(config: CommandConfig, frame_width: u32, frame_height: u32) -> Self {
        Self {
            config,
            center_x: i64::from(frame_width / 2),
            center_y: i64::from(frame_height / 2),
        }
    }

    /// Map a target centroid to clamped yaw/pitch commands
    ///
    /// Positive x offset (target right of center) raises yaw; positive y
    /// offset (target below center) lowers pitch; the sign is inverted
    /// relative to the pixel y axis.
    pub fn command_for(&self, position: Position2D) -> CommandPair {
        let offset_x = i64::from(position.cx) - self.center_x;
        let offset_y = i64::from(position.cy) - self.center_y;

        let yaw = RC_NEUTRAL + offset_x as f32 * self.config.gain_x;
        let pitch = RC_NEUTRAL - offset_y as f32 * self.config.gain_y;

        CommandPair {
            yaw: clamp_rc(yaw),
            pitch: clamp_rc(pitch),
        }
    }

    /// Stick-centered command, used by the recenter-on-loss policy
    pub fn neutral(&self) -> CommandPair {
        CommandPair {
            yaw: RC_NEUTRAL as u16,
            pitch: RC_NEUTRAL as u16,
        }
    }
}

fn clamp_rc(value: f32) -> u16 {
    (value as i32).clamp(i32::from(RC_MIN), i32::from(RC_MAX)) as u16
}

/// Configuration for the 3D pursuit law
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PursuitConfig {
    /// Desired follower offset from the target in the image plane, pixels
    pub desired_offset_xy: [f32; 2],
    /// Desired follower offset in depth units
    pub desired_offset_z: f32,
    /// Proportional correction per step, must be in (0, 1) to converge
    pub follow_gain: f32,
    /// Steps per second, scales the finite-difference velocity estimate
    pub update_rate: f32,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            desired_offset_xy: [-100.0, 0.0],
            desired_offset_z: 0.2,
            follow_gain: 0.1,
            update_rate: 10.0,
        }
    }
}

/// The simulated pursuing agent
#[derive(Debug, Clone, Copy)]
pub struct FollowerState {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub last_position: Option<Vector3<f32>>,
}

/// 3D pursuit law, stepped once per frame while tracking is active
///
/// Owns the follower state exclusively; on a lost frame the caller skips
/// the step entirely, so the position freezes and the velocity estimate
/// goes stale rather than being zeroed.
#[derive(Debug, Clone)]
pub struct PursuitController {
    config: PursuitConfig,
    follower: Option<FollowerState>,
}

impl PursuitController {
    pub fn new(config: PursuitConfig) -> Self {
        Self {
            config,
            follower: None,
        }
    }

    /// Setpoint for a given object position: target plus the desired offset
    pub fn setpoint(&self, object: Position3D) -> Vector3<f32> {
        Vector3::new(
            object.x + self.config.desired_offset_xy[0],
            object.y + self.config.desired_offset_xy[1],
            object.z + self.config.desired_offset_z,
        )
    }

    /// Advance the follower one step toward the setpoint
    ///
    /// The first step bootstraps the follower directly onto the setpoint
    /// (no offset error). Velocity is derived from the displacement applied
    /// this step: the pre-step position is snapshotted into
    /// `last_position` before the correction mutates `position`.
    pub fn step(&mut self, object: Position3D) -> FollowerState {
        let target = self.setpoint(object);
        let gain = self.config.follow_gain;
        let rate = self.config.update_rate;

        let follower = self.follower.get_or_insert_with(|| FollowerState {
            position: target,
            velocity: Vector3::zeros(),
            last_position: None,
        });

        let error = target - follower.position;
        let prev = follower.position;
        follower.last_position = Some(prev);
        follower.position += error * gain;
        follower.velocity = (follower.position - prev) * rate;

        log::debug!(
            "pursuit step: error |e|={:.3}, position=({:.2},{:.2},{:.3})",
            error.norm(),
            follower.position.x,
            follower.position.y,
            follower.position.z
        );

        *follower
    }

    /// Latest follower state, if the law has been stepped at least once
    pub fn follower(&self) -> Option<&FollowerState> {
        self.follower.as_ref()
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }
}
