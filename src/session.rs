//! Session loop driver
//!
//! Sequences one full pipeline cycle per frame: acquire frame, update the
//! tracker, estimate the target position, run the active control law,
//! append to the trail, then check for an external stop or re-acquisition
//! signal. Single-threaded and frame-synchronous; all mutable state lives
//! in the driver and is only read from outside through published
//! snapshots.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::controller::{CommandConfig, CommandLaw, FollowerState, PursuitConfig, PursuitController};
use crate::error::{FollowError, Result};
use crate::estimator::{self, DepthSampler};
use crate::tracker::{TrackerSession, VisualTracker};
use crate::trail::Trail;
use crate::types::{CommandPair, Frame, Position3D, Region};

/// Per-cycle frame provider
pub trait FrameSource {
    /// Next frame, or `None` when the stream has ended
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Human-in-the-loop region supplier
pub trait RegionSelector {
    /// Ask the operator for a region; `None` means no selection was made
    fn select(&mut self, frame: &Frame) -> Option<Region>;
}

/// External control signals, checked once per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// End the session after the current cycle
    Stop,
    /// Prompt the selector for a fresh region and restart tracking on it
    Reacquire,
}

/// Which control law the session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionMode {
    /// 2D proportional yaw/pitch commands
    #[default]
    Command,
    /// Simulated 3D pursuit with depth
    Pursuit,
}

/// What happens to the published command when tracking is lost (mode A)
///
/// The controller itself never extrapolates; this is purely a display
/// policy for the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LossPolicy {
    /// Keep publishing the last computed command
    #[default]
    Hold,
    /// Publish the neutral command, as if the target sat at frame center
    Recenter,
    /// Publish no command at all
    Clear,
}

/// Full session configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: SessionMode,
    pub command: CommandConfig,
    pub pursuit: PursuitConfig,
    pub loss_policy: LossPolicy,
}

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    AwaitingInit,
    Active,
    Lost,
    Terminated,
}

/// Owns the whole per-session state and sequences it once per frame
///
/// There is deliberately no ambient state here: tracker session, control
/// law, trail and latest command all live in this struct and are threaded
/// through the loop explicitly.
pub struct SessionDriver {
    config: SessionConfig,
    session: TrackerSession,
    depth: Option<Box<dyn DepthSampler>>,
    command_law: Option<CommandLaw>,
    pursuit: PursuitController,
    trail: Trail,
    state: DriverState,
    last_command: Option<CommandPair>,
    cycles: u64,
}

impl SessionDriver {
    /// Build a driver around an injected tracker and optional depth sampler
    ///
    /// Pursuit mode requires a depth sampler; command mode ignores it.
    pub fn new(
        config: SessionConfig,
        tracker: Box<dyn VisualTracker>,
        depth: Option<Box<dyn DepthSampler>>,
    ) -> Result<Self> {
        if config.mode == SessionMode::Pursuit && depth.is_none() {
            return Err(FollowError::config(
                "pursuit mode requires a depth sampler",
            ));
        }
        Ok(Self {
            pursuit: PursuitController::new(config.pursuit),
            config,
            session: TrackerSession::new(tracker),
            depth,
            command_law: None,
            trail: Trail::new(),
            state: DriverState::AwaitingInit,
            last_command: None,
            cycles: 0,
        })
    }

    /// Start tracking on an operator-supplied region
    pub fn initialize(&mut self, frame: &Frame, region: Region) -> Result<()> {
        self.session.initialize(frame, region)?;
        self.state = DriverState::Active;
        Ok(())
    }

    /// Restart tracking on a fresh region, from any state
    pub fn reacquire(&mut self, frame: &Frame, region: Region) -> Result<()> {
        self.session.reacquire(frame, region)?;
        self.state = DriverState::Active;
        Ok(())
    }

    /// Run one tracking/control cycle on an already-initialized session
    ///
    /// Returns the region reported this cycle, or `None` when tracking is
    /// lost. Loss is absorbed into driver state, never propagated as an
    /// error.
    pub fn step(&mut self, frame: &Frame) -> Result<Option<Region>> {
        match self.session.update(frame) {
            Ok(region) => {
                self.state = DriverState::Active;
                self.run_controller(frame, region);
                Ok(Some(region))
            }
            Err(FollowError::TrackingLost) => {
                self.state = DriverState::Lost;
                self.apply_loss_policy();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Consume frames until an explicit stop or the source is exhausted
    ///
    /// Per cycle: acquire frame; if awaiting initialization, ask the
    /// selector for a region; otherwise step the pipeline; then poll the
    /// signal channel once. Source exhaustion is fatal and propagates;
    /// whatever the trail holds at that point stands.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        selector: &mut dyn RegionSelector,
        signals: &Receiver<SessionSignal>,
    ) -> Result<()> {
        loop {
            let cycle_start = Instant::now();
            let Some(frame) = source.next_frame() else {
                self.state = DriverState::Terminated;
                log::info!("frame source exhausted after {} cycles", self.cycles);
                return Err(FollowError::FrameSourceExhausted);
            };
            self.cycles += 1;

            match self.state {
                DriverState::AwaitingInit => {
                    if let Some(region) = selector.select(&frame) {
                        if let Err(e) = self.initialize(&frame, region) {
                            log::warn!("initialization rejected: {e}");
                        }
                    }
                }
                DriverState::Active | DriverState::Lost => {
                    self.step(&frame)?;
                }
                DriverState::Terminated => return Ok(()),
            }

            match signals.try_recv() {
                Ok(SessionSignal::Stop) => {
                    self.state = DriverState::Terminated;
                    log::info!("stop requested after {} cycles", self.cycles);
                    return Ok(());
                }
                Ok(SessionSignal::Reacquire) => {
                    if let Some(region) = selector.select(&frame) {
                        if let Err(e) = self.reacquire(&frame, region) {
                            log::warn!("re-acquisition rejected: {e}");
                        }
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }

            let elapsed = cycle_start.elapsed();
            log::debug!(
                "cycle {} took {:?} ({:.1} fps)",
                self.cycles,
                elapsed,
                1.0 / elapsed.as_secs_f64().max(1e-9)
            );
        }
    }

    fn run_controller(&mut self, frame: &Frame, region: Region) {
        let position = estimator::centroid(&region);
        match self.config.mode {
            SessionMode::Command => {
                let config = self.config.command;
                let law = self
                    .command_law
                    .get_or_insert_with(|| CommandLaw::new(config, frame.width, frame.height));
                self.last_command = Some(law.command_for(position));
            }
            SessionMode::Pursuit => {
                // presence checked at construction
                let Some(sampler) = self.depth.as_deref() else {
                    return;
                };
                let object = estimator::with_depth(frame, position, sampler);
                let follower = self.pursuit.step(object);
                self.trail.append(Position3D::from(follower.position));
            }
        }
    }

    fn apply_loss_policy(&mut self) {
        if self.config.mode != SessionMode::Command {
            return; // mode B skips the whole step on loss
        }
        match self.config.loss_policy {
            LossPolicy::Hold => {}
            LossPolicy::Recenter => {
                if let Some(law) = &self.command_law {
                    self.last_command = Some(law.neutral());
                }
            }
            LossPolicy::Clear => self.last_command = None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Lost/active status flag for display
    pub fn is_lost(&self) -> bool {
        self.state == DriverState::Lost
    }

    /// Latest command pair, per the configured loss policy (mode A)
    pub fn last_command(&self) -> Option<CommandPair> {
        self.last_command
    }

    /// Latest follower state (mode B)
    pub fn follower(&self) -> Option<&FollowerState> {
        self.pursuit.follower()
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Last region the tracker reported, in any state
    pub fn last_region(&self) -> Option<Region> {
        self.session.last_region()
    }

    /// Write the session's trail as the terminal CSV artifact
    pub fn export<W: std::io::Write>(&self, writer: W) -> Result<()> {
        self.trail.export(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{QueuedSelector, ScriptedTracker, SyntheticFrames, UniformDepth};
    use std::sync::mpsc::channel;

    fn region_at(x: u32) -> Region {
        Region::new(x, 100, 50, 50)
    }

    fn command_driver(
        script: Vec<Option<Region>>,
        loss_policy: LossPolicy,
    ) -> SessionDriver {
        let config = SessionConfig {
            mode: SessionMode::Command,
            loss_policy,
            ..SessionConfig::default()
        };
        SessionDriver::new(config, Box::new(ScriptedTracker::new(script)), None).unwrap()
    }

    fn pursuit_driver(script: Vec<Option<Region>>) -> SessionDriver {
        let config = SessionConfig {
            mode: SessionMode::Pursuit,
            ..SessionConfig::default()
        };
        SessionDriver::new(
            config,
            Box::new(ScriptedTracker::new(script)),
            Some(Box::new(UniformDepth(1.5))),
        )
        .unwrap()
    }

    #[test]
    fn test_pursuit_mode_requires_depth_sampler() {
        let config = SessionConfig {
            mode: SessionMode::Pursuit,
            ..SessionConfig::default()
        };
        let err = SessionDriver::new(config, Box::new(ScriptedTracker::new(vec![])), None)
            .err()
            .unwrap();
        assert!(matches!(err, FollowError::ConfigError(_)));
    }

    #[test]
    fn test_command_mode_publishes_clamped_commands() {
        let frame = Frame::blank(640, 480);
        let mut driver = command_driver(vec![Some(region_at(100))], LossPolicy::Hold);
        driver.initialize(&frame, region_at(100)).unwrap();

        let region = driver.step(&frame).unwrap();
        assert_eq!(region, Some(region_at(100)));
        let cmd = driver.last_command().unwrap();
        assert_eq!(cmd.yaw, 1441);
        assert_eq!(cmd.pitch, 1534);
    }

    #[test]
    fn test_loss_policy_hold_keeps_last_command() {
        let frame = Frame::blank(640, 480);
        let mut driver = command_driver(vec![Some(region_at(100)), None], LossPolicy::Hold);
        driver.initialize(&frame, region_at(100)).unwrap();

        driver.step(&frame).unwrap();
        let held = driver.last_command().unwrap();
        assert_eq!(driver.step(&frame).unwrap(), None);
        assert!(driver.is_lost());
        assert_eq!(driver.last_command(), Some(held));
    }

    #[test]
    fn test_loss_policy_recenter_goes_neutral() {
        let frame = Frame::blank(640, 480);
        let mut driver = command_driver(vec![Some(region_at(100)), None], LossPolicy::Recenter);
        driver.initialize(&frame, region_at(100)).unwrap();

        driver.step(&frame).unwrap();
        driver.step(&frame).unwrap();
        let cmd = driver.last_command().unwrap();
        assert_eq!(cmd.yaw, 1500);
        assert_eq!(cmd.pitch, 1500);
    }

    #[test]
    fn test_loss_policy_clear_drops_command() {
        let frame = Frame::blank(640, 480);
        let mut driver = command_driver(vec![Some(region_at(100)), None], LossPolicy::Clear);
        driver.initialize(&frame, region_at(100)).unwrap();

        driver.step(&frame).unwrap();
        driver.step(&frame).unwrap();
        assert_eq!(driver.last_command(), None);
    }

    #[test]
    fn test_pursuit_trail_grows_only_on_tracked_frames() {
        let frame = Frame::blank(640, 480);
        let script = vec![
            Some(region_at(100)),
            Some(region_at(110)),
            None,
            Some(region_at(130)),
        ];
        let mut driver = pursuit_driver(script);
        driver.initialize(&frame, region_at(100)).unwrap();

        driver.step(&frame).unwrap();
        driver.step(&frame).unwrap();
        assert_eq!(driver.trail().len(), 2);

        // lost frame: no trail entry, follower frozen, velocity stale
        let frozen = driver.follower().unwrap().position;
        let stale = driver.follower().unwrap().velocity;
        assert_eq!(driver.step(&frame).unwrap(), None);
        assert_eq!(driver.trail().len(), 2);
        assert_eq!(driver.follower().unwrap().position, frozen);
        assert_eq!(driver.follower().unwrap().velocity, stale);

        // re-acquisition resumes appending
        driver.reacquire(&frame, region_at(130)).unwrap();
        driver.step(&frame).unwrap();
        assert_eq!(driver.trail().len(), 3);
    }

    #[test]
    fn test_loss_then_reacquire_restores_active() {
        let frame = Frame::blank(640, 480);
        let mut driver = command_driver(
            vec![Some(region_at(100)), None, Some(region_at(205))],
            LossPolicy::Hold,
        );
        driver.initialize(&frame, region_at(100)).unwrap();

        driver.step(&frame).unwrap();
        driver.step(&frame).unwrap();
        assert_eq!(driver.state(), DriverState::Lost);

        driver.reacquire(&frame, region_at(200)).unwrap();
        assert_eq!(driver.state(), DriverState::Active);
        assert_eq!(driver.step(&frame).unwrap(), Some(region_at(205)));
    }

    #[test]
    fn test_run_initializes_then_terminates_on_exhaustion() {
        // frame 1 initializes via the selector; frames 2..=6 track
        let mut source = SyntheticFrames::new(640, 480, 6);
        let mut selector = QueuedSelector::new(vec![region_at(100)]);
        let script = (0u32..5).map(|i| Some(region_at(100 + i * 10))).collect();
        let mut driver = pursuit_driver(script);
        let (_tx, rx) = channel();

        let err = driver.run(&mut source, &mut selector, &rx).unwrap_err();
        assert!(matches!(err, FollowError::FrameSourceExhausted));
        assert_eq!(driver.state(), DriverState::Terminated);
        // everything appended before exhaustion is preserved
        assert_eq!(driver.trail().len(), 5);
    }

    #[test]
    fn test_run_stops_on_signal() {
        let mut source = SyntheticFrames::new(640, 480, 1000);
        let mut selector = QueuedSelector::new(vec![region_at(100)]);
        let mut driver = command_driver(vec![Some(region_at(100)); 100], LossPolicy::Hold);
        let (tx, rx) = channel();
        tx.send(SessionSignal::Stop).unwrap();

        driver.run(&mut source, &mut selector, &rx).unwrap();
        assert_eq!(driver.state(), DriverState::Terminated);
    }

    #[test]
    fn test_run_reacquires_on_signal() {
        // the queued signal is polled at the end of the first cycle and
        // re-acquires on the second queued region
        let mut source = SyntheticFrames::new(640, 480, 4);
        let mut selector = QueuedSelector::new(vec![region_at(100), region_at(200)]);
        let script = vec![
            Some(region_at(205)),
            Some(region_at(210)),
            Some(region_at(215)),
        ];
        let mut driver = command_driver(script, LossPolicy::Hold);
        let (tx, rx) = channel();
        tx.send(SessionSignal::Reacquire).unwrap();
        drop(tx);

        let err = driver.run(&mut source, &mut selector, &rx).unwrap_err();
        assert!(matches!(err, FollowError::FrameSourceExhausted));
        // both queued selections were consumed
        assert!(selector.select(&Frame::blank(640, 480)).is_none());
        assert_eq!(driver.last_region(), Some(region_at(215)));
    }
}
