//! Synthetic pursuit simulation
//!
//! Drives the full session loop against scripted collaborators: a target
//! drifting across a 640x480 frame, a scripted tracker following it and a
//! ramp depth field. Writes the follower trail to `pursuit_trail.csv`.
//!
//! Usage:
//!   cargo run --bin simulate [-- --frames N] [-- --config session.json]

use std::fs::File;
use std::sync::mpsc::channel;

use anyhow::Context;
use rand::Rng;

use drone_pursuit::stub::{QueuedSelector, RampDepth, ScriptedTracker, SyntheticFrames};
use drone_pursuit::{FollowError, Region, SessionConfig, SessionDriver, SessionMode};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = SessionConfig {
        mode: SessionMode::Pursuit,
        ..SessionConfig::default()
    };
    let mut frames: u32 = 300;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                let file = File::open(&path).with_context(|| format!("failed to open {path}"))?;
                config = serde_json::from_reader(file)
                    .with_context(|| format!("failed to parse {path}"))?;
            }
            "--frames" => {
                frames = args
                    .next()
                    .context("--frames requires a count")?
                    .parse()
                    .context("--frames must be an integer")?;
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let (width, height) = (640u32, 480u32);
    let mut rng = rand::thread_rng();

    // target drifts left to right with a little pixel jitter
    let script: Vec<Option<Region>> = (0..frames)
        .map(|i| {
            let x = 60 + i as i64 * 500 / i64::from(frames.max(1)) + rng.gen_range(-2i64..=2);
            let y = 200 + rng.gen_range(-2i64..=2);
            Some(Region::new(
                x.clamp(0, i64::from(width - 50)) as u32,
                y.clamp(0, i64::from(height - 50)) as u32,
                50,
                50,
            ))
        })
        .collect();
    let initial = script
        .first()
        .copied()
        .flatten()
        .context("empty target script")?;

    log::info!(
        "simulating {} frames in {:?} mode (drone-pursuit {})",
        frames,
        config.mode,
        drone_pursuit::version()
    );

    let mut driver = SessionDriver::new(
        config,
        Box::new(ScriptedTracker::new(script)),
        Some(Box::new(RampDepth {
            near: 0.5,
            far: 3.0,
        })),
    )?;

    // one extra frame for the initial selection cycle
    let mut source = SyntheticFrames::new(width, height, frames + 1);
    let mut selector = QueuedSelector::new(vec![initial]);
    let (_tx, rx) = channel();

    if let Err(e) = driver.run(&mut source, &mut selector, &rx) {
        // running the synthetic stream dry is the expected way to end
        if !matches!(e, FollowError::FrameSourceExhausted) {
            return Err(e.into());
        }
    }

    let out = "pursuit_trail.csv";
    driver.export(File::create(out)?)?;
    log::info!("wrote {} trail entries to {}", driver.trail().len(), out);

    if let Some(follower) = driver.follower() {
        log::info!(
            "final follower position ({:.2}, {:.2}, {:.3}), velocity |v|={:.2}",
            follower.position.x,
            follower.position.y,
            follower.position.z,
            follower.velocity.norm()
        );
    }

    Ok(())
}
