//! Follower position history
//!
//! Append-only, time-ordered buffer of follower positions, one entry per
//! frame where the pursuit law ran. Growth is unbounded for the lifetime of
//! a session; no eviction policy is applied. Readers only ever see
//! immutable snapshots.

use std::io::Write;

use crate::error::Result;
use crate::types::Position3D;

/// Ordered history of follower positions
#[derive(Debug, Clone, Default)]
pub struct Trail {
    points: Vec<Position3D>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one position; entries are never removed within a session
    pub fn append(&mut self, position: Position3D) {
        self.points.push(position);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Read-only view over the history in append order
    pub fn snapshot(&self) -> &[Position3D] {
        &self.points
    }

    /// Write the full history as CSV
    ///
    /// Header `x,y,z`, one row per entry, `x`/`y` at 2 decimal places and
    /// `z` at 3 (depth is a finer-grained unit than the pixel axes).
    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["x", "y", "z"])?;
        for p in &self.points {
            wtr.write_record(&[
                format!("{:.2}", p.x),
                format!("{:.2}", p.y),
                format!("{:.3}", p.z),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
