//! Body-height reconciliation.
//!
//! The command source may raise or lower the body while a gait runs. Between phases the
//! gaits ask the [`BodyHeightTracker`] whether the height changed since it last looked, and
//! if so every lift servo is brought to the new height in one move.
use log::info;

use super::motion::{Actuator, CommandSource, Motion, PhaseOutcome};

#[derive(Debug, Default)]
pub struct BodyHeightTracker {
    remembered: Option<u8>,
}

impl BodyHeightTracker {
    pub fn new() -> Self {
        Self { remembered: None }
    }

    pub fn remembered(&self) -> Option<u8> {
        self.remembered
    }

    /// Record `observed` and return it if it differs from the remembered height. The first
    /// observation only initializes the tracker.
    pub fn observe(&mut self, observed: u8) -> Option<u8> {
        match self.remembered.replace(observed) {
            Some(previous) if previous != observed => Some(observed),
            _ => None,
        }
    }

    /// Move all lift servos to the current body height if it changed.
    pub async fn reconcile<A: Actuator, C: CommandSource>(
        &mut self,
        motion: &mut Motion<A>,
        source: &C,
    ) -> PhaseOutcome {
        let Some(height) = self.observe(source.body_height()) else {
            return Ok(());
        };
        info!("body height changed to {height}");
        let next = motion.current().with_lifts(height);
        motion.commit_all(next, source).await
    }
}
