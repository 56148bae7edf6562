//! Motion commit primitive.
//!
//! [`Motion`] is the only place that talks to the servos. It turns a complete target
//! [`Pose`] (or one channel of it) into a [`ServoCommand`] with a common duration, hands it
//! to the [`Actuator`] and then waits for the move to finish. The wait loop is the single
//! point where the gait engine yields; the stop flag of the [`CommandSource`] is checked
//! there, and once more when the move has finished.
use heapless::Vec;
use log::{debug, info};

use crate::robot::{
    commands::{ServoCommand, ServoMove},
    config::{MotionConfig, NUMBER_OF_SERVOS},
    joint::{Pose, ServoChannel},
    leg::Direction,
};

/// Gait aborted because a stop was requested. Not a fault: the robot rests in whatever
/// pose the interrupted move reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Outcome of one phase. `Err(Cancelled)` unwinds the whole gait through `?`.
pub type PhaseOutcome = Result<(), Cancelled>;

/// The servo hardware (or a fake of it).
#[allow(async_fn_in_trait)]
pub trait Actuator {
    /// Start every move of the command. Returns once the moves are under way.
    async fn start(&mut self, cmd: ServoCommand);

    fn is_moving(&self) -> bool;

    /// Let the moves progress for a while. Other tasks run during this call.
    async fn wait(&mut self);

    /// Freeze all servos where they are. Returns once they have stopped, so [`pose`]
    /// afterwards reports where they ended up.
    ///
    /// [`pose`]: Actuator::pose
    async fn halt(&mut self);

    /// Angles the servos physically hold right now.
    fn pose(&self) -> Pose;
}

/// Read-only view of the state the command source writes.
pub trait CommandSource {
    fn direction(&self) -> Direction;

    fn stop_requested(&self) -> bool;

    fn body_height(&self) -> u8;

    fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            direction: self.direction(),
            body_height: self.body_height(),
        }
    }
}

impl<T: CommandSource + ?Sized> CommandSource for &T {
    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn stop_requested(&self) -> bool {
        (**self).stop_requested()
    }

    fn body_height(&self) -> u8 {
        (**self).body_height()
    }
}

/// Command source values sampled at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub direction: Direction,
    pub body_height: u8,
}

pub struct Motion<A> {
    actuator: A,
    current: Pose, // last pose the servos were commanded to and reached
    config: MotionConfig,
    commits: u32,
}

impl<A: Actuator> Motion<A> {
    pub fn new(actuator: A, config: MotionConfig) -> Self {
        let current = actuator.pose();
        Self {
            actuator,
            current,
            config,
            commits: 0,
        }
    }

    pub fn current(&self) -> Pose {
        self.current
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MotionConfig) {
        self.config = config;
    }

    /// Number of commits issued so far.
    pub fn commits(&self) -> u32 {
        self.commits
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Move every channel to `next`, all channels arriving together.
    pub async fn commit_all<C: CommandSource>(&mut self, next: Pose, source: &C) -> PhaseOutcome {
        if source.stop_requested() {
            return Err(Cancelled);
        }

        let duration_ms = ServoChannel::all()
            .map(|channel| self.config.duration_ms(self.current[channel].abs_diff(next[channel])))
            .max()
            .unwrap_or(self.config.tick_ms);
        let moves: Vec<ServoMove, NUMBER_OF_SERVOS> = ServoChannel::all()
            .map(|channel| ServoMove {
                channel,
                target: next[channel],
                duration_ms,
            })
            .collect();

        debug!("commit {:?} in {}ms", next.angles(), duration_ms);
        self.issue(ServoCommand::new(moves, self.config.easing)).await;
        self.settle(next, source).await
    }

    /// Move a single channel, leaving the others where they are.
    pub async fn commit_one<C: CommandSource>(
        &mut self,
        channel: ServoChannel,
        angle: u8,
        source: &C,
    ) -> PhaseOutcome {
        if source.stop_requested() {
            return Err(Cancelled);
        }

        let duration_ms = self.config.duration_ms(self.current[channel].abs_diff(angle));
        let moves: Vec<ServoMove, NUMBER_OF_SERVOS> = core::iter::once(ServoMove {
            channel,
            target: angle,
            duration_ms,
        })
        .collect();

        debug!("commit {} to {} in {}ms", channel, angle, duration_ms);
        self.issue(ServoCommand::new(moves, self.config.easing)).await;

        let mut next = self.current;
        next[channel] = angle;
        self.settle(next, source).await
    }

    async fn issue(&mut self, cmd: ServoCommand) {
        self.commits += 1;
        self.actuator.start(cmd).await;
    }

    async fn settle<C: CommandSource>(&mut self, next: Pose, source: &C) -> PhaseOutcome {
        while self.actuator.is_moving() {
            if source.stop_requested() {
                self.actuator.halt().await;
                self.current = self.actuator.pose();
                info!("stop requested, movement halted");
                return Err(Cancelled);
            }
            self.actuator.wait().await;
        }
        self.current = next;

        if source.stop_requested() {
            info!("stop requested");
            return Err(Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{
        joint::Role,
        leg::{Direction, Leg},
    };
    use core::cell::Cell;
    use embassy_futures::block_on;
    use std::vec::Vec as StdVec;

    #[derive(Default)]
    struct Control {
        stop: Cell<bool>,
        stop_after_waits: Cell<Option<u32>>,
    }

    impl CommandSource for Control {
        fn direction(&self) -> Direction {
            Direction::Forward
        }

        fn stop_requested(&self) -> bool {
            self.stop.get()
        }

        fn body_height(&self) -> u8 {
            80
        }
    }

    /// Moves in `waits_per_move` waits, raising the stop flag after a set number of waits.
    struct StepActuator<'a> {
        control: &'a Control,
        pose: Pose,
        target: Pose,
        waits_left: u32,
        waits_per_move: u32,
        waits_total: u32,
        commands: StdVec<StdVec<ServoMove>>,
    }

    impl<'a> StepActuator<'a> {
        fn new(control: &'a Control, waits_per_move: u32) -> Self {
            Self {
                control,
                pose: Pose::uniform(90),
                target: Pose::uniform(90),
                waits_left: 0,
                waits_per_move,
                waits_total: 0,
                commands: StdVec::new(),
            }
        }
    }

    impl Actuator for StepActuator<'_> {
        async fn start(&mut self, cmd: ServoCommand) {
            for m in cmd.moves.iter() {
                self.target[m.channel] = m.target;
            }
            self.commands.push(cmd.moves.iter().copied().collect());
            self.waits_left = self.waits_per_move;
        }

        fn is_moving(&self) -> bool {
            self.waits_left > 0
        }

        async fn wait(&mut self) {
            self.waits_left -= 1;
            self.waits_total += 1;
            if self.waits_left == 0 {
                self.pose = self.target;
            }
            if Some(self.waits_total) == self.control.stop_after_waits.get() {
                self.control.stop.set(true);
            }
        }

        async fn halt(&mut self) {
            self.waits_left = 0;
        }

        fn pose(&self) -> Pose {
            self.pose
        }
    }

    #[test]
    fn commit_all_uses_common_duration() {
        let control = Control::default();
        let mut motion = Motion::new(StepActuator::new(&control, 2), MotionConfig::default());
        let mut next = Pose::uniform(90);
        next[ServoChannel::new(Leg::BackLeft, Role::Pivot)] = 150;
        next[ServoChannel::new(Leg::FrontLeft, Role::Lift)] = 60;

        assert_eq!(block_on(motion.commit_all(next, &control)), Ok(()));
        assert_eq!(motion.current(), next);
        assert_eq!(motion.commits(), 1);

        let moves = &motion.actuator().commands[0];
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|m| m.duration_ms == 500));
    }

    #[test]
    fn commit_one_only_moves_its_channel() {
        let control = Control::default();
        let mut motion = Motion::new(StepActuator::new(&control, 1), MotionConfig::default());
        let channel = ServoChannel::new(Leg::FrontRight, Role::Lift);

        assert_eq!(block_on(motion.commit_one(channel, 30, &control)), Ok(()));
        let moves = &motion.actuator().commands[0];
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].channel, channel);
        assert_eq!(motion.current()[channel], 30);
        assert_eq!(motion.current().pivot(Leg::FrontRight), 90);
    }

    #[test]
    fn stop_during_wait_halts_and_keeps_reached_pose() {
        let control = Control::default();
        control.stop_after_waits.set(Some(1));
        let mut motion = Motion::new(StepActuator::new(&control, 3), MotionConfig::default());

        let outcome = block_on(motion.commit_all(Pose::uniform(120), &control));
        assert_eq!(outcome, Err(Cancelled));
        assert!(!motion.actuator().is_moving());
        // halted before the move completed, so the servos never left their start angles
        assert_eq!(motion.current(), Pose::uniform(90));
    }

    #[test]
    fn stop_observed_at_phase_end_still_counts_the_move() {
        let control = Control::default();
        control.stop_after_waits.set(Some(2));
        let mut motion = Motion::new(StepActuator::new(&control, 2), MotionConfig::default());

        let outcome = block_on(motion.commit_all(Pose::uniform(120), &control));
        assert_eq!(outcome, Err(Cancelled));
        assert_eq!(motion.current(), Pose::uniform(120));
    }

    #[test]
    fn nothing_is_issued_once_stopped() {
        let control = Control::default();
        control.stop.set(true);
        let mut motion = Motion::new(StepActuator::new(&control, 1), MotionConfig::default());

        assert_eq!(
            block_on(motion.commit_all(Pose::uniform(100), &control)),
            Err(Cancelled)
        );
        assert_eq!(motion.commits(), 0);
        assert!(motion.actuator().commands.is_empty());
    }
}
