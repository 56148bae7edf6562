//! Gait state machines.
//!
//! Trot, turn and creep are written for walking forward in the canonical leg frame and
//! turned into physical poses by [`transform`](super::transform). Each phase is one commit.
use log::{debug, info};

use super::{
    body_height::BodyHeightTracker,
    cycle::{CycleCounter, DirectionTracker},
    motion::{Actuator, CommandSource, Motion, PhaseOutcome},
    transform::{offset_angle, transform_channel, LegFrame},
};
use crate::robot::{
    commands::GaitCommand,
    config::*,
    joint::{Pose, Role, ServoChannel},
    leg::{Direction, Leg},
};

/// State machine that sequences the gaits phase by phase.
///
/// Every phase builds a complete target pose, commits it through [`Motion`] and returns
/// early with `Err(Cancelled)` as soon as a stop is observed. Trot and creep reconcile the
/// body height after every phase; the turn keeps its legs near level and does not.
pub struct GaitEngine<A, C> {
    motion: Motion<A>,
    source: C,
    body_height: BodyHeightTracker,
}

impl<A: Actuator, C: CommandSource> GaitEngine<A, C> {
    pub fn new(actuator: A, source: C, config: MotionConfig) -> Self {
        Self {
            motion: Motion::new(actuator, config),
            source,
            body_height: BodyHeightTracker::new(),
        }
    }

    pub fn motion(&self) -> &Motion<A> {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut Motion<A> {
        &mut self.motion
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub async fn run(&mut self, cmd: GaitCommand) -> PhaseOutcome {
        match cmd {
            GaitCommand::Trot(cycles) => self.trot(cycles).await,
            GaitCommand::Turn(cycles) => self.turn(cycles).await,
            GaitCommand::Creep(cycles) => self.creep(cycles).await,
            GaitCommand::Center => self.center().await,
            GaitCommand::Twist { angle, left } => self.twist(angle, left).await,
        }
    }

    /// Move two diagonal legs up and forward, then the other two.
    pub async fn trot(&mut self, cycles: u16) -> PhaseOutcome {
        info!("[MOTION_TASK] trot x{} {:?}", cycles, self.source.snapshot());
        self.reconcile_body_height().await?;
        let mut counter = CycleCounter::new(cycles);
        let mut direction = DirectionTracker::new(&self.source);

        loop {
            let lift = trot_lift_angle(self.source.body_height());

            debug!("trot: back left and front right up");
            let height = self.source.body_height();
            let frame = LegFrame::new(
                [
                    TROT_BASE_ANGLE_FL_BR + TROT_MOVE_ANGLE,
                    TROT_BASE_ANGLE_BL_FR - TROT_MOVE_ANGLE,
                    TROT_BASE_ANGLE_FL_BR - TROT_MOVE_ANGLE,
                    TROT_BASE_ANGLE_BL_FR + TROT_MOVE_ANGLE,
                ],
                [height, lift, height, lift],
            );
            self.commit(frame.transform(direction.current(), false)).await?;
            self.reconcile_body_height().await?;

            debug!("trot: front left and back right up");
            let height = self.source.body_height();
            let frame = LegFrame::new(
                [
                    TROT_BASE_ANGLE_FL_BR - TROT_MOVE_ANGLE,
                    TROT_BASE_ANGLE_BL_FR + TROT_MOVE_ANGLE,
                    TROT_BASE_ANGLE_FL_BR + TROT_MOVE_ANGLE,
                    TROT_BASE_ANGLE_BL_FR - TROT_MOVE_ANGLE,
                ],
                [lift, height, lift, height],
            );
            self.commit(frame.transform(direction.current(), false)).await?;
            self.reconcile_body_height().await?;

            if !counter.complete_cycle() {
                break;
            }
            direction.resample(&self.source);
        }
        info!("[MOTION_TASK] trot completed!");
        Ok(())
    }

    /// Turn on the spot, one quarter turn per cycle. Left turns walk the moving leg forward
    /// around the ring, right turns backward.
    pub async fn turn(&mut self, cycles: u16) -> PhaseOutcome {
        info!("[MOTION_TASK] turn x{} {:?}", cycles, self.source.snapshot());
        let mut counter = CycleCounter::new(cycles);
        let mut direction = DirectionTracker::new(&self.source);

        // Start centered with the leg preceding the first mover already swung out, otherwise
        // the center of gravity is not supported at the first quarter turn.
        debug!("turn: stabilize");
        let mut next = Pose::uniform(PIVOT_NEUTRAL).with_lifts(self.source.body_height());
        if direction.current() == Direction::Left {
            next[ServoChannel::new(Leg::FrontRight, Role::Pivot)] =
                offset_angle(PIVOT_NEUTRAL, TURN_MOVE_ANGLE as i16);
        } else {
            next[ServoChannel::new(Leg::BackLeft, Role::Pivot)] =
                offset_angle(PIVOT_NEUTRAL, -(TURN_MOVE_ANGLE as i16));
        }
        self.commit(next).await?;

        let mut leg = Leg::FrontLeft;
        loop {
            let left = direction.current() == Direction::Left;
            self.quarter_turn(leg, left).await?;
            leg = if left { leg.next() } else { leg.prev() };

            if !counter.complete_cycle() {
                break;
            }
            direction.resample(&self.source);
        }
        info!("[MOTION_TASK] turn completed!");
        Ok(())
    }

    /// Swing `leg` up and ahead in the turn direction while the three others twist the
    /// body the opposite way. One synchronized commit.
    async fn quarter_turn(&mut self, leg: Leg, left: bool) -> PhaseOutcome {
        debug!("turn: {} leg, left={}", leg, left);
        let (move_angle, body_angle) = if left {
            (TURN_MOVE_ANGLE as i16, -(TURN_BODY_ANGLE as i16))
        } else {
            (-(TURN_MOVE_ANGLE as i16), TURN_BODY_ANGLE as i16)
        };
        let height = self.source.body_height();
        let current = self.motion.current();

        let mut next = current;
        next[ServoChannel::new(leg, Role::Pivot)] = offset_angle(PIVOT_NEUTRAL, move_angle);
        next[ServoChannel::new(leg, Role::Lift)] = LIFT_MAX_ANGLE;
        for other in (1..NUMBER_OF_LEGS as i8).map(|step| leg.offset(step)) {
            next[ServoChannel::new(other, Role::Pivot)] =
                offset_angle(current.pivot(other), body_angle);
            next[ServoChannel::new(other, Role::Lift)] = height;
        }
        self.commit(next).await
    }

    /// Walk keeping three legs on the ground: each cycle is a half creep and its mirror.
    pub async fn creep(&mut self, cycles: u16) -> PhaseOutcome {
        info!("[MOTION_TASK] creep x{} {:?}", cycles, self.source.snapshot());
        self.reconcile_body_height().await?;
        let mut counter = CycleCounter::new(cycles);
        let mut direction = DirectionTracker::new(&self.source);

        self.y_position(direction.current()).await?;
        loop {
            self.half_creep(direction.current(), false).await?;
            self.half_creep(direction.current(), true).await?;

            if !counter.complete_cycle() {
                break;
            }
            direction.resample(&self.source);
        }

        // the mirrored half ends with its back leg still lifted
        let channel = transform_channel(Leg::BackLeft, Role::Lift, direction.current(), true);
        let height = self.source.body_height();
        self.motion.commit_one(channel, height, &self.source).await?;
        info!("[MOTION_TASK] creep completed!");
        Ok(())
    }

    /// Y stance: right legs closed, left legs open.
    async fn y_position(&mut self, direction: Direction) -> PhaseOutcome {
        debug!("creep: Y position {}", direction);
        let height = self.source.body_height();
        let frame = LegFrame::new(
            [
                MAX_ANGLE - Y_POSITION_OPEN_ANGLE,
                Y_POSITION_OPEN_ANGLE,
                MAX_ANGLE - Y_POSITION_CLOSE_ANGLE,
                Y_POSITION_CLOSE_ANGLE,
            ],
            [height; NUMBER_OF_LEGS],
        );
        self.commit(frame.transform(direction, false)).await
    }

    /// Front leg forward, body forward, trailing diagonal leg closed.
    async fn half_creep(&mut self, direction: Direction, mirror: bool) -> PhaseOutcome {
        debug!("creep: move front leg (mirror={})", mirror);
        let height = self.source.body_height();
        let frame = LegFrame::new(
            [
                MAX_ANGLE - Y_POSITION_OPEN_ANGLE,
                Y_POSITION_OPEN_ANGLE,
                MAX_ANGLE - Y_POSITION_CLOSE_ANGLE,
                Y_POSITION_FRONT_ANGLE,
            ],
            [height, height, height, LIFT_MAX_ANGLE],
        );
        self.commit(frame.transform(direction, mirror)).await?;
        self.reconcile_body_height().await?;

        debug!("creep: move body");
        let height = self.source.body_height();
        let frame = LegFrame::new(
            [
                MAX_ANGLE - Y_POSITION_CLOSE_ANGLE,
                Y_POSITION_OPEN_ANGLE + CREEP_BODY_MOVE_ANGLE,
                MAX_ANGLE - Y_POSITION_OPEN_ANGLE,
                Y_POSITION_OPEN_ANGLE,
            ],
            [height; NUMBER_OF_LEGS],
        );
        self.commit(frame.transform(direction, mirror)).await?;
        self.reconcile_body_height().await?;

        debug!("creep: move back leg to close position");
        let height = self.source.body_height();
        let frame = LegFrame::new(
            [
                MAX_ANGLE - Y_POSITION_CLOSE_ANGLE,
                Y_POSITION_CLOSE_ANGLE,
                MAX_ANGLE - Y_POSITION_OPEN_ANGLE,
                Y_POSITION_OPEN_ANGLE,
            ],
            [height, LIFT_MAX_ANGLE, height, height],
        );
        self.commit(frame.transform(direction, mirror)).await?;
        self.reconcile_body_height().await
    }

    /// All pivots to neutral, all feet at body height.
    pub async fn center(&mut self) -> PhaseOutcome {
        info!("[MOTION_TASK] center");
        let height = self.source.body_height();
        self.body_height.observe(height);
        self.commit(Pose::uniform(PIVOT_NEUTRAL).with_lifts(height)).await
    }

    /// Rotate the body around its center with all feet on the ground.
    pub async fn twist(&mut self, angle: u8, left: bool) -> PhaseOutcome {
        info!("[MOTION_TASK] twist {} left={}", angle, left);
        let delta = if left { -(angle as i16) } else { angle as i16 };
        let next = self
            .motion
            .current()
            .with_pivots(offset_angle(PIVOT_NEUTRAL, delta));
        self.commit(next).await
    }

    async fn commit(&mut self, next: Pose) -> PhaseOutcome {
        self.motion.commit_all(next, &self.source).await
    }

    async fn reconcile_body_height(&mut self) -> PhaseOutcome {
        self.body_height
            .reconcile(&mut self.motion, &self.source)
            .await
    }
}

/// Trot lifts its feet only halfway to the maximum.
fn trot_lift_angle(body_height: u8) -> u8 {
    body_height + LIFT_MAX_ANGLE.saturating_sub(body_height) / 2
}
