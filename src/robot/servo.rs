use crate::kinematics::easing::Easing;
use crate::robot::{
    commands::ServoCommand,
    config::{NUMBER_OF_SERVOS, PIVOT_NEUTRAL},
    joint::{Pose, ServoChannel},
};
use core::cmp::Ordering;
use fugit::Hertz;
use log::error;

use embedded_hal::pwm::SetDutyCycle;

// microseconds for 0° and 180°
const MIN_PULSE_US: u32 = 544;
const MAX_PULSE_US: u32 = 2400;

#[derive(Debug)]
pub struct Servo<PWM> {
    pwm: PWM,
    angle: Option<u8>,
    frequency: Hertz<u32>,
    channel: ServoChannel,
}

impl<PWM> Servo<PWM>
where
    PWM: SetDutyCycle,
{
    pub fn new(pwm: PWM, frequency: Hertz<u32>, channel: ServoChannel) -> Self {
        Self {
            pwm,
            angle: None,
            frequency,
            channel,
        }
    }

    /// Sets the servo angle in degrees.
    ///
    /// # Arguments
    /// * `angle` - A value between 0 and 180 degrees. Values outside this range are clamped.
    ///
    /// Write failures are logged, the servo then keeps its previous angle.
    pub fn set_angle(&mut self, angle: u8) {
        let angle = angle.clamp(0, 180);

        //Avoid setting the same angle again
        if self.angle == Some(angle) {
            return;
        }

        // Linearly interpolate the pulse
        let pulse = MIN_PULSE_US + (angle as u32 * (MAX_PULSE_US - MIN_PULSE_US)) / 180;
        // e.g.: 90° -> 1472 µs

        // Scale pulse to PWM register resolution
        // THE WIDTH OF THE PULSE DRIVES THE ANGLE, NOT FREQ
        let max_duty = self.pwm.max_duty_cycle() as u32;
        let period_us = 1_000_000 / self.frequency.raw();
        let duty = ((pulse * max_duty) / period_us).min(max_duty) as u16;
        match self.pwm.set_duty_cycle(duty) {
            Ok(()) => self.angle = Some(angle),
            Err(e) => error!("{} Error writing angle {:?}", self.channel, e),
        }
    }

    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn pwm(&self) -> &PWM {
        &self.pwm
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveMove {
    from: u8,
    to: u8,
    duration_ms: u32,
    elapsed_ms: u32,
}

/// The eight servos of the robot, moved together along an easing curve.
///
/// [`ServoBank::begin`] loads a command, every [`ServoBank::advance`] moves each servo to
/// where its curve is after the elapsed time.
pub struct ServoBank<PWM> {
    servos: [Servo<PWM>; NUMBER_OF_SERVOS],
    moves: [Option<ActiveMove>; NUMBER_OF_SERVOS],
    pose: Pose,
    easing: Easing,
    running: u32,
}

/// What a halt request tagged with a command sequence number means to the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltRequest {
    /// It named the running command, which is now halted.
    Halted,
    /// It names a command not started yet; keep it for that one.
    Ahead,
    /// It named a command that already ended.
    Stale,
}

/// Numbers the servo commands one sender issues, so that a completion or a halt can be
/// matched to the command it belongs to.
#[derive(Debug, Default)]
pub struct MoveSequence {
    issued: u32,
}

impl MoveSequence {
    pub const fn new() -> Self {
        Self { issued: 0 }
    }

    /// Give `cmd` the next sequence number. Numbers start at 1.
    pub fn stamp(&mut self, cmd: &mut ServoCommand) -> u32 {
        self.issued += 1;
        cmd.seq = self.issued;
        self.issued
    }

    /// Sequence number of the last command stamped, 0 if none.
    pub fn issued(&self) -> u32 {
        self.issued
    }

    /// Whether `seq` names the last command stamped.
    pub fn is_current(&self, seq: u32) -> bool {
        self.issued != 0 && seq == self.issued
    }
}

impl<PWM> ServoBank<PWM>
where
    PWM: SetDutyCycle,
{
    /// Take the servos (in channel order) and park them at neutral.
    pub fn new(servos: [Servo<PWM>; NUMBER_OF_SERVOS]) -> Self {
        Self::with_pose(servos, Pose::uniform(PIVOT_NEUTRAL))
    }

    pub fn with_pose(servos: [Servo<PWM>; NUMBER_OF_SERVOS], pose: Pose) -> Self {
        let mut bank = Self {
            servos,
            moves: [None; NUMBER_OF_SERVOS],
            pose,
            easing: Easing::Linear,
            running: 0,
        };
        for channel in ServoChannel::all() {
            bank.servos[channel.index()].set_angle(pose[channel]);
        }
        bank
    }

    pub fn begin(&mut self, cmd: &ServoCommand) {
        self.easing = cmd.easing;
        self.running = cmd.seq;
        for m in cmd.moves.iter() {
            self.moves[m.channel.index()] = Some(ActiveMove {
                from: self.pose[m.channel],
                to: m.target,
                duration_ms: m.duration_ms,
                elapsed_ms: 0,
            });
        }
    }

    /// Progress all moves by `dt_ms`. Returns whether any move is still running.
    pub fn advance(&mut self, dt_ms: u32) -> bool {
        for channel in ServoChannel::all() {
            let index = channel.index();
            let Some(mut active) = self.moves[index] else {
                continue;
            };
            active.elapsed_ms = active.elapsed_ms.saturating_add(dt_ms);
            let angle = self.easing.interpolate(
                active.from,
                active.to,
                active.elapsed_ms,
                active.duration_ms,
            );
            self.servos[index].set_angle(angle);
            self.pose[channel] = angle;
            self.moves[index] = (active.elapsed_ms < active.duration_ms).then_some(active);
        }
        self.is_moving()
    }

    pub fn is_moving(&self) -> bool {
        self.moves.iter().any(Option::is_some)
    }

    /// Drop all running moves, the servos hold their current angle.
    pub fn halt(&mut self) {
        self.moves = [None; NUMBER_OF_SERVOS];
    }

    /// Halt the running command if `seq` names it.
    pub fn request_halt(&mut self, seq: u32) -> HaltRequest {
        match seq.cmp(&self.running) {
            Ordering::Equal => {
                self.halt();
                HaltRequest::Halted
            }
            Ordering::Greater => HaltRequest::Ahead,
            Ordering::Less => HaltRequest::Stale,
        }
    }

    /// Sequence number of the last command begun.
    pub fn running(&self) -> u32 {
        self.running
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn servo(&self, channel: ServoChannel) -> &Servo<PWM> {
        &self.servos[channel.index()]
    }
}
