//! Command types for robot control and inter-task communication.
//!
//! Defines the text commands received over TCP, the gait commands handed to the motion
//! task and the servo commands handed to the actuator.
use heapless::Vec;

use super::config::{NUMBER_OF_SERVOS, TWIST_DEFAULT_ANGLE};
use super::joint::ServoChannel;
use super::leg::Direction;
use crate::kinematics::easing::Easing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpCommand {
    /// Change the walking direction, also while a gait runs.
    Direction(Direction),
    Stop,
    BodyUp,
    BodyDown,
    Gait(GaitCommand),
    /// Preset the direction, then start a gait.
    DirectedGait(Direction, GaitCommand),
    CloseConnection,
}

/// Work for the motion task. Cycle counts of 0 repeat until stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaitCommand {
    Trot(u16),
    Turn(u16),
    Creep(u16),
    Center,
    Twist { angle: u8, left: bool },
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCommandError;

impl TryFrom<&str> for TcpCommand {
    type Error = ParseCommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut tokens = value.split_whitespace();

        let cmd = tokens.next().ok_or(ParseCommandError)?;
        let arg = tokens.next();
        let cycles = || match arg {
            Some(s) => s.parse::<u16>().map_err(|_| ParseCommandError),
            None => Ok(1),
        };

        match cmd {
            "f" => Ok(TcpCommand::Direction(Direction::Forward)),
            "b" => Ok(TcpCommand::Direction(Direction::Backward)),
            "l" => Ok(TcpCommand::Direction(Direction::Left)),
            "r" => Ok(TcpCommand::Direction(Direction::Right)),
            "x" => Ok(TcpCommand::Stop),
            "u" => Ok(TcpCommand::BodyUp),
            "d" => Ok(TcpCommand::BodyDown),
            "c" => Ok(TcpCommand::Gait(GaitCommand::Center)),
            "q" => Ok(TcpCommand::CloseConnection),
            "trot" => Ok(TcpCommand::Gait(GaitCommand::Trot(cycles()?))),
            "creep" => Ok(TcpCommand::Gait(GaitCommand::Creep(cycles()?))),
            "turn" => Ok(TcpCommand::Gait(GaitCommand::Turn(cycles()?))),
            "tl" => Ok(TcpCommand::DirectedGait(Direction::Left, GaitCommand::Turn(cycles()?))),
            "tr" => Ok(TcpCommand::DirectedGait(Direction::Right, GaitCommand::Turn(cycles()?))),
            "tw" => {
                let left = match arg {
                    Some("l") => true,
                    Some("r") => false,
                    _ => return Err(ParseCommandError),
                };
                let angle = tokens
                    .next()
                    .map(|s| s.parse::<u8>().map_err(|_| ParseCommandError))
                    .transpose()?
                    .unwrap_or(TWIST_DEFAULT_ANGLE);
                Ok(TcpCommand::Gait(GaitCommand::Twist { angle, left }))
            }
            _ => Err(ParseCommandError),
        }
    }
}

/// One eased move of one servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoMove {
    pub channel: ServoChannel,
    pub target: u8,
    pub duration_ms: u32,
}

pub struct ServoCommand {
    pub moves: Vec<ServoMove, NUMBER_OF_SERVOS>,
    pub easing: Easing,
    /// Stamped by the sender so completions and halts can be matched to this command.
    pub seq: u32,
}

impl ServoCommand {
    pub fn new(moves: Vec<ServoMove, NUMBER_OF_SERVOS>, easing: Easing) -> Self {
        Self {
            moves,
            easing,
            seq: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    TooLong,
    NotUtf8,
}

/// Reassembles newline-terminated command lines from a byte stream that may split them
/// anywhere.
pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    overflowed: bool,
    complete: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
            complete: false,
        }
    }

    /// Feed one byte. Returns the finished line (without its line ending) when `byte`
    /// ends one.
    pub fn push(&mut self, byte: u8) -> Option<Result<&str, LineError>> {
        if self.complete {
            self.buf.clear();
            self.overflowed = false;
            self.complete = false;
        }
        if byte != b'\n' {
            if self.buf.push(byte).is_err() {
                self.overflowed = true;
            }
            return None;
        }

        self.complete = true;
        if self.overflowed {
            return Some(Err(LineError::TooLong));
        }
        Some(
            core::str::from_utf8(&self.buf)
                .map(|line| line.trim_end_matches('\r'))
                .map_err(|_| LineError::NotUtf8),
        )
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
