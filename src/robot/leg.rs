//! Leg ring and movement direction.
//!
//! The legs are numbered around the body (front left, back left, back right, front right).
//! Stepping forward on this ring is a quarter rotation counter-clockwise, which is how a
//! direction is applied to a gait and how the turn gait picks its next leg.
use core::fmt::Display;
use core::ops::{Index, IndexMut};

use super::config::NUMBER_OF_LEGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    FrontLeft = 0,
    BackLeft = 1,
    BackRight = 2,
    FrontRight = 3,
}

impl Leg {
    pub const ALL: [Leg; NUMBER_OF_LEGS] =
        [Leg::FrontLeft, Leg::BackLeft, Leg::BackRight, Leg::FrontRight];

    /// Leg `steps` positions further around the ring, wrapping in both directions.
    pub fn offset(self, steps: i8) -> Leg {
        let index = (self as i8 + steps).rem_euclid(NUMBER_OF_LEGS as i8);
        Leg::from(index as usize)
    }

    pub fn next(self) -> Leg {
        self.offset(1)
    }

    pub fn prev(self) -> Leg {
        self.offset(-1)
    }

    /// Same leg on the other side of the body.
    pub fn mirrored(self) -> Leg {
        Leg::from(NUMBER_OF_LEGS - 1 - self as usize)
    }

    pub fn diagonal(self) -> Leg {
        self.offset(2)
    }
}

impl Display for Leg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Leg::FrontLeft => f.write_str("Front left"),
            Leg::BackLeft => f.write_str("Back left"),
            Leg::BackRight => f.write_str("Back right"),
            Leg::FrontRight => f.write_str("Front right"),
        }
    }
}

impl From<usize> for Leg {
    fn from(value: usize) -> Self {
        match value % NUMBER_OF_LEGS {
            0 => Leg::FrontLeft,
            1 => Leg::BackLeft,
            2 => Leg::BackRight,
            _ => Leg::FrontRight,
        }
    }
}

impl Index<Leg> for [u8; NUMBER_OF_LEGS] {
    type Output = u8;

    fn index(&self, leg: Leg) -> &Self::Output {
        &self[leg as usize]
    }
}

impl IndexMut<Leg> for [u8; NUMBER_OF_LEGS] {
    fn index_mut(&mut self, leg: Leg) -> &mut Self::Output {
        &mut self[leg as usize]
    }
}

/// Direction the robot walks in. Written by the command source, read by the gaits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward = 0,
    Left = 1,
    Backward = 2,
    Right = 3,
}

impl Direction {
    /// Number of ring steps the canonical (forward) leg assignment is rotated by.
    pub fn ring_offset(self) -> i8 {
        self as i8
    }

    /// Direction that undoes this one's ring rotation.
    pub fn inverse(self) -> Direction {
        match self {
            Direction::Forward => Direction::Forward,
            Direction::Left => Direction::Right,
            Direction::Backward => Direction::Backward,
            Direction::Right => Direction::Left,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Left => f.write_str("left"),
            Direction::Backward => f.write_str("backward"),
            Direction::Right => f.write_str("right"),
        }
    }
}
