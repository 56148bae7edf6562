//! Joint roles and servo channel addressing.
//!
//! Every leg carries a pivot servo (swings the leg around the body) and a lift servo
//! (raises and lowers the foot). [`ServoChannel`] addresses one of them as
//! `leg * SERVOS_PER_LEG + role`.
use core::fmt::Display;
use core::ops::{Index, IndexMut};

use super::config::{NUMBER_OF_SERVOS, SERVOS_PER_LEG};
use super::leg::Leg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Pivot = 0,
    Lift = 1,
}

impl Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Role::Pivot => f.write_str("pivot"),
            Role::Lift => f.write_str("lift"),
        }
    }
}

impl From<usize> for Role {
    fn from(value: usize) -> Self {
        match value % SERVOS_PER_LEG {
            0 => Role::Pivot,
            _ => Role::Lift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoChannel(u8);

impl ServoChannel {
    pub fn new(leg: Leg, role: Role) -> Self {
        Self((leg as usize * SERVOS_PER_LEG + role as usize) as u8)
    }

    /// Channel for any index, wrapped around the channel ring.
    pub fn from_index(index: usize) -> Self {
        Self((index % NUMBER_OF_SERVOS) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn leg(self) -> Leg {
        Leg::from(self.index() / SERVOS_PER_LEG)
    }

    pub fn role(self) -> Role {
        Role::from(self.index())
    }

    pub fn all() -> impl Iterator<Item = ServoChannel> {
        (0..NUMBER_OF_SERVOS).map(ServoChannel::from_index)
    }
}

impl Display for ServoChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.leg(), self.role())
    }
}

/// One target angle per servo channel.
///
/// Built whole for every phase, so a commit never carries a stale value from an earlier
/// phase for a channel the phase forgot about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pose([u8; NUMBER_OF_SERVOS]);

impl Pose {
    pub const fn new(angles: [u8; NUMBER_OF_SERVOS]) -> Self {
        Self(angles)
    }

    /// Every servo at the same angle.
    pub const fn uniform(angle: u8) -> Self {
        Self([angle; NUMBER_OF_SERVOS])
    }

    pub fn angles(&self) -> &[u8; NUMBER_OF_SERVOS] {
        &self.0
    }

    pub fn pivot(&self, leg: Leg) -> u8 {
        self[ServoChannel::new(leg, Role::Pivot)]
    }

    pub fn lift(&self, leg: Leg) -> u8 {
        self[ServoChannel::new(leg, Role::Lift)]
    }

    /// Same pose with every lift servo at `height`.
    pub fn with_lifts(mut self, height: u8) -> Self {
        for leg in Leg::ALL {
            self[ServoChannel::new(leg, Role::Lift)] = height;
        }
        self
    }

    /// Same pose with every pivot servo at `angle`.
    pub fn with_pivots(mut self, angle: u8) -> Self {
        for leg in Leg::ALL {
            self[ServoChannel::new(leg, Role::Pivot)] = angle;
        }
        self
    }
}

impl Index<ServoChannel> for Pose {
    type Output = u8;

    fn index(&self, channel: ServoChannel) -> &Self::Output {
        &self.0[channel.index()]
    }
}

impl IndexMut<ServoChannel> for Pose {
    fn index_mut(&mut self, channel: ServoChannel) -> &mut Self::Output {
        &mut self.0[channel.index()]
    }
}
