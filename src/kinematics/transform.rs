//! Angle transforms from the canonical leg frame to physical servo channels.
//!
//! Gaits are written once, for walking forward, in terms of the four legs of a
//! [`LegFrame`]. The robot is rotationally symmetric, so walking in another direction is
//! the same gait with the leg assignment rotated around the ring. The optional mirror
//! swaps the left and right legs (reflecting their pivot angles) and is how the creep gait
//! runs its second half.
use crate::robot::{
    config::{MAX_ANGLE, NUMBER_OF_LEGS},
    joint::{Pose, Role, ServoChannel},
    leg::{Direction, Leg},
};

/// Pivot and lift angle for each leg, indexed by [`Leg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegFrame {
    pub pivot: [u8; NUMBER_OF_LEGS],
    pub lift: [u8; NUMBER_OF_LEGS],
}

impl LegFrame {
    /// Build a frame in ring order: front left, back left, back right, front right.
    pub const fn new(pivot: [u8; NUMBER_OF_LEGS], lift: [u8; NUMBER_OF_LEGS]) -> Self {
        Self { pivot, lift }
    }

    /// Frame where the two diagonal pairs (front left + back right, back left + front
    /// right) each share one pivot angle and one lift angle.
    pub const fn diagonal(fl_br_pivot: u8, bl_fr_pivot: u8, fl_br_lift: u8, bl_fr_lift: u8) -> Self {
        Self {
            pivot: [fl_br_pivot, bl_fr_pivot, fl_br_pivot, bl_fr_pivot],
            lift: [fl_br_lift, bl_fr_lift, fl_br_lift, bl_fr_lift],
        }
    }

    /// Swap left and right legs, reflecting the pivots around neutral.
    pub fn mirrored(self) -> Self {
        let mut out = self;
        for leg in Leg::ALL {
            out.pivot[leg.mirrored()] = MAX_ANGLE - self.pivot[leg];
            out.lift[leg.mirrored()] = self.lift[leg];
        }
        out
    }

    /// Hand every leg's angles to the leg `direction` ring steps further on.
    pub fn rotated(self, direction: Direction) -> Self {
        let mut out = self;
        for leg in Leg::ALL {
            let target = leg.offset(direction.ring_offset());
            out.pivot[target] = self.pivot[leg];
            out.lift[target] = self.lift[leg];
        }
        out
    }

    /// Physical pose for this canonical frame.
    pub fn transform(self, direction: Direction, mirror: bool) -> Pose {
        let frame = if mirror { self.mirrored() } else { self };
        frame.rotated(direction).into_pose()
    }

    fn into_pose(self) -> Pose {
        let mut pose = Pose::uniform(0);
        for leg in Leg::ALL {
            pose[ServoChannel::new(leg, Role::Pivot)] = self.pivot[leg];
            pose[ServoChannel::new(leg, Role::Lift)] = self.lift[leg];
        }
        pose
    }
}

/// Physical channel of one canonical joint, with the same mirror and rotation rules as
/// [`LegFrame::transform`].
pub fn transform_channel(leg: Leg, role: Role, direction: Direction, mirror: bool) -> ServoChannel {
    let leg = if mirror { leg.mirrored() } else { leg };
    ServoChannel::new(leg.offset(direction.ring_offset()), role)
}

/// `angle + delta`, kept inside the servo range.
pub fn offset_angle(angle: u8, delta: i16) -> u8 {
    (angle as i16 + delta).clamp(0, MAX_ANGLE as i16) as u8
}
