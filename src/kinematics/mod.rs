//! Gait sequencing for the quadruped.
//!
//! This module turns high-level gait commands into servo moves:
//!
//! - [`transform`] maps the canonical leg frame to physical servo channels.
//! - [`easing`] holds the easing curves servo moves follow.
//! - [`motion`] commits poses to the servos and watches for stop requests.
//! - [`body_height`] follows live body-height changes between phases.
//! - [`cycle`] repeats gait cycles and samples the walking direction.
//! - [`gait_engine`] implements the trot, turn and creep state machines.
//!
//! Used by the motion task to plan and execute robot movement.
pub mod body_height;
pub mod cycle;
pub mod easing;
pub mod gait_engine;
pub mod motion;
pub mod transform;
