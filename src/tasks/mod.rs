//! Asynchronous tasks for the quadruped firmware.
//!
//! This module contains Embassy async tasks for the robot's runtime, including:
//! - [`motion_task`]: Runs gait commands on the gait engine.
//! - [`servo_task`]: Drives the servos along eased moves as commanded.
//! - [`net_task`]: Manages WiFi, TCP server, and command reception.
//!
//! Tasks are spawned from `main.rs` and communicate via Embassy channels.
pub mod motion_task;
pub mod net_task;
pub mod servo_task;
