//! Library root for the quadruped gait firmware.
//!
//! Re-exports all main modules: [`kinematics`], [`robot`], and [`tasks`].
//! The gait core is hardware independent; the embassy tasks that drive the ESP32 are only
//! built with the `esp32` feature.
#![cfg_attr(not(test), no_std)]

pub mod kinematics;
pub mod robot;
#[cfg(feature = "esp32")]
pub mod tasks;

pub const SERVOCMD_CHANNEL_SIZE: usize = 3;
pub const TCPCMD_CHANNEL_SIZE: usize = 4;
