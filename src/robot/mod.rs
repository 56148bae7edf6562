//! Core robot types and configuration.
//!
//! This module defines the main types and constants for the quadruped, including:
//! - [`commands`]: Command types for inter-task communication (TCP, gait and servo).
//! - [`config`]: Geometry angles, motion and network constants.
//! - [`leg`]: Leg ring and movement direction.
//! - [`joint`]: Joint roles and servo channel addressing.
//! - [`servo`]: PWM servo driver and the eased servo bank.
//! - [`state`]: Process-wide control state written by the command source.
pub mod commands;
pub mod config;
pub mod joint;
pub mod leg;
pub mod servo;
pub mod state;
