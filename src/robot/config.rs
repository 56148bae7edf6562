use crate::kinematics::easing::Easing;

// ROBOT LAYOUT
pub const NUMBER_OF_LEGS: usize = 4;
pub const SERVOS_PER_LEG: usize = 2;
pub const NUMBER_OF_SERVOS: usize = NUMBER_OF_LEGS * SERVOS_PER_LEG;

/// Pivot angle of a leg pointing straight out of its corner.
pub const PIVOT_NEUTRAL: u8 = 90;
pub const MAX_ANGLE: u8 = 180;

// LIFT
pub const LIFT_MAX_ANGLE: u8 = 150;
pub const BODY_HEIGHT_DEFAULT: u8 = 80;
pub const BODY_HEIGHT_MIN: u8 = 30;
pub const BODY_HEIGHT_MAX: u8 = 130;
pub const BODY_HEIGHT_STEP: u8 = 10;

// TROT
pub const TROT_BASE_ANGLE_FL_BR: u8 = 60;
pub const TROT_BASE_ANGLE_BL_FR: u8 = 120;
pub const TROT_MOVE_ANGLE: u8 = 30;

// TURN
pub const TURN_MOVE_ANGLE: u8 = 30;
pub const TURN_BODY_ANGLE: u8 = 10;
pub const TWIST_DEFAULT_ANGLE: u8 = 30;

// CREEP
pub const CREEP_BODY_MOVE_ANGLE: u8 = 45;
pub const Y_POSITION_OPEN_ANGLE: u8 = 60;
pub const Y_POSITION_CLOSE_ANGLE: u8 = Y_POSITION_OPEN_ANGLE + CREEP_BODY_MOVE_ANGLE;
pub const Y_POSITION_FRONT_ANGLE: u8 = Y_POSITION_OPEN_ANGLE - CREEP_BODY_MOVE_ANGLE;

// MOTION
pub const MOVE_SPEED_DEG_PER_SEC: u32 = 120;
pub const SERVO_TICK_MS: u32 = 20;
/// How long the commit loop sleeps between two checks of the stop flag.
pub const STOP_POLL_MS: u64 = 20;
pub const SERVO_PWM_FREQUENCY_HZ: u32 = 50;

// NETWORK
pub const PORT: u16 = 4242;
pub const RX_BUF_SIZE: usize = 512;
pub const TX_BUF_SIZE: usize = 512;

/// Tunables of the motion commit primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pub speed_deg_per_sec: u32,
    pub easing: Easing,
    pub tick_ms: u32,
}

impl MotionConfig {
    /// Duration of a move covering `delta` degrees, never shorter than one servo tick.
    pub fn duration_ms(&self, delta: u8) -> u32 {
        let speed = self.speed_deg_per_sec.max(1);
        (delta as u32 * 1000 / speed).max(self.tick_ms)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_deg_per_sec: MOVE_SPEED_DEG_PER_SEC,
            easing: Easing::QuadraticInOut,
            tick_ms: SERVO_TICK_MS,
        }
    }
}
