//! Easing curves for servo moves.
//!
//! A curve maps the elapsed fraction of a move (0.0 to 1.0) to the covered fraction of
//! its distance. All curves start at 0 and end at 1, so every channel of a synchronized
//! commit arrives together regardless of the curve.
use core::f32::consts::PI;
use micromath::F32Ext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    QuadraticInOut,
    CubicInOut,
    SineInOut,
}

impl Easing {
    pub fn apply(self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
        }
    }

    /// Angle reached after `elapsed_ms` of a `duration_ms` move from `from` to `to`.
    pub fn interpolate(self, from: u8, to: u8, elapsed_ms: u32, duration_ms: u32) -> u8 {
        if duration_ms == 0 || elapsed_ms >= duration_ms {
            return to;
        }
        let progress = self.apply(elapsed_ms as f32 / duration_ms as f32);
        let angle = from as f32 + (to as f32 - from as f32) * progress;
        angle.round().clamp(0.0, 180.0) as u8
    }
}
