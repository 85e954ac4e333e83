/// Damped spring motion
///
/// Closed-form damped harmonic oscillator. Each step samples the analytic
/// solution at `dt`, so large frame times never overshoot or explode the way
/// an explicit Euler step would.

pub mod presets;

pub use presets::SpringPreset;

use crate::constants::{SPRING_EPSILON, SPRING_SPEED};

/// Coefficients that advance (position - target, velocity) over one interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampedSpringParams {
    pub pos_pos: f64,
    pub pos_vel: f64,
    pub vel_pos: f64,
    pub vel_vel: f64,
}

impl DampedSpringParams {
    /// Position frozen, velocity dropped. Used when the spring has no stiffness.
    pub const FROZEN: DampedSpringParams = DampedSpringParams {
        pos_pos: 1.0,
        pos_vel: 0.0,
        vel_pos: 0.0,
        vel_vel: 0.0,
    };

    /// Compute the motion coefficients for one interval
    ///
    /// # Arguments
    /// * `delta_time` - Interval length, already multiplied by the spring speed
    /// * `angular_frequency` - Oscillation frequency; negative values clamp to 0
    /// * `damping_ratio` - 1 is critical; negative values clamp to 0
    ///
    /// A frequency below epsilon yields [`DampedSpringParams::FROZEN`]: the
    /// spring holds its position and loses its velocity instead of drifting.
    pub fn compute(delta_time: f64, angular_frequency: f64, damping_ratio: f64) -> Self {
        let dt = delta_time.max(0.0);
        let omega = angular_frequency.max(0.0);
        let zeta = damping_ratio.max(0.0);

        if omega < SPRING_EPSILON {
            return Self::FROZEN;
        }

        if zeta > 1.0 + SPRING_EPSILON {
            // over-damped
            let za = -omega * zeta;
            let zb = omega * (zeta * zeta - 1.0).sqrt();
            let z1 = za - zb;
            let z2 = za + zb;

            let e1 = (z1 * dt).exp();
            let e2 = (z2 * dt).exp();

            let inv_two_zb = 1.0 / (2.0 * zb);

            let e1_over_two_zb = e1 * inv_two_zb;
            let e2_over_two_zb = e2 * inv_two_zb;

            let z1e1_over_two_zb = z1 * e1_over_two_zb;
            let z2e2_over_two_zb = z2 * e2_over_two_zb;

            Self {
                pos_pos: e1_over_two_zb * z2 - z2e2_over_two_zb + e2,
                pos_vel: -e1_over_two_zb + e2_over_two_zb,
                vel_pos: (z1e1_over_two_zb - z2e2_over_two_zb + e2) * z2,
                vel_vel: -z1e1_over_two_zb + z2e2_over_two_zb,
            }
        } else if zeta < 1.0 - SPRING_EPSILON {
            // under-damped
            let omega_zeta = omega * zeta;
            let alpha = omega * (1.0 - zeta * zeta).sqrt();

            let exp_term = (-omega_zeta * dt).exp();
            let cos_term = (alpha * dt).cos();
            let sin_term = (alpha * dt).sin();

            let inv_alpha = 1.0 / alpha;

            let exp_sin = exp_term * sin_term;
            let exp_cos = exp_term * cos_term;
            let exp_omega_zeta_sin_over_alpha = exp_term * omega_zeta * sin_term * inv_alpha;

            Self {
                pos_pos: exp_cos + exp_omega_zeta_sin_over_alpha,
                pos_vel: exp_sin * inv_alpha,
                vel_pos: -exp_sin * alpha - omega_zeta * exp_omega_zeta_sin_over_alpha,
                vel_vel: exp_cos - exp_omega_zeta_sin_over_alpha,
            }
        } else {
            // critically damped
            let exp_term = (-omega * dt).exp();
            let time_exp = dt * exp_term;
            let time_exp_freq = time_exp * omega;

            Self {
                pos_pos: time_exp_freq + exp_term,
                pos_vel: time_exp,
                vel_pos: -omega * time_exp_freq,
                vel_vel: -time_exp_freq + exp_term,
            }
        }
    }

    /// Advance a spring in place, re-centred on its current target
    pub fn apply(&self, spring: &mut Spring) {
        let old_pos = spring.position - spring.target;
        let old_vel = spring.velocity;

        spring.position = old_pos * self.pos_pos + old_vel * self.pos_vel + spring.target;
        spring.velocity = old_pos * self.vel_pos + old_vel * self.vel_vel;
    }
}

/// A scalar chasing its target with damped-spring motion
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub target: f64,
    pub position: f64,
    pub velocity: f64,
    pub frequency: f64,
    pub damping_ratio: f64,
    /// Multiplier applied to every delta before integration
    pub speed: f64,
}

impl Spring {
    /// Create a spring at rest on `initial`, targeting `initial`
    pub fn new(preset: SpringPreset, initial: f64) -> Self {
        let (frequency, damping_ratio) = preset.params();
        Self::with_params(frequency, damping_ratio, initial)
    }

    pub fn with_params(frequency: f64, damping_ratio: f64, initial: f64) -> Self {
        Self {
            target: initial,
            position: initial,
            velocity: 0.0,
            frequency,
            damping_ratio,
            speed: SPRING_SPEED,
        }
    }

    pub fn update(&mut self, delta_time: f64) {
        let params =
            DampedSpringParams::compute(delta_time * self.speed, self.frequency, self.damping_ratio);
        params.apply(self);
    }

    /// Snap to `value` with no velocity
    pub fn reset(&mut self, value: f64) {
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
    }

    pub fn is_settled(&self, tolerance: f64) -> bool {
        (self.position - self.target).abs() <= tolerance && self.velocity.abs() <= tolerance
    }
}

impl Default for Spring {
    fn default() -> Self {
        Spring::new(SpringPreset::Normal, 1.0)
    }
}
