//! # Envelope Follower
//!
//! Tracks the loudness of a signal so the delay can get out of the way of
//! the dry input ("ducking"): while the player is playing, the echoes are
//! pushed down; in the gaps they come back up.
//!
//! The input is rectified (`|x|`), scaled by a fixed sensitivity, and then
//! followed by a one-pole smoother with two different speeds:
//!
//! ```text
//! target = |x| * sensitivity
//! coeff  = target > env ? attack : release
//! env    = coeff * (env - target) + target
//! ```
//!
//! A fast attack and slower release is the classic detector shape. The
//! coefficients come from times in milliseconds:
//!
//! ```text
//! coeff = e^(-1 / (t_ms / 1000 * sample_rate))
//! ```
//!
//! The sensitivity of 10 is chosen so ordinary program material lands the
//! envelope near the 0..1 range of a ducking gain. It is not a user control.

use super::flush_denormal;

/// Input gain applied before tracking.
pub const SENSITIVITY: f32 = 10.0;

/// Attack/release envelope detector.
pub struct EnvFollower {
    attack_ms: f32,
    release_ms: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    env: f32,
}

impl Default for EnvFollower {
    fn default() -> Self {
        Self::new(44100.0, 0.0, 0.0)
    }
}

impl EnvFollower {
    pub fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            attack_ms,
            release_ms,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            env: 0.0,
        };
        follower.prepare(sample_rate, attack_ms, release_ms);
        follower
    }

    pub fn prepare(&mut self, sample_rate: f32, attack_ms: f32, release_ms: f32) {
        self.sample_rate = sample_rate;
        self.set_attack(attack_ms);
        self.set_release(release_ms);
        self.env = 0.0;
    }

    /// Changing the rate keeps the configured times in milliseconds.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.attack_coeff = time_to_coeff(self.attack_ms, sample_rate);
        self.release_coeff = time_to_coeff(self.release_ms, sample_rate);
    }

    pub fn set_attack(&mut self, attack_ms: f32) {
        self.attack_ms = attack_ms;
        self.attack_coeff = time_to_coeff(attack_ms, self.sample_rate);
    }

    pub fn set_release(&mut self, release_ms: f32) {
        self.release_ms = release_ms;
        self.release_coeff = time_to_coeff(release_ms, self.sample_rate);
    }

    /// Track one input sample and return the envelope (always >= 0).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let target = input.abs() * SENSITIVITY;
        let coeff = if target > self.env {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.env = flush_denormal(coeff * (self.env - target) + target);
        self.env
    }

    pub fn level(&self) -> f32 {
        self.env
    }

    pub fn reset(&mut self) {
        self.env = 0.0;
    }
}

/// `e^(-1 / samples)`; zero (instant) for non-positive times.
fn time_to_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = time_ms / 1000.0 * sample_rate;
    if samples <= 0.0 {
        0.0
    } else {
        (-1.0 / samples).exp()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Samples until the envelope crosses `threshold` in the given
    /// direction, feeding a constant input.
    fn samples_to_cross(env: &mut EnvFollower, input: f32, threshold: f32, rising: bool) -> usize {
        for n in 1..(SAMPLE_RATE as usize * 10) {
            let level = env.process(input);
            if (rising && level >= threshold) || (!rising && level <= threshold) {
                return n;
            }
        }
        panic!("envelope never crossed {threshold}");
    }

    #[test]
    fn test_zero_time_is_instant() {
        let mut env = EnvFollower::new(SAMPLE_RATE, 0.0, 0.0);

        assert_eq!(env.process(0.05), 0.5);
        assert_eq!(env.process(0.0), 0.0);
    }

    #[test]
    fn test_rise_uses_attack_coefficient() {
        let mut env = EnvFollower::new(SAMPLE_RATE, 5.0, 200.0);
        let attack = env.attack_coeff;

        let first = env.process(1.0);
        let expected = (1.0 - attack) * SENSITIVITY;
        assert!((first - expected).abs() < 1e-5, "expected {expected}, got {first}");
    }

    #[test]
    fn test_fall_uses_release_coefficient() {
        let mut env = EnvFollower::new(SAMPLE_RATE, 0.0, 50.0);
        env.process(0.1);
        let start = env.level();
        let release = env.release_coeff;

        let next = env.process(0.0);
        assert!((next - start * release).abs() < 1e-6, "expected {}, got {next}", start * release);
    }

    /// Attack and release configured differently settle at measurably
    /// different speeds.
    #[test]
    fn test_attack_and_release_are_asymmetric() {
        let mut env = EnvFollower::new(SAMPLE_RATE, 1.0, 100.0);

        let rise = samples_to_cross(&mut env, 0.1, 0.99 * 0.1 * SENSITIVITY, true);
        let fall = samples_to_cross(&mut env, 0.0, 0.01 * 0.1 * SENSITIVITY, false);

        assert!(rise < fall / 10, "rise {rise} should be far shorter than fall {fall}");
    }

    #[test]
    fn test_never_negative() {
        let mut env = EnvFollower::new(SAMPLE_RATE, 2.0, 20.0);
        for i in 0..4800 {
            let x = (i as f32 * 0.05).sin() * if i % 7 == 0 { -1.0 } else { 1.0 };
            assert!(env.process(x) >= 0.0);
        }
    }

    #[test]
    fn test_silence_decays_to_exact_zero() {
        let mut env = EnvFollower::new(SAMPLE_RATE, 1.0, 1.0);
        env.process(1.0);
        for _ in 0..48000 {
            env.process(0.0);
        }

        assert_eq!(env.level(), 0.0);
    }
}
